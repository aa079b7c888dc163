/*
 * ESP32 Build Light
 *
 * MIT license
 *
 * Copyright (c) 2021-2023 Michael Zill
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 *
 * Apache license, Version 2.0
 *
 * Copyright (c) 2021-2023 Michael Zill
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */
use crate::peripherals::LampPeripherals;
use build_light::indicator::{IndicatorOutput, IndicatorState};
use esp_idf_hal::gpio::*;
use esp_idf_sys::EspError;
use log::*;

type LampPin = PinDriver<'static, AnyOutputPin, Output>;

/// Three discrete LEDs (or relays) driven high for "on".
pub struct Lamp {
    red: LampPin,
    yellow: LampPin,
    green: LampPin,
}

impl Lamp {
    pub fn new(pins: LampPeripherals) -> Result<Self, EspError> {
        Ok(Lamp {
            red: PinDriver::output(pins.red)?,
            yellow: PinDriver::output(pins.yellow)?,
            green: PinDriver::output(pins.green)?,
        })
    }
}

fn switch(pin: &mut LampPin, on: bool, name: &str) {
    let result = if on { pin.set_high() } else { pin.set_low() };
    if let Err(err) = result {
        warn!("switching {} lamp failed: {}", name, err);
    }
}

impl IndicatorOutput for Lamp {
    fn write(&mut self, state: IndicatorState) {
        switch(&mut self.red, state.red, "red");
        switch(&mut self.yellow, state.yellow, "yellow");
        switch(&mut self.green, state.green, "green");
    }
}
