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
//! Desk simulator: runs the real control loop against a scripted pipeline
//! and prints the lamp instead of driving GPIOs.
use build_light::configuration::Settings;
use build_light::controller::Controller;
use build_light::errors::FetchError;
use build_light::feed::{self, FeedConfig};
use build_light::indicator::{IndicatorOutput, IndicatorState};
use build_light::scheduler::{Clock, SystemClock};
use build_light::source::ScriptedSource;
use build_light::state::Flags;

struct ConsoleLamp<C> {
    clock: C,
}

impl<C: Clock> IndicatorOutput for ConsoleLamp<C> {
    fn write(&mut self, state: IndicatorState) {
        println!("{:>8} ms  {}", self.clock.now_ms(), state);
    }
}

fn pipeline() -> ScriptedSource {
    ScriptedSource::new([
        Ok(Flags::new(0, 0)),
        Ok(Flags::new(1, 0)),
        Ok(Flags::new(1, 0)),
        Err(FetchError::Timeout),
        Ok(Flags::new(0, 1)),
        Ok(Flags::new(1, 1)),
        Err(FetchError::Malformed),
        Ok(Flags::new(0, 0)),
    ])
}

pub fn run(settings: &Settings, feed: &FeedConfig) -> ! {
    match feed::last_value_url(&feed.host, &feed.user, &feed.building_feed) {
        Ok(url) if !feed.user.is_empty() => println!("device would poll {url}"),
        _ => println!("no feed configured, using a scripted pipeline"),
    }

    let mut controller = Controller::new(
        settings,
        SystemClock,
        pipeline(),
        ConsoleLamp { clock: SystemClock },
    );
    controller.run(std::thread::sleep)
}
