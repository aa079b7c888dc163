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
use crate::errors::ConfigError;
use crate::startup::RetryPolicy;

// How often the feed server is asked for fresh flags [ms]
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 15_000;
// Blink period of the yellow lamp, also the render cadence [ms]
pub const DEFAULT_BLINK_INTERVAL_MS: u32 = 1_000;
// Upper bound for one HTTP request [ms]
pub const DEFAULT_FETCH_TIMEOUT_MS: u32 = 5_000;
// Idle time between two loop ticks [ms]
pub const DEFAULT_LOOP_DELAY_MS: u32 = 10;
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 20;
pub const DEFAULT_CONNECT_RETRY_DELAY_MS: u32 = 500;

/// Runtime settings, fixed at startup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub poll_interval_ms: u32,
    pub blink_interval_ms: u32,
    pub fetch_timeout_ms: u32,
    pub loop_delay_ms: u32,
    /// Render and poll on the very first tick instead of one interval later.
    pub fire_on_start: bool,
    pub connect: RetryPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            blink_interval_ms: DEFAULT_BLINK_INTERVAL_MS,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            loop_delay_ms: DEFAULT_LOOP_DELAY_MS,
            fire_on_start: true,
            connect: RetryPolicy::new(DEFAULT_CONNECT_ATTEMPTS, DEFAULT_CONNECT_RETRY_DELAY_MS),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("poll_interval_ms"));
        }
        if self.blink_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("blink_interval_ms"));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::ZeroInterval("fetch_timeout_ms"));
        }
        Ok(())
    }
}
