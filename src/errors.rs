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
use core::fmt;

/// Why a poll of the signal source did not produce a fresh flag pair.
///
/// All variants are handled the same way by the control loop: the previous
/// flags are kept and the next attempt happens one poll interval later.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FetchError {
    Transport,
    Timeout,
    HttpStatus(u16),
    Malformed,
    Pending,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "Transport error while talking to the feed server"),
            Self::Timeout => write!(f, "Feed server did not answer in time"),
            Self::HttpStatus(status) => write!(f, "Unexpected server response {status}"),
            Self::Malformed => write!(f, "Feed response could not be parsed"),
            Self::Pending => write!(f, "No fetch result available yet"),
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    ZeroInterval(&'static str),
    TooLong(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "Missing configuration value {key}"),
            Self::ZeroInterval(key) => write!(f, "Configuration value {key} must not be zero"),
            Self::TooLong(key) => write!(f, "Configuration value {key} is too long"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum InitError {
    #[cfg(target_os = "espidf")]
    EspError(esp_idf_sys::EspError),
    ConfigError(ConfigError),
    SpawnError(std::io::Error),
    NotConnected,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(target_os = "espidf")]
            Self::EspError(e) => write!(f, "ESP-IDF call failed: {e}"),
            Self::ConfigError(e) => write!(f, "{e}"),
            Self::SpawnError(e) => write!(f, "Failed to start worker thread: {e}"),
            Self::NotConnected => write!(f, "No network connection"),
        }
    }
}

impl std::error::Error for InitError {}

#[cfg(target_os = "espidf")]
impl From<esp_idf_sys::EspError> for InitError {
    fn from(e: esp_idf_sys::EspError) -> Self {
        Self::EspError(e)
    }
}

#[cfg(target_os = "espidf")]
impl From<esp_idf_svc::errors::EspIOError> for InitError {
    fn from(e: esp_idf_svc::errors::EspIOError) -> Self {
        Self::EspError(e.0)
    }
}

impl From<ConfigError> for InitError {
    fn from(e: ConfigError) -> Self {
        Self::ConfigError(e)
    }
}

impl From<std::io::Error> for InitError {
    fn from(e: std::io::Error) -> Self {
        Self::SpawnError(e)
    }
}
