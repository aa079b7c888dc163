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
use crate::errors::FetchError;
use crate::source::SignalSource;
use crate::state::Flags;
use log::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    Updated { previous: Flags },
    Unchanged,
    Failed(FetchError),
}

/// Holds the last known flag pair and refreshes it from a [`SignalSource`].
///
/// A failed fetch never touches the held flags: stale but known state is
/// shown until the source answers again.
#[derive(Debug, Default)]
pub struct Poller {
    flags: Flags,
    consecutive_failures: u32,
}

impl Poller {
    pub fn new(initial: Flags) -> Self {
        Self {
            flags: initial,
            consecutive_failures: 0,
        }
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn poll<S: SignalSource + ?Sized>(&mut self, source: &mut S) -> PollOutcome {
        debug!("polling signal source");

        let fresh = match source.fetch() {
            Ok(fresh) => fresh,
            Err(FetchError::Pending) => {
                debug!("no fetch result yet, keeping {}", self.flags);
                return PollOutcome::Failed(FetchError::Pending);
            }
            Err(err) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                warn!(
                    "fetch failed ({} in a row): {}, keeping {}",
                    self.consecutive_failures, err, self.flags
                );
                return PollOutcome::Failed(err);
            }
        };

        if self.consecutive_failures > 0 {
            info!(
                "signal source recovered after {} failed fetches",
                self.consecutive_failures
            );
            self.consecutive_failures = 0;
        }

        if fresh == self.flags {
            debug!("flags unchanged: {}", fresh);
            return PollOutcome::Unchanged;
        }

        let previous = core::mem::replace(&mut self.flags, fresh);
        info!("flags changed: {} -> {}", previous, fresh);
        PollOutcome::Updated { previous }
    }
}
