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
use core::time::Duration;
use log::*;

/// How often to retry a startup step and how long to wait in between.
/// `attempts == 0` retries forever.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay_ms: u32,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, delay_ms: u32) -> Self {
        Self { attempts, delay_ms }
    }

    pub fn is_unlimited(&self) -> bool {
        self.attempts == 0
    }
}

/// Runs `attempt` until it succeeds or the policy is exhausted, calling
/// `sleep` between failed attempts. Attempts are numbered from 1.
pub fn retry<T, E, F, D>(policy: RetryPolicy, mut attempt: F, mut sleep: D) -> Result<T, E>
where
    F: FnMut(u32) -> Result<T, E>,
    D: FnMut(Duration),
    E: fmt::Display,
{
    let mut n = 1;
    loop {
        match attempt(n) {
            Ok(value) => {
                if n > 1 {
                    info!("succeeded after {} attempts", n);
                }
                return Ok(value);
            }
            Err(err) if !policy.is_unlimited() && n >= policy.attempts => {
                error!("giving up after {} attempts: {}", n, err);
                return Err(err);
            }
            Err(err) => {
                warn!(
                    "attempt {} failed: {}, retrying in {} ms",
                    n, err, policy.delay_ms
                );
                sleep(Duration::from_millis(policy.delay_ms.into()));
                n = n.saturating_add(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::InitError;

    #[test]
    fn retries_until_success() {
        let mut slept = Vec::new();
        let result = retry(
            RetryPolicy::new(5, 250),
            |n| if n < 3 { Err(InitError::NotConnected) } else { Ok(n) },
            |d| slept.push(d),
        );
        assert_eq!(result.ok(), Some(3));
        assert_eq!(slept, [Duration::from_millis(250); 2]);
    }

    #[test]
    fn gives_up_after_last_attempt() {
        let mut calls = 0;
        let mut sleeps = 0;
        let result: Result<(), _> = retry(
            RetryPolicy::new(4, 10),
            |_| {
                calls += 1;
                Err(InitError::NotConnected)
            },
            |_| sleeps += 1,
        );
        assert!(matches!(result, Err(InitError::NotConnected)));
        assert_eq!(calls, 4);
        assert_eq!(sleeps, 3);
    }

    #[test]
    fn zero_attempts_is_unlimited() {
        let policy = RetryPolicy::new(0, 1);
        assert!(policy.is_unlimited());

        let result = retry(
            policy,
            |n| if n < 100 { Err(InitError::NotConnected) } else { Ok(n) },
            |_| {},
        );
        assert_eq!(result.ok(), Some(100));
    }
}
