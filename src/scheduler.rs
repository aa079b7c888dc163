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
//! Non-blocking interval timers driven by a wrapping millisecond counter.
//!
//! The loop never sleeps until an action is due. Instead every tick asks each
//! timer whether its interval has elapsed. Elapsed time is computed with
//! wrapping `u32` arithmetic, so a counter overflow (after ~49.7 days) does
//! not stall or double-fire a timer.
use core::cell::Cell;

/// Milliseconds since an arbitrary epoch, wrapping at `u32::MAX`.
pub type Millis = u32;

/// True iff more than `interval` milliseconds passed between `last` and `now`.
#[inline(always)]
pub fn due(now: Millis, last: Millis, interval: Millis) -> bool {
    now.wrapping_sub(last) > interval
}

/// One periodic action: the time it last fired and its fixed interval.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IntervalTimer {
    last: Millis,
    interval: Millis,
}

impl IntervalTimer {
    /// Timer that first fires one interval after the clock epoch.
    pub const fn new(interval: Millis) -> Self {
        Self { last: 0, interval }
    }

    /// Timer that is already due at `now`.
    pub fn fire_immediately(interval: Millis, now: Millis) -> Self {
        Self {
            last: now.wrapping_sub(interval).wrapping_sub(1),
            interval,
        }
    }

    /// Returns true when the action is due and restarts the interval at `now`.
    pub fn poll(&mut self, now: Millis) -> bool {
        if due(now, self.last, self.interval) {
            self.last = now;
            true
        } else {
            false
        }
    }

    pub fn interval(&self) -> Millis {
        self.interval
    }

    pub fn last(&self) -> Millis {
        self.last
    }
}

pub trait Clock {
    fn now_ms(&self) -> Millis;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}

/// Uptime clock of the embassy time driver, truncated to 32 bits.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        embassy_time::Instant::now().as_millis() as Millis
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Millis>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: Millis) {
        self.now.set(now);
    }

    pub fn advance(&self, delta: Millis) {
        self.now.set(self.now.get().wrapping_add(delta));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_only_after_interval_is_exceeded() {
        assert!(!due(1000, 0, 1000));
        assert!(due(1001, 0, 1000));
        assert!(!due(0, 0, 1000));
    }

    #[test]
    fn due_survives_counter_wraparound() {
        let last = u32::MAX - 100;
        // 101 ticks up to the wrap plus 50 after it
        assert!(due(50, last, 150));
        assert!(!due(50, last, 151));
    }

    #[test]
    fn poll_restarts_interval() {
        let mut timer = IntervalTimer::new(1000);
        assert!(!timer.poll(500));
        assert!(timer.poll(1001));
        assert_eq!(timer.last(), 1001);
        assert!(!timer.poll(1500));
        assert!(!timer.poll(2001));
        assert!(timer.poll(2002));
    }

    #[test]
    fn poll_across_wraparound() {
        let start = u32::MAX - 10;
        let mut timer = IntervalTimer::fire_immediately(20, start);
        assert!(timer.poll(start));
        assert!(!timer.poll(5));
        // 11 ticks to wrap, 10 more after it
        assert!(timer.poll(10));
        assert_eq!(timer.last(), 10);
    }

    #[test]
    fn fire_immediately_at_epoch() {
        let mut timer = IntervalTimer::fire_immediately(15_000, 0);
        assert!(timer.poll(0));
        assert!(!timer.poll(15_000));
        assert!(timer.poll(15_001));
    }

    #[test]
    fn timers_are_independent() {
        let mut fast = IntervalTimer::new(10);
        let mut slow = IntervalTimer::new(100);

        let mut fast_count = 0;
        let mut slow_count = 0;
        for now in 0..=1000 {
            if fast.poll(now) {
                fast_count += 1;
            }
            if slow.poll(now) {
                slow_count += 1;
            }
        }
        // fires at 11, 22, ... 990 and 101, 202, ... 909
        assert_eq!(fast_count, 90);
        assert_eq!(slow_count, 9);
        assert_eq!(slow.interval(), 100);
    }

    #[test]
    fn manual_clock_wraps() {
        let clock = ManualClock::new(u32::MAX);
        clock.advance(2);
        assert_eq!(clock.now_ms(), 1);
        clock.set(42);
        assert_eq!((&clock).now_ms(), 42);
    }
}
