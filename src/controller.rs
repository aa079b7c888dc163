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
//! The control loop.
//!
//! One [`Controller`] owns everything the loop touches: the clock, both
//! interval timers, the flag pair, the blink phase and the lamp. Every tick
//! it checks the render timer and then the poll timer; either, both or
//! neither may fire. Nothing in a tick waits for time to pass.
use crate::configuration::Settings;
use crate::indicator::{self, AnimationPhase, IndicatorOutput, IndicatorState};
use crate::poll::{PollOutcome, Poller};
use crate::scheduler::{Clock, IntervalTimer};
use crate::source::SignalSource;
use crate::state::Flags;
use core::time::Duration;
use log::*;

/// What happened during one tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub rendered: Option<IndicatorState>,
    pub polled: Option<PollOutcome>,
}

pub struct Controller<S, O, C> {
    clock: C,
    source: S,
    output: O,
    render_timer: IntervalTimer,
    poll_timer: IntervalTimer,
    poller: Poller,
    phase: AnimationPhase,
    indicator: IndicatorState,
    loop_delay: Duration,
}

impl<S, O, C> Controller<S, O, C>
where
    S: SignalSource,
    O: IndicatorOutput,
    C: Clock,
{
    pub fn new(settings: &Settings, clock: C, source: S, output: O) -> Self {
        let (render_timer, poll_timer) = if settings.fire_on_start {
            let now = clock.now_ms();
            (
                IntervalTimer::fire_immediately(settings.blink_interval_ms, now),
                IntervalTimer::fire_immediately(settings.poll_interval_ms, now),
            )
        } else {
            (
                IntervalTimer::new(settings.blink_interval_ms),
                IntervalTimer::new(settings.poll_interval_ms),
            )
        };

        Self {
            clock,
            source,
            output,
            render_timer,
            poll_timer,
            poller: Poller::default(),
            phase: AnimationPhase::Off,
            indicator: IndicatorState::OFF,
            loop_delay: Duration::from_millis(settings.loop_delay_ms.into()),
        }
    }

    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        let mut report = TickReport::default();

        if self.render_timer.poll(now) {
            report.rendered = Some(self.render());
        }

        if self.poll_timer.poll(now) {
            report.polled = Some(self.poller.poll(&mut self.source));
        }

        report
    }

    /// Ticks forever, handing control to `sleep` between ticks so lower
    /// priority tasks and the idle watchdog get to run.
    pub fn run(&mut self, mut sleep: impl FnMut(Duration)) -> ! {
        info!(
            "control loop running: render every {} ms, poll every {} ms",
            self.render_timer.interval(),
            self.poll_timer.interval()
        );
        loop {
            self.tick();
            sleep(self.loop_delay);
        }
    }

    fn render(&mut self) -> IndicatorState {
        let (state, phase) = indicator::render(self.poller.flags(), self.phase);
        if state != self.indicator {
            debug!("indicator {} -> {}", self.indicator, state);
        }
        self.phase = phase;
        self.indicator = state;
        self.output.write(state);
        state
    }

    pub fn flags(&self) -> Flags {
        self.poller.flags()
    }

    pub fn indicator(&self) -> IndicatorState {
        self.indicator
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}
