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
//! Lamp state computation.
//!
//! Red and green show whether the pipeline is failing, yellow blinks while a
//! build is running. The function here is pure; writing to hardware is left
//! to an [`IndicatorOutput`].
use crate::state::Flags;
use core::fmt;

/// Blink phase of the yellow lamp.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AnimationPhase {
    #[default]
    Off,
    On,
}

impl AnimationPhase {
    pub fn toggled(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IndicatorState {
    pub red: bool,
    pub yellow: bool,
    pub green: bool,
}

impl IndicatorState {
    pub const OFF: Self = Self {
        red: false,
        yellow: false,
        green: false,
    };
}

impl fmt::Display for IndicatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lamp = |on: bool, name: &'static str| if on { name } else { "-" };
        write!(
            f,
            "[{} {} {}]",
            lamp(self.red, "R"),
            lamp(self.yellow, "Y"),
            lamp(self.green, "G")
        )
    }
}

/// Computes the lamp state for one render tick and the phase to keep for the
/// next one.
pub fn render(flags: Flags, phase: AnimationPhase) -> (IndicatorState, AnimationPhase) {
    let phase = if flags.is_building() {
        phase.toggled()
    } else {
        AnimationPhase::Off
    };

    let failing = flags.is_failing();
    let state = IndicatorState {
        red: failing,
        yellow: phase.is_on(),
        green: !failing,
    };

    (state, phase)
}

/// Sink for the computed lamp state.
///
/// Writes are fire-and-forget; implementations log hardware errors
/// themselves.
pub trait IndicatorOutput {
    fn write(&mut self, state: IndicatorState);
}

impl<T: IndicatorOutput + ?Sized> IndicatorOutput for &mut T {
    fn write(&mut self, state: IndicatorState) {
        (**self).write(state)
    }
}

impl<T: IndicatorOutput + ?Sized> IndicatorOutput for Box<T> {
    fn write(&mut self, state: IndicatorState) {
        (**self).write(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_flags() -> [Flags; 4] {
        [
            Flags::new(0, 0),
            Flags::new(1, 0),
            Flags::new(0, 1),
            Flags::new(1, 1),
        ]
    }

    #[test]
    fn failing_shows_red_only() {
        for flags in all_flags().into_iter().filter(|f| f.is_failing()) {
            for phase in [AnimationPhase::Off, AnimationPhase::On] {
                let (state, _) = render(flags, phase);
                assert!(state.red);
                assert!(!state.green);
            }
        }
    }

    #[test]
    fn passing_shows_green_only() {
        for flags in all_flags().into_iter().filter(|f| !f.is_failing()) {
            for phase in [AnimationPhase::Off, AnimationPhase::On] {
                let (state, _) = render(flags, phase);
                assert!(!state.red);
                assert!(state.green);
            }
        }
    }

    #[test]
    fn building_alternates_yellow() {
        let flags = Flags::new(1, 0);
        let mut phase = AnimationPhase::Off;
        let mut yellow = Vec::new();
        for _ in 0..5 {
            let (state, next) = render(flags, phase);
            phase = next;
            yellow.push(state.yellow);
            assert!(state.green);
            assert!(!state.red);
        }
        assert_eq!(yellow, [true, false, true, false, true]);
    }

    #[test]
    fn build_end_resets_phase() {
        let (_, phase) = render(Flags::new(1, 1), AnimationPhase::Off);
        assert_eq!(phase, AnimationPhase::On);

        let (state, phase) = render(Flags::new(0, 1), phase);
        assert!(!state.yellow);
        assert_eq!(phase, AnimationPhase::Off);

        // a new build starts blinking from the same phase every time
        let (state, _) = render(Flags::new(1, 1), phase);
        assert!(state.yellow);
    }

    #[test]
    fn idle_failing_is_stable() {
        let flags = Flags::new(0, 1);
        let mut phase = AnimationPhase::default();
        for _ in 0..4 {
            let (state, next) = render(flags, phase);
            phase = next;
            assert_eq!(
                state,
                IndicatorState {
                    red: true,
                    yellow: false,
                    green: false
                }
            );
        }
    }

    #[test]
    fn display_lists_lit_lamps() {
        let state = IndicatorState {
            red: true,
            yellow: false,
            green: true,
        };
        assert_eq!(state.to_string(), "[R - G]");
        assert_eq!(IndicatorState::OFF.to_string(), "[- - -]");
    }
}
