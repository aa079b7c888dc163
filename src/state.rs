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

/// The two status flags published by the build pipeline.
///
/// Values are kept exactly as received; any nonzero value means "true".
/// The pair is always replaced as a whole.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash)]
pub struct Flags {
    pub building: i32,
    pub failing: i32,
}

impl Flags {
    pub const fn new(building: i32, failing: i32) -> Self {
        Self { building, failing }
    }

    pub const fn is_building(&self) -> bool {
        self.building != 0
    }

    pub const fn is_failing(&self) -> bool {
        self.failing != 0
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "building={} failing={}", self.building, self.failing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonzero_is_true() {
        let flags = Flags::new(-1, 2);
        assert!(flags.is_building());
        assert!(flags.is_failing());

        let flags = Flags::default();
        assert!(!flags.is_building());
        assert!(!flags.is_failing());
    }
}
