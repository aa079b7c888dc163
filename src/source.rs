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
use crate::state::Flags;

/// Anything that can report the current pipeline flags.
///
/// Implementations may block, but should bound the wait with a timeout and
/// report it as [`FetchError::Timeout`].
pub trait SignalSource {
    fn fetch(&mut self) -> Result<Flags, FetchError>;
}

impl<S: SignalSource + ?Sized> SignalSource for &mut S {
    fn fetch(&mut self) -> Result<Flags, FetchError> {
        (**self).fetch()
    }
}

impl<S: SignalSource + ?Sized> SignalSource for Box<S> {
    fn fetch(&mut self) -> Result<Flags, FetchError> {
        (**self).fetch()
    }
}

/// Replays a fixed list of results, starting over at the end.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    steps: Vec<Result<Flags, FetchError>>,
    calls: usize,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Result<Flags, FetchError>>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            calls: 0,
        }
    }

    pub fn constant(flags: Flags) -> Self {
        Self::new([Ok(flags)])
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl SignalSource for ScriptedSource {
    fn fetch(&mut self) -> Result<Flags, FetchError> {
        if self.steps.is_empty() {
            return Err(FetchError::Pending);
        }
        let step = self.steps[self.calls % self.steps.len()];
        self.calls += 1;
        step
    }
}
