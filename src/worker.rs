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
//! Runs a slow [`SignalSource`] on its own thread.
//!
//! The control loop must keep blinking while an HTTP request is in flight, so
//! the request is handed to a worker thread. The worker drops each finished
//! result into a single-slot [`Mailbox`]; the loop picks it up on its next
//! poll tick. A result is always a whole flag pair or an error, never half of
//! one.
use crate::errors::{FetchError, InitError};
use crate::feed::{FeedConfig, FeedSource, HttpGet};
use crate::source::SignalSource;
use crate::state::Flags;
use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use log::*;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;

pub const FETCH_THREAD_NAME: &str = "feed-fetch";

pub type FetchResult = Result<Flags, FetchError>;

/// Holds at most one fetch result. A newer result replaces an unread one.
pub struct Mailbox {
    slot: Mutex<CriticalSectionRawMutex, Cell<Option<FetchResult>>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    pub fn post(&self, result: FetchResult) {
        self.slot.lock(|slot| slot.set(Some(result)));
    }

    pub fn take(&self) -> Option<FetchResult> {
        self.slot.lock(|slot| slot.take())
    }

    pub fn is_full(&self) -> bool {
        self.slot.lock(|slot| slot.get().is_some())
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

struct Shared {
    mailbox: Mailbox,
    // set by the caller when a request is sent, cleared by the worker right
    // before it posts the result
    in_flight: AtomicBool,
}

/// Non-blocking front for a source running on a worker thread.
///
/// Each call to [`fetch`](SignalSource::fetch) returns the newest result the
/// worker finished since the previous call and asks the worker for the next
/// one, unless a request is still in flight. Results therefore lag one poll
/// interval behind the request.
pub struct BackgroundSource {
    shared: Arc<Shared>,
    requests: SyncSender<()>,
    worker: JoinHandle<()>,
}

impl BackgroundSource {
    pub fn spawn<S>(source: S, stack_size: usize) -> Result<Self, InitError>
    where
        S: SignalSource + Send + 'static,
    {
        let (requests, pending) = mpsc::sync_channel(1);
        let shared = Arc::new(Shared {
            mailbox: Mailbox::new(),
            in_flight: AtomicBool::new(false),
        });
        let worker_shared = shared.clone();

        let worker = std::thread::Builder::new()
            .name(FETCH_THREAD_NAME.into())
            .stack_size(stack_size)
            .spawn(move || fetch_loop(source, pending, &worker_shared))?;

        info!("fetch worker started");
        Ok(Self {
            shared,
            requests,
            worker,
        })
    }

    /// True if a finished result is waiting to be picked up.
    pub fn has_result(&self) -> bool {
        self.shared.mailbox.is_full()
    }

    /// True while a request has been handed to the worker and not answered.
    pub fn is_in_flight(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }
}

/// Starts a [`FeedSource`] on its own fetch thread.
pub fn spawn_feed_fetcher<T>(
    config: &FeedConfig,
    transport: T,
    stack_size: usize,
) -> Result<BackgroundSource, InitError>
where
    T: HttpGet + Send + 'static,
{
    let source = FeedSource::new(config, transport)?;
    info!("polling {} and {}", source.building_url(), source.failing_url());
    BackgroundSource::spawn(source, stack_size)
}

impl SignalSource for BackgroundSource {
    fn fetch(&mut self) -> Result<Flags, FetchError> {
        let result = self.shared.mailbox.take();

        if !self.is_running() {
            error!("fetch worker has stopped");
            return result.unwrap_or(Err(FetchError::Transport));
        }

        if self.shared.in_flight.swap(true, Ordering::AcqRel) {
            debug!("previous fetch still in flight, not queueing another one");
            return result.unwrap_or(Err(FetchError::Pending));
        }

        match self.requests.try_send(()) {
            Ok(()) => {}
            Err(TrySendError::Full(())) => {
                debug!("fetch request already queued")
            }
            Err(TrySendError::Disconnected(())) => {
                error!("fetch worker has stopped");
                return result.unwrap_or(Err(FetchError::Transport));
            }
        }

        result.unwrap_or(Err(FetchError::Pending))
    }
}

fn fetch_loop<S: SignalSource>(mut source: S, pending: Receiver<()>, shared: &Shared) {
    while pending.recv().is_ok() {
        let result = source.fetch();
        debug!("fetch finished: {:?}", result);
        shared.in_flight.store(false, Ordering::Release);
        shared.mailbox.post(result);
    }
    info!("fetch worker shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;
    use crate::source::ScriptedSource;
    use core::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    const STACK_SIZE: usize = 64 * 1024;

    fn wait_for_result(source: &BackgroundSource) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !source.has_result() {
            assert!(Instant::now() < deadline, "worker did not deliver a result");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn mailbox_keeps_only_newest() {
        let mailbox = Mailbox::new();
        assert_eq!(mailbox.take(), None);

        mailbox.post(Ok(Flags::new(1, 0)));
        mailbox.post(Err(FetchError::Timeout));
        mailbox.post(Ok(Flags::new(0, 1)));
        assert!(mailbox.is_full());
        assert_eq!(mailbox.take(), Some(Ok(Flags::new(0, 1))));
        assert_eq!(mailbox.take(), None);
        assert!(!mailbox.is_full());
    }

    #[test]
    fn first_fetch_is_pending_then_delivers() {
        let inner = ScriptedSource::new([Ok(Flags::new(1, 1)), Err(FetchError::Transport)]);
        let mut source = BackgroundSource::spawn(inner, STACK_SIZE).unwrap();

        assert_eq!(source.fetch(), Err(FetchError::Pending));
        wait_for_result(&source);
        assert_eq!(source.fetch(), Ok(Flags::new(1, 1)));
        wait_for_result(&source);
        assert_eq!(source.fetch(), Err(FetchError::Transport));
    }

    struct GatedSource {
        gate: Receiver<Flags>,
        calls: Arc<AtomicUsize>,
    }

    impl GatedSource {
        fn new(gate: Receiver<Flags>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    gate,
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl SignalSource for GatedSource {
        fn fetch(&mut self) -> Result<Flags, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.recv().map_err(|_| FetchError::Transport)
        }
    }

    #[test]
    fn slow_source_does_not_block_caller() {
        let (release, gate) = mpsc::channel();
        let (gated, _) = GatedSource::new(gate);
        let mut source = BackgroundSource::spawn(gated, STACK_SIZE).unwrap();

        // the worker is stuck in the first request, callers still return at once
        for _ in 0..10 {
            assert_eq!(source.fetch(), Err(FetchError::Pending));
        }

        release.send(Flags::new(0, 1)).unwrap();
        wait_for_result(&source);
        assert_eq!(source.fetch(), Ok(Flags::new(0, 1)));
    }

    #[test]
    fn request_in_flight_is_not_queued_again() {
        let (release, gate) = mpsc::channel();
        let (gated, calls) = GatedSource::new(gate);
        let mut source = BackgroundSource::spawn(gated, STACK_SIZE).unwrap();

        assert_eq!(source.fetch(), Err(FetchError::Pending));
        assert!(source.is_in_flight());
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(source.fetch(), Err(FetchError::Pending));
        assert_eq!(source.fetch(), Err(FetchError::Pending));

        release.send(Flags::new(1, 0)).unwrap();
        wait_for_result(&source);
        // give a stray queued request time to reach the source
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!source.is_in_flight());

        assert_eq!(source.fetch(), Ok(Flags::new(1, 0)));
    }

    struct PanickingSource;

    impl SignalSource for PanickingSource {
        fn fetch(&mut self) -> Result<Flags, FetchError> {
            panic!("source crashed");
        }
    }

    #[test]
    fn stopped_worker_reports_transport_error() {
        let mut source = BackgroundSource::spawn(PanickingSource, STACK_SIZE).unwrap();
        assert_eq!(source.fetch(), Err(FetchError::Pending));

        let deadline = Instant::now() + Duration::from_secs(5);
        while source.is_running() {
            assert!(Instant::now() < deadline, "worker did not stop");
            std::thread::sleep(Duration::from_millis(1));
        }

        let started = Instant::now();
        assert_eq!(source.fetch(), Err(FetchError::Transport));
        assert_eq!(source.fetch(), Err(FetchError::Transport));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[derive(Clone)]
    struct StaticHttp;

    impl HttpGet for StaticHttp {
        fn get(&mut self, url: &str, _headers: &[(&str, &str)]) -> Result<Vec<u8>, FetchError> {
            let value = if url.contains("/feeds/building/") { "1" } else { "0" };
            Ok(format!(r#"{{"value":"{value}"}}"#).into_bytes())
        }
    }

    fn feed_config(user: &str) -> FeedConfig {
        FeedConfig {
            host: "io.adafruit.com".to_string(),
            user: user.to_string(),
            key: String::new(),
            building_feed: "building".to_string(),
            failing_feed: "failing".to_string(),
        }
    }

    #[test]
    fn feed_fetcher_runs_feed_source() {
        let mut source = spawn_feed_fetcher(&feed_config("ci"), StaticHttp, STACK_SIZE).unwrap();
        assert_eq!(source.fetch(), Err(FetchError::Pending));
        wait_for_result(&source);
        assert_eq!(source.fetch(), Ok(Flags::new(1, 0)));
    }

    #[test]
    fn feed_fetcher_rejects_incomplete_config() {
        let result = spawn_feed_fetcher(&feed_config(""), StaticHttp, STACK_SIZE);
        assert!(matches!(
            result,
            Err(InitError::ConfigError(ConfigError::Missing("feed_user")))
        ));
    }
}
