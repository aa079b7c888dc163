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
//! Reads the two pipeline flags from an Adafruit IO style REST service.
//!
//! Each flag lives in its own feed. The newest value of a feed is available at
//! `https://{host}/api/v2/{user}/feeds/{feed}/data/last` and comes back as a
//! JSON record whose `value` field carries the flag.
use crate::errors::{ConfigError, FetchError};
use crate::source::SignalSource;
use crate::state::Flags;
use core::fmt::Write;
use log::*;
use serde::Deserialize;
use serde_json::Value;

pub const FEED_KEY_HEADER: &str = "X-AIO-Key";
pub const MAX_URL_LEN: usize = 192;

pub type FeedUrl = heapless::String<MAX_URL_LEN>;

/// Minimal blocking HTTP GET. Implementations must bound the request with a
/// timeout and only return the body of a `200` response.
pub trait HttpGet {
    fn get(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<Vec<u8>, FetchError>;
}

impl<T: HttpGet + ?Sized> HttpGet for &mut T {
    fn get(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<Vec<u8>, FetchError> {
        (**self).get(url, headers)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedConfig {
    pub host: String,
    pub user: String,
    /// Access key, sent with every request. May be empty for public feeds.
    pub key: String,
    pub building_feed: String,
    pub failing_feed: String,
}

#[derive(Deserialize)]
struct FeedRecord {
    value: Value,
}

pub fn last_value_url(host: &str, user: &str, feed: &str) -> Result<FeedUrl, ConfigError> {
    let mut url = FeedUrl::new();
    write!(url, "https://{host}/api/v2/{user}/feeds/{feed}/data/last")
        .map_err(|_| ConfigError::TooLong("feed url"))?;
    Ok(url)
}

/// Extracts the flag from a `data/last` response body.
pub fn parse_last_value(body: &[u8]) -> Result<i32, FetchError> {
    let record: FeedRecord = serde_json::from_slice(body).map_err(|err| {
        warn!("feed response is not a feed record: {}", err);
        FetchError::Malformed
    })?;

    match record.value {
        Value::String(s) => parse_flag(&s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or(FetchError::Malformed),
        Value::Bool(b) => Ok(b.into()),
        other => {
            warn!("unexpected feed value {}", other);
            Err(FetchError::Malformed)
        }
    }
}

fn parse_flag(s: &str) -> Result<i32, FetchError> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("on") {
        Ok(1)
    } else if s.eq_ignore_ascii_case("false") || s.eq_ignore_ascii_case("off") {
        Ok(0)
    } else {
        s.parse::<i32>().map_err(|_| {
            warn!("feed value '{}' is not a flag", s);
            FetchError::Malformed
        })
    }
}

/// [`SignalSource`] backed by two feeds. Both must be read successfully for
/// a new flag pair to be reported.
pub struct FeedSource<T> {
    transport: T,
    key: String,
    building_url: FeedUrl,
    failing_url: FeedUrl,
}

impl<T: HttpGet> FeedSource<T> {
    pub fn new(config: &FeedConfig, transport: T) -> Result<Self, ConfigError> {
        if config.host.is_empty() {
            return Err(ConfigError::Missing("feed_host"));
        }
        if config.user.is_empty() {
            return Err(ConfigError::Missing("feed_user"));
        }
        if config.building_feed.is_empty() {
            return Err(ConfigError::Missing("building_feed"));
        }
        if config.failing_feed.is_empty() {
            return Err(ConfigError::Missing("failing_feed"));
        }

        Ok(Self {
            transport,
            key: config.key.clone(),
            building_url: last_value_url(&config.host, &config.user, &config.building_feed)?,
            failing_url: last_value_url(&config.host, &config.user, &config.failing_feed)?,
        })
    }

    pub fn building_url(&self) -> &str {
        self.building_url.as_str()
    }

    pub fn failing_url(&self) -> &str {
        self.failing_url.as_str()
    }

    fn read_feed(transport: &mut T, key: &str, url: &str) -> Result<i32, FetchError> {
        debug!("GET {}", url);
        let body = if key.is_empty() {
            transport.get(url, &[])?
        } else {
            transport.get(url, &[(FEED_KEY_HEADER, key)])?
        };
        parse_last_value(&body)
    }
}

impl<T: HttpGet> SignalSource for FeedSource<T> {
    fn fetch(&mut self) -> Result<Flags, FetchError> {
        let building = Self::read_feed(&mut self.transport, &self.key, &self.building_url)?;
        let failing = Self::read_feed(&mut self.transport, &self.key, &self.failing_url)?;
        Ok(Flags::new(building, failing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeHttp {
        responses: HashMap<String, Result<Vec<u8>, FetchError>>,
        requests: Vec<(String, Vec<(String, String)>)>,
    }

    impl FakeHttp {
        fn respond(&mut self, url: &str, response: Result<&str, FetchError>) {
            self.responses.insert(
                url.to_string(),
                response.map(|body| body.as_bytes().to_vec()),
            );
        }
    }

    impl HttpGet for FakeHttp {
        fn get(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<Vec<u8>, FetchError> {
            self.requests.push((
                url.to_string(),
                headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ));
            self.responses
                .get(url)
                .cloned()
                .unwrap_or(Err(FetchError::HttpStatus(404)))
        }
    }

    const BUILDING_URL: &str = "https://io.adafruit.com/api/v2/ci/feeds/building/data/last";
    const FAILING_URL: &str = "https://io.adafruit.com/api/v2/ci/feeds/failing/data/last";

    fn config(key: &str) -> FeedConfig {
        FeedConfig {
            host: "io.adafruit.com".to_string(),
            user: "ci".to_string(),
            key: key.to_string(),
            building_feed: "building".to_string(),
            failing_feed: "failing".to_string(),
        }
    }

    #[test]
    fn urls_are_built_from_config() {
        let source = FeedSource::new(&config("k"), FakeHttp::default()).unwrap();
        assert_eq!(source.building_url(), BUILDING_URL);
        assert_eq!(source.failing_url(), FAILING_URL);
    }

    #[test]
    fn missing_user_is_rejected() {
        let mut cfg = config("k");
        cfg.user.clear();
        assert_eq!(
            FeedSource::new(&cfg, FakeHttp::default()).err(),
            Some(ConfigError::Missing("feed_user"))
        );
    }

    #[test]
    fn overlong_url_is_rejected() {
        let mut cfg = config("k");
        cfg.building_feed = "b".repeat(MAX_URL_LEN);
        assert_eq!(
            FeedSource::new(&cfg, FakeHttp::default()).err(),
            Some(ConfigError::TooLong("feed url"))
        );
    }

    #[test]
    fn parses_value_variants() {
        assert_eq!(parse_last_value(br#"{"value":"1"}"#), Ok(1));
        assert_eq!(parse_last_value(br#"{"value":" 0 "}"#), Ok(0));
        assert_eq!(parse_last_value(br#"{"value":"ON"}"#), Ok(1));
        assert_eq!(parse_last_value(br#"{"value":"false"}"#), Ok(0));
        assert_eq!(parse_last_value(br#"{"value":2}"#), Ok(2));
        assert_eq!(parse_last_value(br#"{"value":true}"#), Ok(1));
        assert_eq!(
            parse_last_value(br#"{"id":"0F","value":"1","feed_key":"building"}"#),
            Ok(1)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_last_value(b"<html>"), Err(FetchError::Malformed));
        assert_eq!(parse_last_value(br#"{"id":"1"}"#), Err(FetchError::Malformed));
        assert_eq!(
            parse_last_value(br#"{"value":"maybe"}"#),
            Err(FetchError::Malformed)
        );
        assert_eq!(
            parse_last_value(br#"{"value":null}"#),
            Err(FetchError::Malformed)
        );
        assert_eq!(
            parse_last_value(br#"{"value":1.5}"#),
            Err(FetchError::Malformed)
        );
    }

    #[test]
    fn fetch_reads_both_feeds_with_key() {
        let mut http = FakeHttp::default();
        http.respond(BUILDING_URL, Ok(r#"{"value":"1"}"#));
        http.respond(FAILING_URL, Ok(r#"{"value":"0"}"#));

        let mut source = FeedSource::new(&config("secret"), &mut http).unwrap();
        assert_eq!(source.fetch(), Ok(Flags::new(1, 0)));
        drop(source);

        assert_eq!(http.requests.len(), 2);
        for (_, headers) in &http.requests {
            assert_eq!(
                headers,
                &vec![(FEED_KEY_HEADER.to_string(), "secret".to_string())]
            );
        }
    }

    #[test]
    fn empty_key_sends_no_header() {
        let mut http = FakeHttp::default();
        http.respond(BUILDING_URL, Ok(r#"{"value":"0"}"#));
        http.respond(FAILING_URL, Ok(r#"{"value":"1"}"#));

        let mut source = FeedSource::new(&config(""), &mut http).unwrap();
        assert_eq!(source.fetch(), Ok(Flags::new(0, 1)));
        drop(source);

        assert!(http.requests.iter().all(|(_, headers)| headers.is_empty()));
    }

    #[test]
    fn one_failed_feed_fails_the_pair() {
        let mut http = FakeHttp::default();
        http.respond(BUILDING_URL, Ok(r#"{"value":"1"}"#));
        http.respond(FAILING_URL, Err(FetchError::Timeout));

        let mut source = FeedSource::new(&config("k"), &mut http).unwrap();
        assert_eq!(source.fetch(), Err(FetchError::Timeout));

        let mut http = FakeHttp::default();
        http.respond(BUILDING_URL, Ok("not json"));
        http.respond(FAILING_URL, Ok(r#"{"value":"1"}"#));

        let mut source = FeedSource::new(&config("k"), &mut http).unwrap();
        assert_eq!(source.fetch(), Err(FetchError::Malformed));
        drop(source);
        // the second feed is not asked once the first one failed
        assert_eq!(http.requests.len(), 1);
    }
}
