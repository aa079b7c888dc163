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
use build_light::errors::FetchError;
use build_light::feed::HttpGet;
use esp_idf_svc::errors::EspIOError;
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use esp_idf_sys::{ESP_ERR_HTTP_EAGAIN, ESP_ERR_TIMEOUT};
use log::*;
use std::time::Duration;

const READ_BUF_SIZE: usize = 512;
// A feed record is a few hundred bytes, anything larger is not what we asked for
const MAX_BODY_SIZE: usize = 4096;

/// HTTPS GET on top of the ESP-IDF http client. A fresh connection is opened
/// per request, so the value can move freely between threads.
pub struct EspHttpGet {
    timeout: Duration,
}

impl EspHttpGet {
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms.into()),
        }
    }
}

fn classify(err: impl Into<EspIOError>) -> FetchError {
    let err = err.into().0;
    let code = err.code();
    if code == ESP_ERR_HTTP_EAGAIN as i32 || code == ESP_ERR_TIMEOUT as i32 {
        warn!("http request timed out: {}", err);
        FetchError::Timeout
    } else {
        warn!("http request failed: {}", err);
        FetchError::Transport
    }
}

impl HttpGet for EspHttpGet {
    fn get(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<Vec<u8>, FetchError> {
        let mut client = EspHttpConnection::new(&Configuration {
            buffer_size: Some(READ_BUF_SIZE),
            timeout: Some(self.timeout),
            crt_bundle_attach: Some(esp_idf_sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(classify)?;

        client
            .initiate_request(embedded_svc::http::Method::Get, url, headers)
            .map_err(classify)?;
        client.initiate_response().map_err(classify)?;

        let http_status = client.status();
        if http_status != 200 {
            warn!("feed request failed. Server response = {http_status}");
            return Err(FetchError::HttpStatus(http_status));
        }

        let mut body = Vec::new();
        let mut buf = [0_u8; READ_BUF_SIZE];
        loop {
            let data_read = client.read(&mut buf).map_err(classify)?;
            if data_read == 0 {
                break;
            }
            if body.len() + data_read > MAX_BODY_SIZE {
                warn!("feed response exceeds {} bytes", MAX_BODY_SIZE);
                return Err(FetchError::Malformed);
            }
            body.extend_from_slice(&buf[..data_read]);
        }

        debug!("feed response = {}", String::from_utf8_lossy(&body));
        Ok(body)
    }
}
