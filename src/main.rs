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
use build_light::configuration::Settings;
use build_light::feed::FeedConfig;
use build_light::startup::RetryPolicy;

#[cfg(target_os = "espidf")]
mod http;
#[cfg(target_os = "espidf")]
mod lamp;
#[cfg(target_os = "espidf")]
mod peripherals;
#[cfg(target_os = "espidf")]
mod services;
#[cfg(not(target_os = "espidf"))]
mod simulator;

#[cfg(target_os = "espidf")]
esp_idf_sys::esp_app_desc!();

#[toml_cfg::toml_config]
pub struct Config {
    #[default("")]
    wifi_ssid: &'static str,
    #[default("")]
    wifi_psk: &'static str,
    #[default("io.adafruit.com")]
    feed_host: &'static str,
    #[default("")]
    feed_user: &'static str,
    #[default("")]
    feed_key: &'static str,
    #[default("building")]
    building_feed: &'static str,
    #[default("failing")]
    failing_feed: &'static str,
    #[default(15000)]
    poll_interval_ms: u32,
    #[default(1000)]
    blink_interval_ms: u32,
    #[default(5000)]
    fetch_timeout_ms: u32,
    #[default(20)]
    connect_attempts: u32,
    #[default(500)]
    connect_retry_delay_ms: u32,
}

fn settings() -> Settings {
    Settings {
        poll_interval_ms: CONFIG.poll_interval_ms,
        blink_interval_ms: CONFIG.blink_interval_ms,
        fetch_timeout_ms: CONFIG.fetch_timeout_ms,
        connect: RetryPolicy::new(CONFIG.connect_attempts, CONFIG.connect_retry_delay_ms),
        ..Default::default()
    }
}

fn feed_config() -> FeedConfig {
    FeedConfig {
        host: CONFIG.feed_host.into(),
        user: CONFIG.feed_user.into(),
        key: CONFIG.feed_key.into(),
        building_feed: CONFIG.building_feed.into(),
        failing_feed: CONFIG.failing_feed.into(),
    }
}

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use build_light::controller::Controller;
    use build_light::indicator::{IndicatorOutput, IndicatorState};
    use build_light::scheduler::SystemClock;
    use build_light::worker;
    use esp_idf_hal::delay::FreeRtos;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use log::*;

    // TLS handshakes need far more stack than the default pthread size
    const FETCH_STACK_SIZE: usize = 16 * 1024;

    esp_idf_sys::link_patches();
    esp_idf_hal::task::critical_section::link();
    esp_idf_svc::timer::embassy_time::driver::link();

    esp_idf_svc::log::EspLogger::initialize_default();
    info!("build light v{}", env!("CARGO_PKG_VERSION"));

    let settings = settings();
    settings.validate()?;
    if CONFIG.wifi_ssid.is_empty() {
        anyhow::bail!("missing WiFi name")
    }
    let feed = feed_config();

    let peripherals = peripherals::SystemPeripherals::take()
        .ok_or_else(|| anyhow::anyhow!("peripherals already taken"))?;

    let mut lamp = lamp::Lamp::new(peripherals.lamp)?;
    lamp.write(IndicatorState::OFF);

    let nvs_default_partition = EspDefaultNvsPartition::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    let wifi = match services::wifi(
        peripherals.modem,
        &sysloop,
        Some(nvs_default_partition),
        CONFIG.wifi_ssid,
        CONFIG.wifi_psk,
        settings.connect,
    ) {
        Ok(wifi) => wifi,
        Err(err) => {
            error!("no network connection ({err}) - restarting device");
            FreeRtos::delay_ms(1000);
            services::restart()
        }
    };
    let _wifi_event_sub = services::keep_connected(&sysloop, wifi)?;

    let transport = http::EspHttpGet::new(settings.fetch_timeout_ms);
    let source = worker::spawn_feed_fetcher(&feed, transport, FETCH_STACK_SIZE)?;

    let mut controller = Controller::new(&settings, SystemClock, source, lamp);
    controller.run(|delay| FreeRtos::delay_ms(delay.as_millis() as u32))
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    let settings = settings();
    settings.validate()?;
    simulator::run(&settings, &feed_config())
}
