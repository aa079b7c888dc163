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
use build_light::errors::InitError;
use build_light::startup::{self, RetryPolicy};
use embedded_svc::ipv4::Ipv4Addr;
use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
use esp_idf_svc::netif::{EspNetif, EspNetifWait};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{EspWifi, WifiEvent, WifiWait};
use log::*;
use std::time::Duration;

const START_TIMEOUT: Duration = Duration::from_secs(20);
// Time to wait for association plus DHCP on a single connect attempt
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Brings up the station interface and blocks until an IP address is
/// assigned or the retry policy is exhausted.
pub fn wifi(
    modem: Modem,
    sysloop: &EspSystemEventLoop,
    partition: Option<EspDefaultNvsPartition>,
    ssid: &str,
    psk: &str,
    policy: RetryPolicy,
) -> Result<EspWifi<'static>, InitError> {
    let mut wifi = EspWifi::new(modem, sysloop.clone(), partition)?;

    info!("Wifi name {}", ssid);
    let auth_method = if psk.is_empty() {
        info!("Wifi password is empty");
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };

    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: ssid.into(),
        password: psk.into(),
        auth_method,
        ..Default::default()
    }))?;

    let wait = WifiWait::new(sysloop)?;
    wifi.start()?;
    if !wait.wait_with_timeout(START_TIMEOUT, || wifi.is_started().unwrap_or(false)) {
        return Err(InitError::NotConnected);
    }
    info!("Wifi started");

    startup::retry(
        policy,
        |attempt| connect(&mut wifi, sysloop, attempt),
        |delay| FreeRtos::delay_ms(delay.as_millis() as u32),
    )?;

    Ok(wifi)
}

fn connect(
    wifi: &mut EspWifi<'static>,
    sysloop: &EspSystemEventLoop,
    attempt: u32,
) -> Result<Ipv4Addr, InitError> {
    info!("Wifi connect attempt {}", attempt);
    wifi.connect()?;

    let wait = EspNetifWait::new::<EspNetif>(wifi.sta_netif(), sysloop)?;
    let connected = wait.wait_with_timeout(CONNECT_TIMEOUT, || {
        wifi.is_connected().unwrap_or(false)
            && wifi
                .sta_netif()
                .get_ip_info()
                .map(|ip_info| ip_info.ip != Ipv4Addr::new(0, 0, 0, 0))
                .unwrap_or(false)
    });

    if !connected {
        // leave the driver idle for the next attempt
        if let Err(err) = wifi.disconnect() {
            debug!("Wifi disconnect after failed attempt: {:?}", err);
        }
        return Err(InitError::NotConnected);
    }

    let ip = wifi.sta_netif().get_ip_info()?.ip;
    info!("IpEvent: DhcpIpAssigned: {:?}", ip);
    Ok(ip)
}

/// Hands the driver to a system event handler that reconnects whenever the
/// station drops off the access point. Keep the returned subscription alive.
pub fn keep_connected(
    sysloop: &EspSystemEventLoop,
    mut wifi: EspWifi<'static>,
) -> Result<EspSubscription<System>, InitError> {
    Ok(sysloop.subscribe(move |event: &WifiEvent| match event {
        WifiEvent::StaConnected => {
            info!("WifiEvent: STAConnected");
        }
        WifiEvent::StaDisconnected => {
            info!("WifiEvent: STADisconnected");
            if let Err(err) = wifi.connect() {
                warn!("Error calling wifi.connect in wifi reconnect {:?}", err);
            }
        }
        _ => {
            debug!("WifiEvent: other .....");
        }
    })?)
}

#[allow(unreachable_code)]
pub fn restart() -> ! {
    unsafe {
        esp_idf_sys::esp_restart();
    }
    unreachable!("esp_restart returned");
}
