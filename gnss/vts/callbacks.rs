// Copyright 2024, The Android Open Source Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Callbacks registered to the service under test.
//!
//! Each callback stores what it receives in a `CallbackQueue`; scenarios
//! consume from the queues.

use crate::callback_queue::CallbackQueue;
use crate::hal::*;
use crate::types::*;
use std::sync::Mutex;

/// Callback of `IGnss`
pub struct GnssCallback {
    pub capabilities_cbq: CallbackQueue<GnssCapabilities>,
    pub info_cbq: CallbackQueue<GnssSystemInfo>,
    pub location_cbq: CallbackQueue<GnssLocation>,
    pub sv_info_list_cbq: CallbackQueue<Vec<GnssSvInfo>>,
}

impl GnssCallback {
    pub fn new() -> Self {
        Self {
            capabilities_cbq: CallbackQueue::new("capabilities"),
            info_cbq: CallbackQueue::new("system_info"),
            location_cbq: CallbackQueue::new("location"),
            sv_info_list_cbq: CallbackQueue::new("sv_info"),
        }
    }
}

impl Default for GnssCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl IGnssCallback for GnssCallback {
    fn gnss_set_capabilities_cb(&self, capabilities: GnssCapabilities) {
        log::info!("Capabilities received {:?}", capabilities);
        self.capabilities_cbq.store(capabilities);
    }

    fn gnss_set_system_info_cb(&self, info: GnssSystemInfo) {
        log::info!("Info received, year {}, name {}", info.year_of_hw, info.name);
        self.info_cbq.store(info);
    }

    fn gnss_location_cb(&self, location: GnssLocation) {
        log::debug!(
            "Location received: lat {}, long {}",
            location.latitude_degrees,
            location.longitude_degrees
        );
        self.location_cbq.store(location);
    }

    fn gnss_sv_status_cb(&self, sv_info_list: Vec<GnssSvInfo>) {
        log::debug!("SvStatus received with {} satellites", sv_info_list.len());
        self.sv_info_list_cbq.store(sv_info_list);
    }
}

/// Callback of `IGnssLegacy`, normalizing satellite records to `GnssSvInfo`
pub struct GnssCallbackLegacy {
    pub location_cbq: CallbackQueue<GnssLocation>,
    pub sv_info_list_cbq: CallbackQueue<Vec<GnssSvInfo>>,
}

impl GnssCallbackLegacy {
    pub fn new() -> Self {
        Self {
            location_cbq: CallbackQueue::new("location"),
            sv_info_list_cbq: CallbackQueue::new("sv_info"),
        }
    }
}

impl Default for GnssCallbackLegacy {
    fn default() -> Self {
        Self::new()
    }
}

impl IGnssCallbackLegacy for GnssCallbackLegacy {
    fn gnss_location_cb(&self, location: GnssLocation) {
        log::debug!(
            "Location received: lat {}, long {}",
            location.latitude_degrees,
            location.longitude_degrees
        );
        self.location_cbq.store(location);
    }

    fn gnss_sv_status_cb(&self, sv_info_list: Vec<LegacySvInfo>) {
        log::debug!("SvStatus received with {} satellites", sv_info_list.len());
        self.sv_info_list_cbq.store(sv_info_list.iter().map(GnssSvInfo::from).collect());
    }
}

/// Callback of `IGnssMeasurementInterface`
pub struct GnssMeasurementCallback {
    pub gnss_data_cbq: CallbackQueue<GnssData>,
}

impl GnssMeasurementCallback {
    pub fn new() -> Self {
        Self { gnss_data_cbq: CallbackQueue::new("gnss_data") }
    }
}

impl Default for GnssMeasurementCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl IGnssMeasurementCallback for GnssMeasurementCallback {
    fn gnss_measurement_cb(&self, data: GnssData) {
        log::debug!("GnssData received with {} measurements", data.measurements.len());
        self.gnss_data_cbq.store(data);
    }
}

/// Callback of `IGnssPowerIndication`
pub struct GnssPowerIndicationCallback {
    pub capabilities_cbq: CallbackQueue<PowerCapabilities>,
    pub gnss_power_stats_cbq: CallbackQueue<GnssPowerStats>,
    last_capabilities: Mutex<PowerCapabilities>,
}

impl GnssPowerIndicationCallback {
    pub fn new() -> Self {
        Self {
            capabilities_cbq: CallbackQueue::new("power_capabilities"),
            gnss_power_stats_cbq: CallbackQueue::new("power_stats"),
            last_capabilities: Mutex::new(PowerCapabilities::empty()),
        }
    }

    /// Capabilities of the last `set_capabilities_cb`
    pub fn last_capabilities(&self) -> PowerCapabilities {
        *self.last_capabilities.lock().unwrap()
    }
}

impl Default for GnssPowerIndicationCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl IGnssPowerIndicationCallback for GnssPowerIndicationCallback {
    fn set_capabilities_cb(&self, capabilities: PowerCapabilities) {
        log::info!("Power capabilities received {:?}", capabilities);
        *self.last_capabilities.lock().unwrap() = capabilities;
        self.capabilities_cbq.store(capabilities);
    }

    fn gnss_power_stats_cb(&self, stats: GnssPowerStats) {
        log::info!("GnssPowerStats received, total {} mJ", stats.total_energy_milli_joule);
        self.gnss_power_stats_cbq.store(stats);
    }
}

/// Callback of the extensions whose deliveries are not inspected
#[derive(Default)]
pub(crate) struct LoggingCallback;

impl IGnssBatchingCallback for LoggingCallback {
    fn gnss_location_batch_cb(&self, locations: Vec<GnssLocation>) {
        log::debug!("Batch of {} locations received", locations.len());
    }
}

impl IGnssGeofenceCallback for LoggingCallback {
    fn gnss_geofence_status_cb(&self, availability: i32, _last_location: GnssLocation) {
        log::debug!("Geofence status received, availability {}", availability);
    }
}

impl IGnssNavigationMessageCallback for LoggingCallback {
    fn gnss_navigation_message_cb(&self, svid: i32, message: Vec<u8>) {
        log::debug!("Navigation message of {} bytes received for svid {}", message.len(), svid);
    }
}

impl IAGnssCallback for LoggingCallback {
    fn agnss_status_cb(&self, agnss_type: AGnssType, status: i32) {
        log::debug!("AGnss status {} received for {:?}", status, agnss_type);
    }
}

impl IGnssVisibilityControlCallback for LoggingCallback {
    fn nfw_notify_cb(&self, proxy_app_package_name: &str, in_emergency_mode: bool) {
        log::debug!(
            "NFW notification for {} (emergency: {})",
            proxy_app_package_name,
            in_emergency_mode
        );
    }

    fn is_in_emergency_session(&self) -> bool {
        false
    }
}
