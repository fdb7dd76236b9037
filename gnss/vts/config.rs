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

use crate::checks::LocationLimits;
use crate::poller::PollerConfig;
use serde::Deserialize;
use std::time::Duration;

/// Tunables of the scenarios.
///
/// Defaults are the values the scenarios were calibrated with on devices
/// under real sky. Retry counts and tolerances absorb RF flakiness; they are
/// empirical.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VtsConfig {
    /// Wait for the first location after start
    pub first_location_timeout_ms: u64,
    /// Wait for each following location
    pub location_timeout_subsequent_ms: u64,
    /// Wait for capabilities at set-up
    pub capabilities_timeout_ms: u64,
    /// Minimum interval between fixes when a single fix is awaited
    pub min_interval_ms: i32,
    /// Minimum interval between fixes when several fixes are awaited
    pub locations_min_interval_ms: i32,
    /// Locations awaited per blocklist phase
    pub locations_to_await: usize,
    /// Status reports a satellite may be missing from and still be elected
    /// as strongest
    pub sv_observation_tolerance: usize,
    /// Attempts at observing reacquisition of a satellite once unblocklisted
    pub retries_to_unblocklist: usize,
    /// Wait for each satellite status report
    pub sv_info_list_timeout_ms: u64,
    /// Wait for the first measurement
    pub first_measurement_timeout_ms: u64,
    /// Measurements inspected looking for satellite PVT and correlation vectors
    pub measurement_events: usize,
    /// Measurements inspected with the interval option
    pub measurement_events_with_options: usize,
    /// Interval requested with the interval option
    pub measurement_interval_ms: i32,
    /// Measurements inspected for AGC
    pub agc_measurement_events: usize,
    /// Wait for power indication callbacks
    pub power_stats_timeout_ms: u64,
    /// Automotive devices are not required to provide `IGnssDebug`
    pub is_automotive: bool,
    pub supl_host: String,
    pub supl_port: i32,
    /// Packages granted non-framework location access
    pub proxy_apps: Vec<String>,
    pub max_speed_meters_per_sec: f64,
    pub max_horizontal_accuracy_meters: f64,
    pub max_vertical_accuracy_meters: f64,
    pub max_speed_accuracy_meters_per_second: f64,
}

impl Default for VtsConfig {
    fn default() -> Self {
        Self {
            first_location_timeout_ms: 75_000,
            location_timeout_subsequent_ms: 3_000,
            capabilities_timeout_ms: 2_000,
            min_interval_ms: 1000,
            locations_min_interval_ms: 500,
            locations_to_await: 3,
            sv_observation_tolerance: 1,
            retries_to_unblocklist: 10,
            sv_info_list_timeout_ms: 2_000,
            first_measurement_timeout_ms: 10_000,
            measurement_events: 75,
            measurement_events_with_options: 5,
            measurement_interval_ms: 2000,
            agc_measurement_events: 15,
            power_stats_timeout_ms: 2_000,
            is_automotive: false,
            supl_host: "supl.google.com".to_string(),
            supl_port: 7275,
            proxy_apps: vec!["com.example.ims".to_string(), "com.example.mdt".to_string()],
            max_speed_meters_per_sec: 5.0,
            max_horizontal_accuracy_meters: 250.0,
            max_vertical_accuracy_meters: 500.0,
            max_speed_accuracy_meters_per_second: 50.0,
        }
    }
}

impl VtsConfig {
    /// Parses a JSON configuration; missing keys keep their default.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn first_location_timeout(&self) -> Duration {
        Duration::from_millis(self.first_location_timeout_ms)
    }

    pub fn location_timeout_subsequent(&self) -> Duration {
        Duration::from_millis(self.location_timeout_subsequent_ms)
    }

    pub fn capabilities_timeout(&self) -> Duration {
        Duration::from_millis(self.capabilities_timeout_ms)
    }

    pub fn sv_info_list_timeout(&self) -> Duration {
        Duration::from_millis(self.sv_info_list_timeout_ms)
    }

    pub fn first_measurement_timeout(&self) -> Duration {
        Duration::from_millis(self.first_measurement_timeout_ms)
    }

    pub fn power_stats_timeout(&self) -> Duration {
        Duration::from_millis(self.power_stats_timeout_ms)
    }

    /// Minimum count of status reports the strongest satellite must appear in
    pub fn min_sv_observations(&self) -> usize {
        self.locations_to_await.saturating_sub(self.sv_observation_tolerance)
    }

    /// Retry budget of the reacquisition after clearing the blocklist
    pub fn unblocklist_poller(&self) -> PollerConfig {
        PollerConfig {
            max_attempts: self.retries_to_unblocklist,
            retrieve_timeout: self.sv_info_list_timeout(),
        }
    }

    pub fn location_limits(&self) -> LocationLimits {
        LocationLimits {
            max_speed_meters_per_sec: self.max_speed_meters_per_sec,
            max_horizontal_accuracy_meters: self.max_horizontal_accuracy_meters,
            max_vertical_accuracy_meters: self.max_vertical_accuracy_meters,
            max_speed_accuracy_meters_per_second: self.max_speed_accuracy_meters_per_second,
            ..Default::default()
        }
    }
}
