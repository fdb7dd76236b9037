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

//! Interfaces of the GNSS service under test.
//!
//! These mirror the `android.hardware.gnss` AIDL interfaces (and the legacy
//! version 1 streaming surface); the proxies implementing them live on the
//! other side of the transport and are not part of this crate.
//! Extension getters return `Ok(None)` when the service does not provide the
//! extension.

use crate::types::*;
use std::sync::Arc;
use thiserror::Error;

/// Binder exception codes surfaced by a failing call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ExceptionCode {
    IllegalArgument,
    IllegalState,
    UnsupportedOperation,
    NullPointer,
    TransactionFailed,
}

/// Failure of a call into the service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// The call raised a binder exception
    #[error("binder exception {0:?}")]
    Exception(ExceptionCode),
    /// The service returned a service-specific error code
    #[error("service-specific error {0}")]
    ServiceSpecific(i32),
}

impl From<ExceptionCode> for HalError {
    fn from(code: ExceptionCode) -> Self {
        HalError::Exception(code)
    }
}

/// Result of a call into the service
pub type HalResult<T> = Result<T, HalError>;

/// Top level GNSS interface
pub trait IGnss: Send + Sync {
    /// Version of the AIDL interface implemented by the service
    fn interface_version(&self) -> i32;

    /// Registers the callback, and replays capabilities and system info into it.
    fn set_callback(&self, callback: Arc<dyn IGnssCallback>) -> HalResult<()>;
    /// Starts navigating
    fn start(&self) -> HalResult<()>;
    /// Stops navigating
    fn stop(&self) -> HalResult<()>;
    /// Closes the interface
    fn close(&self) -> HalResult<()>;
    /// Sets the scheduling of fixes
    fn set_position_mode(&self, options: &PositionModeOptions) -> HalResult<()>;

    fn get_extension_psds(&self) -> HalResult<Option<Arc<dyn IGnssPsds>>>;
    fn get_extension_gnss_configuration(&self) -> HalResult<Option<Arc<dyn IGnssConfiguration>>>;
    fn get_extension_gnss_measurement(
        &self,
    ) -> HalResult<Option<Arc<dyn IGnssMeasurementInterface>>>;
    fn get_extension_gnss_power_indication(
        &self,
    ) -> HalResult<Option<Arc<dyn IGnssPowerIndication>>>;
    fn get_extension_gnss_batching(&self) -> HalResult<Option<Arc<dyn IGnssBatching>>>;
    fn get_extension_gnss_geofence(&self) -> HalResult<Option<Arc<dyn IGnssGeofence>>>;
    fn get_extension_gnss_navigation_message(
        &self,
    ) -> HalResult<Option<Arc<dyn IGnssNavigationMessageInterface>>>;
    fn get_extension_agnss(&self) -> HalResult<Option<Arc<dyn IAGnss>>>;
    fn get_extension_gnss_debug(&self) -> HalResult<Option<Arc<dyn IGnssDebug>>>;
    fn get_extension_gnss_visibility_control(
        &self,
    ) -> HalResult<Option<Arc<dyn IGnssVisibilityControl>>>;
}

/// Streaming surface of a version 1 service, still served over the legacy
/// interface.
pub trait IGnssLegacy: Send + Sync {
    fn set_callback(&self, callback: Arc<dyn IGnssCallbackLegacy>) -> HalResult<()>;
    fn start(&self) -> HalResult<()>;
    fn stop(&self) -> HalResult<()>;
    fn set_position_mode(&self, options: &PositionModeOptions) -> HalResult<()>;
}

/// Callbacks of `IGnss`
pub trait IGnssCallback: Send + Sync {
    fn gnss_set_capabilities_cb(&self, capabilities: GnssCapabilities);
    fn gnss_set_system_info_cb(&self, info: GnssSystemInfo);
    fn gnss_location_cb(&self, location: GnssLocation);
    fn gnss_sv_status_cb(&self, sv_info_list: Vec<GnssSvInfo>);
}

/// Callbacks of `IGnssLegacy`
pub trait IGnssCallbackLegacy: Send + Sync {
    fn gnss_location_cb(&self, location: GnssLocation);
    fn gnss_sv_status_cb(&self, sv_info_list: Vec<LegacySvInfo>);
}

/// Predicted satellite data injection
pub trait IGnssPsds: Send + Sync {
    fn inject_psds_data(&self, psds_type: PsdsType, data: &[u8]) -> HalResult<()>;
}

/// Satellite configuration
pub trait IGnssConfiguration: Send + Sync {
    /// Replaces the whole blocklist; an empty list clears it.
    fn set_blocklist(&self, blocklist: &[BlocklistedSource]) -> HalResult<()>;
}

/// Raw measurements
pub trait IGnssMeasurementInterface: Send + Sync {
    fn set_callback(
        &self,
        callback: Arc<dyn IGnssMeasurementCallback>,
        enable_full_tracking: bool,
        enable_corr_vec_outputs: bool,
    ) -> HalResult<()>;
    fn set_callback_with_options(
        &self,
        callback: Arc<dyn IGnssMeasurementCallback>,
        options: &MeasurementOptions,
    ) -> HalResult<()>;
    fn close(&self) -> HalResult<()>;
}

pub trait IGnssMeasurementCallback: Send + Sync {
    fn gnss_measurement_cb(&self, data: GnssData);
}

/// Power statistics
pub trait IGnssPowerIndication: Send + Sync {
    fn set_callback(&self, callback: Arc<dyn IGnssPowerIndicationCallback>) -> HalResult<()>;
    /// Asks for a `gnss_power_stats_cb`; the stats arrive asynchronously.
    fn request_gnss_power_stats(&self);
}

pub trait IGnssPowerIndicationCallback: Send + Sync {
    fn set_capabilities_cb(&self, capabilities: PowerCapabilities);
    fn gnss_power_stats_cb(&self, stats: GnssPowerStats);
}

pub trait IGnssBatching: Send + Sync {
    fn init(&self, callback: Arc<dyn IGnssBatchingCallback>) -> HalResult<()>;
    fn cleanup(&self) -> HalResult<()>;
}

pub trait IGnssBatchingCallback: Send + Sync {
    fn gnss_location_batch_cb(&self, locations: Vec<GnssLocation>);
}

pub trait IGnssGeofence: Send + Sync {
    fn set_callback(&self, callback: Arc<dyn IGnssGeofenceCallback>) -> HalResult<()>;
}

pub trait IGnssGeofenceCallback: Send + Sync {
    fn gnss_geofence_status_cb(&self, availability: i32, last_location: GnssLocation);
}

pub trait IGnssNavigationMessageInterface: Send + Sync {
    fn set_callback(&self, callback: Arc<dyn IGnssNavigationMessageCallback>) -> HalResult<()>;
    fn close(&self) -> HalResult<()>;
}

pub trait IGnssNavigationMessageCallback: Send + Sync {
    fn gnss_navigation_message_cb(&self, svid: i32, message: Vec<u8>);
}

/// Assisted GNSS
pub trait IAGnss: Send + Sync {
    fn set_callback(&self, callback: Arc<dyn IAGnssCallback>) -> HalResult<()>;
    fn set_server(&self, agnss_type: AGnssType, hostname: &str, port: i32) -> HalResult<()>;
}

pub trait IAGnssCallback: Send + Sync {
    fn agnss_status_cb(&self, agnss_type: AGnssType, status: i32);
}

/// Debug snapshot
pub trait IGnssDebug: Send + Sync {
    fn get_debug_data(&self) -> HalResult<DebugData>;
}

/// Non-framework location access control
pub trait IGnssVisibilityControl: Send + Sync {
    fn set_callback(&self, callback: Arc<dyn IGnssVisibilityControlCallback>) -> HalResult<()>;
    fn enable_nfw_location_access(&self, proxy_apps: &[String]) -> HalResult<()>;
}

pub trait IGnssVisibilityControlCallback: Send + Sync {
    fn nfw_notify_cb(&self, proxy_app_package_name: &str, in_emergency_mode: bool);
    fn is_in_emergency_session(&self) -> bool;
}
