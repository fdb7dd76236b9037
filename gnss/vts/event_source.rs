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

use crate::callback_queue::CallbackQueue;
use crate::callbacks::{GnssCallback, GnssCallbackLegacy};
use crate::hal::{ExceptionCode, HalResult, IGnss, IGnssLegacy};
use crate::types::{GnssLocation, GnssSvInfo, PositionModeOptions};
use std::sync::Arc;

/// Stream of locations and satellite status reports.
///
/// Version 1 services stream over the legacy interface, later versions over
/// AIDL; `connect()` picks the variant once, so scenarios never look at the
/// interface version to reach the queues.
pub trait EventSource: Send + Sync {
    fn set_position_mode(&self, options: &PositionModeOptions) -> HalResult<()>;
    fn start(&self) -> HalResult<()>;
    fn stop(&self) -> HalResult<()>;
    fn locations(&self) -> &CallbackQueue<GnssLocation>;
    fn sv_info_lists(&self) -> &CallbackQueue<Vec<GnssSvInfo>>;
}

/// Streams through `IGnss`, reusing the callback already registered on it
pub struct AidlEventSource {
    hal: Arc<dyn IGnss>,
    callback: Arc<GnssCallback>,
}

/// Streams through `IGnssLegacy`
pub struct LegacyEventSource {
    hal: Arc<dyn IGnssLegacy>,
    callback: Arc<GnssCallbackLegacy>,
}

/// Builds the event source matching the interface version of `gnss`.
/// `callback` must already be registered to `gnss`.
pub fn connect(
    gnss: &Arc<dyn IGnss>,
    legacy: Option<&Arc<dyn IGnssLegacy>>,
    callback: &Arc<GnssCallback>,
) -> HalResult<Box<dyn EventSource>> {
    if gnss.interface_version() > 1 {
        return Ok(Box::new(AidlEventSource::new(gnss.clone(), callback.clone())));
    }

    let Some(legacy) = legacy else {
        log::error!("Version 1 service without legacy streaming interface");
        return Err(ExceptionCode::NullPointer.into());
    };
    Ok(Box::new(LegacyEventSource::new(legacy.clone())?))
}

impl AidlEventSource {
    pub fn new(hal: Arc<dyn IGnss>, callback: Arc<GnssCallback>) -> Self {
        Self { hal, callback }
    }
}

impl EventSource for AidlEventSource {
    fn set_position_mode(&self, options: &PositionModeOptions) -> HalResult<()> {
        self.hal.set_position_mode(options)
    }

    fn start(&self) -> HalResult<()> {
        self.hal.start()
    }

    fn stop(&self) -> HalResult<()> {
        self.hal.stop()
    }

    fn locations(&self) -> &CallbackQueue<GnssLocation> {
        &self.callback.location_cbq
    }

    fn sv_info_lists(&self) -> &CallbackQueue<Vec<GnssSvInfo>> {
        &self.callback.sv_info_list_cbq
    }
}

impl LegacyEventSource {
    /// Registers a fresh callback to `hal`.
    pub fn new(hal: Arc<dyn IGnssLegacy>) -> HalResult<Self> {
        let callback = Arc::new(GnssCallbackLegacy::new());
        hal.set_callback(callback.clone())?;
        Ok(Self { hal, callback })
    }
}

impl EventSource for LegacyEventSource {
    fn set_position_mode(&self, options: &PositionModeOptions) -> HalResult<()> {
        self.hal.set_position_mode(options)
    }

    fn start(&self) -> HalResult<()> {
        self.hal.start()
    }

    fn stop(&self) -> HalResult<()> {
        self.hal.stop()
    }

    fn locations(&self) -> &CallbackQueue<GnssLocation> {
        &self.callback.location_cbq
    }

    fn sv_info_lists(&self) -> &CallbackQueue<Vec<GnssSvInfo>> {
        &self.callback.sv_info_list_cbq
    }
}
