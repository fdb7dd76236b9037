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

use crate::callbacks::GnssCallback;
use crate::checks::check_location;
use crate::config::VtsConfig;
use crate::error::{ensure, ScenarioError};
use crate::event_source::{self, EventSource};
use crate::hal::{HalResult, IGnss, IGnssConfiguration, IGnssLegacy};
use crate::types::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Handles on the service under test
#[derive(Clone)]
pub struct Connection {
    pub gnss: Arc<dyn IGnss>,
    /// Streaming interface of version 1 services
    pub legacy: Option<Arc<dyn IGnssLegacy>>,
}

/// State of one scenario, from set-up to tear-down.
///
/// Built fresh for every scenario, so that no queue content or capability
/// leaks from a scenario to the next.
pub struct ScenarioContext {
    gnss: Arc<dyn IGnss>,
    callback: Arc<GnssCallback>,
    source: Box<dyn EventSource>,
    capabilities: GnssCapabilities,
    config: VtsConfig,
}

impl ScenarioContext {
    /// Registers the callback, awaits the capabilities it is replayed, and
    /// makes sure location is off.
    pub fn set_up(connection: Connection, config: VtsConfig) -> Result<Self, ScenarioError> {
        let gnss = connection.gnss;
        let callback = Arc::new(GnssCallback::new());
        gnss.set_callback(callback.clone())?;

        let capabilities = callback.capabilities_cbq.retrieve(config.capabilities_timeout())?;
        ensure!(
            callback.capabilities_cbq.called_count() == 1,
            "Capabilities delivered {} times",
            callback.capabilities_cbq.called_count()
        );
        log::info!("Capabilities {:?}", capabilities);

        if gnss.interface_version() > 1 {
            let info = callback.info_cbq.retrieve(config.capabilities_timeout())?;
            log::info!("System info: {} ({})", info.name, info.year_of_hw);
        }

        let source = event_source::connect(&gnss, connection.legacy.as_ref(), &callback)?;
        let context = Self { gnss, callback, source, capabilities, config };
        context.stop_and_clear_locations()?;
        Ok(context)
    }

    /// Stops location, and closes the service.
    pub fn tear_down(self) -> Result<(), ScenarioError> {
        self.source.stop()?;

        let pending = self.source.locations().size() + self.source.sv_info_lists().size();
        if pending > 0 {
            log::warn!("{} events left unprocessed", pending);
        }
        self.source.locations().reset();
        self.source.sv_info_lists().reset();
        self.callback.capabilities_cbq.reset();
        self.callback.info_cbq.reset();

        self.gnss.close()?;
        Ok(())
    }

    pub fn gnss(&self) -> &Arc<dyn IGnss> {
        &self.gnss
    }

    pub fn source(&self) -> &dyn EventSource {
        self.source.as_ref()
    }

    pub fn capabilities(&self) -> GnssCapabilities {
        self.capabilities
    }

    pub fn interface_version(&self) -> i32 {
        self.gnss.interface_version()
    }

    pub fn config(&self) -> &VtsConfig {
        &self.config
    }

    pub fn set_position_mode(&self, min_interval_ms: i32, low_power_mode: bool) -> HalResult<()> {
        self.source.set_position_mode(&PositionModeOptions {
            mode: GnssPositionMode::Standalone,
            recurrence: GnssPositionRecurrence::Periodic,
            min_interval_ms,
            preferred_accuracy_meters: 0,
            preferred_time_ms: 0,
            low_power_mode,
        })
    }

    /// Starts location and checks the first fix, speed included.
    /// Clears the location queue first, so that a stale fix cannot satisfy the
    /// wait.
    pub fn start_and_check_first_location(
        &self,
        min_interval_ms: i32,
        low_power_mode: bool,
    ) -> Result<GnssLocation, ScenarioError> {
        let locations = self.source.locations();
        locations.reset();

        self.set_position_mode(min_interval_ms, low_power_mode)?;
        self.source.start()?;

        match locations.retrieve(self.config.first_location_timeout()) {
            Ok(location) => {
                check_location(&location, true, &self.config.location_limits())?;
                Ok(location)
            }
            Err(timed_out) => {
                log::error!("0 Gnss locations received - ensure sufficient signal and retry");
                Err(timed_out.into())
            }
        }
    }

    /// Starts location, and checks `count` fixes.
    pub fn start_and_check_locations(&self, count: usize) -> Result<(), ScenarioError> {
        let locations = self.source.locations();
        self.start_and_check_first_location(self.config.locations_min_interval_ms, false)?;

        for i in 1..count {
            let location = locations.retrieve(self.config.location_timeout_subsequent())?;
            log::debug!("Location {} of {} received", i + 1, count);
            check_location(&location, true, &self.config.location_limits())?;
        }
        Ok(())
    }

    /// Stops location, and drains the fixes still in flight.
    pub fn stop_and_clear_locations(&self) -> Result<(), ScenarioError> {
        self.source.stop()?;

        let locations = self.source.locations();
        let timeout = self.config.location_timeout_subsequent();
        while locations.retrieve(timeout).is_ok() {}
        Ok(())
    }

    /// Retrieves the status reports gathered while awaiting locations.
    ///
    /// One report less than `locations_to_await` is tolerated.
    pub fn observed_sv_info_lists(&self) -> Result<Vec<Vec<GnssSvInfo>>, ScenarioError> {
        let queue = self.source.sv_info_lists();
        let size = queue.size();
        ensure!(
            size + self.config.sv_observation_tolerance >= self.config.locations_to_await,
            "Observed {} GnssSvInfo, while awaiting {} Locations",
            size,
            self.config.locations_to_await
        );
        log::debug!(
            "Observed {} GnssSvInfo, while awaiting {} Locations ({} received)",
            size,
            self.config.locations_to_await,
            self.source.locations().called_count()
        );

        let lists = queue.retrieve_many(size, self.config.sv_info_list_timeout());
        ensure!(lists.len() == size, "Retrieved {} of {} GnssSvInfo", lists.len(), size);
        Ok(lists)
    }

    /// Awaits a few locations, and returns the first non-GPS constellation used
    /// in fix. GLONASS when none is used.
    pub fn start_location_and_get_non_gps_constellation(
        &self,
    ) -> Result<GnssConstellationType, ScenarioError> {
        self.start_and_check_locations(self.config.locations_to_await)?;

        let constellation = self
            .observed_sv_info_lists()?
            .iter()
            .flatten()
            .find(|sv| sv.used_in_fix() && is_known_non_gps(sv.constellation))
            .map(|sv| sv.constellation);

        Ok(constellation.unwrap_or_else(|| {
            log::info!("No non-GPS constellations found, constellation blocklist test less effective.");
            GnssConstellationType::Glonass
        }))
    }

    pub fn blocklist_configuration(&self) -> Result<Arc<dyn IGnssConfiguration>, ScenarioError> {
        self.gnss
            .get_extension_gnss_configuration()?
            .ok_or(ScenarioError::MissingExtension("IGnssConfiguration"))
    }
}

fn is_known_non_gps(constellation: GnssConstellationType) -> bool {
    !matches!(constellation, GnssConstellationType::Unknown | GnssConstellationType::Gps)
}

#[derive(Debug, Default)]
struct SignalCounts {
    observations: usize,
    max_cn0_dbhz: f32,
}

/// Elects the strongest non-GPS satellite used in fix in at least
/// `min_observations` of `lists`. The constellation of the returned source is
/// `Unknown` when no satellite qualifies.
pub fn find_strong_frequent_non_gps_source(
    lists: &[Vec<GnssSvInfo>],
    min_observations: usize,
) -> BlocklistedSource {
    let mut signal_counts: BTreeMap<BlocklistedSource, SignalCounts> = BTreeMap::new();
    for sv in lists.iter().flatten() {
        if !sv.used_in_fix() || !is_known_non_gps(sv.constellation) {
            continue;
        }
        let counts = signal_counts
            .entry(BlocklistedSource::satellite(sv.constellation, sv.svid))
            .or_default();
        counts.observations += 1;
        counts.max_cn0_dbhz = counts.max_cn0_dbhz.max(sv.cn0_dbhz);
    }

    let mut elected = BlocklistedSource::default();
    let mut max_cn0_dbhz = 0.0;
    let mut total_observations = 0;
    for (source, counts) in &signal_counts {
        total_observations += counts.observations;
        if counts.observations >= min_observations && counts.max_cn0_dbhz > max_cn0_dbhz {
            elected = *source;
            max_cn0_dbhz = counts.max_cn0_dbhz;
        }
    }

    log::debug!(
        "Among {} sources, {} observations, elected {:?} with {} dB-Hz",
        signal_counts.len(),
        total_observations,
        elected,
        max_cn0_dbhz
    );
    elected
}
