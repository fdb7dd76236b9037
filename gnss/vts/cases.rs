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

//! The conformance scenarios.
//!
//! A scenario fails on the first broken expectation; a missing capability
//! makes it pass as `Outcome::Skipped`.

use crate::callback_queue::CallbackQueue;
use crate::callbacks::{GnssMeasurementCallback, GnssPowerIndicationCallback, LoggingCallback};
use crate::checks::*;
use crate::config::VtsConfig;
use crate::error::{ensure, Outcome, ScenarioError};
use crate::hal::{HalResult, IGnssMeasurementInterface};
use crate::poller::ConvergencePoller;
use crate::scenario::{find_strong_frequent_non_gps_source, Connection, ScenarioContext};
use crate::types::*;
use std::sync::Arc;

/// A named scenario
pub struct Scenario {
    pub name: &'static str,
    pub run: fn(&ScenarioContext) -> Result<Outcome, ScenarioError>,
}

/// Result of a scenario run through `run_scenarios`
#[derive(Debug)]
pub struct ScenarioReport {
    pub name: &'static str,
    pub result: Result<Outcome, ScenarioError>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// All the scenarios, in execution order
pub static SCENARIOS: &[Scenario] = &[
    Scenario { name: "SetupTeardownCreateCleanup", run: setup_teardown_create_cleanup },
    Scenario { name: "TestPsdsExtension", run: psds_extension },
    Scenario {
        name: "TestGnssMeasurementExtensionAndSatellitePvt",
        run: measurement_extension_and_satellite_pvt,
    },
    Scenario { name: "TestCorrelationVector", run: correlation_vector },
    Scenario { name: "TestGnssPowerIndication", run: power_indication },
    Scenario { name: "BlocklistIndividualSatellites", run: blocklist_individual_satellites },
    Scenario {
        name: "BlocklistConstellationLocationOff",
        run: blocklist_constellation_location_off,
    },
    Scenario { name: "BlocklistConstellationLocationOn", run: blocklist_constellation_location_on },
    Scenario { name: "TestAllExtensions", run: all_extensions },
    Scenario { name: "TestAGnssExtension", run: agnss_extension },
    Scenario { name: "GnssDebugValuesSanityTest", run: debug_values_sanity },
    Scenario { name: "TestGnssVisibilityControlExtension", run: visibility_control_extension },
    Scenario {
        name: "TestGnssMeasurementSetCallbackWithOptions",
        run: measurement_set_callback_with_options,
    },
    Scenario { name: "TestGnssAgcInGnssMeasurement", run: agc_in_measurement },
];

/// Looks up a scenario by name
pub fn find_scenario(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|scenario| scenario.name == name)
}

/// Runs every scenario against a fresh connection from `connect`.
pub fn run_scenarios<F>(connect: F, config: &VtsConfig) -> Vec<ScenarioReport>
where
    F: Fn() -> HalResult<Connection>,
{
    SCENARIOS.iter().map(|scenario| run_scenario(scenario, &connect, config)).collect()
}

/// Sets up a context, runs `scenario`, and tears the context down.
pub fn run_scenario<F>(scenario: &Scenario, connect: F, config: &VtsConfig) -> ScenarioReport
where
    F: Fn() -> HalResult<Connection>,
{
    log::info!("[ RUN      ] {}", scenario.name);

    let result = connect().map_err(ScenarioError::from).and_then(|connection| {
        let context = ScenarioContext::set_up(connection, config.clone())?;
        let result = (scenario.run)(&context);
        let tear_down = context.tear_down();
        let outcome = result?;
        tear_down?;
        Ok(outcome)
    });

    match &result {
        Ok(Outcome::Passed) => log::info!("[       OK ] {}", scenario.name),
        Ok(Outcome::Skipped(reason)) => log::info!("[  SKIPPED ] {}: {}", scenario.name, reason),
        Err(e) => log::error!("[  FAILED  ] {}: {}", scenario.name, e),
    }
    ScenarioReport { name: scenario.name, result }
}

fn skipped(reason: &str) -> Result<Outcome, ScenarioError> {
    log::info!("Skipped: {}", reason);
    Ok(Outcome::Skipped(reason.to_string()))
}

/// Extension probed without being required: a failing getter counts as absent.
fn optional<T>(extension: HalResult<Option<T>>, name: &str) -> Option<T> {
    match extension {
        Ok(extension) => extension,
        Err(e) => {
            log::warn!("{} not available: {}", name, e);
            None
        }
    }
}

fn measurement_interface(
    ctx: &ScenarioContext,
) -> Result<Arc<dyn IGnssMeasurementInterface>, ScenarioError> {
    ctx.gnss()
        .get_extension_gnss_measurement()?
        .ok_or(ScenarioError::MissingExtension("IGnssMeasurementInterface"))
}

/// Retrieves the `index`th measurement since registration, and checks the
/// fields common to all the measurement scenarios.
fn retrieve_measurement(
    queue: &CallbackQueue<GnssData>,
    index: usize,
    config: &VtsConfig,
) -> Result<GnssData, ScenarioError> {
    let data = queue.retrieve(config.first_measurement_timeout())?;
    ensure!(
        queue.called_count() > index,
        "GnssData called count {} after {} retrievals",
        queue.called_count(),
        index + 1
    );
    ensure!(!data.measurements.is_empty(), "GnssData without measurement");
    check_measurement_clock_fields(&data)?;
    Ok(data)
}

/// Requests the service to be set up and torn down, and nothing else.
fn setup_teardown_create_cleanup(_ctx: &ScenarioContext) -> Result<Outcome, ScenarioError> {
    Ok(Outcome::Passed)
}

/// Injecting empty predicted data must be refused.
fn psds_extension(ctx: &ScenarioContext) -> Result<Outcome, ScenarioError> {
    let Some(psds) = optional(ctx.gnss().get_extension_psds(), "IGnssPsds") else {
        return skipped("IGnssPsds not provided");
    };

    ensure!(
        psds.inject_psds_data(PsdsType::LongTerm, &[]).is_err(),
        "Empty PSDS data accepted"
    );
    Ok(Outcome::Passed)
}

/// Checks the measurements and, when supported, waits for one carrying a
/// satellite PVT.
fn measurement_extension_and_satellite_pvt(
    ctx: &ScenarioContext,
) -> Result<Outcome, ScenarioError> {
    let pvt_supported = ctx.capabilities().contains(GnssCapabilities::SATELLITE_PVT);
    log::debug!("SatellitePvt supported: {}", pvt_supported);

    let measurement = measurement_interface(ctx)?;
    let callback = Arc::new(GnssMeasurementCallback::new());
    measurement.set_callback(callback.clone(), true, false)?;

    let mut pvt_found = false;
    for i in 0..ctx.config().measurement_events {
        if i > 0 && (!pvt_supported || pvt_found) {
            break;
        }
        let data = retrieve_measurement(&callback.gnss_data_cbq, i, ctx.config())?;

        for m in &data.measurements {
            check_measurement_flags(m)?;
            if pvt_supported && m.flags.contains(MeasurementFlags::HAS_SATELLITE_PVT) {
                log::debug!("Found a measurement with SatellitePvt");
                pvt_found = true;
                check_satellite_pvt(&m.satellite_pvt)?;
            }
        }
    }
    if pvt_supported {
        ensure!(pvt_found, "No SatellitePvt in {} measurements", ctx.config().measurement_events);
    }

    measurement.close()?;
    Ok(Outcome::Passed)
}

/// Waits for a measurement carrying correlation vectors, and checks them.
fn correlation_vector(ctx: &ScenarioContext) -> Result<Outcome, ScenarioError> {
    if !ctx.capabilities().contains(GnssCapabilities::CORRELATION_VECTOR) {
        return skipped("CORRELATION_VECTOR capability not supported");
    }

    let measurement = measurement_interface(ctx)?;
    let callback = Arc::new(GnssMeasurementCallback::new());
    measurement.set_callback(callback.clone(), true, true)?;

    let mut found = false;
    for i in 0..ctx.config().measurement_events {
        if found {
            break;
        }
        let data = retrieve_measurement(&callback.gnss_data_cbq, i, ctx.config())?;

        for m in &data.measurements {
            check_measurement_flags(m)?;
            if !m.flags.contains(MeasurementFlags::HAS_CORRELATION_VECTOR) {
                continue;
            }
            found = true;
            ensure!(!m.correlation_vectors.is_empty(), "HAS_CORRELATION_VECTOR without vector");
            for vector in &m.correlation_vectors {
                check_correlation_vector(vector)?;
            }
        }
    }
    ensure!(found, "No CorrelationVector in {} measurements", ctx.config().measurement_events);

    measurement.close()?;
    Ok(Outcome::Passed)
}

/// Requests power stats before and after a fix, and checks that the energies
/// covered by the capabilities increased.
fn power_indication(ctx: &ScenarioContext) -> Result<Outcome, ScenarioError> {
    let power = ctx
        .gnss()
        .get_extension_gnss_power_indication()?
        .ok_or(ScenarioError::MissingExtension("IGnssPowerIndication"))?;
    let callback = Arc::new(GnssPowerIndicationCallback::new());
    power.set_callback(callback.clone())?;

    let timeout = ctx.config().power_stats_timeout();
    callback.capabilities_cbq.retrieve(timeout)?;
    ensure!(
        callback.capabilities_cbq.called_count() == 1,
        "Power capabilities delivered {} times",
        callback.capabilities_cbq.called_count()
    );
    let capabilities = callback.last_capabilities();

    let stats_cbq = &callback.gnss_power_stats_cbq;
    stats_cbq.reset();
    power.request_gnss_power_stats();
    let stats1 = stats_cbq.retrieve(timeout)?;
    ensure!(stats_cbq.called_count() == 1, "{} power stats for 1 request", stats_cbq.called_count());

    ctx.start_and_check_first_location(ctx.config().min_interval_ms, false)?;

    power.request_gnss_power_stats();
    let stats2 = stats_cbq.retrieve(timeout)?;
    ensure!(stats_cbq.called_count() == 2, "{} power stats for 2 requests", stats_cbq.called_count());

    if capabilities.contains(PowerCapabilities::TOTAL) {
        ensure!(
            stats2.elapsed_realtime.timestamp_ns > stats1.elapsed_realtime.timestamp_ns,
            "Elapsed realtime did not increase"
        );
        ensure!(
            stats2.total_energy_milli_joule > stats1.total_energy_milli_joule,
            "Total energy did not increase"
        );
    }

    if capabilities
        .intersects(PowerCapabilities::SINGLEBAND_ACQUISITION | PowerCapabilities::MULTIBAND_ACQUISITION)
    {
        ensure!(
            stats2.singleband_acquisition_mode_energy_milli_joule
                > stats1.singleband_acquisition_mode_energy_milli_joule
                || stats2.multiband_acquisition_mode_energy_milli_joule
                    > stats1.multiband_acquisition_mode_energy_milli_joule,
            "Neither singleband nor multiband acquisition energy increased"
        );
    }

    if capabilities
        .intersects(PowerCapabilities::SINGLEBAND_TRACKING | PowerCapabilities::MULTIBAND_TRACKING)
    {
        ensure!(
            stats2.singleband_tracking_mode_energy_milli_joule
                > stats1.singleband_tracking_mode_energy_milli_joule
                || stats2.multiband_tracking_mode_energy_milli_joule
                    > stats1.multiband_tracking_mode_energy_milli_joule,
            "Neither singleband nor multiband tracking energy increased"
        );
    }

    ctx.stop_and_clear_locations()?;
    Ok(Outcome::Passed)
}

/// Checks that no satellite of `lists` covered by `sources` is used in fix.
fn ensure_not_used_in_fix(
    lists: &[Vec<GnssSvInfo>],
    sources: &[BlocklistedSource],
) -> Result<(), ScenarioError> {
    for sv in lists.iter().flatten().filter(|sv| sv.used_in_fix()) {
        for source in sources {
            ensure!(
                !sv.matches(source),
                "Blocklisted {:?} {} used in fix",
                sv.constellation,
                sv.svid
            );
        }
    }
    Ok(())
}

/// Blocklists the strongest non-GPS satellite, checks it is not used anymore,
/// then clears the blocklist and waits for the satellite to be used again.
fn blocklist_individual_satellites(ctx: &ScenarioContext) -> Result<Outcome, ScenarioError> {
    if !ctx.capabilities().contains(GnssCapabilities::SATELLITE_BLOCKLIST) {
        return skipped("SATELLITE_BLOCKLIST capability not supported");
    }
    let config = ctx.config();
    let sv_info_lists = ctx.source().sv_info_lists();

    ctx.start_and_check_locations(config.locations_to_await)?;
    let source = find_strong_frequent_non_gps_source(
        &ctx.observed_sv_info_lists()?,
        config.min_sv_observations(),
    );
    if source.constellation == GnssConstellationType::Unknown {
        log::info!("Cannot find a non-GPS satellite. Letting the test pass.");
        return Ok(Outcome::Passed);
    }

    // Stop locations, blocklist the common SV
    ctx.stop_and_clear_locations()?;
    let configuration = ctx.blocklist_configuration()?;
    configuration.set_blocklist(&[source])?;

    sv_info_lists.reset();
    ctx.start_and_check_locations(config.locations_to_await)?;
    ensure_not_used_in_fix(&ctx.observed_sv_info_lists()?, &[source])?;

    // Clear blocklist, and allow non-immediate reacquisition
    configuration.set_blocklist(&[])?;

    let poller = ConvergencePoller::new(sv_info_lists, config.unblocklist_poller());
    poller.await_condition::<ScenarioError, _, _>(
        "reacquisition of the unblocklisted satellite",
        |attempt| {
            ctx.stop_and_clear_locations()?;
            sv_info_lists.reset();
            ctx.start_and_check_locations(config.locations_to_await)?;

            let size = sv_info_lists.size();
            ensure!(
                size + config.sv_observation_tolerance >= config.locations_to_await,
                "Observed {} GnssSvInfo, while awaiting {} Locations",
                size,
                config.locations_to_await
            );
            log::debug!(
                "Clear blocklist, observed {} GnssSvInfo on attempt {}",
                size,
                attempt
            );
            Ok(size)
        },
        |list| list.iter().any(|sv| sv.used_in_fix() && sv.matches(&source)),
    )?;

    ctx.stop_and_clear_locations()?;
    Ok(Outcome::Passed)
}

/// Blocklists a whole non-GPS constellation, and IRNSS, and checks none of
/// their satellites is used in fix.
fn blocklist_constellation(
    ctx: &ScenarioContext,
    while_location_on: bool,
) -> Result<Outcome, ScenarioError> {
    if !ctx.capabilities().contains(GnssCapabilities::SATELLITE_BLOCKLIST) {
        return skipped("SATELLITE_BLOCKLIST capability not supported");
    }
    let config = ctx.config();

    let constellation = ctx.start_location_and_get_non_gps_constellation()?;
    // IRNSS is always blocklisted, to verify the value is supported
    let sources = [
        BlocklistedSource::constellation(constellation),
        BlocklistedSource::constellation(GnssConstellationType::Irnss),
    ];

    let configuration = ctx.blocklist_configuration()?;
    if while_location_on {
        configuration.set_blocklist(&sources)?;
        ctx.stop_and_clear_locations()?;
    } else {
        ctx.stop_and_clear_locations()?;
        configuration.set_blocklist(&sources)?;
    }

    ctx.source().sv_info_lists().reset();
    ctx.start_and_check_locations(config.locations_to_await)?;
    ensure_not_used_in_fix(&ctx.observed_sv_info_lists()?, &sources)?;

    ctx.stop_and_clear_locations()?;
    configuration.set_blocklist(&[])?;
    Ok(Outcome::Passed)
}

fn blocklist_constellation_location_off(ctx: &ScenarioContext) -> Result<Outcome, ScenarioError> {
    blocklist_constellation(ctx, false)
}

fn blocklist_constellation_location_on(ctx: &ScenarioContext) -> Result<Outcome, ScenarioError> {
    blocklist_constellation(ctx, true)
}

/// Exercises the batching, geofence and navigation message extensions that
/// are provided.
fn all_extensions(ctx: &ScenarioContext) -> Result<Outcome, ScenarioError> {
    let gnss = ctx.gnss();

    if let Some(batching) = optional(gnss.get_extension_gnss_batching(), "IGnssBatching") {
        batching.init(Arc::new(LoggingCallback))?;
        batching.cleanup()?;
    }

    if let Some(geofence) = optional(gnss.get_extension_gnss_geofence(), "IGnssGeofence") {
        geofence.set_callback(Arc::new(LoggingCallback))?;
    }

    if let Some(navigation_message) = optional(
        gnss.get_extension_gnss_navigation_message(),
        "IGnssNavigationMessageInterface",
    ) {
        navigation_message.set_callback(Arc::new(LoggingCallback))?;
        navigation_message.close()?;
    }

    Ok(Outcome::Passed)
}

fn agnss_extension(ctx: &ScenarioContext) -> Result<Outcome, ScenarioError> {
    if ctx.interface_version() == 1 {
        return skipped("IAGnss requires interface version 2");
    }
    let agnss =
        ctx.gnss().get_extension_agnss()?.ok_or(ScenarioError::MissingExtension("IAGnss"))?;

    agnss.set_callback(Arc::new(LoggingCallback))?;
    agnss.set_server(AGnssType::Supl, &ctx.config().supl_host, ctx.config().supl_port)?;
    Ok(Outcome::Passed)
}

fn debug_values_sanity(ctx: &ScenarioContext) -> Result<Outcome, ScenarioError> {
    if ctx.interface_version() == 1 {
        return skipped("IGnssDebug requires interface version 2");
    }
    let debug = ctx.gnss().get_extension_gnss_debug()?;
    if ctx.config().is_automotive {
        return skipped("IGnssDebug not required on automotive devices");
    }
    let debug = debug.ok_or(ScenarioError::MissingExtension("IGnssDebug"))?;

    check_debug_data(&debug.get_debug_data()?)?;
    Ok(Outcome::Passed)
}

fn visibility_control_extension(ctx: &ScenarioContext) -> Result<Outcome, ScenarioError> {
    if ctx.interface_version() == 1 {
        return skipped("IGnssVisibilityControl requires interface version 2");
    }
    let visibility_control = ctx
        .gnss()
        .get_extension_gnss_visibility_control()?
        .ok_or(ScenarioError::MissingExtension("IGnssVisibilityControl"))?;

    visibility_control.set_callback(Arc::new(LoggingCallback))?;
    visibility_control.enable_nfw_location_access(&ctx.config().proxy_apps)?;
    Ok(Outcome::Passed)
}

fn measurement_set_callback_with_options(
    ctx: &ScenarioContext,
) -> Result<Outcome, ScenarioError> {
    if ctx.interface_version() == 1 {
        return skipped("Measurement options require interface version 2");
    }

    let measurement = measurement_interface(ctx)?;
    let callback = Arc::new(GnssMeasurementCallback::new());
    let options =
        MeasurementOptions { interval_ms: ctx.config().measurement_interval_ms, ..Default::default() };
    measurement.set_callback_with_options(callback.clone(), &options)?;

    for i in 0..ctx.config().measurement_events_with_options {
        retrieve_measurement(&callback.gnss_data_cbq, i, ctx.config())?;
    }

    measurement.close()?;
    Ok(Outcome::Passed)
}

fn agc_in_measurement(ctx: &ScenarioContext) -> Result<Outcome, ScenarioError> {
    if ctx.interface_version() == 1 {
        return skipped("GnssAgc requires interface version 2");
    }

    let measurement = measurement_interface(ctx)?;
    let callback = Arc::new(GnssMeasurementCallback::new());
    measurement.set_callback(callback.clone(), false, false)?;

    for i in 0..ctx.config().agc_measurement_events {
        let data = retrieve_measurement(&callback.gnss_data_cbq, i, ctx.config())?;
        check_agcs(&data)?;
    }

    measurement.close()?;
    Ok(Outcome::Passed)
}
