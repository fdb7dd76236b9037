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

use crate::*;
use num_traits::ToPrimitive;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const EPOCH: Duration = Duration::from_millis(5);

/// Thread calling `tick` every epoch, until dropped
struct Ticker {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Ticker {
    fn start(mut tick: impl FnMut() + Send + 'static) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let handle = {
            let running = running.clone();
            thread::spawn(move || {
                while running.load(Ordering::SeqCst) {
                    tick();
                    thread::sleep(EPOCH);
                }
            })
        };
        Self { running, handle: Some(handle) }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.join().expect("End of ticker");
        }
    }
}

/// Satellites in view, and the effect of the blocklist on them
struct Sky {
    satellites: Vec<GnssSvInfo>,
    blocklist: Vec<BlocklistedSource>,
    /// Sources removed from the blocklist, with the epochs left before reuse
    reacquiring: Vec<(BlocklistedSource, usize)>,
    reacquisition_epochs: usize,
    ignores_blocklist: bool,
}

impl Sky {
    fn epoch(&mut self) -> Vec<GnssSvInfo> {
        let list = self
            .satellites
            .iter()
            .map(|sv| {
                let blocked = self.blocklist.iter().any(|source| sv.matches(source))
                    || self.reacquiring.iter().any(|(source, left)| *left > 0 && sv.matches(source));
                let mut sv = sv.clone();
                if !blocked || self.ignores_blocklist {
                    sv.sv_flag |= SvFlags::USED_IN_FIX;
                }
                sv
            })
            .collect();

        for (_, left) in &mut self.reacquiring {
            *left = left.saturating_sub(1);
        }
        list
    }

    fn set_blocklist(&mut self, blocklist: &[BlocklistedSource]) {
        for source in &self.blocklist {
            if !blocklist.contains(source) {
                self.reacquiring.push((*source, self.reacquisition_epochs));
            }
        }
        self.blocklist = blocklist.to_vec();
    }
}

#[derive(Clone)]
enum Sink {
    Aidl(Arc<dyn IGnssCallback>),
    Legacy(Arc<dyn IGnssCallbackLegacy>),
}

impl Sink {
    fn deliver(&self, sv_info_list: Vec<GnssSvInfo>, location: GnssLocation) {
        match self {
            Sink::Aidl(callback) => {
                callback.gnss_sv_status_cb(sv_info_list);
                callback.gnss_location_cb(location);
            }
            Sink::Legacy(callback) => {
                callback.gnss_sv_status_cb(sv_info_list.iter().map(legacy_sv_info).collect());
                callback.gnss_location_cb(location);
            }
        }
    }
}

fn legacy_sv_info(sv: &GnssSvInfo) -> LegacySvInfo {
    LegacySvInfo {
        v2_0: LegacySvInfoV2_0 {
            v1_0: LegacySvInfoV1_0 {
                svid: sv.svid as i16,
                c_n0_dbhz: sv.cn0_dbhz,
                elevation_degrees: sv.elevation_degrees,
                azimuth_degrees: sv.azimuth_degrees,
                carrier_frequency_hz: sv.carrier_frequency_hz as f32,
                sv_flag: sv.sv_flag.bits() as u8,
            },
            constellation: sv.constellation.to_u8().unwrap_or(0),
        },
        baseband_c_n0_dbhz: sv.baseband_cn0_dbhz.into(),
    }
}

fn sv(constellation: GnssConstellationType, svid: i32, cn0_dbhz: f32) -> GnssSvInfo {
    GnssSvInfo {
        svid,
        constellation,
        cn0_dbhz,
        baseband_cn0_dbhz: cn0_dbhz - 3.0,
        elevation_degrees: 45.0,
        azimuth_degrees: 90.0,
        carrier_frequency_hz: 1_575_420_000,
        sv_flag: SvFlags::HAS_EPHEMERIS_DATA | SvFlags::HAS_ALMANAC_DATA,
    }
}

fn sky_in_view() -> Vec<GnssSvInfo> {
    use GnssConstellationType::*;
    vec![
        sv(Gps, 1, 45.0),
        sv(Galileo, 11, 41.0),
        sv(Glonass, 8, 44.0),
        sv(Glonass, 3, 38.0),
        sv(Beidou, 20, 30.0),
    ]
}

fn fix() -> GnssLocation {
    GnssLocation {
        flags: LocationFlags::all(),
        latitude_degrees: 37.42,
        longitude_degrees: -122.08,
        altitude_meters: 10.0,
        speed_meters_per_sec: 0.0,
        bearing_degrees: 0.0,
        horizontal_accuracy_meters: 5.0,
        vertical_accuracy_meters: 8.0,
        speed_accuracy_meters_per_second: 0.5,
        bearing_accuracy_degrees: 20.0,
        timestamp_millis: 1_700_000_000_000,
        elapsed_realtime: ElapsedRealtime::default(),
    }
}

fn measurement_data() -> GnssData {
    GnssData {
        measurements: vec![GnssMeasurement {
            flags: MeasurementFlags::HAS_SNR
                | MeasurementFlags::HAS_CARRIER_FREQUENCY
                | MeasurementFlags::HAS_SATELLITE_PVT
                | MeasurementFlags::HAS_CORRELATION_VECTOR,
            svid: 3,
            constellation: GnssConstellationType::Glonass,
            antenna_cn0_dbhz: 38.0,
            carrier_frequency_hz: 1.602e9,
            satellite_pvt: SatellitePvt {
                flags: SatellitePvtFlags::all(),
                sat_pos_ecef: SatellitePositionEcef {
                    pos_x_meters: 10_442_263.2,
                    pos_y_meters: -19_870_912.1,
                    pos_z_meters: 14_000_400.4,
                    ure_meters: 1.0,
                },
                sat_vel_ecef: SatelliteVelocityEcef {
                    vel_x_mps: -478.0,
                    vel_y_mps: -2231.0,
                    vel_z_mps: 2553.0,
                    ure_rate_mps: 0.1,
                },
                sat_clock_info: SatelliteClockInfo {
                    sat_hardware_code_bias_meters: 1.3,
                    sat_time_correction_meters: 5000.0,
                    sat_clk_drift_mps: 0.5,
                },
                iono_delay_meters: 4.5,
                tropo_delay_meters: 2.2,
            },
            correlation_vectors: vec![CorrelationVector {
                frequency_offset_mps: 10.0,
                sampling_width_m: 30.0,
                sampling_start_m: -150.0,
                magnitude: vec![0, 5000, 30000, 5000, 0],
            }],
        }],
        clock: GnssClock {
            gnss_clock_flags: ClockFlags::HAS_FULL_BIAS | ClockFlags::HAS_BIAS,
            time_ns: 1_000_000,
            ..Default::default()
        },
        elapsed_realtime: ElapsedRealtime {
            flags: ElapsedRealtimeFlags::all(),
            timestamp_ns: 1_000_000_000,
            time_uncertainty_ns: 1000.0,
        },
        gnss_agcs: Some(vec![Some(GnssAgc {
            agc_level_db: 3.0,
            constellation: GnssConstellationType::Gps,
            carrier_frequency_hz: 1_575_420_000,
        })]),
    }
}

fn debug_data() -> DebugData {
    DebugData {
        position: PositionDebug {
            valid: true,
            latitude_degrees: 37.42,
            longitude_degrees: -122.08,
            altitude_meters: 10.0,
            speed_meters_per_sec: 0.0,
            bearing_degrees: 0.0,
            horizontal_accuracy_meters: 5.0,
            vertical_accuracy_meters: 8.0,
            speed_accuracy_meters_per_second: 0.5,
            bearing_accuracy_degrees: 20.0,
            age_seconds: 1.0,
        },
        time: TimeDebug {
            time_estimate_ms: 1_700_000_000_000,
            time_uncertainty_ns: 1000.0,
            frequency_uncertainty_ns_per_sec: 800.0,
        },
        satellite_data_array: vec![],
    }
}

#[derive(Clone)]
struct FakeOptions {
    version: i32,
    capabilities: GnssCapabilities,
    satellites: Vec<GnssSvInfo>,
    reacquisition_epochs: usize,
    ignores_blocklist: bool,
    power_capabilities: PowerCapabilities,
    stale_power_stats: bool,
    location: GnssLocation,
    measurement: GnssData,
    debug: DebugData,
    provides_extensions: bool,
}

impl Default for FakeOptions {
    fn default() -> Self {
        Self {
            version: 2,
            capabilities: GnssCapabilities::SCHEDULING
                | GnssCapabilities::MEASUREMENTS
                | GnssCapabilities::SATELLITE_BLOCKLIST
                | GnssCapabilities::CORRELATION_VECTOR
                | GnssCapabilities::SATELLITE_PVT,
            satellites: sky_in_view(),
            reacquisition_epochs: 8,
            ignores_blocklist: false,
            power_capabilities: PowerCapabilities::TOTAL
                | PowerCapabilities::SINGLEBAND_TRACKING
                | PowerCapabilities::SINGLEBAND_ACQUISITION,
            stale_power_stats: false,
            location: fix(),
            measurement: measurement_data(),
            debug: debug_data(),
            provides_extensions: true,
        }
    }
}

struct FakeConfiguration {
    sky: Arc<Mutex<Sky>>,
    history: Mutex<Vec<Vec<BlocklistedSource>>>,
}

impl IGnssConfiguration for FakeConfiguration {
    fn set_blocklist(&self, blocklist: &[BlocklistedSource]) -> HalResult<()> {
        self.sky.lock().unwrap().set_blocklist(blocklist);
        self.history.lock().unwrap().push(blocklist.to_vec());
        Ok(())
    }
}

struct FakeMeasurement {
    data: GnssData,
    ticker: Mutex<Option<Ticker>>,
    intervals: Mutex<Vec<i32>>,
}

impl FakeMeasurement {
    fn stream(&self, callback: Arc<dyn IGnssMeasurementCallback>) {
        let data = self.data.clone();
        let mut ticker = self.ticker.lock().unwrap();
        *ticker = None;
        *ticker = Some(Ticker::start(move || callback.gnss_measurement_cb(data.clone())));
    }
}

impl IGnssMeasurementInterface for FakeMeasurement {
    fn set_callback(
        &self,
        callback: Arc<dyn IGnssMeasurementCallback>,
        _enable_full_tracking: bool,
        _enable_corr_vec_outputs: bool,
    ) -> HalResult<()> {
        self.stream(callback);
        Ok(())
    }

    fn set_callback_with_options(
        &self,
        callback: Arc<dyn IGnssMeasurementCallback>,
        options: &MeasurementOptions,
    ) -> HalResult<()> {
        self.intervals.lock().unwrap().push(options.interval_ms);
        self.stream(callback);
        Ok(())
    }

    fn close(&self) -> HalResult<()> {
        *self.ticker.lock().unwrap() = None;
        Ok(())
    }
}

struct FakePowerIndication {
    capabilities: PowerCapabilities,
    stale: bool,
    callback: Mutex<Option<Arc<dyn IGnssPowerIndicationCallback>>>,
    requests: AtomicUsize,
}

impl IGnssPowerIndication for FakePowerIndication {
    fn set_callback(&self, callback: Arc<dyn IGnssPowerIndicationCallback>) -> HalResult<()> {
        callback.set_capabilities_cb(self.capabilities);
        *self.callback.lock().unwrap() = Some(callback);
        Ok(())
    }

    fn request_gnss_power_stats(&self) {
        let Some(callback) = self.callback.lock().unwrap().clone() else {
            return;
        };
        let n = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        let energy = if self.stale { 100.0 } else { 100.0 * n as f64 };
        let stats = GnssPowerStats {
            elapsed_realtime: ElapsedRealtime {
                flags: ElapsedRealtimeFlags::HAS_TIMESTAMP_NS,
                timestamp_ns: 1_000_000_000 * n as i64,
                time_uncertainty_ns: 0.0,
            },
            total_energy_milli_joule: energy,
            singleband_tracking_mode_energy_milli_joule: energy / 2.0,
            multiband_tracking_mode_energy_milli_joule: 0.0,
            singleband_acquisition_mode_energy_milli_joule: energy / 4.0,
            multiband_acquisition_mode_energy_milli_joule: 0.0,
            other_modes_energy_milli_joule: vec![],
        };
        thread::spawn(move || callback.gnss_power_stats_cb(stats));
    }
}

struct FakeDebug {
    data: DebugData,
}

impl IGnssDebug for FakeDebug {
    fn get_debug_data(&self) -> HalResult<DebugData> {
        Ok(self.data.clone())
    }
}

/// Extensions whose calls are only recorded
#[derive(Default)]
struct FakeExtensions {
    calls: Mutex<Vec<String>>,
}

impl FakeExtensions {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl IGnssPsds for FakeExtensions {
    fn inject_psds_data(&self, psds_type: PsdsType, data: &[u8]) -> HalResult<()> {
        self.record(format!("inject_psds_data {:?}", psds_type));
        if data.is_empty() {
            return Err(ExceptionCode::IllegalArgument.into());
        }
        Ok(())
    }
}

impl IGnssBatching for FakeExtensions {
    fn init(&self, _callback: Arc<dyn IGnssBatchingCallback>) -> HalResult<()> {
        self.record("batching init");
        Ok(())
    }

    fn cleanup(&self) -> HalResult<()> {
        self.record("batching cleanup");
        Ok(())
    }
}

impl IGnssGeofence for FakeExtensions {
    fn set_callback(&self, _callback: Arc<dyn IGnssGeofenceCallback>) -> HalResult<()> {
        self.record("geofence set_callback");
        Ok(())
    }
}

impl IGnssNavigationMessageInterface for FakeExtensions {
    fn set_callback(&self, callback: Arc<dyn IGnssNavigationMessageCallback>) -> HalResult<()> {
        self.record("navigation_message set_callback");
        callback.gnss_navigation_message_cb(3, vec![0x8b, 0x00]);
        Ok(())
    }

    fn close(&self) -> HalResult<()> {
        self.record("navigation_message close");
        Ok(())
    }
}

impl IAGnss for FakeExtensions {
    fn set_callback(&self, _callback: Arc<dyn IAGnssCallback>) -> HalResult<()> {
        self.record("agnss set_callback");
        Ok(())
    }

    fn set_server(&self, agnss_type: AGnssType, hostname: &str, port: i32) -> HalResult<()> {
        self.record(format!("agnss set_server {:?} {}:{}", agnss_type, hostname, port));
        Ok(())
    }
}

impl IGnssVisibilityControl for FakeExtensions {
    fn set_callback(&self, _callback: Arc<dyn IGnssVisibilityControlCallback>) -> HalResult<()> {
        self.record("visibility_control set_callback");
        Ok(())
    }

    fn enable_nfw_location_access(&self, proxy_apps: &[String]) -> HalResult<()> {
        self.record(format!("enable_nfw_location_access {}", proxy_apps.join(",")));
        Ok(())
    }
}

/// Service producing a fix and a status report every epoch while started
struct FakeGnss {
    version: i32,
    capabilities: GnssCapabilities,
    callback: Mutex<Option<Arc<dyn IGnssCallback>>>,
    legacy_callback: Mutex<Option<Arc<dyn IGnssCallbackLegacy>>>,
    sky: Arc<Mutex<Sky>>,
    location: GnssLocation,
    ticker: Mutex<Option<Ticker>>,
    starts: AtomicUsize,
    closes: AtomicUsize,
    position_modes: Mutex<Vec<PositionModeOptions>>,
    configuration: Arc<FakeConfiguration>,
    measurement: Arc<FakeMeasurement>,
    power: Arc<FakePowerIndication>,
    debug: Arc<FakeDebug>,
    extensions: Option<Arc<FakeExtensions>>,
}

impl FakeGnss {
    fn new(options: FakeOptions) -> Arc<Self> {
        let sky = Arc::new(Mutex::new(Sky {
            satellites: options.satellites,
            blocklist: vec![],
            reacquiring: vec![],
            reacquisition_epochs: options.reacquisition_epochs,
            ignores_blocklist: options.ignores_blocklist,
        }));
        Arc::new(Self {
            version: options.version,
            capabilities: options.capabilities,
            callback: Mutex::new(None),
            legacy_callback: Mutex::new(None),
            sky: sky.clone(),
            location: options.location,
            ticker: Mutex::new(None),
            starts: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            position_modes: Mutex::new(vec![]),
            configuration: Arc::new(FakeConfiguration { sky, history: Mutex::new(vec![]) }),
            measurement: Arc::new(FakeMeasurement {
                data: options.measurement,
                ticker: Mutex::new(None),
                intervals: Mutex::new(vec![]),
            }),
            power: Arc::new(FakePowerIndication {
                capabilities: options.power_capabilities,
                stale: options.stale_power_stats,
                callback: Mutex::new(None),
                requests: AtomicUsize::new(0),
            }),
            debug: Arc::new(FakeDebug { data: options.debug }),
            extensions: options.provides_extensions.then(Default::default),
        })
    }

    fn start_streaming(&self, sink: Option<Sink>) -> HalResult<()> {
        let Some(sink) = sink else {
            return Err(ExceptionCode::IllegalState.into());
        };
        let mut ticker = self.ticker.lock().unwrap();
        if ticker.is_none() {
            let sky = self.sky.clone();
            let location = self.location.clone();
            self.starts.fetch_add(1, Ordering::SeqCst);
            *ticker = Some(Ticker::start(move || {
                let sv_info_list = sky.lock().unwrap().epoch();
                sink.deliver(sv_info_list, location.clone());
            }));
        }
        Ok(())
    }

    fn stop_streaming(&self) {
        let ticker = self.ticker.lock().unwrap().take();
        drop(ticker);
    }

    fn is_streaming(&self) -> bool {
        self.ticker.lock().unwrap().is_some()
    }

    fn blocklist_history(&self) -> Vec<Vec<BlocklistedSource>> {
        self.configuration.history.lock().unwrap().clone()
    }

    fn extension_calls(&self) -> Vec<String> {
        self.extensions.as_ref().map(|e| e.calls.lock().unwrap().clone()).unwrap_or_default()
    }
}

impl IGnss for FakeGnss {
    fn interface_version(&self) -> i32 {
        self.version
    }

    fn set_callback(&self, callback: Arc<dyn IGnssCallback>) -> HalResult<()> {
        callback.gnss_set_capabilities_cb(self.capabilities);
        callback.gnss_set_system_info_cb(GnssSystemInfo {
            year_of_hw: 2024,
            name: "fake".to_string(),
        });
        *self.callback.lock().unwrap() = Some(callback);
        Ok(())
    }

    fn start(&self) -> HalResult<()> {
        let sink = self.callback.lock().unwrap().clone().map(Sink::Aidl);
        self.start_streaming(sink)
    }

    fn stop(&self) -> HalResult<()> {
        self.stop_streaming();
        Ok(())
    }

    fn close(&self) -> HalResult<()> {
        self.stop_streaming();
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_position_mode(&self, options: &PositionModeOptions) -> HalResult<()> {
        self.position_modes.lock().unwrap().push(options.clone());
        Ok(())
    }

    fn get_extension_psds(&self) -> HalResult<Option<Arc<dyn IGnssPsds>>> {
        Ok(self.extensions.clone().map(|e| e as Arc<dyn IGnssPsds>))
    }

    fn get_extension_gnss_configuration(&self) -> HalResult<Option<Arc<dyn IGnssConfiguration>>> {
        Ok(Some(self.configuration.clone() as Arc<dyn IGnssConfiguration>))
    }

    fn get_extension_gnss_measurement(
        &self,
    ) -> HalResult<Option<Arc<dyn IGnssMeasurementInterface>>> {
        Ok(Some(self.measurement.clone() as Arc<dyn IGnssMeasurementInterface>))
    }

    fn get_extension_gnss_power_indication(
        &self,
    ) -> HalResult<Option<Arc<dyn IGnssPowerIndication>>> {
        Ok(Some(self.power.clone() as Arc<dyn IGnssPowerIndication>))
    }

    fn get_extension_gnss_batching(&self) -> HalResult<Option<Arc<dyn IGnssBatching>>> {
        Ok(self.extensions.clone().map(|e| e as Arc<dyn IGnssBatching>))
    }

    fn get_extension_gnss_geofence(&self) -> HalResult<Option<Arc<dyn IGnssGeofence>>> {
        Ok(self.extensions.clone().map(|e| e as Arc<dyn IGnssGeofence>))
    }

    fn get_extension_gnss_navigation_message(
        &self,
    ) -> HalResult<Option<Arc<dyn IGnssNavigationMessageInterface>>> {
        Ok(self.extensions.clone().map(|e| e as Arc<dyn IGnssNavigationMessageInterface>))
    }

    fn get_extension_agnss(&self) -> HalResult<Option<Arc<dyn IAGnss>>> {
        Ok(self.extensions.clone().map(|e| e as Arc<dyn IAGnss>))
    }

    fn get_extension_gnss_debug(&self) -> HalResult<Option<Arc<dyn IGnssDebug>>> {
        Ok(Some(self.debug.clone() as Arc<dyn IGnssDebug>))
    }

    fn get_extension_gnss_visibility_control(
        &self,
    ) -> HalResult<Option<Arc<dyn IGnssVisibilityControl>>> {
        Ok(self.extensions.clone().map(|e| e as Arc<dyn IGnssVisibilityControl>))
    }
}

impl IGnssLegacy for FakeGnss {
    fn set_callback(&self, callback: Arc<dyn IGnssCallbackLegacy>) -> HalResult<()> {
        *self.legacy_callback.lock().unwrap() = Some(callback);
        Ok(())
    }

    fn start(&self) -> HalResult<()> {
        let sink = self.legacy_callback.lock().unwrap().clone().map(Sink::Legacy);
        self.start_streaming(sink)
    }

    fn stop(&self) -> HalResult<()> {
        self.stop_streaming();
        Ok(())
    }

    fn set_position_mode(&self, options: &PositionModeOptions) -> HalResult<()> {
        self.position_modes.lock().unwrap().push(options.clone());
        Ok(())
    }
}

fn test_config() -> VtsConfig {
    init_logging();
    VtsConfig {
        first_location_timeout_ms: 1000,
        location_timeout_subsequent_ms: 50,
        capabilities_timeout_ms: 500,
        sv_info_list_timeout_ms: 50,
        first_measurement_timeout_ms: 500,
        power_stats_timeout_ms: 500,
        measurement_events: 10,
        measurement_events_with_options: 3,
        agc_measurement_events: 3,
        ..Default::default()
    }
}

fn connection(fake: &Arc<FakeGnss>) -> Connection {
    Connection { gnss: fake.clone(), legacy: Some(fake.clone()) }
}

fn run_with(name: &str, fake: &Arc<FakeGnss>, config: &VtsConfig) -> ScenarioReport {
    let scenario = find_scenario(name).expect("Known scenario");
    let fake = fake.clone();
    run_scenario(scenario, move || Ok(connection(&fake)), config)
}

fn run(name: &str, fake: &Arc<FakeGnss>) -> ScenarioReport {
    run_with(name, fake, &test_config())
}

#[test]
fn all_scenarios_pass_on_conforming_service() {
    let config = test_config();
    let reports = run_scenarios(|| Ok(connection(&FakeGnss::new(FakeOptions::default()))), &config);

    assert_eq!(reports.len(), SCENARIOS.len());
    for report in &reports {
        assert_eq!(report.result, Ok(Outcome::Passed), "{}", report.name);
    }
}

#[test]
fn context_is_torn_down() {
    let fake = FakeGnss::new(FakeOptions::default());
    let report = run("TestGnssPowerIndication", &fake);

    assert!(report.passed());
    assert_eq!(fake.closes.load(Ordering::SeqCst), 1);
    assert!(!fake.is_streaming());

    let modes = fake.position_modes.lock().unwrap();
    assert_eq!(modes.len(), 1);
    assert_eq!(modes[0].min_interval_ms, 1000);
    assert!(!modes[0].low_power_mode);
}

#[test]
fn scenario_fails_without_capabilities() {
    struct Silent(Arc<FakeGnss>);

    // Registers the callback, but never replays the capabilities
    impl IGnss for Silent {
        fn interface_version(&self) -> i32 {
            2
        }
        fn set_callback(&self, _callback: Arc<dyn IGnssCallback>) -> HalResult<()> {
            Ok(())
        }
        fn start(&self) -> HalResult<()> {
            IGnss::start(self.0.as_ref())
        }
        fn stop(&self) -> HalResult<()> {
            IGnss::stop(self.0.as_ref())
        }
        fn close(&self) -> HalResult<()> {
            IGnss::close(self.0.as_ref())
        }
        fn set_position_mode(&self, options: &PositionModeOptions) -> HalResult<()> {
            IGnss::set_position_mode(self.0.as_ref(), options)
        }
        fn get_extension_psds(&self) -> HalResult<Option<Arc<dyn IGnssPsds>>> {
            self.0.get_extension_psds()
        }
        fn get_extension_gnss_configuration(
            &self,
        ) -> HalResult<Option<Arc<dyn IGnssConfiguration>>> {
            self.0.get_extension_gnss_configuration()
        }
        fn get_extension_gnss_measurement(
            &self,
        ) -> HalResult<Option<Arc<dyn IGnssMeasurementInterface>>> {
            self.0.get_extension_gnss_measurement()
        }
        fn get_extension_gnss_power_indication(
            &self,
        ) -> HalResult<Option<Arc<dyn IGnssPowerIndication>>> {
            self.0.get_extension_gnss_power_indication()
        }
        fn get_extension_gnss_batching(&self) -> HalResult<Option<Arc<dyn IGnssBatching>>> {
            self.0.get_extension_gnss_batching()
        }
        fn get_extension_gnss_geofence(&self) -> HalResult<Option<Arc<dyn IGnssGeofence>>> {
            self.0.get_extension_gnss_geofence()
        }
        fn get_extension_gnss_navigation_message(
            &self,
        ) -> HalResult<Option<Arc<dyn IGnssNavigationMessageInterface>>> {
            self.0.get_extension_gnss_navigation_message()
        }
        fn get_extension_agnss(&self) -> HalResult<Option<Arc<dyn IAGnss>>> {
            self.0.get_extension_agnss()
        }
        fn get_extension_gnss_debug(&self) -> HalResult<Option<Arc<dyn IGnssDebug>>> {
            self.0.get_extension_gnss_debug()
        }
        fn get_extension_gnss_visibility_control(
            &self,
        ) -> HalResult<Option<Arc<dyn IGnssVisibilityControl>>> {
            self.0.get_extension_gnss_visibility_control()
        }
    }

    let config = VtsConfig { capabilities_timeout_ms: 20, ..test_config() };
    let silent = Arc::new(Silent(FakeGnss::new(FakeOptions::default())));
    let report = run_scenario(
        &SCENARIOS[0],
        move || Ok(Connection { gnss: silent.clone(), legacy: None }),
        &config,
    );

    assert_eq!(
        report.result,
        Err(ScenarioError::Timeout { queue: "capabilities", timeout: Duration::from_millis(20) })
    );
}

#[test]
fn connection_failure_is_reported() {
    let report = run_scenario(
        &SCENARIOS[0],
        || Err(HalError::ServiceSpecific(-1)),
        &test_config(),
    );
    assert_eq!(report.result, Err(ScenarioError::Transport(HalError::ServiceSpecific(-1))));
}

#[test]
fn psds_extension_refuses_empty_data() {
    let fake = FakeGnss::new(FakeOptions::default());
    assert_eq!(run("TestPsdsExtension", &fake).result, Ok(Outcome::Passed));
    assert_eq!(fake.extension_calls(), vec!["inject_psds_data LongTerm".to_string()]);

    let fake = FakeGnss::new(FakeOptions { provides_extensions: false, ..Default::default() });
    assert!(matches!(run("TestPsdsExtension", &fake).result, Ok(Outcome::Skipped(_))));
}

#[test]
fn satellite_pvt_must_be_reported_when_supported() {
    let mut measurement = measurement_data();
    measurement.measurements[0].flags.remove(MeasurementFlags::HAS_SATELLITE_PVT);

    let fake = FakeGnss::new(FakeOptions { measurement: measurement.clone(), ..Default::default() });
    assert!(matches!(
        run("TestGnssMeasurementExtensionAndSatellitePvt", &fake).result,
        Err(ScenarioError::Expectation(_))
    ));

    // Without the capability, a single valid measurement is enough
    let fake = FakeGnss::new(FakeOptions {
        capabilities: GnssCapabilities::MEASUREMENTS,
        measurement,
        ..Default::default()
    });
    assert_eq!(
        run("TestGnssMeasurementExtensionAndSatellitePvt", &fake).result,
        Ok(Outcome::Passed)
    );
}

#[test]
fn invalid_satellite_pvt_fails() {
    let mut measurement = measurement_data();
    measurement.measurements[0].satellite_pvt.iono_delay_meters = 100.0;

    let fake = FakeGnss::new(FakeOptions { measurement, ..Default::default() });
    assert!(matches!(
        run("TestGnssMeasurementExtensionAndSatellitePvt", &fake).result,
        Err(ScenarioError::Check(CheckError::OutOfRange { field: "ionoDelayMeters", .. }))
    ));
}

#[test]
fn unknown_measurement_flags_fail() {
    let mut measurement = measurement_data();
    measurement.measurements[0].flags = MeasurementFlags::from_bits_retain(1 << 30);

    let fake = FakeGnss::new(FakeOptions { measurement, ..Default::default() });
    assert!(matches!(
        run("TestGnssMeasurementExtensionAndSatellitePvt", &fake).result,
        Err(ScenarioError::Check(CheckError::UnknownFlags { field: "measurement.flags", .. }))
    ));
}

#[test]
fn correlation_vector_gated_on_capability() {
    let fake = FakeGnss::new(FakeOptions {
        capabilities: GnssCapabilities::MEASUREMENTS,
        ..Default::default()
    });
    assert!(matches!(run("TestCorrelationVector", &fake).result, Ok(Outcome::Skipped(_))));

    let mut measurement = measurement_data();
    measurement.measurements[0].correlation_vectors[0].sampling_width_m = 0.0;
    let fake = FakeGnss::new(FakeOptions { measurement, ..Default::default() });
    assert!(matches!(
        run("TestCorrelationVector", &fake).result,
        Err(ScenarioError::Check(CheckError::OutOfRange {
            field: "correlationVector.samplingWidthM",
            ..
        }))
    ));
}

#[test]
fn power_stats_must_increase() {
    let fake = FakeGnss::new(FakeOptions { stale_power_stats: true, ..Default::default() });
    assert_eq!(
        run("TestGnssPowerIndication", &fake).result,
        Err(ScenarioError::Expectation("Total energy did not increase".to_string()))
    );

    // Energies are only compared for the capabilities reported
    let fake = FakeGnss::new(FakeOptions {
        stale_power_stats: true,
        power_capabilities: PowerCapabilities::OTHER_MODES,
        ..Default::default()
    });
    assert_eq!(run("TestGnssPowerIndication", &fake).result, Ok(Outcome::Passed));
}

#[test]
fn blocklist_individual_satellite_reacquired() {
    let fake = FakeGnss::new(FakeOptions::default());
    assert_eq!(run("BlocklistIndividualSatellites", &fake).result, Ok(Outcome::Passed));

    // Glonass 8 is the strongest non-GPS satellite
    assert_eq!(
        fake.blocklist_history(),
        vec![vec![BlocklistedSource::satellite(GnssConstellationType::Glonass, 8)], vec![]]
    );
}

#[test]
fn blocklist_individual_satellite_never_reacquired() {
    let fake = FakeGnss::new(FakeOptions { reacquisition_epochs: usize::MAX, ..Default::default() });
    let config = VtsConfig { retries_to_unblocklist: 3, ..test_config() };

    let report = run_with("BlocklistIndividualSatellites", &fake, &config);
    assert!(matches!(
        report.result,
        Err(ScenarioError::Convergence(ConvergenceError { attempts: 3, .. }))
    ));
    // Initial phase, blocklisted phase, then one start per attempt
    assert_eq!(fake.starts.load(Ordering::SeqCst), 5);
}

#[test]
fn blocklist_ignored_by_service() {
    let fake = FakeGnss::new(FakeOptions { ignores_blocklist: true, ..Default::default() });
    assert!(matches!(
        run("BlocklistIndividualSatellites", &fake).result,
        Err(ScenarioError::Expectation(_))
    ));

    let fake = FakeGnss::new(FakeOptions { ignores_blocklist: true, ..Default::default() });
    assert!(matches!(
        run("BlocklistConstellationLocationOn", &fake).result,
        Err(ScenarioError::Expectation(_))
    ));
}

#[test]
fn blocklist_individual_satellite_without_non_gps_source() {
    let fake = FakeGnss::new(FakeOptions {
        satellites: vec![sv(GnssConstellationType::Gps, 1, 45.0), sv(GnssConstellationType::Gps, 2, 40.0)],
        ..Default::default()
    });
    assert_eq!(run("BlocklistIndividualSatellites", &fake).result, Ok(Outcome::Passed));
    assert!(fake.blocklist_history().is_empty());
}

#[test]
fn blocklist_constellation() {
    let expected = vec![
        vec![
            BlocklistedSource::constellation(GnssConstellationType::Galileo),
            BlocklistedSource::constellation(GnssConstellationType::Irnss),
        ],
        vec![],
    ];

    let fake = FakeGnss::new(FakeOptions::default());
    assert_eq!(run("BlocklistConstellationLocationOff", &fake).result, Ok(Outcome::Passed));
    assert_eq!(fake.blocklist_history(), expected);

    let fake = FakeGnss::new(FakeOptions::default());
    assert_eq!(run("BlocklistConstellationLocationOn", &fake).result, Ok(Outcome::Passed));
    assert_eq!(fake.blocklist_history(), expected);
}

#[test]
fn blocklist_constellation_defaults_to_glonass() {
    let fake = FakeGnss::new(FakeOptions {
        satellites: vec![sv(GnssConstellationType::Gps, 1, 45.0)],
        ..Default::default()
    });
    assert_eq!(run("BlocklistConstellationLocationOff", &fake).result, Ok(Outcome::Passed));
    assert_eq!(
        fake.blocklist_history()[0][0],
        BlocklistedSource::constellation(GnssConstellationType::Glonass)
    );
}

#[test]
fn blocklist_skipped_without_capability() {
    let fake = FakeGnss::new(FakeOptions {
        capabilities: GnssCapabilities::SCHEDULING,
        ..Default::default()
    });
    for name in [
        "BlocklistIndividualSatellites",
        "BlocklistConstellationLocationOff",
        "BlocklistConstellationLocationOn",
    ] {
        assert!(matches!(run(name, &fake).result, Ok(Outcome::Skipped(_))), "{}", name);
    }
    assert!(fake.blocklist_history().is_empty());
}

#[test]
fn legacy_service_streams_through_legacy_interface() {
    let fake = FakeGnss::new(FakeOptions { version: 1, ..Default::default() });
    assert_eq!(run("BlocklistConstellationLocationOff", &fake).result, Ok(Outcome::Passed));
    assert_eq!(run("BlocklistIndividualSatellites", &fake).result, Ok(Outcome::Passed));

    for name in [
        "TestAGnssExtension",
        "GnssDebugValuesSanityTest",
        "TestGnssVisibilityControlExtension",
        "TestGnssMeasurementSetCallbackWithOptions",
        "TestGnssAgcInGnssMeasurement",
    ] {
        assert!(matches!(run(name, &fake).result, Ok(Outcome::Skipped(_))), "{}", name);
    }
}

#[test]
fn legacy_service_requires_legacy_interface() {
    let fake = FakeGnss::new(FakeOptions { version: 1, ..Default::default() });
    let report = run_scenario(
        &SCENARIOS[0],
        move || Ok(Connection { gnss: fake.clone(), legacy: None }),
        &test_config(),
    );
    assert_eq!(
        report.result,
        Err(ScenarioError::Transport(HalError::Exception(ExceptionCode::NullPointer)))
    );
}

#[test]
fn all_extensions_exercised() {
    let fake = FakeGnss::new(FakeOptions::default());
    assert_eq!(run("TestAllExtensions", &fake).result, Ok(Outcome::Passed));
    assert_eq!(
        fake.extension_calls(),
        vec![
            "batching init",
            "batching cleanup",
            "geofence set_callback",
            "navigation_message set_callback",
            "navigation_message close",
        ]
    );

    let fake = FakeGnss::new(FakeOptions { provides_extensions: false, ..Default::default() });
    assert_eq!(run("TestAllExtensions", &fake).result, Ok(Outcome::Passed));
}

#[test]
fn agnss_and_visibility_control_configured() {
    let fake = FakeGnss::new(FakeOptions::default());
    assert_eq!(run("TestAGnssExtension", &fake).result, Ok(Outcome::Passed));
    assert_eq!(run("TestGnssVisibilityControlExtension", &fake).result, Ok(Outcome::Passed));
    assert_eq!(
        fake.extension_calls(),
        vec![
            "agnss set_callback",
            "agnss set_server Supl supl.google.com:7275",
            "visibility_control set_callback",
            "enable_nfw_location_access com.example.ims,com.example.mdt",
        ]
    );

    let fake = FakeGnss::new(FakeOptions { provides_extensions: false, ..Default::default() });
    assert_eq!(
        run("TestAGnssExtension", &fake).result,
        Err(ScenarioError::MissingExtension("IAGnss"))
    );
}

#[test]
fn debug_values_checked() {
    let mut debug = debug_data();
    debug.position.latitude_degrees = 999.0;
    let fake = FakeGnss::new(FakeOptions { debug: debug.clone(), ..Default::default() });
    assert!(matches!(
        run("GnssDebugValuesSanityTest", &fake).result,
        Err(ScenarioError::Check(CheckError::OutOfRange {
            field: "position.latitudeDegrees",
            ..
        }))
    ));

    // Position not inspected when invalid
    debug.position.valid = false;
    let fake = FakeGnss::new(FakeOptions { debug: debug.clone(), ..Default::default() });
    assert_eq!(run("GnssDebugValuesSanityTest", &fake).result, Ok(Outcome::Passed));

    let config = VtsConfig { is_automotive: true, ..test_config() };
    debug.time.time_uncertainty_ns = 0.0;
    let fake = FakeGnss::new(FakeOptions { debug, ..Default::default() });
    assert!(matches!(
        run_with("GnssDebugValuesSanityTest", &fake, &config).result,
        Ok(Outcome::Skipped(_))
    ));
}

#[test]
fn measurement_options_forwarded() {
    let fake = FakeGnss::new(FakeOptions::default());
    assert_eq!(
        run("TestGnssMeasurementSetCallbackWithOptions", &fake).result,
        Ok(Outcome::Passed)
    );
    assert_eq!(*fake.measurement.intervals.lock().unwrap(), vec![2000]);
    assert!(fake.measurement.ticker.lock().unwrap().is_none());
}

#[test]
fn agc_required_in_measurements() {
    let mut measurement = measurement_data();
    measurement.gnss_agcs = None;
    let fake = FakeGnss::new(FakeOptions { measurement, ..Default::default() });
    assert_eq!(
        run("TestGnssAgcInGnssMeasurement", &fake).result,
        Err(ScenarioError::Check(CheckError::Missing("gnssAgcs")))
    );
}

#[test]
fn empty_measurement_fails() {
    let mut measurement = measurement_data();
    measurement.measurements.clear();
    let fake = FakeGnss::new(FakeOptions { measurement, ..Default::default() });
    assert_eq!(
        run("TestGnssAgcInGnssMeasurement", &fake).result,
        Err(ScenarioError::Expectation("GnssData without measurement".to_string()))
    );
}

#[test]
fn moving_location_fails() {
    let fake = FakeGnss::new(FakeOptions {
        location: GnssLocation { speed_meters_per_sec: 30.0, ..fix() },
        ..Default::default()
    });
    assert!(matches!(
        run("TestGnssPowerIndication", &fake).result,
        Err(ScenarioError::Check(CheckError::OutOfRange { field: "speedMetersPerSec", .. }))
    ));
    assert!(!fake.is_streaming());
}

#[test]
fn missing_location_fails() {
    let fake = FakeGnss::new(FakeOptions {
        location: GnssLocation { flags: LocationFlags::HAS_LAT_LONG, ..fix() },
        ..Default::default()
    });
    assert_eq!(
        run("BlocklistConstellationLocationOn", &fake).result,
        Err(ScenarioError::Check(CheckError::Missing("HAS_ALTITUDE")))
    );
}
