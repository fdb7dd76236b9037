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

//! Parcelables exchanged with the GNSS service.
//!
//! Flag words keep unknown bits (`from_bits_retain`), so that the validity
//! checks can report a service setting bits outside the documented set.

use bitflags::bitflags;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

/// GNSS constellation, as numbered by the GNSS HAL
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(FromPrimitive, ToPrimitive)]
#[allow(missing_docs)]
pub enum GnssConstellationType {
    #[default]
    Unknown = 0,
    Gps = 1,
    Sbas = 2,
    Glonass = 3,
    Qzss = 4,
    Beidou = 5,
    Galileo = 6,
    Irnss = 7,
}

impl GnssConstellationType {
    /// Decode a raw constellation byte from the version 1 interface.
    /// Unknown values map to `Unknown`.
    pub fn from_raw(raw: u8) -> Self {
        Self::from_u8(raw).unwrap_or(Self::Unknown)
    }
}

bitflags! {
    /// Capabilities reported through `IGnssCallback::gnss_set_capabilities_cb`
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct GnssCapabilities: u32 {
        const SCHEDULING = 1 << 0;
        const MSB = 1 << 1;
        const MSA = 1 << 2;
        const SINGLE_SHOT = 1 << 3;
        const ON_DEMAND_TIME = 1 << 4;
        const GEOFENCING = 1 << 5;
        const MEASUREMENTS = 1 << 6;
        const NAV_MESSAGES = 1 << 7;
        const LOW_POWER_MODE = 1 << 8;
        const SATELLITE_BLOCKLIST = 1 << 9;
        const MEASUREMENT_CORRECTIONS = 1 << 10;
        const ANTENNA_INFO = 1 << 11;
        const CORRELATION_VECTOR = 1 << 12;
        const SATELLITE_PVT = 1 << 13;
        const MEASUREMENT_CORRECTIONS_FOR_DRIVING = 1 << 14;
        const ACCUMULATED_DELTA_RANGE = 1 << 15;
    }
}

bitflags! {
    /// Capabilities reported through `IGnssPowerIndicationCallback`
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct PowerCapabilities: u32 {
        const TOTAL = 1 << 0;
        const SINGLEBAND_TRACKING = 1 << 1;
        const MULTIBAND_TRACKING = 1 << 2;
        const SINGLEBAND_ACQUISITION = 1 << 3;
        const MULTIBAND_ACQUISITION = 1 << 4;
        const OTHER_MODES = 1 << 5;
    }
}

bitflags! {
    /// Validity of the `GnssLocation` fields
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct LocationFlags: u32 {
        const HAS_LAT_LONG = 0x0001;
        const HAS_ALTITUDE = 0x0002;
        const HAS_SPEED = 0x0004;
        const HAS_BEARING = 0x0008;
        const HAS_HORIZONTAL_ACCURACY = 0x0010;
        const HAS_VERTICAL_ACCURACY = 0x0020;
        const HAS_SPEED_ACCURACY = 0x0040;
        const HAS_BEARING_ACCURACY = 0x0080;
    }
}

bitflags! {
    /// Status of a satellite in a `GnssSvInfo`
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct SvFlags: u32 {
        const HAS_EPHEMERIS_DATA = 1 << 0;
        const HAS_ALMANAC_DATA = 1 << 1;
        const USED_IN_FIX = 1 << 2;
        const HAS_CARRIER_FREQUENCY = 1 << 3;
    }
}

bitflags! {
    /// Validity of the `ElapsedRealtime` fields
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct ElapsedRealtimeFlags: u32 {
        const HAS_TIMESTAMP_NS = 1 << 0;
        const HAS_TIME_UNCERTAINTY_NS = 1 << 1;
    }
}

bitflags! {
    /// Validity of the `GnssClock` fields
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct ClockFlags: u32 {
        const HAS_LEAP_SECOND = 1 << 0;
        const HAS_TIME_UNCERTAINTY = 1 << 1;
        const HAS_FULL_BIAS = 1 << 2;
        const HAS_BIAS = 1 << 3;
        const HAS_BIAS_UNCERTAINTY = 1 << 4;
        const HAS_DRIFT = 1 << 5;
        const HAS_DRIFT_UNCERTAINTY = 1 << 6;
    }
}

bitflags! {
    /// Validity of the `GnssMeasurement` fields
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct MeasurementFlags: u32 {
        const HAS_SNR = 1 << 0;
        const HAS_CARRIER_FREQUENCY = 1 << 9;
        const HAS_CARRIER_CYCLES = 1 << 10;
        const HAS_CARRIER_PHASE = 1 << 11;
        const HAS_CARRIER_PHASE_UNCERTAINTY = 1 << 12;
        const HAS_AUTOMATIC_GAIN_CONTROL = 1 << 13;
        const HAS_FULL_ISB = 1 << 16;
        const HAS_FULL_ISB_UNCERTAINTY = 1 << 17;
        const HAS_SATELLITE_ISB = 1 << 18;
        const HAS_SATELLITE_ISB_UNCERTAINTY = 1 << 19;
        const HAS_SATELLITE_PVT = 1 << 20;
        const HAS_CORRELATION_VECTOR = 1 << 21;
    }
}

bitflags! {
    /// Validity of the `SatellitePvt` sub-records
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct SatellitePvtFlags: u32 {
        const HAS_POSITION_VELOCITY_CLOCK_INFO = 1 << 0;
        const HAS_IONO = 1 << 1;
        const HAS_TROPO = 1 << 2;
    }
}

/// Boot-clock timestamp attached to locations, measurements and power stats
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ElapsedRealtime {
    pub flags: ElapsedRealtimeFlags,
    pub timestamp_ns: i64,
    pub time_uncertainty_ns: f64,
}

/// A position fix
#[derive(Debug, Default, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct GnssLocation {
    pub flags: LocationFlags,
    pub latitude_degrees: f64,
    pub longitude_degrees: f64,
    pub altitude_meters: f64,
    pub speed_meters_per_sec: f64,
    pub bearing_degrees: f64,
    pub horizontal_accuracy_meters: f64,
    pub vertical_accuracy_meters: f64,
    pub speed_accuracy_meters_per_second: f64,
    pub bearing_accuracy_degrees: f64,
    pub timestamp_millis: i64,
    pub elapsed_realtime: ElapsedRealtime,
}

/// One satellite of a status report
#[derive(Debug, Default, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct GnssSvInfo {
    pub svid: i32,
    pub constellation: GnssConstellationType,
    pub cn0_dbhz: f32,
    pub baseband_cn0_dbhz: f32,
    pub elevation_degrees: f32,
    pub azimuth_degrees: f32,
    pub carrier_frequency_hz: i64,
    pub sv_flag: SvFlags,
}

impl GnssSvInfo {
    /// True when the satellite participates in the reported fix
    pub fn used_in_fix(&self) -> bool {
        self.sv_flag.contains(SvFlags::USED_IN_FIX)
    }

    /// True when this satellite is covered by `source`; an svid of 0 covers the
    /// whole constellation.
    pub fn matches(&self, source: &BlocklistedSource) -> bool {
        self.constellation == source.constellation
            && (source.svid == BlocklistedSource::ALL_SATELLITES || self.svid == source.svid)
    }
}

/// Version 1.0 part of a version 1 satellite record
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LegacySvInfoV1_0 {
    pub svid: i16,
    pub c_n0_dbhz: f32,
    pub elevation_degrees: f32,
    pub azimuth_degrees: f32,
    pub carrier_frequency_hz: f32,
    pub sv_flag: u8,
}

/// Version 2.0 part of a version 1 satellite record
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LegacySvInfoV2_0 {
    pub v1_0: LegacySvInfoV1_0,
    pub constellation: u8,
}

/// Satellite record delivered by the version 1 interface
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LegacySvInfo {
    pub v2_0: LegacySvInfoV2_0,
    pub baseband_c_n0_dbhz: f64,
}

impl From<&LegacySvInfo> for GnssSvInfo {
    fn from(sv: &LegacySvInfo) -> Self {
        let v1_0 = &sv.v2_0.v1_0;
        Self {
            svid: v1_0.svid.into(),
            constellation: GnssConstellationType::from_raw(sv.v2_0.constellation),
            cn0_dbhz: v1_0.c_n0_dbhz,
            baseband_cn0_dbhz: sv.baseband_c_n0_dbhz as f32,
            elevation_degrees: v1_0.elevation_degrees,
            azimuth_degrees: v1_0.azimuth_degrees,
            carrier_frequency_hz: v1_0.carrier_frequency_hz as i64,
            sv_flag: SvFlags::from_bits_retain(v1_0.sv_flag.into()),
        }
    }
}

/// Satellite, or whole constellation, excluded from position fixes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlocklistedSource {
    pub constellation: GnssConstellationType,
    pub svid: i32,
}

impl BlocklistedSource {
    /// Wildcard svid, covering all satellites of the constellation
    pub const ALL_SATELLITES: i32 = 0;

    /// Blocklist a single satellite
    pub fn satellite(constellation: GnssConstellationType, svid: i32) -> Self {
        Self { constellation, svid }
    }

    /// Blocklist every satellite of a constellation
    pub fn constellation(constellation: GnssConstellationType) -> Self {
        Self { constellation, svid: Self::ALL_SATELLITES }
    }
}

/// Receiver clock attached to a `GnssData`
#[derive(Debug, Default, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct GnssClock {
    pub gnss_clock_flags: ClockFlags,
    pub leap_second: i32,
    pub time_ns: i64,
    pub time_uncertainty_ns: f64,
    pub full_bias_ns: i64,
    pub bias_ns: f64,
    pub bias_uncertainty_ns: f64,
    pub drift_nsps: f64,
    pub drift_uncertainty_nsps: f64,
    pub hw_clock_discontinuity_count: i32,
}

/// Satellite position in the ECEF frame
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub struct SatellitePositionEcef {
    pub pos_x_meters: f64,
    pub pos_y_meters: f64,
    pub pos_z_meters: f64,
    pub ure_meters: f64,
}

/// Satellite velocity in the ECEF frame
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub struct SatelliteVelocityEcef {
    pub vel_x_mps: f64,
    pub vel_y_mps: f64,
    pub vel_z_mps: f64,
    pub ure_rate_mps: f64,
}

/// Satellite clock corrections
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub struct SatelliteClockInfo {
    pub sat_hardware_code_bias_meters: f64,
    pub sat_time_correction_meters: f64,
    pub sat_clk_drift_mps: f64,
}

/// Satellite position, velocity and clock information
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub struct SatellitePvt {
    pub flags: SatellitePvtFlags,
    pub sat_pos_ecef: SatellitePositionEcef,
    pub sat_vel_ecef: SatelliteVelocityEcef,
    pub sat_clock_info: SatelliteClockInfo,
    pub iono_delay_meters: f64,
    pub tropo_delay_meters: f64,
}

/// Correlation samples around the prompt correlator
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CorrelationVector {
    pub frequency_offset_mps: f64,
    pub sampling_width_m: f64,
    pub sampling_start_m: f64,
    pub magnitude: Vec<i32>,
}

/// A raw measurement of a single satellite signal
#[derive(Debug, Default, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct GnssMeasurement {
    pub flags: MeasurementFlags,
    pub svid: i32,
    pub constellation: GnssConstellationType,
    pub antenna_cn0_dbhz: f64,
    pub carrier_frequency_hz: f64,
    pub satellite_pvt: SatellitePvt,
    pub correlation_vectors: Vec<CorrelationVector>,
}

/// Automatic gain control level of a frequency band
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GnssAgc {
    pub agc_level_db: f64,
    pub constellation: GnssConstellationType,
    pub carrier_frequency_hz: i64,
}

/// A batch of measurements delivered through `IGnssMeasurementCallback`
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GnssData {
    pub measurements: Vec<GnssMeasurement>,
    pub clock: GnssClock,
    pub elapsed_realtime: ElapsedRealtime,
    /// Absent entries model unset nullable parcelables
    pub gnss_agcs: Option<Vec<Option<GnssAgc>>>,
}

/// Cumulative energy consumed by the GNSS chipset since boot
#[derive(Debug, Default, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct GnssPowerStats {
    pub elapsed_realtime: ElapsedRealtime,
    pub total_energy_milli_joule: f64,
    pub singleband_tracking_mode_energy_milli_joule: f64,
    pub multiband_tracking_mode_energy_milli_joule: f64,
    pub singleband_acquisition_mode_energy_milli_joule: f64,
    pub multiband_acquisition_mode_energy_milli_joule: f64,
    pub other_modes_energy_milli_joule: Vec<f64>,
}

/// Position estimate reported by `IGnssDebug`
#[derive(Debug, Default, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct PositionDebug {
    pub valid: bool,
    pub latitude_degrees: f64,
    pub longitude_degrees: f64,
    pub altitude_meters: f32,
    pub speed_meters_per_sec: f32,
    pub bearing_degrees: f32,
    pub horizontal_accuracy_meters: f64,
    pub vertical_accuracy_meters: f64,
    pub speed_accuracy_meters_per_second: f64,
    pub bearing_accuracy_degrees: f64,
    pub age_seconds: f32,
}

/// Time estimate reported by `IGnssDebug`
#[derive(Debug, Default, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct TimeDebug {
    pub time_estimate_ms: i64,
    pub time_uncertainty_ns: f32,
    pub frequency_uncertainty_ns_per_sec: f32,
}

/// Per-satellite entry reported by `IGnssDebug`
#[derive(Debug, Default, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct SatelliteDebug {
    pub svid: i32,
    pub constellation: GnssConstellationType,
    pub ephemeris_age_seconds: f32,
    pub server_prediction_is_available: bool,
}

/// Snapshot returned by `IGnssDebug::get_debug_data`
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DebugData {
    pub position: PositionDebug,
    pub time: TimeDebug,
    pub satellite_data_array: Vec<SatelliteDebug>,
}

/// Fix scheduling mode
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum GnssPositionMode {
    #[default]
    Standalone,
    Msb,
    Msa,
}

/// Fix recurrence
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum GnssPositionRecurrence {
    #[default]
    Periodic,
    Single,
}

/// Arguments of `IGnss::set_position_mode`
#[derive(Debug, Default, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct PositionModeOptions {
    pub mode: GnssPositionMode,
    pub recurrence: GnssPositionRecurrence,
    pub min_interval_ms: i32,
    pub preferred_accuracy_meters: i32,
    pub preferred_time_ms: i32,
    pub low_power_mode: bool,
}

/// Arguments of `IGnssMeasurementInterface::set_callback_with_options`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct MeasurementOptions {
    pub enable_full_tracking: bool,
    pub enable_corr_vec_outputs: bool,
    pub interval_ms: i32,
}

/// Kind of predicted satellite data injected through `IGnssPsds`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum PsdsType {
    LongTerm = 1,
    Normal = 2,
    RealTime = 3,
}

/// Kind of assistance server configured through `IAGnss`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum AGnssType {
    Supl = 1,
    C2k = 2,
    SuplEims = 3,
    SuplIms = 4,
}

/// Hardware description reported at callback registration
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GnssSystemInfo {
    pub year_of_hw: i32,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_source_covers_constellation() {
        let sv = GnssSvInfo {
            svid: 12,
            constellation: GnssConstellationType::Galileo,
            ..Default::default()
        };
        assert!(sv.matches(&BlocklistedSource::constellation(GnssConstellationType::Galileo)));
        assert!(sv.matches(&BlocklistedSource::satellite(GnssConstellationType::Galileo, 12)));
        assert!(!sv.matches(&BlocklistedSource::satellite(GnssConstellationType::Galileo, 13)));
        assert!(!sv.matches(&BlocklistedSource::constellation(GnssConstellationType::Glonass)));
    }

    #[test]
    fn legacy_sv_info_conversion() {
        let legacy = LegacySvInfo {
            v2_0: LegacySvInfoV2_0 {
                v1_0: LegacySvInfoV1_0 {
                    svid: 7,
                    c_n0_dbhz: 42.5,
                    sv_flag: SvFlags::USED_IN_FIX.bits() as u8,
                    ..Default::default()
                },
                constellation: 7,
            },
            baseband_c_n0_dbhz: 38.0,
        };

        let sv = GnssSvInfo::from(&legacy);
        assert_eq!(sv.svid, 7);
        assert_eq!(sv.constellation, GnssConstellationType::Irnss);
        assert!(sv.used_in_fix());
        assert_eq!(sv.cn0_dbhz, 42.5);
    }

    #[test]
    fn unknown_constellation_byte() {
        assert_eq!(GnssConstellationType::from_raw(42), GnssConstellationType::Unknown);
        assert_eq!(GnssConstellationType::from_raw(3), GnssConstellationType::Glonass);
    }
}
