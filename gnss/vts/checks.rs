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

//! Validity checks of the values reported by the service.
//!
//! Sub-records are only inspected when their presence flag is set. A value out
//! of its interval is a defect of the service, reported with the field name.

use crate::types::*;
use std::fmt;
use thiserror::Error;

/// Bound of an `Interval`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Limit {
    Inclusive(f64),
    Exclusive(f64),
    Unbounded,
}

/// Interval of plausible values for a field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub low: Limit,
    pub high: Limit,
}

impl Interval {
    /// `[low, high]`
    pub const fn closed(low: f64, high: f64) -> Self {
        Self { low: Limit::Inclusive(low), high: Limit::Inclusive(high) }
    }

    /// `(low, high)`
    pub const fn open(low: f64, high: f64) -> Self {
        Self { low: Limit::Exclusive(low), high: Limit::Exclusive(high) }
    }

    /// `(low, high]`
    pub const fn left_open(low: f64, high: f64) -> Self {
        Self { low: Limit::Exclusive(low), high: Limit::Inclusive(high) }
    }

    /// `[low, +inf)`
    pub const fn at_least(low: f64) -> Self {
        Self { low: Limit::Inclusive(low), high: Limit::Unbounded }
    }

    /// `(low, +inf)`
    pub const fn greater_than(low: f64) -> Self {
        Self { low: Limit::Exclusive(low), high: Limit::Unbounded }
    }

    pub fn contains(&self, value: f64) -> bool {
        let above = match self.low {
            Limit::Inclusive(l) => value >= l,
            Limit::Exclusive(l) => value > l,
            Limit::Unbounded => true,
        };
        let below = match self.high {
            Limit::Inclusive(h) => value <= h,
            Limit::Exclusive(h) => value < h,
            Limit::Unbounded => true,
        };
        above && below
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.low {
            Limit::Inclusive(l) => write!(f, "[{}", l)?,
            Limit::Exclusive(l) => write!(f, "({}", l)?,
            Limit::Unbounded => write!(f, "(-inf")?,
        }
        match self.high {
            Limit::Inclusive(h) => write!(f, ", {}]", h),
            Limit::Exclusive(h) => write!(f, ", {})", h),
            Limit::Unbounded => write!(f, ", +inf)"),
        }
    }
}

/// A reported value failed its validity check
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckError {
    #[error("{field} = {value} is outside {interval}")]
    OutOfRange { field: &'static str, value: f64, interval: Interval },
    #[error("{field} = {flags:#x} exceeds {max:#x}")]
    UnknownFlags { field: &'static str, flags: u32, max: u32 },
    #[error("{0} is missing")]
    Missing(&'static str),
}

/// Checks that `value` of `field` lies within `interval`.
pub fn ensure_in(field: &'static str, value: f64, interval: Interval) -> Result<(), CheckError> {
    if interval.contains(value) {
        Ok(())
    } else {
        Err(CheckError::OutOfRange { field, value, interval })
    }
}

/// Flag words are bounded by the union of the documented flags, undefined
/// bits below the highest one are tolerated.
fn ensure_flags_within(field: &'static str, flags: u32, max: u32) -> Result<(), CheckError> {
    if flags <= max {
        Ok(())
    } else {
        Err(CheckError::UnknownFlags { field, flags, max })
    }
}

fn ensure_present(field: &'static str, present: bool) -> Result<(), CheckError> {
    if present {
        Ok(())
    } else {
        Err(CheckError::Missing(field))
    }
}

const MAX_ORBIT_RADIUS_METERS: f64 = 43_000_000.0;
const MAX_VELOCITY_MPS: f64 = 4000.0;
// Hardware code bias bounds from GPS ICD Table 20-1
const MIN_HARDWARE_CODE_BIAS_METERS: f64 = -17.869;
const MAX_HARDWARE_CODE_BIAS_METERS: f64 = 17.729;
const MAX_TIME_CORRELATION_METERS: f64 = 3e6;
const MAX_SAT_CLK_DRIFT_MPS: f64 = 1.117;

/// Checks the sub-records of a `SatellitePvt` whose presence flag is set.
pub fn check_satellite_pvt(pvt: &SatellitePvt) -> Result<(), CheckError> {
    let orbit = Interval::closed(-MAX_ORBIT_RADIUS_METERS, MAX_ORBIT_RADIUS_METERS);
    let velocity = Interval::closed(-MAX_VELOCITY_MPS, MAX_VELOCITY_MPS);

    ensure_present(
        "satellitePvt.flags",
        pvt.flags.intersects(SatellitePvtFlags::all()),
    )?;

    if pvt.flags.contains(SatellitePvtFlags::HAS_POSITION_VELOCITY_CLOCK_INFO) {
        log::debug!("Found HAS_POSITION_VELOCITY_CLOCK_INFO");
        let pos = &pvt.sat_pos_ecef;
        ensure_in("satPosEcef.posXMeters", pos.pos_x_meters, orbit)?;
        ensure_in("satPosEcef.posYMeters", pos.pos_y_meters, orbit)?;
        ensure_in("satPosEcef.posZMeters", pos.pos_z_meters, orbit)?;
        ensure_in("satPosEcef.ureMeters", pos.ure_meters, Interval::greater_than(0.0))?;

        let vel = &pvt.sat_vel_ecef;
        ensure_in("satVelEcef.velXMps", vel.vel_x_mps, velocity)?;
        ensure_in("satVelEcef.velYMps", vel.vel_y_mps, velocity)?;
        ensure_in("satVelEcef.velZMps", vel.vel_z_mps, velocity)?;
        ensure_in("satVelEcef.ureRateMps", vel.ure_rate_mps, Interval::greater_than(0.0))?;

        let clock = &pvt.sat_clock_info;
        ensure_in(
            "satClockInfo.satHardwareCodeBiasMeters",
            clock.sat_hardware_code_bias_meters,
            Interval::open(MIN_HARDWARE_CODE_BIAS_METERS, MAX_HARDWARE_CODE_BIAS_METERS),
        )?;
        ensure_in(
            "satClockInfo.satTimeCorrectionMeters",
            clock.sat_time_correction_meters,
            Interval::open(-MAX_TIME_CORRELATION_METERS, MAX_TIME_CORRELATION_METERS),
        )?;
        ensure_in(
            "satClockInfo.satClkDriftMps",
            clock.sat_clk_drift_mps,
            Interval::open(-MAX_SAT_CLK_DRIFT_MPS, MAX_SAT_CLK_DRIFT_MPS),
        )?;
    }

    if pvt.flags.contains(SatellitePvtFlags::HAS_IONO) {
        log::debug!("Found HAS_IONO");
        ensure_in("ionoDelayMeters", pvt.iono_delay_meters, Interval::open(0.0, 100.0))?;
    }

    if pvt.flags.contains(SatellitePvtFlags::HAS_TROPO) {
        log::debug!("Found HAS_TROPO");
        ensure_in("tropoDelayMeters", pvt.tropo_delay_meters, Interval::open(0.0, 100.0))?;
    }

    Ok(())
}

/// Checks the clock and elapsed realtime of a `GnssData`.
pub fn check_measurement_clock_fields(data: &GnssData) -> Result<(), CheckError> {
    let elapsed = &data.elapsed_realtime;
    ensure_flags_within(
        "elapsedRealtime.flags",
        elapsed.flags.bits(),
        ElapsedRealtimeFlags::all().bits(),
    )?;
    if elapsed.flags.contains(ElapsedRealtimeFlags::HAS_TIMESTAMP_NS) {
        ensure_in(
            "elapsedRealtime.timestampNs",
            elapsed.timestamp_ns as f64,
            Interval::greater_than(0.0),
        )?;
    }
    if elapsed.flags.contains(ElapsedRealtimeFlags::HAS_TIME_UNCERTAINTY_NS) {
        ensure_in(
            "elapsedRealtime.timeUncertaintyNs",
            elapsed.time_uncertainty_ns,
            Interval::greater_than(0.0),
        )?;
    }

    ensure_flags_within(
        "clock.gnssClockFlags",
        data.clock.gnss_clock_flags.bits(),
        ClockFlags::all().bits(),
    )
}

/// Checks that the measurement flags do not exceed the documented ones.
pub fn check_measurement_flags(measurement: &GnssMeasurement) -> Result<(), CheckError> {
    ensure_flags_within(
        "measurement.flags",
        measurement.flags.bits(),
        MeasurementFlags::all().bits(),
    )
}

/// Checks a correlation vector of a measurement.
pub fn check_correlation_vector(vector: &CorrelationVector) -> Result<(), CheckError> {
    ensure_in(
        "correlationVector.frequencyOffsetMps",
        vector.frequency_offset_mps,
        Interval::at_least(0.0),
    )?;
    ensure_in(
        "correlationVector.samplingWidthM",
        vector.sampling_width_m,
        Interval::greater_than(0.0),
    )?;
    ensure_present("correlationVector.magnitude", !vector.magnitude.is_empty())?;
    for &magnitude in &vector.magnitude {
        ensure_in(
            "correlationVector.magnitude",
            magnitude.into(),
            Interval::closed(-32768.0, 32767.0),
        )?;
    }
    Ok(())
}

/// Checks the automatic gain control entries of a `GnssData`, which must be
/// reported.
pub fn check_agcs(data: &GnssData) -> Result<(), CheckError> {
    let Some(agcs) = &data.gnss_agcs else {
        return Err(CheckError::Missing("gnssAgcs"));
    };
    for agc in agcs {
        let Some(agc) = agc else {
            return Err(CheckError::Missing("gnssAgc"));
        };
        ensure_in(
            "gnssAgc.carrierFrequencyHz",
            agc.carrier_frequency_hz as f64,
            Interval::at_least(0.0),
        )?;
    }
    Ok(())
}

/// Limits of a location fix reported by a stationary device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationLimits {
    pub max_speed_meters_per_sec: f64,
    pub max_horizontal_accuracy_meters: f64,
    pub max_vertical_accuracy_meters: f64,
    pub max_speed_accuracy_meters_per_second: f64,
    pub min_timestamp_millis: f64,
}

impl Default for LocationLimits {
    fn default() -> Self {
        Self {
            max_speed_meters_per_sec: 5.0,
            max_horizontal_accuracy_meters: 250.0,
            max_vertical_accuracy_meters: 500.0,
            max_speed_accuracy_meters_per_second: 50.0,
            // Some time after 2016
            min_timestamp_millis: 1.48e12,
        }
    }
}

/// Checks a location fix; speed related fields are required when `check_speed`.
pub fn check_location(
    location: &GnssLocation,
    check_speed: bool,
    limits: &LocationLimits,
) -> Result<(), CheckError> {
    let flags = location.flags;
    ensure_present("HAS_LAT_LONG", flags.contains(LocationFlags::HAS_LAT_LONG))?;
    ensure_present("HAS_ALTITUDE", flags.contains(LocationFlags::HAS_ALTITUDE))?;
    ensure_present(
        "HAS_HORIZONTAL_ACCURACY",
        flags.contains(LocationFlags::HAS_HORIZONTAL_ACCURACY),
    )?;
    ensure_present("HAS_VERTICAL_ACCURACY", flags.contains(LocationFlags::HAS_VERTICAL_ACCURACY))?;
    if check_speed {
        ensure_present("HAS_SPEED", flags.contains(LocationFlags::HAS_SPEED))?;
        ensure_present("HAS_SPEED_ACCURACY", flags.contains(LocationFlags::HAS_SPEED_ACCURACY))?;
        if flags.contains(LocationFlags::HAS_BEARING) {
            ensure_present(
                "HAS_BEARING_ACCURACY",
                flags.contains(LocationFlags::HAS_BEARING_ACCURACY),
            )?;
        }
    }

    ensure_in("latitudeDegrees", location.latitude_degrees, Interval::closed(-90.0, 90.0))?;
    ensure_in("longitudeDegrees", location.longitude_degrees, Interval::closed(-180.0, 180.0))?;
    ensure_in("altitudeMeters", location.altitude_meters, Interval::closed(-1000.0, 30000.0))?;
    ensure_in(
        "horizontalAccuracyMeters",
        location.horizontal_accuracy_meters,
        Interval::left_open(0.0, limits.max_horizontal_accuracy_meters),
    )?;
    ensure_in(
        "verticalAccuracyMeters",
        location.vertical_accuracy_meters,
        Interval::left_open(0.0, limits.max_vertical_accuracy_meters),
    )?;
    if check_speed {
        ensure_in(
            "speedMetersPerSec",
            location.speed_meters_per_sec,
            Interval::closed(0.0, limits.max_speed_meters_per_sec),
        )?;
        ensure_in(
            "speedAccuracyMetersPerSecond",
            location.speed_accuracy_meters_per_second,
            Interval::left_open(0.0, limits.max_speed_accuracy_meters_per_second),
        )?;
    }
    if flags.contains(LocationFlags::HAS_BEARING_ACCURACY) {
        ensure_in(
            "bearingAccuracyDegrees",
            location.bearing_accuracy_degrees,
            Interval::closed(0.0, 360.0),
        )?;
    }
    ensure_in(
        "timestampMillis",
        location.timestamp_millis as f64,
        Interval::greater_than(limits.min_timestamp_millis),
    )
}

// Jan 01 2017 00:00:00 GMT
const MIN_TIME_ESTIMATE_MS: f64 = 1_483_228_800_000.0;
// 200 ppm
const MAX_FREQUENCY_UNCERTAINTY_NS_PER_SEC: f64 = 2.0e5;

/// Checks a debug snapshot; the position is only inspected when valid.
pub fn check_debug_data(data: &DebugData) -> Result<(), CheckError> {
    let position = &data.position;
    if position.valid {
        ensure_in("position.latitudeDegrees", position.latitude_degrees, Interval::closed(-90.0, 90.0))?;
        ensure_in(
            "position.longitudeDegrees",
            position.longitude_degrees,
            Interval::closed(-180.0, 180.0),
        )?;
        // Dead Sea: -414m, Mount Everest: 8850m
        ensure_in(
            "position.altitudeMeters",
            position.altitude_meters.into(),
            Interval::closed(-1000.0, 20000.0),
        )?;
        ensure_in(
            "position.speedMetersPerSec",
            position.speed_meters_per_sec.into(),
            Interval::closed(0.0, 600.0),
        )?;
        ensure_in(
            "position.bearingDegrees",
            position.bearing_degrees.into(),
            Interval::closed(-360.0, 360.0),
        )?;
        ensure_in(
            "position.horizontalAccuracyMeters",
            position.horizontal_accuracy_meters,
            Interval::left_open(0.0, 20_000_000.0),
        )?;
        ensure_in(
            "position.verticalAccuracyMeters",
            position.vertical_accuracy_meters,
            Interval::left_open(0.0, 20000.0),
        )?;
        ensure_in(
            "position.speedAccuracyMetersPerSecond",
            position.speed_accuracy_meters_per_second,
            Interval::left_open(0.0, 500.0),
        )?;
        ensure_in(
            "position.bearingAccuracyDegrees",
            position.bearing_accuracy_degrees,
            Interval::left_open(0.0, 180.0),
        )?;
        ensure_in("position.ageSeconds", position.age_seconds.into(), Interval::at_least(0.0))?;
    }

    ensure_in(
        "time.timeEstimateMs",
        data.time.time_estimate_ms as f64,
        Interval::at_least(MIN_TIME_ESTIMATE_MS),
    )?;
    ensure_in(
        "time.timeUncertaintyNs",
        data.time.time_uncertainty_ns.into(),
        Interval::greater_than(0.0),
    )?;
    ensure_in(
        "time.frequencyUncertaintyNsPerSec",
        data.time.frequency_uncertainty_ns_per_sec.into(),
        Interval::left_open(0.0, MAX_FREQUENCY_UNCERTAINTY_NS_PER_SEC),
    )
}
