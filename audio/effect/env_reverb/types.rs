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

//! Types of the audio effect interface, as used by the reverb

use std::fmt;
use thiserror::Error;

/// Audio UUID, in the RFC 4122 layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AudioUuid {
    pub time_low: u32,
    pub time_mid: u16,
    pub time_hi_and_version: u16,
    pub clock_seq: u16,
    pub node: [u8; 6],
}

impl fmt::Display for AudioUuid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-",
            self.time_low, self.time_mid, self.time_hi_and_version, self.clock_seq
        )?;
        self.node.iter().try_for_each(|b| write!(f, "{:02x}", b))
    }
}

/// Environmental reverb effect type: c2e5d5f0-94bd-4763-9cac-4e234d06839e
pub const ENV_REVERB_TYPE_UUID: AudioUuid = AudioUuid {
    time_low: 0xc2e5d5f0,
    time_mid: 0x94bd,
    time_hi_and_version: 0x4763,
    clock_seq: 0x9cac,
    node: [0x4e, 0x23, 0x4d, 0x06, 0x83, 0x9e],
};

/// Software implementation: fa819886-588b-11ed-9b6a-0242ac120002
pub const ENV_REVERB_SW_IMPL_UUID: AudioUuid = AudioUuid {
    time_low: 0xfa819886,
    time_mid: 0x588b,
    time_hi_and_version: 0x11ed,
    clock_seq: 0x9b6a,
    node: [0x02, 0x42, 0xac, 0x12, 0x00, 0x02],
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id {
    pub type_uuid: AudioUuid,
    pub uuid: AudioUuid,
    pub proxy: Option<AudioUuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagType {
    Insert,
    Auxiliary,
    Replace,
    PreProcessing,
    PostProcessing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagInsert {
    Any,
    First,
    Last,
    Exclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagVolume {
    None,
    Ctrl,
    Ind,
    Monitor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub flag_type: FlagType,
    pub insert: FlagInsert,
    pub volume: FlagVolume,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Common {
    pub id: Id,
    pub flags: Flags,
    pub name: String,
    pub implementor: String,
}

/// Ranges supported by an environmental reverb
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvironmentalReverbCapability {
    pub max_decay_time_ms: i32,
    pub max_delay_ms: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    EnvironmentalReverb(EnvironmentalReverbCapability),
    Equalizer { band_count: i32 },
    Volume { max_level_db: i32 },
}

/// Static description of an effect implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub common: Common,
    pub capability: Capability,
}

/// Environmental reverb settings, levels in millibels, ratios in permille
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvironmentalReverb {
    pub room_level_mb: i32,
    pub room_hf_level_mb: i32,
    pub decay_time_ms: i32,
    pub decay_hf_ratio_pm: i32,
    pub level_mb: i32,
    pub delay_ms: i32,
    pub diffusion_pm: i32,
    pub density_pm: i32,
    pub bypass: bool,
}

/// Effect specific parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Specific {
    EnvironmentalReverb(EnvironmentalReverb),
    Equalizer { preset: i32 },
    Volume { level_db: i32 },
}

/// Identifies the effect specific parameter to get
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterId {
    EnvironmentalReverbTag,
    EqualizerTag,
    VolumeTag,
}

/// Audio configuration of one side of the effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioConfig {
    pub sample_rate: i32,
    pub channel_count: i32,
    pub frame_count: i64,
}

/// Parameters common to all effects, given at open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParameterCommon {
    pub session: i32,
    pub io_handle: i32,
    pub input: AudioConfig,
    pub output: AudioConfig,
}

/// Processing context of an opened effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectContext {
    pub status_fmq_depth: usize,
    pub common: ParameterCommon,
}

impl EffectContext {
    pub fn new(status_fmq_depth: usize, common: ParameterCommon) -> Self {
        Self { status_fmq_depth, common }
    }
}

pub const STATUS_OK: i32 = 0;
pub const BAD_VALUE: i32 = -22;

/// Result of one processing pass, in samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStatus {
    pub status: i32,
    pub fmq_consumed: usize,
    pub fmq_produced: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    #[error("illegal argument: {0}")]
    IllegalArgument(&'static str),
    #[error("illegal state: {0}")]
    IllegalState(&'static str),
}
