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

//! Software environmental reverb effect
//!
//! Exposes the effect factory entry points, `create_effect` and
//! `query_effect`, for the implementation UUID of the software reverb.

mod env_reverb;
mod types;


pub use env_reverb::{EnvReverbSw, IEffect};
pub use types::*;

use std::sync::Arc;

fn check_uuid(uuid: Option<&AudioUuid>) -> Result<(), EffectError> {
    match uuid {
        Some(uuid) if *uuid == ENV_REVERB_SW_IMPL_UUID => Ok(()),
        _ => {
            log::error!("uuid {:?} not supported", uuid.map(|u| u.to_string()));
            Err(EffectError::IllegalArgument("uuid not supported"))
        }
    }
}

/// Creates an instance of the effect implemented with `uuid`
pub fn create_effect(uuid: Option<&AudioUuid>) -> Result<Arc<dyn IEffect>, EffectError> {
    check_uuid(uuid)?;
    log::debug!("create_effect: instance created");
    Ok(Arc::new(EnvReverbSw::new()))
}

/// Returns the descriptor of the effect implemented with `uuid`
pub fn query_effect(uuid: Option<&AudioUuid>) -> Result<Descriptor, EffectError> {
    check_uuid(uuid)?;
    Ok(EnvReverbSw::static_descriptor())
}

/// Inits logging for Android
#[cfg(target_os = "android")]
pub fn init_logging() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_tag("AHAL_EnvReverbSw")
            .with_max_level(log::LevelFilter::Debug),
    );
}

/// Inits logging for host
#[cfg(not(target_os = "android"))]
pub fn init_logging() {
    env_logger::Builder::new().parse_default_env().try_init().ok();
}
