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

//! GNSS HAL conformance scenarios
//!
//! The scenarios drive a GNSS service through its streaming, configuration,
//! debug and power interfaces, and assert on what comes back through the
//! callbacks registered by this crate:
//!
//! ```text
//!        scenario                     service under test
//!      ____________                     ______________
//!     |  poller    |  start/stop/      |              |
//!     |            |  set_blocklist    |              |
//!     |   ---------|------------------>|              |
//!     |            |                   |              |
//!     |  checks    |    callbacks      |              |
//!     |   <--------|-- queue <---------|--  producer  |
//!     |____________|                   |______________|
//! ```
//!
//! The callback queue is the only point of synchronization between the
//! scenario thread and the service's producer thread.

mod callback_queue;
mod callbacks;
mod cases;
mod checks;
mod config;
mod error;
mod event_source;
mod hal;
mod poller;
mod scenario;
mod types;

#[cfg(test)]
mod tests;

pub use callback_queue::{CallbackQueue, TimedOut};
pub use callbacks::{
    GnssCallback, GnssCallbackLegacy, GnssMeasurementCallback, GnssPowerIndicationCallback,
};
pub use cases::{find_scenario, run_scenario, run_scenarios, Scenario, ScenarioReport, SCENARIOS};
pub use checks::*;
pub use config::VtsConfig;
pub use error::{Outcome, ScenarioError};
pub use event_source::{connect, AidlEventSource, EventSource, LegacyEventSource};
pub use hal::*;
pub use poller::{ConvergenceError, ConvergencePoller, PollerConfig};
pub use scenario::{find_strong_frequent_non_gps_source, Connection, ScenarioContext};
pub use types::*;

/// Inits logging for Android
#[cfg(target_os = "android")]
pub fn init_logging() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_tag("GnssHalTestCases")
            .with_max_level(log::LevelFilter::Debug),
    );
}

/// Inits logging for host
#[cfg(not(target_os = "android"))]
pub fn init_logging() {
    env_logger::Builder::new().parse_default_env().try_init().ok();
}
