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

use crate::callback_queue::TimedOut;
use crate::checks::CheckError;
use crate::hal::HalError;
use crate::poller::ConvergenceError;
use std::time::Duration;
use thiserror::Error;

/// Successful end of a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// A capability or extension the scenario relies on is not supported
    Skipped(String),
}

/// Failure of a scenario.
///
/// A failing call into the service (`Transport`) is kept apart from a retry
/// loop running out of attempts (`Convergence`): the former is a broken
/// contract, the latter usually a lack of signal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScenarioError {
    #[error("call to the service failed: {0}")]
    Transport(#[from] HalError),
    #[error(transparent)]
    Convergence(#[from] ConvergenceError),
    #[error("invalid value: {0}")]
    Check(#[from] CheckError),
    #[error("no {queue} event within {timeout:?}")]
    Timeout { queue: &'static str, timeout: Duration },
    #[error("extension {0} not provided")]
    MissingExtension(&'static str),
    #[error("{0}")]
    Expectation(String),
}

impl From<TimedOut> for ScenarioError {
    fn from(e: TimedOut) -> Self {
        ScenarioError::Timeout { queue: e.queue, timeout: e.timeout }
    }
}

/// Fails the scenario with `ScenarioError::Expectation` unless `cond` holds.
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            let message = format!($($arg)+);
            log::error!("{}", message);
            return Err($crate::error::ScenarioError::Expectation(message).into());
        }
    };
}

pub(crate) use ensure;
