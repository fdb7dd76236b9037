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
use std::time::Duration;
use thiserror::Error;

/// Retry budget of a `ConvergencePoller`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Count of attempts before giving up
    pub max_attempts: usize,
    /// Timeout of each retrieval from the queue
    pub retrieve_timeout: Duration,
}

/// The retry budget is exhausted, and the condition never held
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{what} not observed after {attempts} attempts")]
pub struct ConvergenceError {
    pub what: String,
    pub attempts: usize,
}

/// Drives repeated control actions against the service until an event
/// satisfying a predicate shows up in `queue`.
pub struct ConvergencePoller<'q, T> {
    queue: &'q CallbackQueue<T>,
    config: PollerConfig,
}

impl<'q, T> ConvergencePoller<'q, T> {
    pub fn new(queue: &'q CallbackQueue<T>, config: PollerConfig) -> Self {
        Self { queue, config }
    }

    /// Runs up to `max_attempts` attempts, and returns the 1-based index of the
    /// attempt that satisfied `predicate`.
    ///
    /// Each attempt calls `on_each_attempt` with the attempt index; it performs
    /// the control action (typically: clear the queues, restart the stream and
    /// await a few fixes) and returns how many events to read back. Events are
    /// then retrieved one by one, and the attempt ends at the first event
    /// satisfying `predicate`, at the first retrieval timeout, or once all the
    /// events are read.
    ///
    /// An error of `on_each_attempt` is returned immediately, without retry.
    pub fn await_condition<E, A, P>(
        &self,
        what: &str,
        mut on_each_attempt: A,
        mut predicate: P,
    ) -> Result<usize, E>
    where
        E: From<ConvergenceError>,
        A: FnMut(usize) -> Result<usize, E>,
        P: FnMut(&T) -> bool,
    {
        for attempt in 1..=self.config.max_attempts {
            let count = on_each_attempt(attempt)?;

            for _ in 0..count {
                let Ok(event) = self.queue.retrieve(self.config.retrieve_timeout) else {
                    break;
                };
                if predicate(&event) {
                    log::debug!("{} observed on attempt {}", what, attempt);
                    return Ok(attempt);
                }
            }

            log::debug!(
                "{} not observed, {} attempts remaining",
                what,
                self.config.max_attempts - attempt
            );
        }

        log::error!("{} not observed after {} attempts", what, self.config.max_attempts);
        Err(ConvergenceError { what: what.to_string(), attempts: self.config.max_attempts }.into())
    }
}
