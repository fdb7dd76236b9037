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

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Queue of events delivered by a callback of the service under test.
///
/// The service stores events from its own thread; the scenario thread
/// retrieves them in FIFO order, blocking at most for the given timeout.
pub struct CallbackQueue<T> {
    name: &'static str,
    state_cvar: (Mutex<State<T>>, Condvar),
}

struct State<T> {
    /// Events stored and not yet retrieved
    events: VecDeque<T>,

    /// Count of `store()` calls since creation or last `reset()`
    called_count: usize,
}

/// No event has been stored within the timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut {
    pub queue: &'static str,
    pub timeout: Duration,
}

impl fmt::Display for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no {} event within {:?}", self.queue, self.timeout)
    }
}

impl std::error::Error for TimedOut {}

impl<T> CallbackQueue<T> {
    pub fn new(name: &'static str) -> Self {
        let state = State { events: VecDeque::new(), called_count: 0 };
        Self { name, state_cvar: (Mutex::new(state), Condvar::new()) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Appends an event, and wakes up a waiting consumer.
    pub fn store(&self, event: T) {
        let (state, cvar) = &self.state_cvar;
        let mut state = state.lock().unwrap();
        state.events.push_back(event);
        state.called_count += 1;
        cvar.notify_one();
    }

    /// Removes the oldest event, waiting up to `timeout` for one to be stored.
    pub fn retrieve(&self, timeout: Duration) -> Result<T, TimedOut> {
        let (state, cvar) = &self.state_cvar;
        let state = state.lock().unwrap();
        let (mut state, _) =
            cvar.wait_timeout_while(state, timeout, |state| state.events.is_empty()).unwrap();

        match state.events.pop_front() {
            Some(event) => Ok(event),
            None => {
                log::debug!("Timed out after {:?} waiting for {}", timeout, self.name);
                Err(TimedOut { queue: self.name, timeout })
            }
        }
    }

    /// Removes up to `count` events, each waited for up to `timeout`.
    /// Stops at the first timeout; the number of events returned tells how many
    /// were received.
    pub fn retrieve_many(&self, count: usize, timeout: Duration) -> Vec<T> {
        let mut events = Vec::new();
        while events.len() < count {
            match self.retrieve(timeout) {
                Ok(event) => events.push(event),
                Err(_) => break,
            }
        }
        events
    }

    /// Drops the pending events and zeroes the called count, so that events of
    /// a previous phase cannot satisfy a later wait.
    pub fn reset(&self) {
        let (state, _) = &self.state_cvar;
        let mut state = state.lock().unwrap();
        state.events.clear();
        state.called_count = 0;
    }

    /// Count of events pending retrieval
    pub fn size(&self) -> usize {
        let (state, _) = &self.state_cvar;
        state.lock().unwrap().events.len()
    }

    /// Count of events stored since creation or last `reset()`
    pub fn called_count(&self) -> usize {
        let (state, _) = &self.state_cvar;
        state.lock().unwrap().called_count
    }
}
