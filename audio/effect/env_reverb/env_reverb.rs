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

use crate::types::*;
use std::sync::{Arc, Mutex};

/// Interface of an audio effect instance
pub trait IEffect: Send + Sync {
    fn descriptor(&self) -> Descriptor;

    fn set_parameter_specific(&self, specific: &Specific) -> Result<(), EffectError>;

    fn get_parameter_specific(&self, id: ParameterId) -> Result<Specific, EffectError>;

    /// Returns the processing context, created on first call
    fn create_context(&self, common: &ParameterCommon) -> Arc<EffectContext>;

    fn context(&self) -> Option<Arc<EffectContext>>;

    fn release_context(&self);

    /// Processes `samples` samples from `input` to `output`
    fn process(
        &self,
        input: &[f32],
        output: &mut [f32],
        samples: usize,
    ) -> Result<ProcessStatus, EffectError>;
}

pub(crate) const EFFECT_NAME: &str = "EnvReverbSw";
const STATUS_FMQ_DEPTH: usize = 1;

/// Software environmental reverb.
///
/// The reverb itself is not rendered: processing copies input to output.
#[derive(Default)]
pub struct EnvReverbSw {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    specific: EnvironmentalReverb,
    context: Option<Arc<EffectContext>>,
}

impl EnvReverbSw {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn static_descriptor() -> Descriptor {
        Descriptor {
            common: Common {
                id: Id {
                    type_uuid: ENV_REVERB_TYPE_UUID,
                    uuid: ENV_REVERB_SW_IMPL_UUID,
                    proxy: None,
                },
                flags: Flags {
                    flag_type: FlagType::Insert,
                    insert: FlagInsert::First,
                    volume: FlagVolume::Ctrl,
                },
                name: EFFECT_NAME.to_string(),
                implementor: "The Android Open Source Project".to_string(),
            },
            capability: Capability::EnvironmentalReverb(Default::default()),
        }
    }
}

impl IEffect for EnvReverbSw {
    fn descriptor(&self) -> Descriptor {
        let descriptor = Self::static_descriptor();
        log::debug!("descriptor: {:?}", descriptor);
        descriptor
    }

    fn set_parameter_specific(&self, specific: &Specific) -> Result<(), EffectError> {
        let Specific::EnvironmentalReverb(reverb) = specific else {
            log::error!("set_parameter_specific: {:?} not supported", specific);
            return Err(EffectError::IllegalArgument("EffectNotSupported"));
        };

        self.state.lock().unwrap().specific = *reverb;
        log::debug!("set_parameter_specific: success with {:?}", reverb);
        Ok(())
    }

    fn get_parameter_specific(&self, id: ParameterId) -> Result<Specific, EffectError> {
        if id != ParameterId::EnvironmentalReverbTag {
            log::error!("get_parameter_specific: wrong id {:?}", id);
            return Err(EffectError::IllegalArgument("wrongIdTag"));
        }
        Ok(Specific::EnvironmentalReverb(self.state.lock().unwrap().specific))
    }

    fn create_context(&self, common: &ParameterCommon) -> Arc<EffectContext> {
        let mut state = self.state.lock().unwrap();
        if let Some(context) = state.context.clone() {
            log::debug!("create_context: context already exists");
            return context;
        }

        let context = Arc::new(EffectContext::new(STATUS_FMQ_DEPTH, *common));
        state.context = Some(context.clone());
        context
    }

    fn context(&self) -> Option<Arc<EffectContext>> {
        self.state.lock().unwrap().context.clone()
    }

    fn release_context(&self) {
        self.state.lock().unwrap().context = None;
    }

    fn process(
        &self,
        input: &[f32],
        output: &mut [f32],
        samples: usize,
    ) -> Result<ProcessStatus, EffectError> {
        if self.state.lock().unwrap().context.is_none() {
            return Err(EffectError::IllegalState("contextNotCreated"));
        }

        log::debug!("process: {} samples", samples);
        if input.len() < samples || output.len() < samples {
            log::error!(
                "process: {} samples, with buffers of {} in and {} out",
                samples,
                input.len(),
                output.len()
            );
            return Ok(ProcessStatus { status: BAD_VALUE, fmq_consumed: 0, fmq_produced: 0 });
        }

        output[..samples].copy_from_slice(&input[..samples]);
        Ok(ProcessStatus { status: STATUS_OK, fmq_consumed: samples, fmq_produced: samples })
    }
}
