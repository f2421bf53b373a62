use crate::config::MelodyConfig;
use crate::error::MelodyError;
use crate::pipeline::defaults::{LogPitchTransitionModel, ViterbiPathDecoder};
use crate::pipeline::runtime::{MelodyDecoder, MelodyDecoderParts};
use crate::pipeline::traits::{PathDecoder, TransitionModel};

pub struct MelodyDecoderBuilder {
    config: MelodyConfig,
    transition_model: Option<Box<dyn TransitionModel>>,
    path_decoder: Option<Box<dyn PathDecoder>>,
}

impl MelodyDecoderBuilder {
    pub fn new(config: MelodyConfig) -> Self {
        Self {
            config,
            transition_model: None,
            path_decoder: None,
        }
    }

    pub fn with_transition_model(mut self, transition_model: Box<dyn TransitionModel>) -> Self {
        self.transition_model = Some(transition_model);
        self
    }

    pub fn with_path_decoder(mut self, path_decoder: Box<dyn PathDecoder>) -> Self {
        self.path_decoder = Some(path_decoder);
        self
    }

    pub fn build(self) -> Result<MelodyDecoder, MelodyError> {
        self.config.validate()?;

        Ok(MelodyDecoder::from_parts(MelodyDecoderParts {
            config: self.config,
            transition_model: self
                .transition_model
                .unwrap_or_else(|| Box::new(LogPitchTransitionModel)),
            path_decoder: self
                .path_decoder
                .unwrap_or_else(|| Box::new(ViterbiPathDecoder)),
        }))
    }
}
