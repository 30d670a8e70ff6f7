use serde::{Deserialize, Serialize};

/// Sampling parameters sent with every completion request.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub json_response: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.8,
            max_output_tokens: 1600,
            json_response: true,
        }
    }
}

/// An instruction string plus the sampling it should be issued with. Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct PromptSpec {
    pub instruction: String,
    pub sampling: SamplingConfig,
}

impl PromptSpec {
    pub fn new(instruction: impl Into<String>, sampling: SamplingConfig) -> Self {
        Self {
            instruction: instruction.into(),
            sampling,
        }
    }
}
