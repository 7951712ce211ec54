//! Generator seam for answer generation
//!
//! The language model is an external collaborator; this trait is the only
//! contract the pipeline depends on. Instruction-tuned chat models plug in
//! behind it.

use anyhow::Result;

/// Sampling parameters for generation
#[derive(Debug, Clone)]
pub struct SamplingParams {
    /// Sampling temperature
    pub temperature: f64,
    /// Nucleus sampling probability mass
    pub top_p: f64,
    /// Maximum number of tokens to generate
    pub max_tokens: usize,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.95,
            max_tokens: 512,
        }
    }
}

/// Trait for text generation models
pub trait Generator: Send + Sync {
    /// Generate a response given a prompt
    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_params_defaults() {
        let params = SamplingParams::default();

        assert!(params.temperature > 0.0);
        assert_eq!(params.max_tokens, 512);
    }
}
