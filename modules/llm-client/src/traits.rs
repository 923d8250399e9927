use std::time::Duration;

use async_trait::async_trait;

use crate::error::GenerationError;

/// Generation settings passed with every request.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Wall-clock budget for the whole request.
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 256,
            timeout: Duration::from_secs(20),
        }
    }
}

/// Single-call, non-streaming text generation.
///
/// Every backend maps its wire protocol onto this one contract:
/// a prompt in, generated text out, or a `GenerationError`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GenerationError>;
}
