mod backoff;
mod claude;
mod error;
mod openai;
mod traits;

pub use backoff::BackoffPolicy;
pub use claude::Claude;
pub use error::GenerationError;
pub use openai::OpenAi;
pub use traits::{GenerationConfig, TextGenerator};

use std::str::FromStr;

/// A configured provider backend, dispatched by identifier at runtime.
///
/// One variant per backend, all conforming to the same
/// `TextGenerator` contract.
#[derive(Clone)]
pub enum Provider {
    Claude(Claude),
    OpenAi(OpenAi),
}

/// Provider identifier as it appears in run requests ("claude", "openai").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderId {
    Claude,
    OpenAi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Claude => "claude",
            ProviderId::OpenAi => "openai",
        }
    }
}

impl FromStr for ProviderId {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Ok(ProviderId::Claude),
            "openai" | "gpt" => Ok(ProviderId::OpenAi),
            other => Err(GenerationError::UnknownProvider(other.to_string())),
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Provider {
    pub fn id(&self) -> ProviderId {
        match self {
            Provider::Claude(_) => ProviderId::Claude,
            Provider::OpenAi(_) => ProviderId::OpenAi,
        }
    }
}

#[async_trait::async_trait]
impl TextGenerator for Provider {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        match self {
            Provider::Claude(c) => c.generate(prompt, config).await,
            Provider::OpenAi(o) => o.generate(prompt, config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_parses_aliases() {
        assert_eq!("claude".parse::<ProviderId>().unwrap(), ProviderId::Claude);
        assert_eq!("Anthropic".parse::<ProviderId>().unwrap(), ProviderId::Claude);
        assert_eq!("openai".parse::<ProviderId>().unwrap(), ProviderId::OpenAi);
        assert!("mistral".parse::<ProviderId>().is_err());
    }

    #[test]
    fn provider_reports_its_id() {
        let p = Provider::Claude(Claude::new("sk-ant-test", "claude-haiku-4-5"));
        assert_eq!(p.id(), ProviderId::Claude);
        assert_eq!(p.id().to_string(), "claude");
    }
}
