use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // AI providers
    pub anthropic_api_key: String,
    pub openai_api_key: String,

    // Models
    pub claude_model: String,
    pub openai_model: String,

    // Pipeline
    pub locations: Vec<String>,
    pub default_provider: String,
    pub llm_timeout_secs: u64,
    pub forecast_ttl_hours: u64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: required_env("ANTHROPIC_API_KEY"),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            claude_model: env::var("SKYCAST_CLAUDE_MODEL")
                .unwrap_or_else(|_| "claude-haiku-4-5".to_string()),
            openai_model: env::var("SKYCAST_OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            locations: env::var("SKYCAST_LOCATIONS")
                .unwrap_or_else(|_| "tokyo".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            default_provider: env::var("SKYCAST_PROVIDER").unwrap_or_else(|_| "claude".to_string()),
            llm_timeout_secs: env::var("SKYCAST_LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .expect("SKYCAST_LLM_TIMEOUT_SECS must be a number"),
            forecast_ttl_hours: env::var("SKYCAST_FORECAST_TTL_HOURS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .expect("SKYCAST_FORECAST_TTL_HOURS must be a number"),
        }
    }

    /// Log config with secrets redacted.
    pub fn log_redacted(&self) {
        tracing::info!(
            claude_model = %self.claude_model,
            openai_model = %self.openai_model,
            provider = %self.default_provider,
            locations = ?self.locations,
            llm_timeout_secs = self.llm_timeout_secs,
            forecast_ttl_hours = self.forecast_ttl_hours,
            "Config loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
