use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("request timed out")]
    Timeout,

    #[error("provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned no text")]
    Empty,

    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

impl GenerationError {
    /// Whether a retry with backoff could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Timeout => true,
            GenerationError::Http(_) => true,
            GenerationError::Api { status, .. } => *status == 429 || *status >= 500,
            GenerationError::Empty => false,
            GenerationError::UnknownProvider(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_server_errors_are_transient() {
        assert!(GenerationError::Api { status: 429, message: String::new() }.is_transient());
        assert!(GenerationError::Api { status: 503, message: String::new() }.is_transient());
        assert!(!GenerationError::Api { status: 401, message: String::new() }.is_transient());
        assert!(GenerationError::Timeout.is_transient());
        assert!(!GenerationError::Empty.is_transient());
    }
}
