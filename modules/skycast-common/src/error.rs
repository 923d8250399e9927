use thiserror::Error;

/// Pipeline error taxonomy.
///
/// Only `Input` and `UpstreamFetch` surface as failed runs. The rest
/// are recovered internally via retry or fallback and never escape
/// the engine boundary.
#[derive(Error, Debug)]
pub enum SkycastError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(String),

    #[error("no candidate pair satisfies the exclusion rules")]
    SelectionExhausted,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl SkycastError {
    /// Whether this error marks the whole run as failed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SkycastError::Input(_) | SkycastError::UpstreamFetch(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_input_and_upstream_are_terminal() {
        assert!(SkycastError::Input("bad".into()).is_terminal());
        assert!(SkycastError::UpstreamFetch("down".into()).is_terminal());
        assert!(!SkycastError::SelectionExhausted.is_terminal());
        assert!(!SkycastError::Validation("too long".into()).is_terminal());
        assert!(!SkycastError::Provider("timeout".into()).is_terminal());
    }
}
