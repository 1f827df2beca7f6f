use meridian_providers::ProviderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeridianError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("No location found for {0:?}")]
    NoResult(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MeridianError {
    /// Internal supersession bookkeeping, never shown to a user.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Provider(ProviderError::Cancelled))
    }

    /// The one user-facing message for this failure. Transport problems get a
    /// generic retry suggestion; permission refusals carry the remediation
    /// hint the provider attached when its breaker tripped.
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(ProviderError::Transport(_)) => {
                "Search is unavailable right now. Check your connection and try again.".to_owned()
            }
            Self::Provider(ProviderError::Permission(detail)) => detail.clone(),
            Self::NoResult(_) => "No location found. Try a more specific search.".to_owned(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MeridianError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_get_a_retry_message() {
        let err = MeridianError::from(ProviderError::Transport("connection reset".to_owned()));
        assert!(err.user_message().contains("try again"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn permission_failures_keep_the_remediation_hint() {
        let err = MeridianError::from(ProviderError::Permission(
            "check that the API key is valid".to_owned(),
        ));
        assert!(err.user_message().contains("API key"));
    }

    #[test]
    fn no_result_has_a_fixed_message() {
        let err = MeridianError::NoResult("xyzzy".to_owned());
        assert_eq!(
            err.user_message(),
            "No location found. Try a more specific search."
        );
    }

    #[test]
    fn cancellation_is_internal_only() {
        let err = MeridianError::from(ProviderError::Cancelled);
        assert!(err.is_cancelled());
    }
}
