use thiserror::Error;

/// Failure taxonomy shared by every provider client.
///
/// `Cancelled` is internal bookkeeping and is never shown to a user; the
/// adapter contract is that a cancelled call resolves to an empty result
/// instead of an error, so this variant only appears on paths (like the
/// debounce wait) that need to distinguish supersession from success.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request cancelled")]
    Cancelled,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("provider refused the request: {0}")]
    Permission(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
