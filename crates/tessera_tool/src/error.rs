//! Error types for provider registration and dispatch.

use thiserror::Error;

/// Errors raised while registering or running providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A provider with this name is already in the repository.
    #[error("provider '{0}' is already registered")]
    DuplicateProvider(String),

    /// No provider with this name is registered.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The provider does not expose the requested action.
    #[error("provider '{provider}' has no action '{action}'")]
    UnknownAction {
        /// Provider name.
        provider: String,
        /// Requested action.
        action: String,
    },

    /// The provider was used before a registry was injected.
    #[error("no registry has been set on the provider")]
    RegistryMissing,

    /// The request lacks the named field needed for dispatch.
    #[error("request does not name a {0}")]
    IncompleteRequest(&'static str),

    /// Request parameters could not be decoded.
    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] serde_json::Error),

    /// The action ran and failed.
    #[error("action failed: {0}")]
    Failed(String),
}

impl ProviderError {
    /// Creates a [`Failed`](Self::Failed) error.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}
