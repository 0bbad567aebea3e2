//! Error types for provider construction.

use thiserror::Error;

/// Errors that can occur while building a provider.
#[derive(Debug, Error)]
pub enum ProviderSetupError {
    /// The configured base URL could not be parsed.
    #[error("Invalid provider URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected URL
        url: String,
        /// The parse failure
        reason: String,
    },

    /// The client requires an API key but none was configured.
    #[error("Missing API key for the Streaming Availability API")]
    MissingApiKey,

    /// The underlying HTTP client could not be built.
    #[error("HTTP client setup failed: {reason}")]
    ClientBuild {
        /// The reason for the failure
        reason: String,
    },
}
