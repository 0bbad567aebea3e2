//! Error types for catalog operations and upstream providers.

use serde::{Deserialize, Serialize};

/// Failures reported by a `CatalogProvider` implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Provider rate limit exceeded")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Not found upstream: {what}")]
    NotFound { what: String },

    #[error("Invalid provider response: {reason}")]
    InvalidResponse { reason: String },
}

/// Errors surfaced by the catalog core to its callers.
///
/// Cloneable so a single coalesced upstream failure can be handed to every
/// waiting caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Upstream provider unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    #[error("Upstream provider rate limit exceeded")]
    UpstreamRateLimited { retry_after_secs: Option<u64> },

    #[error("Invalid streaming service: {service}")]
    InvalidService { service: String },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Not found: {what}")]
    NotFound { what: String },
}

/// Stable, serializable name for each error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UpstreamUnavailable,
    UpstreamRateLimited,
    InvalidService,
    InvalidParameter,
    NotFound,
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            CatalogError::UpstreamRateLimited { .. } => ErrorKind::UpstreamRateLimited,
            CatalogError::InvalidService { .. } => ErrorKind::InvalidService,
            CatalogError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            CatalogError::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    /// Whether an expired cache entry may be served instead of this error.
    pub fn allows_stale_fallback(&self) -> bool {
        matches!(self, CatalogError::UpstreamUnavailable { .. })
    }

    /// Checks if this error was caused by the caller's input.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            CatalogError::InvalidService { .. } | CatalogError::InvalidParameter { .. }
        )
    }

    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        CatalogError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ProviderError> for CatalogError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Unavailable { reason } => CatalogError::UpstreamUnavailable { reason },
            ProviderError::InvalidResponse { reason } => CatalogError::UpstreamUnavailable {
                reason: format!("invalid response: {reason}"),
            },
            ProviderError::RateLimited { retry_after_secs } => {
                CatalogError::UpstreamRateLimited { retry_after_secs }
            }
            ProviderError::NotFound { what } => CatalogError::NotFound { what },
        }
    }
}
