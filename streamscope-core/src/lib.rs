//! Streamscope Core - Streaming catalog caching and aggregation
//!
//! Fronts a rate-limited catalog provider with a time-bounded cache and
//! builds per-service and cross-service views (top lists, search,
//! comparisons, statistics) on top of the cached catalogs.

pub mod catalog;
pub mod config;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use catalog::{CatalogError, CatalogProvider, CatalogService, ProviderError, StreamingService};
pub use config::StreamscopeConfig;

/// Errors that can bubble up from any Streamscope subsystem.
#[derive(Debug, thiserror::Error)]
pub enum StreamscopeError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamscopeError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            StreamscopeError::Catalog(e) => match e {
                CatalogError::InvalidService { service } => {
                    let supported: Vec<&str> =
                        StreamingService::ALL.iter().map(|s| s.id()).collect();
                    format!(
                        "Unknown streaming service '{service}'. Supported: {}",
                        supported.join(", ")
                    )
                }
                CatalogError::InvalidParameter { name, reason } => {
                    format!("Invalid value for {name}: {reason}")
                }
                CatalogError::NotFound { what } => format!("Nothing found for {what}"),
                CatalogError::UpstreamRateLimited { .. } => {
                    "Catalog provider rate limit reached, try again later".to_string()
                }
                CatalogError::UpstreamUnavailable { .. } => {
                    "Catalog provider is currently unavailable".to_string()
                }
            },
            StreamscopeError::Configuration { reason } => format!("Configuration error: {reason}"),
            StreamscopeError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        match self {
            StreamscopeError::Catalog(e) => e.is_caller_error(),
            StreamscopeError::Configuration { .. } => true,
            StreamscopeError::Io(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StreamscopeError>;
