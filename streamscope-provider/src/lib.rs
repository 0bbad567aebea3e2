//! Streamscope Provider - Upstream catalog sources

#![deny(missing_docs)]
#![deny(clippy::missing_errors_doc)]
//!
//! Implements `CatalogProvider` for the Streaming Availability API and for
//! an offline demo catalog, and picks one of them from configuration.

pub mod dto;
pub mod errors;
pub mod providers;

use std::sync::Arc;

use streamscope_core::CatalogProvider;
use streamscope_core::config::ProviderConfig;

pub use errors::ProviderSetupError;
pub use providers::{DemoProvider, StreamingAvailabilityClient};

/// Builds the provider selected by configuration.
///
/// Without an API key the demo catalog is used.
///
/// # Errors
///
/// - `ProviderSetupError` - If the HTTP client cannot be constructed
pub fn build_provider(
    config: &ProviderConfig,
) -> Result<Arc<dyn CatalogProvider>, ProviderSetupError> {
    if config.uses_demo_data() {
        tracing::warn!("RAPIDAPI_KEY not set, serving the built-in demo catalog");
        return Ok(Arc::new(DemoProvider::new()));
    }

    let client = StreamingAvailabilityClient::new(config)?;
    tracing::info!(base_url = %client.base_url(), "Using Streaming Availability API");
    Ok(Arc::new(client))
}
