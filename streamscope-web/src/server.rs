//! JSON API server for Streamscope
//!
//! Builds the catalog service from configuration, wires the routes, and
//! serves them until interrupted.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::get;
use streamscope_core::catalog::{CatalogCache, CatalogService};
use streamscope_core::config::CatalogConfig;
use streamscope_core::{StreamscopeConfig, StreamscopeError};
use streamscope_provider::{ProviderSetupError, build_provider};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handlers::{
    cache_stats, catalog_for_service, compare_services, health, multi_catalog, search_get,
    search_post, service_stats, services, title_by_imdb_id, top_movies_all,
    top_movies_for_service, top_rated_all, top_rated_for_service,
};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Catalog operations backed by the shared cache
    pub catalog: CatalogService,
    /// Defaults and per-route limits
    pub settings: Arc<CatalogConfig>,
    /// When the state was built, reported as uptime
    pub server_started_at: Instant,
}

impl AppState {
    /// Creates state around an existing catalog service.
    pub fn new(catalog: CatalogService, settings: CatalogConfig) -> Self {
        Self {
            catalog,
            settings: Arc::new(settings),
            server_started_at: Instant::now(),
        }
    }
}

/// Errors that prevent the server from starting or keep it from serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration failed validation
    #[error(transparent)]
    Config(#[from] StreamscopeError),

    /// Upstream client could not be created
    #[error(transparent)]
    Provider(#[from] ProviderSetupError),

    /// Binding or serving failed
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Router with every API route, tracing and permissive CORS.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/services", get(services))
        .route("/catalog", get(multi_catalog))
        .route("/catalog/{service}", get(catalog_for_service))
        .route("/top-movies", get(top_movies_all))
        .route("/top-movies/{service}", get(top_movies_for_service))
        .route("/top-rated", get(top_rated_all))
        .route("/top-rated/{service}", get(top_rated_for_service))
        .route("/search", get(search_get).post(search_post))
        .route("/title/imdb/{imdb_id}", get(title_by_imdb_id))
        .route("/compare", get(compare_services))
        .route("/stats/{service}", get(service_stats))
        .route("/cache/stats", get(cache_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the API server and runs until Ctrl-C.
///
/// Without an API key the server answers from the built-in demo catalog.
///
/// # Errors
/// - `ServerError::Config` - Invalid configuration
/// - `ServerError::Provider` - Upstream client setup failed
/// - `ServerError::Io` - Could not bind the listen address
pub async fn run_server(config: StreamscopeConfig) -> Result<(), ServerError> {
    config.validate()?;

    let provider = build_provider(&config.provider)?;
    let cache = Arc::new(CatalogCache::new());
    let sweeper = cache.spawn_sweeper(config.cache.sweep_interval, config.cache.stale_grace);
    let catalog = CatalogService::new(provider, cache, config.fetch_policy());
    let app = build_router(AppState::new(catalog, config.catalog.clone()));

    let listener = TcpListener::bind(config.server.socket_addr()).await?;
    info!(
        address = %listener.local_addr()?,
        demo_data = config.provider.uses_demo_data(),
        cache_ttl_secs = config.cache.ttl.as_secs(),
        "Streamscope API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C, serving until killed");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use streamscope_core::catalog::{ContentType, MockProvider, StreamingService, rated_title};
    use tower::ServiceExt;

    use super::*;

    fn state_with(provider: MockProvider) -> AppState {
        let config = StreamscopeConfig::for_testing();
        let catalog = CatalogService::new(
            Arc::new(provider),
            Arc::new(CatalogCache::new()),
            config.fetch_policy(),
        );
        AppState::new(catalog, config.catalog)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_lists_services() {
        let app = build_router(state_with(MockProvider::new()));
        let (status, body) = get_json(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(
            body["services_supported"].as_array().unwrap().len(),
            StreamingService::ALL.len()
        );
    }

    #[tokio::test]
    async fn test_catalog_route_returns_page() {
        let provider = MockProvider::new().with_catalog(
            StreamingService::Netflix,
            vec![
                rated_title("a", Some("tt1"), ContentType::Movie, Some(7.0), Some(10)),
                rated_title("b", Some("tt2"), ContentType::Series, Some(9.0), Some(10)),
            ],
        );
        let app = build_router(state_with(provider));
        let (status, body) = get_json(app, "/catalog/netflix?page_size=1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_results"], 2);
        assert_eq!(body["has_more"], true);
        assert_eq!(body["items"][0]["id"], "b");
    }

    #[tokio::test]
    async fn test_unknown_service_is_bad_request() {
        let app = build_router(state_with(MockProvider::new()));
        let (status, body) = get_json(app, "/top-movies/tubi").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_service");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = build_router(state_with(MockProvider::new()));
        let response = app
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
