//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use streamscope_core::StreamscopeConfig;
use streamscope_core::catalog::{
    CatalogCache, CatalogProvider, CatalogService, ContentType, MockProvider, StreamingService,
    Title, rated_title,
};
use streamscope_web::{AppState, build_router};
use tower::ServiceExt;

pub fn catalog_with(provider: Arc<dyn CatalogProvider>) -> CatalogService {
    let config = StreamscopeConfig::for_testing();
    CatalogService::new(provider, Arc::new(CatalogCache::new()), config.fetch_policy())
}

pub fn router_with(provider: Arc<dyn CatalogProvider>) -> Router {
    let config = StreamscopeConfig::for_testing();
    build_router(AppState::new(catalog_with(provider), config.catalog))
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Movie with a title derived from its id.
pub fn movie(id: &str, imdb_id: &str, rating: f32, votes: u32) -> Title {
    rated_title(id, Some(imdb_id), ContentType::Movie, Some(rating), Some(votes))
}

pub fn series(id: &str, imdb_id: &str, rating: f32, votes: u32) -> Title {
    rated_title(id, Some(imdb_id), ContentType::Series, Some(rating), Some(votes))
}

/// Three services, with `shared` available on all of them.
pub fn three_service_provider() -> MockProvider {
    MockProvider::new()
        .with_catalog(
            StreamingService::Netflix,
            vec![
                movie("shared", "tt100", 8.0, 500),
                movie("n1", "tt101", 9.1, 900),
                series("n2", "tt102", 7.4, 100),
            ],
        )
        .with_catalog(
            StreamingService::Prime,
            vec![movie("shared", "tt100", 8.0, 500), movie("p1", "tt201", 6.5, 40)],
        )
        .with_catalog(
            StreamingService::Hulu,
            vec![movie("shared", "tt100", 8.0, 500), series("h1", "tt301", 8.8, 300)],
        )
}
