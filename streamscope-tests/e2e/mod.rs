//! End-to-end tests for Streamscope
//!
//! Requests go through the full router, catalog service, fetcher and cache
//! against a scripted upstream.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use streamscope_core::StreamscopeConfig;
use streamscope_core::catalog::{
    CatalogCache, CatalogService, ContentType, MockProvider, ProviderError, StreamingService,
    Title, rated_title,
};
use streamscope_web::{AppState, build_router};
use tower::ServiceExt;

fn app(provider: Arc<MockProvider>) -> Router {
    let config = StreamscopeConfig::for_testing();
    let catalog = CatalogService::new(provider, Arc::new(CatalogCache::new()), config.fetch_policy());
    build_router(AppState::new(catalog, config.catalog))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn ranked_movies() -> Vec<Title> {
    [
        ("m1", 7.0, 10),
        ("m2", 8.5, 50),
        ("m3", 6.0, 5),
        ("m4", 9.3, 100),
        ("m5", 8.5, 80),
    ]
    .into_iter()
    .map(|(id, rating, votes)| {
        rated_title(id, Some(&format!("tt-{id}")), ContentType::Movie, Some(rating), Some(votes))
    })
    .collect()
}

#[tokio::test]
async fn test_top_two_movies_ordered_by_rating_then_votes() {
    let provider = Arc::new(MockProvider::new().with_catalog(StreamingService::Disney, ranked_movies()));
    let app = app(provider.clone());

    let (status, body) = get(&app, "/top-movies/disney?limit=2").await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = body["titles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["m4", "m5"]);

    let (_, body) = get(&app, "/top-movies/disney?limit=3").await;
    let votes: Vec<u64> = body["titles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["vote_count"].as_u64().unwrap())
        .collect();
    assert_eq!(votes, vec![100, 80, 50]);

    // Both limits read the same cached catalog
    assert_eq!(provider.catalog_calls(StreamingService::Disney), 1);
}

#[tokio::test]
async fn test_catalog_pages_through_whole_listing() {
    let titles: Vec<Title> = (0..25)
        .map(|i| {
            rated_title(
                &format!("t{i:02}"),
                Some(&format!("tt{i:02}")),
                ContentType::Movie,
                Some(5.0 + (i % 5) as f32),
                Some(i),
            )
        })
        .collect();
    let provider = Arc::new(MockProvider::new().with_catalog(StreamingService::Peacock, titles));
    let app = app(provider.clone());

    let mut seen = Vec::new();
    for page in 1..=3 {
        let (status, body) = get(&app, &format!("/catalog/peacock?page={page}&page_size=10")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_results"], 25);
        assert_eq!(body["has_more"], page < 3);
        for item in body["items"].as_array().unwrap() {
            seen.push(item["id"].as_str().unwrap().to_string());
        }
    }

    assert_eq!(seen.len(), 25);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 25);
    assert_eq!(provider.catalog_calls(StreamingService::Peacock), 1);
}

#[tokio::test]
async fn test_recovery_after_upstream_outage() {
    let provider = Arc::new(MockProvider::new().with_failure(
        StreamingService::Hbo,
        ProviderError::Unavailable {
            reason: "maintenance".to_string(),
        },
    ));
    let app = app(provider.clone());

    let (status, _) = get(&app, "/stats/hbo").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    provider.clear_failure(StreamingService::Hbo);
    provider.set_catalog(StreamingService::Hbo, ranked_movies());

    let (status, body) = get(&app, "/stats/hbo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statistics"]["total_titles"], 5);
    assert_eq!(provider.catalog_calls(StreamingService::Hbo), 2);
}
