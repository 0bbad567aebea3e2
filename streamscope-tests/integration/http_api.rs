//! HTTP routes, validation and error rendering.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use streamscope_core::catalog::{MockProvider, ProviderError, StreamingService};

use crate::support::{get, post_json, router_with, three_service_provider};

#[tokio::test]
async fn test_upstream_errors_map_to_status_codes() {
    let provider = three_service_provider()
        .with_failure(
            StreamingService::Netflix,
            ProviderError::Unavailable {
                reason: "connection reset".to_string(),
            },
        )
        .with_failure(
            StreamingService::Prime,
            ProviderError::RateLimited {
                retry_after_secs: Some(30),
            },
        );
    let app = router_with(Arc::new(provider));

    let (status, body) = get(&app, "/top-movies/netflix").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_unavailable");
    assert_eq!(body["status_code"], 502);

    let (status, body) = get(&app, "/stats/prime").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "upstream_rate_limited");

    let (status, body) = get(&app, "/title/imdb/tt9999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_invalid_parameters_are_rejected() {
    let app = router_with(Arc::new(three_service_provider()));

    for uri in [
        "/catalog/netflix?page=0",
        "/catalog/netflix?page_size=101",
        "/catalog/netflix?min_rating=11",
        "/catalog/netflix?content_type=podcast",
        "/catalog/netflix?order_by=popularity",
        "/catalog/netflix?country=usa",
        "/top-movies/netflix?limit=101",
        "/top-movies?limit=26",
        "/top-rated?limit=51",
        "/compare?services=netflix",
        "/compare",
        "/search?q=",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "invalid_parameter", "{uri}");
    }

    let (status, body) = get(&app, "/catalog?services=netflix,tubi").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_service");
}

#[tokio::test]
async fn test_multi_catalog_marks_partial_results() {
    let provider = three_service_provider().with_failure(
        StreamingService::Hulu,
        ProviderError::Unavailable {
            reason: "timeout".to_string(),
        },
    );
    let app = router_with(Arc::new(provider));

    let (status, body) = get(&app, "/catalog?services=netflix,prime,hulu&page_size=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["partial"], true);
    assert_eq!(body["failures"][0]["service"], "hulu");
    assert_eq!(body["total_results"], 4);
    assert_eq!(body["has_more"], true);
    assert_eq!(body["items"][0]["id"], "n1");
    assert_eq!(body["items"][1]["id"], "shared");
}

#[tokio::test]
async fn test_inverted_rating_range_is_empty() {
    let provider = Arc::new(three_service_provider());
    let app = router_with(provider.clone());

    let (status, body) = get(&app, "/catalog/netflix?min_rating=9&max_rating=7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 0);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_search_via_query_and_body() {
    let provider = Arc::new(three_service_provider());
    let app = router_with(provider.clone());

    let (status, body) = get(&app, "/search?q=title%20n1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["titles"][0]["id"], "n1");

    let (status, body) = post_json(
        &app,
        "/search?country=gb",
        &json!({ "query": "title", "content_type": "series", "min_rating": 8.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["country"], "gb");
    assert_eq!(body["total_results"], 1);
    assert_eq!(body["titles"][0]["id"], "h1");

    let (status, body) = post_json(&app, "/search", &json!({ "services": ["netflix"] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_parameter");
}

#[tokio::test]
async fn test_repeated_requests_hit_the_cache() {
    let provider = Arc::new(MockProvider::new().with_catalog(
        StreamingService::Apple,
        vec![crate::support::movie("a1", "tt500", 7.9, 70)],
    ));
    let app = router_with(provider.clone());

    for _ in 0..3 {
        let (status, _) = get(&app, "/top-rated/apple").await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(provider.catalog_calls(StreamingService::Apple), 1);

    let (status, body) = get(&app, "/cache/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"], 1);
    assert_eq!(body["hit_count"], 2);
}

#[tokio::test]
async fn test_services_route_lists_every_service() {
    let app = router_with(Arc::new(MockProvider::new()));
    let (status, body) = get(&app, "/services").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 7);
    assert_eq!(body["services"][0]["id"], "netflix");
    assert_eq!(body["services"][0]["name"], "Netflix");
}
