//! The offline demo provider served through the full router.

use std::sync::Arc;

use axum::http::StatusCode;
use streamscope_provider::DemoProvider;

use crate::support::{get, router_with};

#[tokio::test]
async fn test_top_movies_from_demo_catalog() {
    let app = router_with(Arc::new(DemoProvider::new()));
    let (status, body) = get(&app, "/top-movies/netflix?limit=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service_name"], "Netflix");
    let titles: Vec<&str> = body["titles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["The Shawshank Redemption", "The Dark Knight"]);
}

#[tokio::test]
async fn test_fractional_min_rating_is_not_served_from_a_stricter_entry() {
    let app = router_with(Arc::new(DemoProvider::new()));
    let titles = |body: &serde_json::Value| -> Vec<String> {
        body["titles"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, strict) = get(&app, "/top-movies/disney?min_rating=8.34").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&strict), vec!["Avengers: Endgame", "Coco"]);

    let (status, loose) = get(&app, "/top-movies/disney?min_rating=8.26").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&loose), vec!["Avengers: Endgame", "Coco", "Toy Story"]);
}

#[tokio::test]
async fn test_compare_demo_services() {
    let app = router_with(Arc::new(DemoProvider::new()));
    let (status, body) = get(&app, "/compare?services=netflix,hbo").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["partial"], false);
    assert_eq!(body["overlap_stats"]["unique_titles"], 12);
    assert_eq!(body["overlap_stats"]["multi_service_titles"], 2);
    assert_eq!(body["overlap_stats"]["all_services_titles"], 2);
    assert_eq!(body["services"][0]["total_titles"], 6);
    assert_eq!(body["services"][1]["total_titles"], 8);
}

#[tokio::test]
async fn test_demo_service_statistics() {
    let app = router_with(Arc::new(DemoProvider::new()));
    let (status, body) = get(&app, "/stats/apple").await;

    assert_eq!(status, StatusCode::OK);
    let stats = &body["statistics"];
    assert_eq!(stats["total_titles"], 3);
    assert_eq!(stats["total_movies"], 1);
    assert_eq!(stats["total_series"], 2);
    assert!((stats["highest_rated"].as_f64().unwrap() - 8.8).abs() < 1e-4);
    assert!((stats["lowest_rated"].as_f64().unwrap() - 7.0).abs() < 1e-4);
    assert_eq!(stats["top_genres"][0]["genre"], "Drama");
    assert_eq!(stats["top_genres"][0]["count"], 3);
}

#[tokio::test]
async fn test_demo_title_lookup() {
    let app = router_with(Arc::new(DemoProvider::new()));

    let (status, body) = get(&app, "/title/imdb/tt0903747?country=gb").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Breaking Bad");
    assert_eq!(body["content_type"], "series");

    let (status, _) = get(&app, "/title/imdb/tt0000001").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
