//! One failing service must not take down multi-service operations.

use std::sync::Arc;

use streamscope_core::catalog::{
    CatalogError, CatalogRequest, ErrorKind, MockProvider, ProviderError, StreamingService,
    TopRequest,
};

use crate::support::{catalog_with, three_service_provider};

fn unavailable() -> ProviderError {
    ProviderError::Unavailable {
        reason: "503 from upstream".to_string(),
    }
}

const THREE: [StreamingService; 3] = [
    StreamingService::Netflix,
    StreamingService::Prime,
    StreamingService::Hulu,
];

#[tokio::test]
async fn test_multi_catalog_with_one_of_three_failing() {
    let provider = Arc::new(
        three_service_provider().with_failure(StreamingService::Prime, unavailable()),
    );
    let catalog = catalog_with(provider);

    let response = catalog
        .get_multi_catalog(&THREE, &CatalogRequest::default())
        .await
        .unwrap();

    assert!(response.partial);
    assert_eq!(response.failures.len(), 1);
    assert_eq!(response.failures[0].service, StreamingService::Prime);
    assert_eq!(response.failures[0].kind, ErrorKind::UpstreamUnavailable);

    let ids: Vec<&str> = response.page.items.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["n1", "h1", "shared", "n2"]);
    assert!(!ids.contains(&"p1"));
}

#[tokio::test]
async fn test_multi_catalog_fails_only_when_every_service_fails() {
    let provider = Arc::new(
        MockProvider::new()
            .with_failure(
                StreamingService::Netflix,
                ProviderError::RateLimited {
                    retry_after_secs: Some(5),
                },
            )
            .with_failure(StreamingService::Prime, unavailable())
            .with_failure(StreamingService::Hulu, unavailable()),
    );
    let catalog = catalog_with(provider);

    let error = catalog
        .get_multi_catalog(&THREE, &CatalogRequest::default())
        .await
        .unwrap_err();
    assert_eq!(
        error,
        CatalogError::UpstreamRateLimited {
            retry_after_secs: Some(5)
        }
    );
}

#[tokio::test]
async fn test_top_movies_all_reports_failed_services() {
    let provider = Arc::new(
        three_service_provider().with_failure(StreamingService::Hulu, unavailable()),
    );
    let catalog = catalog_with(provider);

    let response = catalog
        .get_top_movies_all(&TopRequest::new("us", 2))
        .await
        .unwrap();

    assert!(response.partial);
    assert_eq!(response.results.len(), StreamingService::ALL.len() - 1);
    assert!(response.results.iter().all(|r| r.service != StreamingService::Hulu));

    let netflix = response
        .results
        .iter()
        .find(|r| r.service == StreamingService::Netflix)
        .unwrap();
    let ids: Vec<&str> = netflix.titles.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["n1", "shared"]);
}

#[tokio::test]
async fn test_comparison_keeps_requested_count_for_overlap() {
    let provider = Arc::new(
        three_service_provider().with_failure(StreamingService::Hulu, unavailable()),
    );
    let catalog = catalog_with(provider);

    let response = catalog.compare_services(&THREE, "us").await.unwrap();

    assert!(response.partial);
    assert_eq!(response.services.len(), 2);
    assert_eq!(response.overlap_stats.unique_titles, 4);
    assert_eq!(response.overlap_stats.multi_service_titles, 1);
    // Hulu failed, so nothing is confirmed on all three
    assert_eq!(response.overlap_stats.all_services_titles, 0);
}
