//! Caching and request coalescing through the catalog service.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use streamscope_core::catalog::{
    CatalogRequest, MockProvider, ProviderError, StreamingService, TopRequest,
};

use crate::support::{catalog_with, movie, three_service_provider};

#[tokio::test]
async fn test_concurrent_requests_share_one_upstream_call() {
    let (provider, gate) = MockProvider::new()
        .with_catalog(
            StreamingService::Netflix,
            vec![movie("a", "tt1", 8.0, 10), movie("b", "tt2", 9.0, 10)],
        )
        .gated();
    let provider = Arc::new(provider);
    let catalog = catalog_with(provider.clone());

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let catalog = catalog.clone();
            tokio::spawn(async move {
                catalog
                    .get_top_movies(StreamingService::Netflix, &TopRequest::new("us", 1))
                    .await
            })
        })
        .collect();

    while provider.catalog_calls(StreamingService::Netflix) == 0 {
        tokio::task::yield_now().await;
    }
    gate.add_permits(1);

    for result in join_all(handles).await {
        let response = result.unwrap().unwrap();
        assert_eq!(response.titles.len(), 1);
        assert_eq!(response.titles[0].id, "b");
    }
    assert_eq!(provider.catalog_calls(StreamingService::Netflix), 1);
}

#[tokio::test]
async fn test_fan_out_calls_each_service_once_under_load() {
    let provider = Arc::new(three_service_provider().with_delay(Duration::from_millis(20)));
    let catalog = catalog_with(provider.clone());

    let requests = (0..10).map(|_| {
        let catalog = catalog.clone();
        async move { catalog.get_top_movies_all(&TopRequest::new("us", 5)).await }
    });
    for response in join_all(requests).await {
        assert_eq!(response.unwrap().results.len(), StreamingService::ALL.len());
    }

    for service in StreamingService::ALL {
        assert_eq!(provider.catalog_calls(service), 1, "{service} fetched more than once");
    }
}

#[tokio::test]
async fn test_cache_statistics_track_hits() {
    let provider = Arc::new(three_service_provider());
    let catalog = catalog_with(provider.clone());
    let request = CatalogRequest::default();

    catalog.get_catalog(StreamingService::Prime, &request).await.unwrap();
    catalog.get_catalog(StreamingService::Prime, &request).await.unwrap();
    catalog.get_catalog(StreamingService::Prime, &request).await.unwrap();

    let stats = catalog.cache_statistics();
    assert_eq!(provider.catalog_calls(StreamingService::Prime), 1);
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hit_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_expired_entries_are_refetched() {
    let provider = Arc::new(three_service_provider());
    let catalog = catalog_with(provider.clone());
    let request = CatalogRequest::default();

    catalog.get_catalog(StreamingService::Hulu, &request).await.unwrap();
    tokio::time::advance(Duration::from_secs(30)).await;
    catalog.get_catalog(StreamingService::Hulu, &request).await.unwrap();
    assert_eq!(provider.catalog_calls(StreamingService::Hulu), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    catalog.get_catalog(StreamingService::Hulu, &request).await.unwrap();
    assert_eq!(provider.catalog_calls(StreamingService::Hulu), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stale_catalog_served_while_upstream_is_down() {
    let provider = Arc::new(three_service_provider());
    let catalog = catalog_with(provider.clone());
    let request = CatalogRequest::default();

    let fresh = catalog.get_catalog(StreamingService::Netflix, &request).await.unwrap();
    assert!(!fresh.stale);

    tokio::time::advance(Duration::from_secs(61)).await;
    provider.set_failure(
        StreamingService::Netflix,
        ProviderError::Unavailable {
            reason: "connection refused".to_string(),
        },
    );
    let stale = catalog.get_catalog(StreamingService::Netflix, &request).await.unwrap();
    assert!(stale.stale);
    assert_eq!(stale.page.items, fresh.page.items);

    provider.clear_failure(StreamingService::Netflix);
    let recovered = catalog.get_catalog(StreamingService::Netflix, &request).await.unwrap();
    assert!(!recovered.stale);
    assert_eq!(provider.catalog_calls(StreamingService::Netflix), 3);
}

#[tokio::test]
async fn test_invalidated_service_is_fetched_again() {
    let provider = Arc::new(three_service_provider());
    let catalog = catalog_with(provider.clone());
    let request = CatalogRequest::default();

    catalog.get_catalog(StreamingService::Netflix, &request).await.unwrap();
    catalog.get_catalog(StreamingService::Prime, &request).await.unwrap();
    catalog.fetcher().invalidate_service(StreamingService::Netflix);
    catalog.get_catalog(StreamingService::Netflix, &request).await.unwrap();
    catalog.get_catalog(StreamingService::Prime, &request).await.unwrap();

    assert_eq!(provider.catalog_calls(StreamingService::Netflix), 2);
    assert_eq!(provider.catalog_calls(StreamingService::Prime), 1);
}
