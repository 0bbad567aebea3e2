//! Cached, coalescing access to the upstream catalog provider
//!
//! Every upstream request is keyed by (scope, country, filter signature).
//! Fresh cache entries are served directly. On a miss, concurrent callers
//! for the same key share one in-flight provider call: the first caller
//! registers a shared future, later callers await that same future.
//! Successful results are cached with a fixed TTL; failures never are.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared, join_all};
use parking_lot::Mutex;
use serde::Serialize;

use super::cache::TtlCache;
use super::error::{CatalogError, ErrorKind, ProviderError};
use super::model::{CatalogSnapshot, StreamingService, Title};
use super::provider::CatalogProvider;
use super::query::{SearchRequest, TitleFilter};

/// Scope used for cross-service searches.
const MULTI_SCOPE: &str = "multi";
/// Scope used for single-title lookups.
const TITLE_SCOPE: &str = "title";

/// Identity of one cached upstream response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Service id, `multi`, or `title`
    pub scope: String,
    pub country: String,
    pub signature: String,
}

impl CacheKey {
    pub fn for_service(service: StreamingService, country: &str, filter: &TitleFilter) -> Self {
        Self {
            scope: service.id().to_string(),
            country: country.to_ascii_lowercase(),
            signature: filter.signature(),
        }
    }

    pub fn for_search(request: &SearchRequest) -> Self {
        Self {
            scope: MULTI_SCOPE.to_string(),
            country: request.country.to_ascii_lowercase(),
            signature: request.signature(),
        }
    }

    pub fn for_title(imdb_id: &str, country: &str) -> Self {
        Self {
            scope: TITLE_SCOPE.to_string(),
            country: country.to_ascii_lowercase(),
            signature: imdb_id.trim().to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.scope, self.country, self.signature)
    }
}

/// Shared cache type injected into the fetcher.
pub type CatalogCache = TtlCache<CacheKey, CatalogSnapshot>;

type FetchResult = Result<CatalogSnapshot, CatalogError>;
type FetchFuture = BoxFuture<'static, FetchResult>;
type ProviderCall = BoxFuture<'static, Result<Vec<Title>, ProviderError>>;

/// Registry entry for a provider call that is currently running.
struct InFlight {
    generation: u64,
    fetch: WeakShared<FetchFuture>,
}

type InFlightMap = Mutex<HashMap<CacheKey, InFlight>>;

/// Removes the in-flight marker when the shared fetch completes or is dropped.
struct InFlightGuard {
    in_flight: Arc<InFlightMap>,
    key: CacheKey,
    generation: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock();
        if in_flight
            .get(&self.key)
            .is_some_and(|entry| entry.generation == self.generation)
        {
            in_flight.remove(&self.key);
        }
    }
}

/// Fetch behaviour knobs.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Lifetime of successful responses
    pub ttl: Duration,
    /// Upper bound on a single provider call
    pub provider_timeout: Duration,
    /// Serve expired entries when the provider is unavailable
    pub serve_stale_on_error: bool,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            provider_timeout: Duration::from_secs(30),
            serve_stale_on_error: true,
        }
    }
}

/// Failure of one service within a multi-service operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceFailure {
    pub service: StreamingService,
    pub kind: ErrorKind,
    pub message: String,
}

impl ServiceFailure {
    pub fn new(service: StreamingService, error: &CatalogError) -> Self {
        Self {
            service,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Outcome of fetching one service during a fan-out.
#[derive(Debug, Clone)]
pub struct ServiceFetch {
    pub service: StreamingService,
    pub result: FetchResult,
}

impl ServiceFetch {
    pub fn failure(&self) -> Option<ServiceFailure> {
        self.result
            .as_ref()
            .err()
            .map(|error| ServiceFailure::new(self.service, error))
    }
}

/// Cache-fronted access to a `CatalogProvider`.
#[derive(Clone)]
pub struct CatalogFetcher {
    provider: Arc<dyn CatalogProvider>,
    cache: Arc<CatalogCache>,
    in_flight: Arc<InFlightMap>,
    next_generation: Arc<AtomicU64>,
    policy: FetchPolicy,
}

impl fmt::Debug for CatalogFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogFetcher")
            .field("provider", &self.provider)
            .field("cached_entries", &self.cache.len())
            .field("in_flight", &self.in_flight.lock().len())
            .field("policy", &self.policy)
            .finish()
    }
}

impl CatalogFetcher {
    /// Creates a fetcher around an explicitly owned cache.
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        cache: Arc<CatalogCache>,
        policy: FetchPolicy,
    ) -> Self {
        Self {
            provider,
            cache,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(0)),
            policy,
        }
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Number of provider calls currently registered as in flight.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Fetches one service's catalog.
    ///
    /// # Errors
    /// - `CatalogError::UpstreamUnavailable` - Provider failed or timed out and no stale entry was usable
    /// - `CatalogError::UpstreamRateLimited` - Provider quota exhausted
    pub async fn fetch(
        &self,
        service: StreamingService,
        country: &str,
        filter: &TitleFilter,
    ) -> Result<CatalogSnapshot, CatalogError> {
        let key = CacheKey::for_service(service, country, filter);
        let provider = Arc::clone(&self.provider);
        let country = key.country.clone();
        let filter = filter.clone();

        self.fetch_keyed(key, move || {
            async move { provider.fetch_catalog(service, &country, &filter).await }.boxed()
        })
        .await
    }

    /// Fetches several services concurrently.
    ///
    /// Runs one branch per distinct service and waits for all of them.
    /// Results come back in request order; a failing service never aborts
    /// the others.
    pub async fn fetch_many(
        &self,
        services: &[StreamingService],
        country: &str,
        filter: &TitleFilter,
    ) -> Vec<ServiceFetch> {
        let mut distinct = Vec::with_capacity(services.len());
        for service in services {
            if !distinct.contains(service) {
                distinct.push(*service);
            }
        }

        let branches = distinct.into_iter().map(|service| async move {
            let result = self.fetch(service, country, filter).await;
            if let Err(error) = &result {
                tracing::warn!(%service, %error, "Service fetch failed");
            }
            ServiceFetch { service, result }
        });

        join_all(branches).await
    }

    /// Looks up one title by cross-reference id.
    ///
    /// # Errors
    /// - `CatalogError::NotFound` - No title with that id exists upstream
    /// - `CatalogError::UpstreamUnavailable` - Provider failed or timed out
    /// - `CatalogError::UpstreamRateLimited` - Provider quota exhausted
    pub async fn lookup(&self, imdb_id: &str, country: &str) -> Result<Title, CatalogError> {
        let key = CacheKey::for_title(imdb_id, country);
        let provider = Arc::clone(&self.provider);
        let imdb_id_owned = imdb_id.trim().to_string();
        let country = key.country.clone();

        let snapshot = self
            .fetch_keyed(key, move || {
                async move {
                    provider
                        .fetch_by_imdb_id(&imdb_id_owned, &country)
                        .await
                        .map(|title| vec![title])
                }
                .boxed()
            })
            .await?;

        snapshot
            .titles
            .first()
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                what: format!("title {imdb_id}"),
            })
    }

    /// Runs a title search through the cache.
    ///
    /// # Errors
    /// - `CatalogError::UpstreamUnavailable` - Provider failed or timed out
    /// - `CatalogError::UpstreamRateLimited` - Provider quota exhausted
    pub async fn search(&self, request: &SearchRequest) -> Result<CatalogSnapshot, CatalogError> {
        let key = CacheKey::for_search(request);
        let provider = Arc::clone(&self.provider);
        let request = request.clone();

        self.fetch_keyed(key, move || {
            async move { provider.search_titles(&request).await }.boxed()
        })
        .await
    }

    /// Drops every cached response for one service.
    pub fn invalidate_service(&self, service: StreamingService) -> usize {
        let removed = self.cache.invalidate_where(|key| key.scope == service.id());
        tracing::info!(%service, removed, "Invalidated cached catalogs");
        removed
    }

    async fn fetch_keyed<F>(&self, key: CacheKey, call: F) -> FetchResult
    where
        F: FnOnce() -> ProviderCall,
    {
        if let Some(snapshot) = self.cache.get(&key) {
            return Ok(snapshot);
        }

        let shared = {
            let mut in_flight = self.in_flight.lock();

            // A fetch may have completed between the lookup above and taking the lock
            if let Some(snapshot) = self.cache.get(&key) {
                return Ok(snapshot);
            }

            match in_flight.get(&key).and_then(|entry| entry.fetch.upgrade()) {
                Some(existing) => {
                    tracing::debug!(%key, "Joining in-flight fetch");
                    existing
                }
                None => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let shared: Shared<FetchFuture> = self
                        .run_provider_call(key.clone(), generation, call())
                        .boxed()
                        .shared();
                    if let Some(fetch) = shared.downgrade() {
                        in_flight.insert(key.clone(), InFlight { generation, fetch });
                    }
                    shared
                }
            }
        };

        match shared.await {
            Ok(snapshot) => Ok(snapshot),
            Err(error) if self.policy.serve_stale_on_error && error.allows_stale_fallback() => {
                match self.cache.get_stale(&key) {
                    Some(stale) => {
                        tracing::warn!(%key, %error, "Serving stale catalog after upstream failure");
                        Ok(stale.into_stale())
                    }
                    None => Err(error),
                }
            }
            Err(error) => Err(error),
        }
    }

    fn run_provider_call(
        &self,
        key: CacheKey,
        generation: u64,
        call: ProviderCall,
    ) -> impl Future<Output = FetchResult> + Send + 'static {
        let cache = Arc::clone(&self.cache);
        let in_flight = Arc::clone(&self.in_flight);
        let ttl = self.policy.ttl;
        let timeout = self.policy.provider_timeout;

        async move {
            let _guard = InFlightGuard {
                in_flight,
                key: key.clone(),
                generation,
            };

            tracing::info!(%key, "Fetching from provider");
            let started = tokio::time::Instant::now();

            let titles = match tokio::time::timeout(timeout, call).await {
                Ok(Ok(titles)) => titles,
                Ok(Err(error)) => {
                    tracing::warn!(%key, %error, "Provider call failed");
                    return Err(CatalogError::from(error));
                }
                Err(_) => {
                    tracing::warn!(%key, ?timeout, "Provider call timed out");
                    return Err(CatalogError::UpstreamUnavailable {
                        reason: format!("provider did not respond within {timeout:?}"),
                    });
                }
            };

            let snapshot = CatalogSnapshot::new(titles);
            tracing::debug!(
                %key,
                titles = snapshot.len(),
                elapsed = ?started.elapsed(),
                "Provider call completed"
            );
            cache.set(key, snapshot.clone(), ttl);
            Ok(snapshot)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_test::{assert_pending, assert_ready};

    use super::*;
    use crate::catalog::model::ContentType;
    use crate::catalog::provider::{MockProvider, rated_title};

    fn catalog(ids: &[&str]) -> Vec<Title> {
        ids.iter()
            .map(|id| rated_title(id, Some(id), ContentType::Movie, Some(7.0), Some(10)))
            .collect()
    }

    fn fetcher_with(provider: Arc<MockProvider>, policy: FetchPolicy) -> CatalogFetcher {
        CatalogFetcher::new(provider, Arc::new(TtlCache::new()), policy)
    }

    fn unavailable() -> ProviderError {
        ProviderError::Unavailable {
            reason: "connection refused".to_string(),
        }
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let provider = Arc::new(
            MockProvider::new().with_catalog(StreamingService::Netflix, catalog(&["a", "b"])),
        );
        let fetcher = fetcher_with(Arc::clone(&provider), FetchPolicy::default());
        let filter = TitleFilter::default();

        let first = fetcher
            .fetch(StreamingService::Netflix, "us", &filter)
            .await
            .unwrap();
        let second = fetcher
            .fetch(StreamingService::Netflix, "US", &filter)
            .await
            .unwrap();

        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first.titles, &second.titles));
        assert_eq!(provider.catalog_calls(StreamingService::Netflix), 1);
        assert_eq!(fetcher.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_different_filters_use_different_entries() {
        let provider = Arc::new(
            MockProvider::new().with_catalog(StreamingService::Prime, catalog(&["a"])),
        );
        let fetcher = fetcher_with(Arc::clone(&provider), FetchPolicy::default());

        fetcher
            .fetch(StreamingService::Prime, "us", &TitleFilter::default())
            .await
            .unwrap();
        fetcher
            .fetch(StreamingService::Prime, "us", &TitleFilter::movies())
            .await
            .unwrap();
        fetcher
            .fetch(StreamingService::Prime, "gb", &TitleFilter::default())
            .await
            .unwrap();

        assert_eq!(provider.catalog_calls(StreamingService::Prime), 3);
        assert_eq!(fetcher.cache().len(), 3);

        // Bounds that only differ past the first decimal are separate entries
        fetcher
            .fetch(
                StreamingService::Prime,
                "us",
                &TitleFilter::movies().with_min_rating(Some(8.34)),
            )
            .await
            .unwrap();
        fetcher
            .fetch(
                StreamingService::Prime,
                "us",
                &TitleFilter::movies().with_min_rating(Some(8.26)),
            )
            .await
            .unwrap();

        assert_eq!(provider.catalog_calls(StreamingService::Prime), 5);
        assert_eq!(fetcher.cache().len(), 5);
    }

    #[tokio::test]
    async fn test_concurrent_identical_fetches_share_one_call() {
        let (provider, gate) = MockProvider::new()
            .with_catalog(StreamingService::Disney, catalog(&["x", "y"]))
            .gated();
        let provider = Arc::new(provider);
        let fetcher = fetcher_with(Arc::clone(&provider), FetchPolicy::default());
        let filter = TitleFilter::default();

        let mut leader =
            tokio_test::task::spawn(fetcher.fetch(StreamingService::Disney, "us", &filter));
        let mut follower =
            tokio_test::task::spawn(fetcher.fetch(StreamingService::Disney, "us", &filter));

        assert_pending!(leader.poll());
        assert_pending!(follower.poll());
        assert_eq!(fetcher.in_flight_count(), 1);

        gate.add_permits(1);

        let leader_result = assert_ready!(leader.poll()).unwrap();
        let follower_result = assert_ready!(follower.poll()).unwrap();

        assert!(Arc::ptr_eq(&leader_result.titles, &follower_result.titles));
        assert_eq!(provider.catalog_calls(StreamingService::Disney), 1);
        assert_eq!(fetcher.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let provider = Arc::new(
            MockProvider::new()
                .with_catalog(StreamingService::Hulu, catalog(&["a"]))
                .with_failure(StreamingService::Hulu, unavailable()),
        );
        let fetcher = fetcher_with(Arc::clone(&provider), FetchPolicy::default());
        let filter = TitleFilter::default();

        let err = fetcher
            .fetch(StreamingService::Hulu, "us", &filter)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
        assert!(fetcher.cache().is_empty());

        provider.clear_failure(StreamingService::Hulu);
        let snapshot = fetcher
            .fetch(StreamingService::Hulu, "us", &filter)
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.stale);
        assert_eq!(provider.catalog_calls(StreamingService::Hulu), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_propagates_unchanged() {
        let provider = Arc::new(MockProvider::new().with_failure(
            StreamingService::Apple,
            ProviderError::RateLimited {
                retry_after_secs: Some(60),
            },
        ));
        let fetcher = fetcher_with(provider, FetchPolicy::default());

        let err = fetcher
            .fetch(StreamingService::Apple, "us", &TitleFilter::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::UpstreamRateLimited {
                retry_after_secs: Some(60)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_triggers_refetch() {
        let provider = Arc::new(
            MockProvider::new().with_catalog(StreamingService::Netflix, catalog(&["a"])),
        );
        let fetcher = fetcher_with(Arc::clone(&provider), FetchPolicy::default());
        let filter = TitleFilter::default();

        fetcher
            .fetch(StreamingService::Netflix, "us", &filter)
            .await
            .unwrap();
        provider.set_catalog(StreamingService::Netflix, catalog(&["a", "b"]));

        tokio::time::advance(Duration::from_secs(3599)).await;
        let cached = fetcher
            .fetch(StreamingService::Netflix, "us", &filter)
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        let refreshed = fetcher
            .fetch(StreamingService::Netflix, "us", &filter)
            .await
            .unwrap();
        assert_eq!(refreshed.len(), 2);
        assert_eq!(provider.catalog_calls(StreamingService::Netflix), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_served_when_provider_down() {
        let provider = Arc::new(
            MockProvider::new().with_catalog(StreamingService::Peacock, catalog(&["a"])),
        );
        let fetcher = fetcher_with(Arc::clone(&provider), FetchPolicy::default());
        let filter = TitleFilter::default();

        fetcher
            .fetch(StreamingService::Peacock, "us", &filter)
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(3601)).await;
        provider.set_failure(StreamingService::Peacock, unavailable());

        let snapshot = fetcher
            .fetch(StreamingService::Peacock, "us", &filter)
            .await
            .unwrap();
        assert!(snapshot.stale);
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_fallback_can_be_disabled() {
        let provider = Arc::new(
            MockProvider::new().with_catalog(StreamingService::Peacock, catalog(&["a"])),
        );
        let policy = FetchPolicy {
            serve_stale_on_error: false,
            ..FetchPolicy::default()
        };
        let fetcher = fetcher_with(Arc::clone(&provider), policy);
        let filter = TitleFilter::default();

        fetcher
            .fetch(StreamingService::Peacock, "us", &filter)
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(3601)).await;
        provider.set_failure(StreamingService::Peacock, unavailable());

        assert!(
            fetcher
                .fetch(StreamingService::Peacock, "us", &filter)
                .await
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_timeout_is_unavailable() {
        let provider = Arc::new(
            MockProvider::new()
                .with_catalog(StreamingService::Hbo, catalog(&["a"]))
                .with_delay(Duration::from_secs(60)),
        );
        let policy = FetchPolicy {
            provider_timeout: Duration::from_secs(5),
            ..FetchPolicy::default()
        };
        let fetcher = fetcher_with(provider, policy);

        let err = fetcher
            .fetch(StreamingService::Hbo, "us", &TitleFilter::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
        assert!(fetcher.cache().is_empty());
        assert_eq!(fetcher.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_leaves_no_trace() {
        let (provider, gate) = MockProvider::new()
            .with_catalog(StreamingService::Prime, catalog(&["a"]))
            .gated();
        let provider = Arc::new(provider);
        let fetcher = fetcher_with(Arc::clone(&provider), FetchPolicy::default());
        let filter = TitleFilter::default();

        let mut pending =
            tokio_test::task::spawn(fetcher.fetch(StreamingService::Prime, "us", &filter));
        assert_pending!(pending.poll());
        assert_eq!(fetcher.in_flight_count(), 1);

        drop(pending);
        assert_eq!(fetcher.in_flight_count(), 0);
        assert!(fetcher.cache().is_empty());

        gate.add_permits(1);
        let snapshot = fetcher
            .fetch(StreamingService::Prime, "us", &filter)
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(provider.catalog_calls(StreamingService::Prime), 2);
    }

    #[tokio::test]
    async fn test_fetch_many_isolates_failures_and_keeps_order() {
        let provider = Arc::new(
            MockProvider::new()
                .with_catalog(StreamingService::Netflix, catalog(&["a"]))
                .with_catalog(StreamingService::Disney, catalog(&["b", "c"]))
                .with_failure(StreamingService::Prime, unavailable()),
        );
        let fetcher = fetcher_with(Arc::clone(&provider), FetchPolicy::default());

        let results = fetcher
            .fetch_many(
                &[
                    StreamingService::Disney,
                    StreamingService::Prime,
                    StreamingService::Netflix,
                    StreamingService::Disney,
                ],
                "us",
                &TitleFilter::default(),
            )
            .await;

        let services: Vec<_> = results.iter().map(|r| r.service).collect();
        assert_eq!(
            services,
            vec![
                StreamingService::Disney,
                StreamingService::Prime,
                StreamingService::Netflix
            ]
        );
        assert_eq!(results[0].result.as_ref().unwrap().len(), 2);
        assert!(results[1].result.is_err());
        assert_eq!(
            results[1].failure().unwrap().kind,
            ErrorKind::UpstreamUnavailable
        );
        assert_eq!(results[2].result.as_ref().unwrap().len(), 1);
        assert_eq!(provider.catalog_calls(StreamingService::Disney), 1);
    }

    #[tokio::test]
    async fn test_lookup_is_cached_and_reports_not_found() {
        let provider = Arc::new(
            MockProvider::new().with_catalog(StreamingService::Netflix, catalog(&["tt1"])),
        );
        let fetcher = fetcher_with(Arc::clone(&provider), FetchPolicy::default());

        let title = fetcher.lookup("tt1", "us").await.unwrap();
        assert_eq!(title.id, "tt1");
        fetcher.lookup("TT1", "us").await.unwrap();
        assert_eq!(provider.lookup_calls(), 1);

        let err = fetcher.lookup("tt404", "us").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_invalidate_service_forces_refetch() {
        let provider = Arc::new(
            MockProvider::new()
                .with_catalog(StreamingService::Netflix, catalog(&["a"]))
                .with_catalog(StreamingService::Prime, catalog(&["b"])),
        );
        let fetcher = fetcher_with(Arc::clone(&provider), FetchPolicy::default());
        let filter = TitleFilter::default();

        fetcher
            .fetch(StreamingService::Netflix, "us", &filter)
            .await
            .unwrap();
        fetcher
            .fetch(StreamingService::Prime, "us", &filter)
            .await
            .unwrap();

        assert_eq!(fetcher.invalidate_service(StreamingService::Netflix), 1);
        fetcher
            .fetch(StreamingService::Netflix, "us", &filter)
            .await
            .unwrap();
        fetcher
            .fetch(StreamingService::Prime, "us", &filter)
            .await
            .unwrap();

        assert_eq!(provider.catalog_calls(StreamingService::Netflix), 2);
        assert_eq!(provider.catalog_calls(StreamingService::Prime), 1);
    }

    #[test]
    fn test_cache_key_display() {
        let key = CacheKey::for_service(StreamingService::Hbo, "GB", &TitleFilter::movies());
        assert_eq!(
            key.to_string(),
            "hbo:gb:type=movie;rating=-..-;genres="
        );
        assert_eq!(CacheKey::for_title(" TT123 ", "us").signature, "tt123");
    }
}
