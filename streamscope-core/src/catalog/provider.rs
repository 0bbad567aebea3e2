//! Upstream catalog provider interface.

use async_trait::async_trait;

use super::error::ProviderError;
use super::model::{StreamingService, Title};
use super::query::{SearchRequest, TitleFilter};

/// Source of raw title records, usually a remote catalog API.
///
/// Implementations own transport concerns (auth, retries, rate limiting).
/// They must report failures as errors and never disguise them as empty
/// results.
#[async_trait]
pub trait CatalogProvider: Send + Sync + std::fmt::Debug {
    /// Fetches the catalog of one service in one country.
    ///
    /// # Errors
    /// - `ProviderError::Unavailable` - Network failure, timeout, or non-2xx response
    /// - `ProviderError::RateLimited` - Upstream quota exhausted
    /// - `ProviderError::InvalidResponse` - Response body could not be decoded
    async fn fetch_catalog(
        &self,
        service: StreamingService,
        country: &str,
        filter: &TitleFilter,
    ) -> Result<Vec<Title>, ProviderError>;

    /// Looks up a single title by its cross-reference id.
    ///
    /// # Errors
    /// - `ProviderError::NotFound` - No title with that id exists upstream
    /// - `ProviderError::Unavailable` - Network failure, timeout, or non-2xx response
    /// - `ProviderError::RateLimited` - Upstream quota exhausted
    async fn fetch_by_imdb_id(&self, imdb_id: &str, country: &str) -> Result<Title, ProviderError>;

    /// Searches titles by name.
    ///
    /// # Errors
    /// - `ProviderError::Unavailable` - Network failure, timeout, or non-2xx response
    /// - `ProviderError::RateLimited` - Upstream quota exhausted
    async fn search_titles(&self, request: &SearchRequest) -> Result<Vec<Title>, ProviderError>;
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockProvider;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::sync::Semaphore;

    use super::CatalogProvider;
    use crate::catalog::error::ProviderError;
    use crate::catalog::model::{ContentType, StreamingService, Title};
    use crate::catalog::query::{SearchRequest, TitleFilter};

    /// In-memory provider with call counting and failure injection.
    ///
    /// Catalogs are returned as configured; the filter is ignored so tests
    /// exercise the aggregator's own filtering.
    #[derive(Debug, Default)]
    pub struct MockProvider {
        catalogs: Mutex<HashMap<StreamingService, Vec<Title>>>,
        failures: Mutex<HashMap<StreamingService, ProviderError>>,
        catalog_calls: Mutex<HashMap<StreamingService, usize>>,
        lookup_calls: AtomicUsize,
        search_calls: AtomicUsize,
        delay: Mutex<Option<Duration>>,
        gate: Mutex<Option<Arc<Semaphore>>>,
    }

    impl MockProvider {
        pub fn new() -> Self {
            Self::default()
        }

        /// Sets the catalog returned for a service.
        pub fn with_catalog(self, service: StreamingService, titles: Vec<Title>) -> Self {
            self.set_catalog(service, titles);
            self
        }

        /// Makes every call for a service fail with the given error.
        pub fn with_failure(self, service: StreamingService, error: ProviderError) -> Self {
            self.set_failure(service, error);
            self
        }

        /// Delays every call by a fixed duration.
        pub fn with_delay(self, delay: Duration) -> Self {
            *self.delay.lock() = Some(delay);
            self
        }

        /// Blocks every call until the returned semaphore receives permits.
        pub fn gated(self) -> (Self, Arc<Semaphore>) {
            let gate = Arc::new(Semaphore::new(0));
            *self.gate.lock() = Some(Arc::clone(&gate));
            (self, gate)
        }

        pub fn set_catalog(&self, service: StreamingService, titles: Vec<Title>) {
            self.catalogs.lock().insert(service, titles);
        }

        pub fn set_failure(&self, service: StreamingService, error: ProviderError) {
            self.failures.lock().insert(service, error);
        }

        pub fn clear_failure(&self, service: StreamingService) {
            self.failures.lock().remove(&service);
        }

        /// Number of catalog calls made for one service.
        pub fn catalog_calls(&self, service: StreamingService) -> usize {
            self.catalog_calls
                .lock()
                .get(&service)
                .copied()
                .unwrap_or(0)
        }

        /// Number of catalog calls across every service.
        pub fn total_catalog_calls(&self) -> usize {
            self.catalog_calls.lock().values().sum()
        }

        pub fn lookup_calls(&self) -> usize {
            self.lookup_calls.load(Ordering::SeqCst)
        }

        pub fn search_calls(&self) -> usize {
            self.search_calls.load(Ordering::SeqCst)
        }

        async fn simulate_latency(&self) {
            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let gate = self.gate.lock().clone();
            if let Some(gate) = gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
        }

        fn all_titles(&self) -> Vec<Title> {
            let catalogs = self.catalogs.lock();
            let mut services: Vec<_> = catalogs.keys().copied().collect();
            services.sort();
            services
                .into_iter()
                .flat_map(|service| catalogs[&service].clone())
                .collect()
        }
    }

    #[async_trait]
    impl CatalogProvider for MockProvider {
        async fn fetch_catalog(
            &self,
            service: StreamingService,
            _country: &str,
            _filter: &TitleFilter,
        ) -> Result<Vec<Title>, ProviderError> {
            *self.catalog_calls.lock().entry(service).or_insert(0) += 1;
            self.simulate_latency().await;

            let failure = self.failures.lock().get(&service).cloned();
            if let Some(error) = failure {
                return Err(error);
            }

            Ok(self
                .catalogs
                .lock()
                .get(&service)
                .cloned()
                .unwrap_or_default())
        }

        async fn fetch_by_imdb_id(
            &self,
            imdb_id: &str,
            _country: &str,
        ) -> Result<Title, ProviderError> {
            self.lookup_calls.fetch_add(1, Ordering::SeqCst);
            self.simulate_latency().await;

            self.all_titles()
                .into_iter()
                .find(|title| title.imdb_id.as_deref() == Some(imdb_id))
                .ok_or_else(|| ProviderError::NotFound {
                    what: format!("title {imdb_id}"),
                })
        }

        async fn search_titles(
            &self,
            request: &SearchRequest,
        ) -> Result<Vec<Title>, ProviderError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            self.simulate_latency().await;

            let needle = request.query.trim().to_lowercase();
            let mut seen = std::collections::HashSet::new();
            Ok(self
                .all_titles()
                .into_iter()
                .filter(|title| title.title.to_lowercase().contains(&needle))
                .filter(|title| {
                    request
                        .content_type
                        .is_none_or(|content_type| title.content_type == content_type)
                })
                .filter(|title| seen.insert(title.id.clone()))
                .collect())
        }
    }

    /// Builds a rated test title.
    pub fn rated_title(
        id: &str,
        imdb_id: Option<&str>,
        content_type: ContentType,
        rating: Option<f32>,
        vote_count: Option<u32>,
    ) -> Title {
        let mut title = Title::new(id, format!("Title {id}"), content_type);
        title.imdb_id = imdb_id.map(str::to_string);
        title.rating = rating;
        title.vote_count = vote_count;
        title
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::rated_title;
