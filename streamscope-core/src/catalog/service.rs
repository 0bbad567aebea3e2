//! Catalog operations exposed to the HTTP layer and the CLI
//!
//! Each operation takes request parameters, validates what the core owns
//! (rating bounds, country codes), fetches through the shared cache, and
//! shapes the result. Single-service operations propagate errors as they
//! are. Multi-service operations report failed services next to the
//! successful ones and only fail as a whole when nothing could be fetched.

use std::sync::Arc;

use serde::Serialize;
use strsim::normalized_levenshtein;

use super::aggregate::{
    Page, ServiceTitles, filter_titles, merge_catalogs, paginate, rating_order, sort_titles,
    top_per_service, top_titles,
};
use super::cache::CacheStatistics;
use super::comparison::{
    OverlapStats, ServiceStatistics, ServiceSummary, compare, service_statistics,
};
use super::error::CatalogError;
use super::fetcher::{CatalogCache, CatalogFetcher, FetchPolicy, ServiceFailure, ServiceFetch};
use super::model::{ContentType, StreamingService, Title};
use super::provider::CatalogProvider;
use super::query::{CatalogRequest, SearchRequest, TitleFilter, TopRequest, normalize_country};

/// Paginated catalog for one or more services.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogResponse {
    pub services: Vec<StreamingService>,
    pub country: String,
    #[serde(flatten)]
    pub page: Page<Title>,
    pub failures: Vec<ServiceFailure>,
    pub partial: bool,
    pub stale: bool,
}

/// Ranked titles of one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopListResponse {
    pub service: StreamingService,
    pub service_name: &'static str,
    pub country: String,
    pub titles: Vec<Title>,
    pub stale: bool,
}

/// Ranked titles for several services at once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopAllResponse {
    pub country: String,
    pub results: Vec<ServiceTitles>,
    pub failures: Vec<ServiceFailure>,
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub country: String,
    pub total_results: usize,
    pub titles: Vec<Title>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResponse {
    pub country: String,
    pub services: Vec<ServiceSummary>,
    pub overlap_stats: OverlapStats,
    pub failures: Vec<ServiceFailure>,
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatsResponse {
    pub service: StreamingService,
    pub service_name: &'static str,
    pub country: String,
    pub statistics: ServiceStatistics,
    pub stale: bool,
}

/// Entry point for every catalog operation.
#[derive(Debug, Clone)]
pub struct CatalogService {
    fetcher: CatalogFetcher,
}

impl CatalogService {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        cache: Arc<CatalogCache>,
        policy: FetchPolicy,
    ) -> Self {
        Self::from_fetcher(CatalogFetcher::new(provider, cache, policy))
    }

    pub fn from_fetcher(fetcher: CatalogFetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &CatalogFetcher {
        &self.fetcher
    }

    /// Paginated, ordered catalog of one service.
    ///
    /// # Errors
    /// - `CatalogError::InvalidParameter` - Bad country code or rating bound
    /// - `CatalogError::UpstreamUnavailable` / `UpstreamRateLimited` - Fetch failed
    pub async fn get_catalog(
        &self,
        service: StreamingService,
        request: &CatalogRequest,
    ) -> Result<CatalogResponse, CatalogError> {
        let country = normalize_country(&request.country)?;
        request.filter.validate()?;

        let snapshot = self.fetcher.fetch(service, &country, &request.filter).await?;
        let mut titles = filter_titles(snapshot.titles.iter(), &request.filter);
        sort_titles(&mut titles, request.order_by);

        Ok(CatalogResponse {
            services: vec![service],
            country,
            page: paginate(&titles, request.page),
            failures: Vec::new(),
            partial: false,
            stale: snapshot.stale,
        })
    }

    /// Paginated catalog across several services, deduplicated by title id.
    ///
    /// # Errors
    /// - `CatalogError::InvalidParameter` - No services, bad country code or rating bound
    /// - The first service's error when every service failed
    pub async fn get_multi_catalog(
        &self,
        services: &[StreamingService],
        request: &CatalogRequest,
    ) -> Result<CatalogResponse, CatalogError> {
        if services.is_empty() {
            return Err(CatalogError::invalid_parameter(
                "services",
                "at least one service is required",
            ));
        }
        let country = normalize_country(&request.country)?;
        request.filter.validate()?;

        let outcomes = self
            .fetcher
            .fetch_many(services, &country, &request.filter)
            .await;
        ensure_any_success(&outcomes)?;

        let merged = merge_catalogs(&outcomes);
        let mut titles = filter_titles(&merged, &request.filter);
        sort_titles(&mut titles, request.order_by);
        let failures = collect_failures(&outcomes);

        Ok(CatalogResponse {
            services: outcomes.iter().map(|o| o.service).collect(),
            country,
            page: paginate(&titles, request.page),
            partial: !failures.is_empty(),
            failures,
            stale: any_stale(&outcomes),
        })
    }

    /// Highest rated movies of one service.
    ///
    /// # Errors
    /// - `CatalogError::InvalidParameter` - Bad country code or rating bound
    /// - `CatalogError::UpstreamUnavailable` / `UpstreamRateLimited` - Fetch failed
    pub async fn get_top_movies(
        &self,
        service: StreamingService,
        request: &TopRequest,
    ) -> Result<TopListResponse, CatalogError> {
        let filter = movies_only(&request.filter);
        self.top_list(service, &request.country, &filter, request.limit)
            .await
    }

    /// Highest rated movies of every supported service.
    ///
    /// # Errors
    /// - `CatalogError::InvalidParameter` - Bad country code or rating bound
    /// - The first service's error when every service failed
    pub async fn get_top_movies_all(
        &self,
        request: &TopRequest,
    ) -> Result<TopAllResponse, CatalogError> {
        let filter = movies_only(&request.filter);
        self.top_all(&StreamingService::ALL, &request.country, &filter, request.limit)
            .await
    }

    /// Highest rated titles of one service, optionally restricted by type.
    ///
    /// # Errors
    /// - `CatalogError::InvalidParameter` - Bad country code or rating bound
    /// - `CatalogError::UpstreamUnavailable` / `UpstreamRateLimited` - Fetch failed
    pub async fn get_top_rated(
        &self,
        service: StreamingService,
        request: &TopRequest,
    ) -> Result<TopListResponse, CatalogError> {
        self.top_list(service, &request.country, &request.filter, request.limit)
            .await
    }

    /// Highest rated titles of every supported service.
    ///
    /// # Errors
    /// - `CatalogError::InvalidParameter` - Bad country code or rating bound
    /// - The first service's error when every service failed
    pub async fn get_top_rated_all(
        &self,
        request: &TopRequest,
    ) -> Result<TopAllResponse, CatalogError> {
        self.top_all(
            &StreamingService::ALL,
            &request.country,
            &request.filter,
            request.limit,
        )
        .await
    }

    /// Title search ranked by name similarity, then by rating.
    ///
    /// # Errors
    /// - `CatalogError::InvalidParameter` - Empty query, bad country code or rating
    /// - `CatalogError::UpstreamUnavailable` / `UpstreamRateLimited` - Search failed
    pub async fn search_titles(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchResponse, CatalogError> {
        request.validate()?;
        let mut request = request.clone();
        request.country = normalize_country(&request.country)?;

        let snapshot = self.fetcher.search(&request).await?;
        let filter = TitleFilter::default()
            .with_content_type(request.content_type)
            .with_min_rating(request.min_rating);
        let mut titles = filter_titles(snapshot.titles.iter(), &filter);
        rank_by_similarity(&mut titles, &request.query);

        Ok(SearchResponse {
            query: request.query,
            country: request.country,
            total_results: titles.len(),
            titles,
        })
    }

    /// Looks up one title by its cross-reference id.
    ///
    /// # Errors
    /// - `CatalogError::InvalidParameter` - Empty id or bad country code
    /// - `CatalogError::NotFound` - No such title upstream
    /// - `CatalogError::UpstreamUnavailable` / `UpstreamRateLimited` - Lookup failed
    pub async fn get_title_by_imdb_id(
        &self,
        imdb_id: &str,
        country: &str,
    ) -> Result<Title, CatalogError> {
        if imdb_id.trim().is_empty() {
            return Err(CatalogError::invalid_parameter("imdb_id", "must not be empty"));
        }
        let country = normalize_country(country)?;
        self.fetcher.lookup(imdb_id, &country).await
    }

    /// Per-service summaries and catalog overlap for two or more services.
    ///
    /// # Errors
    /// - `CatalogError::InvalidParameter` - Fewer than two services or bad country code
    /// - The first service's error when every service failed
    pub async fn compare_services(
        &self,
        services: &[StreamingService],
        country: &str,
    ) -> Result<ComparisonResponse, CatalogError> {
        let mut distinct: Vec<StreamingService> = Vec::with_capacity(services.len());
        for service in services {
            if !distinct.contains(service) {
                distinct.push(*service);
            }
        }
        if distinct.len() < 2 {
            return Err(CatalogError::invalid_parameter(
                "services",
                "at least 2 services are required for a comparison",
            ));
        }
        let country = normalize_country(country)?;

        let outcomes = self
            .fetcher
            .fetch_many(&distinct, &country, &TitleFilter::default())
            .await;
        ensure_any_success(&outcomes)?;

        let catalogs: Vec<(StreamingService, &[Title])> = outcomes
            .iter()
            .filter_map(|outcome| {
                let snapshot = outcome.result.as_ref().ok()?;
                Some((outcome.service, &snapshot.titles[..]))
            })
            .collect();
        let comparison = compare(&catalogs, distinct.len());
        let failures = collect_failures(&outcomes);

        Ok(ComparisonResponse {
            country,
            services: comparison.summaries,
            overlap_stats: comparison.overlap,
            partial: !failures.is_empty(),
            failures,
        })
    }

    /// Detailed statistics for one service's catalog.
    ///
    /// # Errors
    /// - `CatalogError::InvalidParameter` - Bad country code
    /// - `CatalogError::UpstreamUnavailable` / `UpstreamRateLimited` - Fetch failed
    pub async fn get_service_stats(
        &self,
        service: StreamingService,
        country: &str,
    ) -> Result<ServiceStatsResponse, CatalogError> {
        let country = normalize_country(country)?;
        let snapshot = self
            .fetcher
            .fetch(service, &country, &TitleFilter::default())
            .await?;

        Ok(ServiceStatsResponse {
            service,
            service_name: service.display_name(),
            country,
            statistics: service_statistics(&snapshot.titles),
            stale: snapshot.stale,
        })
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.fetcher.cache().statistics()
    }

    async fn top_list(
        &self,
        service: StreamingService,
        country: &str,
        filter: &TitleFilter,
        limit: usize,
    ) -> Result<TopListResponse, CatalogError> {
        let country = normalize_country(country)?;
        filter.validate()?;

        let snapshot = self.fetcher.fetch(service, &country, filter).await?;
        Ok(TopListResponse {
            service,
            service_name: service.display_name(),
            country,
            titles: top_titles(&snapshot.titles, filter, limit),
            stale: snapshot.stale,
        })
    }

    async fn top_all(
        &self,
        services: &[StreamingService],
        country: &str,
        filter: &TitleFilter,
        limit: usize,
    ) -> Result<TopAllResponse, CatalogError> {
        let country = normalize_country(country)?;
        filter.validate()?;

        let outcomes = self.fetcher.fetch_many(services, &country, filter).await;
        ensure_any_success(&outcomes)?;

        let top = top_per_service(&outcomes, filter, limit);
        Ok(TopAllResponse {
            country,
            results: top.results,
            partial: !top.failures.is_empty(),
            failures: top.failures,
        })
    }
}

fn movies_only(filter: &TitleFilter) -> TitleFilter {
    filter.clone().with_content_type(Some(ContentType::Movie))
}

fn collect_failures(outcomes: &[ServiceFetch]) -> Vec<ServiceFailure> {
    outcomes.iter().filter_map(ServiceFetch::failure).collect()
}

fn any_stale(outcomes: &[ServiceFetch]) -> bool {
    outcomes
        .iter()
        .any(|outcome| outcome.result.as_ref().is_ok_and(|snapshot| snapshot.stale))
}

/// Fails with the first error when no service produced a result.
fn ensure_any_success(outcomes: &[ServiceFetch]) -> Result<(), CatalogError> {
    if outcomes.iter().any(|outcome| outcome.result.is_ok()) {
        return Ok(());
    }
    match outcomes.first().map(|outcome| &outcome.result) {
        Some(Err(error)) => {
            tracing::error!(%error, services = outcomes.len(), "Every requested service failed");
            Err(error.clone())
        }
        _ => Ok(()),
    }
}

fn rank_by_similarity(titles: &mut [Title], query: &str) {
    let query = query.trim().to_lowercase();
    let score = |title: &Title| {
        let name = title.title.to_lowercase();
        if name == query {
            1.0
        } else {
            normalized_levenshtein(&query, &name)
        }
    };

    titles.sort_by(|a, b| {
        score(b)
            .total_cmp(&score(a))
            .then_with(|| rating_order(a, b))
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::catalog::cache::TtlCache;
    use crate::catalog::error::{ErrorKind, ProviderError};
    use crate::catalog::provider::{MockProvider, rated_title};
    use crate::catalog::query::{DEFAULT_COUNTRY, PageRequest, SortOrder};

    fn service_with(provider: Arc<MockProvider>) -> CatalogService {
        CatalogService::new(provider, Arc::new(TtlCache::new()), FetchPolicy::default())
    }

    fn movie(id: &str, rating: f32, votes: u32) -> Title {
        rated_title(id, Some(id), ContentType::Movie, Some(rating), Some(votes))
    }

    fn down() -> ProviderError {
        ProviderError::Unavailable {
            reason: "503 Service Unavailable".to_string(),
        }
    }

    #[tokio::test]
    async fn test_top_two_movies_by_rating_then_votes() {
        let provider = Arc::new(MockProvider::new().with_catalog(
            StreamingService::Netflix,
            vec![
                movie("a", 9.3, 100),
                movie("b", 8.5, 50),
                movie("c", 8.5, 80),
                movie("d", 7.0, 10),
                movie("e", 6.0, 5),
            ],
        ));
        let service = service_with(provider);

        let response = service
            .get_top_movies(StreamingService::Netflix, &TopRequest::new("us", 2))
            .await
            .unwrap();

        let ranked: Vec<(&str, Option<u32>)> = response
            .titles
            .iter()
            .map(|t| (t.id.as_str(), t.vote_count))
            .collect();
        assert_eq!(ranked, vec![("a", Some(100)), ("c", Some(80))]);
        assert_eq!(response.service_name, "Netflix");
    }

    #[tokio::test]
    async fn test_top_movies_skips_series() {
        let provider = Arc::new(MockProvider::new().with_catalog(
            StreamingService::Hbo,
            vec![
                rated_title("show", None, ContentType::Series, Some(9.5), None),
                movie("film", 8.0, 1),
            ],
        ));
        let service = service_with(provider);

        let movies = service
            .get_top_movies(StreamingService::Hbo, &TopRequest::new("us", 10))
            .await
            .unwrap();
        assert_eq!(movies.titles.len(), 1);

        let rated = service
            .get_top_rated(StreamingService::Hbo, &TopRequest::new("us", 10))
            .await
            .unwrap();
        assert_eq!(rated.titles[0].id, "show");
    }

    #[tokio::test]
    async fn test_multi_service_partial_failure() {
        let provider = Arc::new(
            MockProvider::new()
                .with_catalog(StreamingService::Netflix, vec![movie("n", 8.0, 1)])
                .with_catalog(StreamingService::Disney, vec![movie("d", 7.0, 1)])
                .with_failure(StreamingService::Prime, down()),
        );
        let service = service_with(provider);
        let services = [
            StreamingService::Netflix,
            StreamingService::Prime,
            StreamingService::Disney,
        ];

        let response = service
            .get_multi_catalog(&services, &CatalogRequest::default())
            .await
            .unwrap();

        assert!(response.partial);
        assert_eq!(response.page.total_results, 2);
        assert_eq!(response.failures.len(), 1);
        assert_eq!(response.failures[0].service, StreamingService::Prime);
        assert_eq!(response.failures[0].kind, ErrorKind::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn test_multi_service_total_failure_is_an_error() {
        let provider = Arc::new(
            MockProvider::new()
                .with_failure(StreamingService::Netflix, down())
                .with_failure(
                    StreamingService::Prime,
                    ProviderError::RateLimited {
                        retry_after_secs: None,
                    },
                ),
        );
        let service = service_with(provider);

        let err = service
            .get_multi_catalog(
                &[StreamingService::Netflix, StreamingService::Prime],
                &CatalogRequest::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn test_get_catalog_paginates_ordered_results() {
        let titles = (1..=25)
            .map(|n| movie(&format!("t{n:02}"), 5.0, n))
            .collect();
        let provider = Arc::new(MockProvider::new().with_catalog(StreamingService::Apple, titles));
        let service = service_with(provider);

        let request = CatalogRequest {
            page: PageRequest::new(3, 10),
            ..CatalogRequest::default()
        };
        let response = service
            .get_catalog(StreamingService::Apple, &request)
            .await
            .unwrap();

        // Equal ratings, so the highest vote counts come first
        let ids: Vec<&str> = response.page.items.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t05", "t04", "t03", "t02", "t01"]);
        assert!(!response.page.has_more);
        assert!(!response.partial);
    }

    #[tokio::test]
    async fn test_get_catalog_rejects_bad_input_before_fetching() {
        let provider = Arc::new(MockProvider::new());
        let service = service_with(Arc::clone(&provider));

        let bad_country = CatalogRequest {
            country: "usa".to_string(),
            ..CatalogRequest::default()
        };
        assert!(
            service
                .get_catalog(StreamingService::Netflix, &bad_country)
                .await
                .unwrap_err()
                .is_caller_error()
        );

        let bad_rating = CatalogRequest {
            filter: TitleFilter::default().with_min_rating(Some(11.0)),
            order_by: SortOrder::Title,
            ..CatalogRequest::default()
        };
        assert!(
            service
                .get_catalog(StreamingService::Netflix, &bad_rating)
                .await
                .is_err()
        );
        assert_eq!(provider.total_catalog_calls(), 0);
    }

    #[tokio::test]
    async fn test_top_all_covers_every_service() {
        let provider = Arc::new(
            MockProvider::new()
                .with_catalog(StreamingService::Peacock, vec![movie("p", 7.5, 3)])
                .with_failure(StreamingService::Hulu, down()),
        );
        let service = service_with(Arc::clone(&provider));

        let response = service
            .get_top_movies_all(&TopRequest::new(DEFAULT_COUNTRY, 5))
            .await
            .unwrap();
        assert_eq!(response.results.len(), StreamingService::ALL.len() - 1);
        assert_eq!(response.failures.len(), 1);
        assert!(response.partial);
        assert_eq!(provider.total_catalog_calls(), StreamingService::ALL.len());
    }

    #[tokio::test]
    async fn test_compare_services_reports_overlap_and_failures() {
        let provider = Arc::new(
            MockProvider::new()
                .with_catalog(
                    StreamingService::Netflix,
                    vec![movie("x", 8.0, 1), movie("y", 7.0, 1), movie("z", 6.0, 1)],
                )
                .with_catalog(
                    StreamingService::Prime,
                    vec![movie("y", 7.0, 1), movie("z", 6.0, 1), movie("w", 9.0, 1)],
                )
                .with_failure(StreamingService::Hbo, down()),
        );
        let service = service_with(provider);

        let two = service
            .compare_services(&[StreamingService::Netflix, StreamingService::Prime], "us")
            .await
            .unwrap();
        assert_eq!(two.overlap_stats.unique_titles, 4);
        assert_eq!(two.overlap_stats.multi_service_titles, 2);
        assert_eq!(two.overlap_stats.all_services_titles, 2);
        assert_eq!(two.services[0].average_rating, 7.0);
        assert!(!two.partial);

        let three = service
            .compare_services(
                &[
                    StreamingService::Netflix,
                    StreamingService::Prime,
                    StreamingService::Hbo,
                ],
                "us",
            )
            .await
            .unwrap();
        assert!(three.partial);
        assert_eq!(three.services.len(), 2);
        assert_eq!(three.overlap_stats.all_services_titles, 0);

        let single = service
            .compare_services(&[StreamingService::Netflix, StreamingService::Netflix], "us")
            .await;
        assert!(matches!(single, Err(CatalogError::InvalidParameter { .. })));
    }

    #[tokio::test]
    async fn test_search_ranks_closest_names_first() {
        let mut inception = movie("1", 8.8, 10);
        inception.title = "Inception".to_string();
        let mut interception = movie("2", 9.0, 10);
        interception.title = "The Inception Files".to_string();
        let mut show = rated_title("3", None, ContentType::Series, Some(7.0), None);
        show.title = "Inception: The Series".to_string();

        let provider = Arc::new(MockProvider::new().with_catalog(
            StreamingService::Netflix,
            vec![interception, show, inception],
        ));
        let service = service_with(Arc::clone(&provider));

        let response = service
            .search_titles(&SearchRequest::new("inception", "US"))
            .await
            .unwrap();
        assert_eq!(response.country, "us");
        assert_eq!(response.titles[0].id, "1");
        assert_eq!(response.total_results, 3);

        let mut movies_only = SearchRequest::new("inception", "us");
        movies_only.content_type = Some(ContentType::Movie);
        movies_only.min_rating = Some(8.9);
        let filtered = service.search_titles(&movies_only).await.unwrap();
        assert_eq!(filtered.total_results, 1);
        assert_eq!(filtered.titles[0].id, "2");

        service
            .search_titles(&SearchRequest::new("Inception", "us"))
            .await
            .unwrap();
        assert_eq!(provider.search_calls(), 2);
    }

    #[tokio::test]
    async fn test_title_lookup_and_stats() {
        let mut titles = vec![movie("tt1", 9.0, 10), movie("tt2", 5.0, 10)];
        titles[0].genres = vec!["Drama".to_string()];
        let provider = Arc::new(MockProvider::new().with_catalog(StreamingService::Disney, titles));
        let service = service_with(provider);

        let title = service.get_title_by_imdb_id("tt2", "us").await.unwrap();
        assert_eq!(title.rating, Some(5.0));
        assert_eq!(
            service
                .get_title_by_imdb_id("tt9", "us")
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
        assert!(service.get_title_by_imdb_id("  ", "us").await.is_err());

        let stats = service
            .get_service_stats(StreamingService::Disney, "us")
            .await
            .unwrap();
        assert_eq!(stats.statistics.total_titles, 2);
        assert_eq!(stats.statistics.average_rating, 7.0);
        assert_eq!(stats.statistics.top_genres[0].genre, "Drama");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_flag_reaches_the_response() {
        let provider = Arc::new(
            MockProvider::new().with_catalog(StreamingService::Netflix, vec![movie("a", 7.0, 1)]),
        );
        let service = service_with(Arc::clone(&provider));
        let request = TopRequest::new("us", 5);

        service
            .get_top_rated(StreamingService::Netflix, &request)
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(3601)).await;
        provider.set_failure(StreamingService::Netflix, down());

        let response = service
            .get_top_rated(StreamingService::Netflix, &request)
            .await
            .unwrap();
        assert!(response.stale);
        assert_eq!(response.titles.len(), 1);

        let stats = service.cache_statistics();
        assert_eq!(stats.hit_count, 0);
        assert_eq!(stats.entries, 1);
    }
}
