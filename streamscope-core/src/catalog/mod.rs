//! Catalog caching and aggregation
//!
//! Upstream responses flow through `fetcher` (cache and coalescing), are
//! shaped by `aggregate` and `comparison`, and are exposed as operations by
//! `service`.

pub mod aggregate;
pub mod cache;
pub mod comparison;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod provider;
pub mod query;
pub mod service;

pub use aggregate::{Page, ServiceTitles, TopPerService};
pub use cache::{CacheStatistics, TtlCache};
pub use comparison::{Comparison, OverlapStats, ServiceStatistics, ServiceSummary};
pub use error::{CatalogError, ErrorKind, ProviderError};
pub use fetcher::{CacheKey, CatalogCache, CatalogFetcher, FetchPolicy, ServiceFailure, ServiceFetch};
pub use model::{AccessType, CatalogSnapshot, ContentType, StreamingOption, StreamingService, Title};
#[cfg(any(test, feature = "test-utils"))]
pub use provider::{MockProvider, rated_title};
pub use provider::CatalogProvider;
pub use query::{
    CatalogRequest, DEFAULT_COUNTRY, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageRequest, SearchRequest,
    SortOrder, TitleFilter, TopRequest, normalize_country,
};
pub use service::{
    CatalogResponse, CatalogService, ComparisonResponse, SearchResponse, ServiceStatsResponse,
    TopAllResponse, TopListResponse,
};
