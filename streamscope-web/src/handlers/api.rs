//! API handlers for catalog listings, rankings, search and statistics

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use serde::Serialize;
use serde_json::{Value, json};
use streamscope_core::catalog::{
    CacheStatistics, CatalogRequest, CatalogResponse, ComparisonResponse, SearchResponse,
    ServiceStatsResponse, StreamingService, Title, TitleFilter, TopAllResponse, TopListResponse,
    TopRequest,
};

use super::error::ApiError;
use super::params::{ApiQuery, LimitRange, SearchBody};
use crate::server::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

const TOP_MOVIES_DEFAULT: usize = 10;
const TOP_RATED_DEFAULT: usize = 50;
const TOP_ALL_DEFAULT: usize = 10;

/// Body of `/` and `/health`.
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub services_supported: Vec<&'static str>,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct ServiceInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

fn parse_service(raw: &str) -> Result<StreamingService, ApiError> {
    Ok(raw.parse::<StreamingService>()?)
}

/// Service status, version and supported services.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        services_supported: StreamingService::ALL.iter().map(|s| s.id()).collect(),
        uptime_secs: state.server_started_at.elapsed().as_secs(),
    })
}

/// Every supported service with its display name.
pub async fn services() -> Json<Value> {
    let services: Vec<ServiceInfo> = StreamingService::ALL
        .iter()
        .map(|service| ServiceInfo {
            id: service.id(),
            name: service.display_name(),
            description: service.description(),
        })
        .collect();

    Json(json!({
        "total": services.len(),
        "services": services,
    }))
}

/// `GET /catalog/{service}`
pub async fn catalog_for_service(
    State(state): State<AppState>,
    Path(service): Path<String>,
    Query(query): Query<ApiQuery>,
) -> ApiResult<CatalogResponse> {
    let service = parse_service(&service)?;
    let request = catalog_request(&state, &query)?;
    Ok(Json(state.catalog.get_catalog(service, &request).await?))
}

/// `GET /catalog?services=a,b`: merged catalog of several services.
pub async fn multi_catalog(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> ApiResult<CatalogResponse> {
    let services = query.services()?;
    let request = catalog_request(&state, &query)?;
    Ok(Json(
        state.catalog.get_multi_catalog(&services, &request).await?,
    ))
}

fn catalog_request(state: &AppState, query: &ApiQuery) -> Result<CatalogRequest, ApiError> {
    Ok(CatalogRequest {
        country: query.country_or(&state.settings.default_country),
        filter: query.filter()?,
        page: query.page()?,
        order_by: query.order_by()?,
    })
}

/// `GET /top-movies/{service}`
pub async fn top_movies_for_service(
    State(state): State<AppState>,
    Path(service): Path<String>,
    Query(query): Query<ApiQuery>,
) -> ApiResult<TopListResponse> {
    let service = parse_service(&service)?;
    let limit = query.limit(LimitRange {
        default: TOP_MOVIES_DEFAULT,
        max: state.settings.max_top_limit,
    })?;
    let filter = TitleFilter::default()
        .with_min_rating(query.min_rating()?)
        .with_genres(query.genres());
    let request =
        TopRequest::new(query.country_or(&state.settings.default_country), limit).with_filter(filter);

    Ok(Json(state.catalog.get_top_movies(service, &request).await?))
}

/// `GET /top-movies`: top movies grouped per service.
pub async fn top_movies_all(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> ApiResult<TopAllResponse> {
    let limit = query.limit(LimitRange {
        default: TOP_ALL_DEFAULT,
        max: state.settings.max_top_movies_all_limit,
    })?;
    let filter = TitleFilter::default().with_min_rating(query.min_rating()?);
    let request =
        TopRequest::new(query.country_or(&state.settings.default_country), limit).with_filter(filter);

    Ok(Json(state.catalog.get_top_movies_all(&request).await?))
}

/// `GET /top-rated/{service}`
pub async fn top_rated_for_service(
    State(state): State<AppState>,
    Path(service): Path<String>,
    Query(query): Query<ApiQuery>,
) -> ApiResult<TopListResponse> {
    let service = parse_service(&service)?;
    let limit = query.limit(LimitRange {
        default: TOP_RATED_DEFAULT,
        max: state.settings.max_top_limit,
    })?;
    let filter = TitleFilter::default().with_content_type(query.content_type()?);
    let request =
        TopRequest::new(query.country_or(&state.settings.default_country), limit).with_filter(filter);

    Ok(Json(state.catalog.get_top_rated(service, &request).await?))
}

/// `GET /top-rated`
pub async fn top_rated_all(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> ApiResult<TopAllResponse> {
    let limit = query.limit(LimitRange {
        default: TOP_ALL_DEFAULT,
        max: state.settings.max_top_rated_all_limit,
    })?;
    let filter = TitleFilter::default().with_content_type(query.content_type()?);
    let request =
        TopRequest::new(query.country_or(&state.settings.default_country), limit).with_filter(filter);

    Ok(Json(state.catalog.get_top_rated_all(&request).await?))
}

/// `GET /search?q=...`
pub async fn search_get(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> ApiResult<SearchResponse> {
    let request = query.search_request(&state.settings.default_country)?;
    Ok(Json(state.catalog.search_titles(&request).await?))
}

/// Search with filters in a JSON body; `country` stays a query parameter.
pub async fn search_post(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> ApiResult<SearchResponse> {
    let Json(body) = body?;
    let request = body.into_request(query.country_or(&state.settings.default_country))?;
    Ok(Json(state.catalog.search_titles(&request).await?))
}

/// `GET /title/imdb/{imdb_id}`
pub async fn title_by_imdb_id(
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
    Query(query): Query<ApiQuery>,
) -> ApiResult<Title> {
    let country = query.country_or(&state.settings.default_country);
    Ok(Json(
        state.catalog.get_title_by_imdb_id(&imdb_id, &country).await?,
    ))
}

/// `GET /compare?services=a,b`: needs at least two services.
pub async fn compare_services(
    State(state): State<AppState>,
    Query(query): Query<ApiQuery>,
) -> ApiResult<ComparisonResponse> {
    let services = query.services()?;
    let country = query.country_or(&state.settings.default_country);
    Ok(Json(
        state.catalog.compare_services(&services, &country).await?,
    ))
}

/// `GET /stats/{service}`
pub async fn service_stats(
    State(state): State<AppState>,
    Path(service): Path<String>,
    Query(query): Query<ApiQuery>,
) -> ApiResult<ServiceStatsResponse> {
    let service = parse_service(&service)?;
    let country = query.country_or(&state.settings.default_country);
    Ok(Json(
        state.catalog.get_service_stats(service, &country).await?,
    ))
}

/// Hit and miss counters of the shared catalog cache.
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStatistics> {
    Json(state.catalog.cache_statistics())
}
