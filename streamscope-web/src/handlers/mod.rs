//! HTTP request handlers

pub mod api;
pub mod error;
pub mod params;

pub use api::{
    cache_stats, catalog_for_service, compare_services, health, multi_catalog, search_get,
    search_post, service_stats, services, title_by_imdb_id, top_movies_all,
    top_movies_for_service, top_rated_all, top_rated_for_service,
};
pub use error::ApiError;
