//! Streaming Availability API client (RapidAPI).

use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::de::DeserializeOwned;
use streamscope_core::catalog::{
    CatalogProvider, ProviderError, SearchRequest, StreamingService, Title, TitleFilter,
};
use streamscope_core::config::ProviderConfig;
use url::Url;

use crate::dto::{FiltersResponse, ShowDto, TitleSearchResponse, rating_to_upstream};
use crate::errors::ProviderSetupError;

/// Query parameters of one upstream request.
type Params = Vec<(&'static str, String)>;

/// HTTP client for the Streaming Availability API.
///
/// Transport failures, timeouts, and non-2xx responses are reported as
/// `ProviderError`s; nothing is retried here.
#[derive(Clone)]
pub struct StreamingAvailabilityClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    api_host: String,
    max_pages: u32,
}

impl fmt::Debug for StreamingAvailabilityClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingAvailabilityClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_host", &self.api_host)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

impl StreamingAvailabilityClient {
    /// Creates a client from provider configuration.
    ///
    /// # Errors
    ///
    /// - `ProviderSetupError::MissingApiKey` - If no API key is configured
    /// - `ProviderSetupError::InvalidBaseUrl` - If the base URL does not parse
    /// - `ProviderSetupError::ClientBuild` - If the HTTP client cannot be built
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderSetupError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProviderSetupError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| ProviderSetupError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: parse_base_url(&config.base_url)?,
            api_key,
            api_host: config.api_host.clone(),
            max_pages: config.max_pages.max(1),
        })
    }

    /// Base URL every endpoint path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, ProviderError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ProviderError::Unavailable {
                reason: format!("invalid endpoint '{path}': {e}"),
            })?;

        tracing::debug!(%url, "Requesting upstream catalog");
        let response = self
            .client
            .get(url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable {
                reason: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error = status_error(status, response.headers(), path);
            tracing::warn!(%status, path, %error, "Upstream returned an error status");
            return Err(error);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Unavailable {
                reason: format!("reading response body failed: {e}"),
            })?;

        serde_json::from_slice(&body).map_err(|e| ProviderError::InvalidResponse {
            reason: format!("{path}: {e}"),
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ProviderSetupError> {
    // Endpoint paths are joined relative to the base, which needs a trailing slash
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };

    Url::parse(&normalized).map_err(|e| ProviderSetupError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Maps a non-2xx response to a provider error.
fn status_error(status: StatusCode, headers: &HeaderMap, path: &str) -> ProviderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            retry_after_secs: headers
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse().ok()),
        },
        StatusCode::NOT_FOUND => ProviderError::NotFound {
            what: path.to_string(),
        },
        _ => ProviderError::Unavailable {
            reason: format!("upstream returned {status}"),
        },
    }
}

fn filter_params(
    service: StreamingService,
    country: &str,
    filter: &TitleFilter,
    cursor: Option<&str>,
) -> Params {
    let mut params = vec![
        ("country", country.to_string()),
        ("catalogs", service.id().to_string()),
        ("order_by", "rating".to_string()),
        ("order_direction", "desc".to_string()),
        ("output_language", "en".to_string()),
    ];

    if let Some(content_type) = filter.content_type {
        params.push(("show_type", content_type.as_str().to_string()));
    }
    if let Some(min) = filter.min_rating {
        params.push(("rating_min", rating_to_upstream(min, false).to_string()));
    }
    if let Some(max) = filter.max_rating {
        params.push(("rating_max", rating_to_upstream(max, true).to_string()));
    }

    let genres = filter.normalized_genres();
    if !genres.is_empty() {
        params.push(("genres", genres.join(",")));
    }
    if let Some(cursor) = cursor {
        params.push(("cursor", cursor.to_string()));
    }
    params
}

fn search_params(request: &SearchRequest) -> Params {
    let mut params = vec![
        ("country", request.country.clone()),
        ("title", request.query.trim().to_string()),
        ("output_language", "en".to_string()),
    ];

    if let Some(content_type) = request.content_type {
        params.push(("show_type", content_type.as_str().to_string()));
    }
    if !request.services.is_empty() {
        let catalogs: Vec<&str> = request.services.iter().map(|s| s.id()).collect();
        params.push(("catalogs", catalogs.join(",")));
    }
    params
}

fn is_inverted(filter: &TitleFilter) -> bool {
    matches!((filter.min_rating, filter.max_rating), (Some(min), Some(max)) if min > max)
}

#[async_trait]
impl CatalogProvider for StreamingAvailabilityClient {
    async fn fetch_catalog(
        &self,
        service: StreamingService,
        country: &str,
        filter: &TitleFilter,
    ) -> Result<Vec<Title>, ProviderError> {
        // Matches nothing; the upstream would reject the range
        if is_inverted(filter) {
            return Ok(Vec::new());
        }

        let mut titles = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 1..=self.max_pages {
            let params = filter_params(service, country, filter, cursor.as_deref());
            let response: FiltersResponse =
                self.get_json("shows/search/filters", &params).await?;

            titles.extend(
                response
                    .shows
                    .into_iter()
                    .map(|show| show.into_title(country)),
            );

            match response.next_cursor {
                Some(next) if response.has_more => cursor = Some(next),
                _ => break,
            }
            tracing::debug!(%service, page, "Following catalog cursor");
        }

        tracing::info!(%service, country, titles = titles.len(), "Fetched upstream catalog");
        Ok(titles)
    }

    async fn fetch_by_imdb_id(&self, imdb_id: &str, country: &str) -> Result<Title, ProviderError> {
        let id = imdb_id.trim();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ProviderError::NotFound {
                what: format!("title {imdb_id}"),
            });
        }

        let params = vec![("country", country.to_string())];
        let show: ShowDto = self
            .get_json(&format!("shows/{id}"), &params)
            .await
            .map_err(|error| match error {
                ProviderError::NotFound { .. } => ProviderError::NotFound {
                    what: format!("title {id}"),
                },
                other => other,
            })?;
        Ok(show.into_title(country))
    }

    async fn search_titles(&self, request: &SearchRequest) -> Result<Vec<Title>, ProviderError> {
        let response: TitleSearchResponse = self
            .get_json("shows/search/title", &search_params(request))
            .await?;

        Ok(response
            .into_shows()
            .into_iter()
            .map(|show| show.into_title(&request.country))
            .collect())
    }
}
