//! Query string parsing and validation.
//!
//! Values arrive as raw strings and are parsed here, so a malformed number
//! produces the same JSON error body as any other invalid parameter.

use std::str::FromStr;

use serde::Deserialize;
use streamscope_core::catalog::{
    CatalogError, ContentType, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageRequest, SearchRequest,
    SortOrder, StreamingService, TitleFilter,
};

/// Query parameters accepted by the API routes.
///
/// Each route reads only the fields it understands.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiQuery {
    pub country: Option<String>,
    pub services: Option<String>,
    pub content_type: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub min_rating: Option<String>,
    pub max_rating: Option<String>,
    pub genres: Option<String>,
    pub genre: Option<String>,
    pub order_by: Option<String>,
    pub limit: Option<String>,
    pub q: Option<String>,
}

/// Inclusive bounds and default for a route's `limit` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitRange {
    pub default: usize,
    pub max: usize,
}

/// Body accepted by `POST /search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchBody {
    pub query: String,
    #[serde(default)]
    pub services: Vec<String>,
    pub content_type: Option<String>,
    pub min_rating: Option<f32>,
}

fn invalid(name: &str, reason: impl Into<String>) -> CatalogError {
    CatalogError::InvalidParameter {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(name: &str, value: &Option<String>) -> Result<Option<T>, CatalogError> {
    present(value)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| invalid(name, format!("'{raw}' is not a valid number")))
        })
        .transpose()
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_content_type(value: Option<&str>) -> Result<Option<ContentType>, CatalogError> {
    value.map(ContentType::from_str).transpose()
}

impl ApiQuery {
    /// Requested country, or the server default.
    pub fn country_or(&self, default: &str) -> String {
        present(&self.country).unwrap_or(default).to_string()
    }

    pub fn content_type(&self) -> Result<Option<ContentType>, CatalogError> {
        parse_content_type(present(&self.content_type))
    }

    pub fn min_rating(&self) -> Result<Option<f32>, CatalogError> {
        parse_number("min_rating", &self.min_rating)
    }

    pub fn max_rating(&self) -> Result<Option<f32>, CatalogError> {
        parse_number("max_rating", &self.max_rating)
    }

    /// Genres from the comma-separated `genres` list and the single `genre`.
    pub fn genres(&self) -> Vec<String> {
        present(&self.genres)
            .into_iter()
            .flat_map(split_list)
            .chain(present(&self.genre))
            .map(str::to_string)
            .collect()
    }

    /// Content type, rating bounds and genres as one filter.
    pub fn filter(&self) -> Result<TitleFilter, CatalogError> {
        Ok(TitleFilter::default()
            .with_content_type(self.content_type()?)
            .with_min_rating(self.min_rating()?)
            .with_max_rating(self.max_rating()?)
            .with_genres(self.genres()))
    }

    /// # Errors
    /// - `CatalogError::InvalidParameter` - `page` below 1 or `page_size` outside 1-100
    pub fn page(&self) -> Result<PageRequest, CatalogError> {
        let page = parse_number::<u32>("page", &self.page)?.unwrap_or(1);
        if page < 1 {
            return Err(invalid("page", "must be at least 1"));
        }

        let page_size = parse_number::<u32>("page_size", &self.page_size)?.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(invalid(
                "page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        Ok(PageRequest::new(page, page_size))
    }

    /// # Errors
    /// - `CatalogError::InvalidParameter` - `limit` outside `1..=range.max`
    pub fn limit(&self, range: LimitRange) -> Result<usize, CatalogError> {
        let limit = parse_number::<usize>("limit", &self.limit)?.unwrap_or(range.default);
        if !(1..=range.max).contains(&limit) {
            return Err(invalid(
                "limit",
                format!("must be between 1 and {}", range.max),
            ));
        }
        Ok(limit)
    }

    pub fn order_by(&self) -> Result<SortOrder, CatalogError> {
        present(&self.order_by)
            .map(SortOrder::from_str)
            .transpose()
            .map(|order| order.unwrap_or(SortOrder::Rating))
    }

    /// The required `services` list.
    ///
    /// # Errors
    /// - `CatalogError::InvalidParameter` - Missing or empty list
    /// - `CatalogError::InvalidService` - Unknown service id
    pub fn services(&self) -> Result<Vec<StreamingService>, CatalogError> {
        let raw = present(&self.services)
            .ok_or_else(|| invalid("services", "a comma-separated list of services is required"))?;
        StreamingService::parse_list(raw)
    }

    /// Search parameters from `q` and the optional filters.
    pub fn search_request(&self, default_country: &str) -> Result<SearchRequest, CatalogError> {
        let mut request = SearchRequest::new(
            present(&self.q).unwrap_or_default(),
            self.country_or(default_country),
        );
        request.services = match present(&self.services) {
            Some(raw) => StreamingService::parse_list(raw)?,
            None => Vec::new(),
        };
        request.content_type = self.content_type()?;
        request.min_rating = self.min_rating()?;
        Ok(request)
    }
}

impl SearchBody {
    /// Converts the body into a search request for `country`.
    pub fn into_request(self, country: String) -> Result<SearchRequest, CatalogError> {
        let mut services = Vec::with_capacity(self.services.len());
        for raw in &self.services {
            let service = raw.parse::<StreamingService>()?;
            if !services.contains(&service) {
                services.push(service);
            }
        }

        let mut request = SearchRequest::new(self.query, country);
        request.services = services;
        request.content_type = parse_content_type(self.content_type.as_deref())?;
        request.min_rating = self.min_rating;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ApiQuery {
        let object: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(object)).unwrap()
    }

    #[test]
    fn test_defaults() {
        let q = ApiQuery::default();
        assert_eq!(q.country_or("gb"), "gb");
        assert_eq!(q.page().unwrap(), PageRequest::default());
        assert_eq!(q.order_by().unwrap(), SortOrder::Rating);
        assert_eq!(q.limit(LimitRange { default: 10, max: 25 }).unwrap(), 10);
        assert_eq!(q.filter().unwrap(), TitleFilter::default());
    }

    #[test]
    fn test_page_bounds() {
        assert!(query(&[("page", "0")]).page().is_err());
        assert!(query(&[("page_size", "0")]).page().is_err());
        assert!(query(&[("page_size", "101")]).page().is_err());
        assert!(query(&[("page", "two")]).page().is_err());

        let page = query(&[("page", "3"), ("page_size", "100")]).page().unwrap();
        assert_eq!(page.page, 3);
        assert_eq!(page.page_size, 100);
    }

    #[test]
    fn test_limit_bounds() {
        let range = LimitRange { default: 10, max: 25 };
        assert_eq!(query(&[("limit", "25")]).limit(range).unwrap(), 25);
        assert!(query(&[("limit", "26")]).limit(range).is_err());
        assert!(query(&[("limit", "0")]).limit(range).is_err());
        assert!(query(&[("limit", "-1")]).limit(range).is_err());
    }

    #[test]
    fn test_filter_parsing() {
        let filter = query(&[
            ("content_type", "Series"),
            ("min_rating", "7.5"),
            ("genres", "Drama, comedy,"),
            ("genre", "Crime"),
        ])
        .filter()
        .unwrap();

        assert_eq!(filter.content_type, Some(ContentType::Series));
        assert_eq!(filter.min_rating, Some(7.5));
        assert_eq!(filter.max_rating, None);
        assert_eq!(filter.genres, vec!["Drama", "comedy", "Crime"]);

        let err = query(&[("content_type", "podcast")]).filter().unwrap_err();
        assert!(matches!(err, CatalogError::InvalidParameter { ref name, .. } if name == "content_type"));
        assert!(query(&[("max_rating", "high")]).filter().is_err());
    }

    #[test]
    fn test_services_are_required_and_known() {
        assert!(matches!(
            ApiQuery::default().services(),
            Err(CatalogError::InvalidParameter { .. })
        ));
        assert!(matches!(
            query(&[("services", "netflix,tubi")]).services(),
            Err(CatalogError::InvalidService { .. })
        ));
        assert_eq!(
            query(&[("services", "netflix, prime,netflix")]).services().unwrap(),
            vec![StreamingService::Netflix, StreamingService::Prime]
        );
    }

    #[test]
    fn test_search_body_conversion() {
        let body = SearchBody {
            query: "dark".to_string(),
            services: vec!["netflix".to_string(), "NETFLIX".to_string()],
            content_type: Some("series".to_string()),
            min_rating: Some(8.0),
        };
        let request = body.into_request("us".to_string()).unwrap();
        assert_eq!(request.services, vec![StreamingService::Netflix]);
        assert_eq!(request.content_type, Some(ContentType::Series));

        let unknown = SearchBody {
            query: "dark".to_string(),
            services: vec!["tubi".to_string()],
            content_type: None,
            min_rating: None,
        };
        assert!(unknown.into_request("us".to_string()).is_err());
    }
}
