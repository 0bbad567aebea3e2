//! Request parameter types for catalog operations.
//!
//! Every recognised filter is an explicit field with a documented default,
//! so validation and cache-key normalization cover a known shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::CatalogError;
use super::model::{ContentType, StreamingService};

/// Default country when a request does not name one.
pub const DEFAULT_COUNTRY: &str = "us";
/// Default number of titles per page.
pub const DEFAULT_PAGE_SIZE: u32 = 25;
/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Ratings are expressed on a 0-10 scale.
pub const MAX_RATING: f32 = 10.0;

/// Title-level filters applied by the aggregator and forwarded upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleFilter {
    /// Only keep titles of this type (default: any)
    pub content_type: Option<ContentType>,
    /// Inclusive lower rating bound (default: none)
    pub min_rating: Option<f32>,
    /// Inclusive upper rating bound (default: none)
    pub max_rating: Option<f32>,
    /// Keep titles carrying at least one of these genres (default: any)
    pub genres: Vec<String>,
}

impl TitleFilter {
    pub fn movies() -> Self {
        Self {
            content_type: Some(ContentType::Movie),
            ..Self::default()
        }
    }

    pub fn with_content_type(mut self, content_type: Option<ContentType>) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_min_rating(mut self, min_rating: Option<f32>) -> Self {
        self.min_rating = min_rating;
        self
    }

    pub fn with_max_rating(mut self, max_rating: Option<f32>) -> Self {
        self.max_rating = max_rating;
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    /// Whether either rating bound is set.
    pub fn has_rating_bounds(&self) -> bool {
        self.min_rating.is_some() || self.max_rating.is_some()
    }

    /// Genres lowercased, trimmed, sorted and deduplicated.
    pub fn normalized_genres(&self) -> Vec<String> {
        let mut genres: Vec<String> = self
            .genres
            .iter()
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .collect();
        genres.sort();
        genres.dedup();
        genres
    }

    /// Canonical text form used in cache keys.
    ///
    /// Two filters selecting the same titles produce the same signature
    /// regardless of genre order, case, or duplicates. Rating bounds are
    /// written exactly; `f32` display output round-trips.
    pub fn signature(&self) -> String {
        let content_type = self.content_type.map_or("any", ContentType::as_str);
        let min = self
            .min_rating
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        let max = self
            .max_rating
            .map_or_else(|| "-".to_string(), |r| r.to_string());
        let genres = self.normalized_genres().join("+");

        format!("type={content_type};rating={min}..{max};genres={genres}")
    }

    /// Checks rating bounds are within 0-10.
    ///
    /// An inverted range is accepted; it simply matches nothing.
    ///
    /// # Errors
    /// - `CatalogError::InvalidParameter` - A bound is outside 0-10 or not a number
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (name, bound) in [("min_rating", self.min_rating), ("max_rating", self.max_rating)] {
            if let Some(value) = bound {
                if !(0.0..=MAX_RATING).contains(&value) {
                    return Err(CatalogError::invalid_parameter(
                        name,
                        format!("{value} is outside 0-10"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// 1-indexed page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Creates a page request, clamping page to >= 1 and size to 1-100.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1).saturating_mul(self.page_size as usize)
    }
}

/// Ordering applied before pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Rating desc, then vote count desc, then id asc
    #[default]
    Rating,
    /// Release year desc, then rating order
    Year,
    /// Title name asc, then id asc
    Title,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Rating => "rating",
            SortOrder::Year => "year",
            SortOrder::Title => "title",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rating" => Ok(SortOrder::Rating),
            "year" => Ok(SortOrder::Year),
            "title" => Ok(SortOrder::Title),
            _ => Err(CatalogError::invalid_parameter(
                "order_by",
                format!("'{s}' is not one of: rating, year, title"),
            )),
        }
    }
}

/// Normalizes a country code to its lowercase two-letter form.
///
/// # Errors
/// - `CatalogError::InvalidParameter` - The code is not two ASCII letters
pub fn normalize_country(country: &str) -> Result<String, CatalogError> {
    let trimmed = country.trim();
    if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CatalogError::invalid_parameter(
            "country",
            format!("'{country}' is not a two-letter country code"),
        ));
    }
    Ok(trimmed.to_ascii_lowercase())
}

/// Parameters for paginated catalog listings.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRequest {
    pub country: String,
    pub filter: TitleFilter,
    pub page: PageRequest,
    pub order_by: SortOrder,
}

impl Default for CatalogRequest {
    fn default() -> Self {
        Self {
            country: DEFAULT_COUNTRY.to_string(),
            filter: TitleFilter::default(),
            page: PageRequest::default(),
            order_by: SortOrder::Rating,
        }
    }
}

/// Parameters for top-N listings.
#[derive(Debug, Clone, PartialEq)]
pub struct TopRequest {
    pub country: String,
    pub filter: TitleFilter,
    pub limit: usize,
}

impl TopRequest {
    pub fn new(country: impl Into<String>, limit: usize) -> Self {
        Self {
            country: country.into(),
            filter: TitleFilter::default(),
            limit,
        }
    }

    pub fn with_filter(mut self, filter: TitleFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Parameters for a title search across services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub country: String,
    /// Restrict to these services (default: all)
    pub services: Vec<StreamingService>,
    pub content_type: Option<ContentType>,
    pub min_rating: Option<f32>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            country: country.into(),
            services: Vec::new(),
            content_type: None,
            min_rating: None,
        }
    }

    /// Canonical text form used in cache keys.
    ///
    /// `min_rating` is applied locally and so is not part of the signature.
    pub fn signature(&self) -> String {
        let mut services: Vec<&str> = self.services.iter().map(|s| s.id()).collect();
        services.sort_unstable();
        services.dedup();

        format!(
            "q={};type={};services={}",
            self.query.trim().to_lowercase(),
            self.content_type.map_or("any", ContentType::as_str),
            services.join("+")
        )
    }

    /// # Errors
    /// - `CatalogError::InvalidParameter` - Empty query or rating outside 0-10
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.query.trim().is_empty() {
            return Err(CatalogError::invalid_parameter("query", "must not be empty"));
        }
        TitleFilter::default()
            .with_min_rating(self.min_rating)
            .validate()
    }
}
