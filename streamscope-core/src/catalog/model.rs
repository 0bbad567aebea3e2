//! Catalog data types shared by the cache, aggregator, and providers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::CatalogError;

/// Streaming services supported by the catalog.
///
/// The set is closed: requests naming any other service are rejected with
/// `CatalogError::InvalidService` before anything is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamingService {
    Netflix,
    Prime,
    Disney,
    Hbo,
    Peacock,
    Apple,
    Hulu,
}

impl StreamingService {
    /// Every supported service, in display order.
    pub const ALL: [StreamingService; 7] = [
        StreamingService::Netflix,
        StreamingService::Prime,
        StreamingService::Disney,
        StreamingService::Hbo,
        StreamingService::Peacock,
        StreamingService::Apple,
        StreamingService::Hulu,
    ];

    /// Service identifier used on the wire and by the upstream provider.
    pub fn id(self) -> &'static str {
        match self {
            StreamingService::Netflix => "netflix",
            StreamingService::Prime => "prime",
            StreamingService::Disney => "disney",
            StreamingService::Hbo => "hbo",
            StreamingService::Peacock => "peacock",
            StreamingService::Apple => "apple",
            StreamingService::Hulu => "hulu",
        }
    }

    /// Human readable service name.
    pub fn display_name(self) -> &'static str {
        match self {
            StreamingService::Netflix => "Netflix",
            StreamingService::Prime => "Amazon Prime Video",
            StreamingService::Disney => "Disney+",
            StreamingService::Hbo => "Max (HBO Max)",
            StreamingService::Peacock => "Peacock",
            StreamingService::Apple => "Apple TV+",
            StreamingService::Hulu => "Hulu",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StreamingService::Netflix => "Netflix streaming service",
            StreamingService::Prime => "Amazon Prime Video streaming service",
            StreamingService::Disney => "Disney Plus streaming service",
            StreamingService::Hbo => "Max (formerly HBO Max) streaming service",
            StreamingService::Peacock => "Peacock streaming service",
            StreamingService::Apple => "Apple TV Plus streaming service",
            StreamingService::Hulu => "Hulu streaming service",
        }
    }

    /// Parses a comma separated list of service ids.
    ///
    /// Blank segments are ignored and repeated services are kept once, in
    /// first-seen order.
    ///
    /// # Errors
    /// - `CatalogError::InvalidService` - A segment names an unknown service
    /// - `CatalogError::InvalidParameter` - The list contains no service at all
    pub fn parse_list(raw: &str) -> Result<Vec<StreamingService>, CatalogError> {
        let mut services = Vec::new();
        for segment in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let service = segment.parse::<StreamingService>()?;
            if !services.contains(&service) {
                services.push(service);
            }
        }

        if services.is_empty() {
            return Err(CatalogError::InvalidParameter {
                name: "services".to_string(),
                reason: "at least one service is required".to_string(),
            });
        }
        Ok(services)
    }
}

impl fmt::Display for StreamingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for StreamingService {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        StreamingService::ALL
            .into_iter()
            .find(|service| service.id() == normalized)
            .ok_or_else(|| CatalogError::InvalidService {
                service: s.to_string(),
            })
    }
}

/// Whether a title is a film or an episodic show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Series,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Series => "series",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(ContentType::Movie),
            "series" => Ok(ContentType::Series),
            _ => Err(CatalogError::InvalidParameter {
                name: "content_type".to_string(),
                reason: format!("'{s}' is not one of: movie, series"),
            }),
        }
    }
}

/// How a streaming option grants access to a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    Subscription,
    Rent,
    Buy,
    Free,
    Addon,
    #[default]
    Unknown,
}

impl AccessType {
    /// Maps the upstream access label, falling back to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "subscription" => AccessType::Subscription,
            "rent" => AccessType::Rent,
            "buy" => AccessType::Buy,
            "free" => AccessType::Free,
            "addon" => AccessType::Addon,
            _ => AccessType::Unknown,
        }
    }
}

/// One way of watching a title in the fetched country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingOption {
    pub service: String,
    pub service_name: String,
    pub access_type: AccessType,
    pub link: Option<String>,
    pub quality: Option<String>,
    pub leaving_soon: Option<bool>,
    /// Unix timestamp after which the title leaves the service
    pub expires_at: Option<i64>,
}

/// Movie or series snapshot as delivered by the upstream provider.
///
/// Titles are never mutated after creation; a refetch replaces the whole
/// cached catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    /// Provider-assigned identifier
    pub id: String,
    /// Cross-reference id used to correlate titles across services
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<String>,
    pub title: String,
    pub content_type: ContentType,
    pub year: Option<u16>,
    pub overview: Option<String>,
    pub genres: Vec<String>,
    /// Rating on a 0-10 scale
    pub rating: Option<f32>,
    pub vote_count: Option<u32>,
    pub runtime_minutes: Option<u32>,
    pub poster_url: Option<String>,
    pub directors: Vec<String>,
    pub cast: Vec<String>,
    pub streaming_options: Vec<StreamingOption>,
}

impl Title {
    /// Creates a title with only the identifying fields set.
    pub fn new(id: impl Into<String>, title: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            id: id.into(),
            imdb_id: None,
            tmdb_id: None,
            title: title.into(),
            content_type,
            year: None,
            overview: None,
            genres: Vec::new(),
            rating: None,
            vote_count: None,
            runtime_minutes: None,
            poster_url: None,
            directors: Vec::new(),
            cast: Vec::new(),
            streaming_options: Vec::new(),
        }
    }

    /// Checks whether the title carries the genre, ignoring case.
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }

    /// Returns the cross-reference id if present and non-empty.
    pub fn cross_reference_id(&self) -> Option<&str> {
        self.imdb_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Immutable result of one upstream fetch.
///
/// Cloning is cheap: the titles are shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub titles: Arc<[Title]>,
    pub fetched_at: DateTime<Utc>,
    /// Set when an expired entry was served because the provider failed
    pub stale: bool,
}

impl CatalogSnapshot {
    /// Wraps freshly fetched titles.
    pub fn new(titles: Vec<Title>) -> Self {
        Self {
            titles: titles.into(),
            fetched_at: Utc::now(),
            stale: false,
        }
    }

    /// Marks a snapshot that is being served past its expiry.
    pub fn into_stale(mut self) -> Self {
        self.stale = true;
        self
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_round_trips_through_id() {
        for service in StreamingService::ALL {
            assert_eq!(service.id().parse::<StreamingService>().unwrap(), service);
        }
        assert_eq!(
            " NetFlix ".parse::<StreamingService>().unwrap(),
            StreamingService::Netflix
        );
    }

    #[test]
    fn test_unknown_service_is_rejected() {
        let err = "crunchyroll".parse::<StreamingService>().unwrap_err();
        assert!(matches!(err, CatalogError::InvalidService { ref service } if service == "crunchyroll"));
    }

    #[test]
    fn test_parse_service_list_dedups_in_order() {
        let services = StreamingService::parse_list("prime, netflix,,prime").unwrap();
        assert_eq!(
            services,
            vec![StreamingService::Prime, StreamingService::Netflix]
        );

        assert!(matches!(
            StreamingService::parse_list(" , "),
            Err(CatalogError::InvalidParameter { .. })
        ));
        assert!(matches!(
            StreamingService::parse_list("netflix,bogus"),
            Err(CatalogError::InvalidService { .. })
        ));
    }

    #[test]
    fn test_content_type_parsing() {
        assert_eq!("Movie".parse::<ContentType>().unwrap(), ContentType::Movie);
        assert_eq!("series".parse::<ContentType>().unwrap(), ContentType::Series);
        assert!("episode".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_title_genre_and_cross_reference() {
        let mut title = Title::new("1", "Heat", ContentType::Movie);
        title.genres = vec!["Crime".to_string(), "Drama".to_string()];
        assert!(title.has_genre("crime"));
        assert!(!title.has_genre("comedy"));

        assert_eq!(title.cross_reference_id(), None);
        title.imdb_id = Some(String::new());
        assert_eq!(title.cross_reference_id(), None);
        title.imdb_id = Some("tt0113277".to_string());
        assert_eq!(title.cross_reference_id(), Some("tt0113277"));
    }

    #[test]
    fn test_access_type_labels() {
        assert_eq!(AccessType::from_label("Subscription"), AccessType::Subscription);
        assert_eq!(AccessType::from_label("lease"), AccessType::Unknown);
    }
}
