//! Wire types of the Streaming Availability API.
//!
//! Only the fields the catalog uses are decoded; everything else in the
//! upstream payload is ignored.

use std::collections::HashMap;

use serde::Deserialize;
use streamscope_core::catalog::{AccessType, ContentType, StreamingOption, Title};
use streamscope_core::catalog::query::MAX_RATING;

/// Maximum number of cast members kept per title.
pub const MAX_CAST: usize = 10;

/// Upstream ratings use a 0-100 scale.
const UPSTREAM_RATING_SCALE: f32 = 10.0;

/// Response of `shows/search/filters`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersResponse {
    /// Shows on this page
    #[serde(default)]
    pub shows: Vec<ShowDto>,
    /// Whether another page exists
    #[serde(default)]
    pub has_more: bool,
    /// Cursor for the next page
    pub next_cursor: Option<String>,
}

/// Response of `shows/search/title`, which is either a bare list or wrapped.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TitleSearchResponse {
    /// Plain array of shows
    List(Vec<ShowDto>),
    /// Object with a `shows` array
    Wrapped {
        /// Matching shows
        #[serde(default)]
        shows: Vec<ShowDto>,
    },
}

impl TitleSearchResponse {
    /// Returns the shows regardless of envelope.
    pub fn into_shows(self) -> Vec<ShowDto> {
        match self {
            TitleSearchResponse::List(shows) => shows,
            TitleSearchResponse::Wrapped { shows } => shows,
        }
    }
}

/// One movie or series.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowDto {
    /// Provider id
    #[serde(default)]
    pub id: String,
    /// IMDb id
    pub imdb_id: Option<String>,
    /// TMDb id, a string or a number depending on API version
    pub tmdb_id: Option<IdValue>,
    /// Display title
    pub title: Option<String>,
    /// `movie` or `series`
    pub show_type: Option<String>,
    /// Release year of a movie
    pub release_year: Option<u16>,
    /// First air year of a series
    pub first_air_year: Option<u16>,
    /// Plot summary
    pub overview: Option<String>,
    /// Genre tags
    #[serde(default)]
    pub genres: Vec<NamedDto>,
    /// Rating on a 0-100 scale
    pub rating: Option<f32>,
    /// Number of votes behind the rating
    pub rating_count: Option<u32>,
    /// Runtime in minutes
    pub runtime: Option<u32>,
    /// Artwork
    pub image_set: Option<ImageSetDto>,
    /// Directors or creators
    #[serde(default)]
    pub directors: Vec<PersonDto>,
    /// Cast, billing order
    #[serde(default)]
    pub cast: Vec<PersonDto>,
    /// Streaming options keyed by country code
    #[serde(default)]
    pub streaming_options: HashMap<String, Vec<StreamingOptionDto>>,
}

/// Identifier encoded as either text or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    /// Text id
    Text(String),
    /// Numeric id
    Number(u64),
}

impl IdValue {
    fn into_string(self) -> String {
        match self {
            IdValue::Text(text) => text,
            IdValue::Number(number) => number.to_string(),
        }
    }
}

/// Object carrying a `name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedDto {
    /// Display name
    #[serde(default)]
    pub name: String,
}

/// Person given either as a plain name or as an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PersonDto {
    /// Plain name
    Name(String),
    /// Object with a name
    Named(NamedDto),
}

impl PersonDto {
    fn into_name(self) -> String {
        match self {
            PersonDto::Name(name) => name,
            PersonDto::Named(named) => named.name,
        }
    }
}

/// Artwork variants.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSetDto {
    /// Poster URLs keyed by width, e.g. `w480`
    #[serde(default)]
    pub vertical_poster: HashMap<String, String>,
}

/// Service reference inside a streaming option.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceRefDto {
    /// Service id
    #[serde(default)]
    pub id: String,
    /// Service display name
    pub name: Option<String>,
}

/// One way to watch a show in one country.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingOptionDto {
    /// Offering service
    #[serde(default)]
    pub service: ServiceRefDto,
    /// Access label such as `subscription` or `rent`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Deep link
    pub link: Option<String>,
    /// Video quality label
    pub quality: Option<String>,
    /// Whether the title leaves the service soon
    pub leaving_soon: Option<bool>,
    /// Unix timestamp of removal
    #[serde(alias = "expiringDate")]
    pub expires_on: Option<i64>,
}

impl StreamingOptionDto {
    fn into_option(self) -> StreamingOption {
        let service_name = self
            .service
            .name
            .unwrap_or_else(|| self.service.id.clone());
        StreamingOption {
            service: self.service.id,
            service_name,
            access_type: self
                .kind
                .as_deref()
                .map_or(AccessType::Unknown, AccessType::from_label),
            link: self.link,
            quality: self.quality,
            leaving_soon: self.leaving_soon,
            expires_at: self.expires_on,
        }
    }
}

/// Converts an upstream 0-100 rating to the 0-10 scale.
pub fn rating_from_upstream(rating: f32) -> Option<f32> {
    rating
        .is_finite()
        .then(|| (rating / UPSTREAM_RATING_SCALE).clamp(0.0, MAX_RATING))
}

/// Converts a 0-10 rating bound to the upstream 0-100 integer scale.
///
/// Lower bounds round down and upper bounds round up so the upstream never
/// drops a title the local filter would keep.
pub fn rating_to_upstream(rating: f32, upper: bool) -> u8 {
    let scaled = rating * UPSTREAM_RATING_SCALE;
    let rounded = if upper { scaled.ceil() } else { scaled.floor() };
    rounded.clamp(0.0, 100.0) as u8
}

impl ShowDto {
    /// Converts the wire form into a catalog title for one country.
    pub fn into_title(self, country: &str) -> Title {
        let content_type = match self.show_type.as_deref() {
            Some(kind) if kind.eq_ignore_ascii_case("series") => ContentType::Series,
            _ => ContentType::Movie,
        };

        let mut streaming_options = self.streaming_options;
        let options = streaming_options
            .remove(&country.to_ascii_lowercase())
            .unwrap_or_default();

        let mut title = Title::new(
            self.id,
            self.title.unwrap_or_else(|| "Unknown".to_string()),
            content_type,
        );
        title.imdb_id = self.imdb_id.filter(|id| !id.is_empty());
        title.tmdb_id = self.tmdb_id.map(IdValue::into_string);
        title.year = self.release_year.or(self.first_air_year);
        title.overview = self.overview;
        title.genres = self
            .genres
            .into_iter()
            .map(|genre| genre.name)
            .filter(|name| !name.is_empty())
            .collect();
        title.rating = self.rating.and_then(rating_from_upstream);
        title.vote_count = self.rating_count;
        title.runtime_minutes = self.runtime;
        title.poster_url = self
            .image_set
            .and_then(|mut images| images.vertical_poster.remove("w480"));
        title.directors = self.directors.into_iter().map(PersonDto::into_name).collect();
        title.cast = self
            .cast
            .into_iter()
            .take(MAX_CAST)
            .map(PersonDto::into_name)
            .collect();
        title.streaming_options = options
            .into_iter()
            .map(StreamingOptionDto::into_option)
            .collect();
        title
    }
}
