//! Offline provider serving a small built-in catalog.
//!
//! Used when no API key is configured, so the server and CLI work without
//! network access.

use async_trait::async_trait;
use streamscope_core::catalog::{
    AccessType, CatalogProvider, ContentType, ProviderError, SearchRequest, StreamingOption,
    StreamingService, Title, TitleFilter,
};

use StreamingService::{Apple, Disney, Hbo, Hulu, Netflix, Peacock, Prime};

/// Compact description of one demo title.
struct DemoEntry {
    imdb_id: &'static str,
    title: &'static str,
    content_type: ContentType,
    year: u16,
    genres: &'static [&'static str],
    rating: f32,
    votes: u32,
    services: &'static [StreamingService],
}

const fn movie(
    imdb_id: &'static str,
    title: &'static str,
    year: u16,
    genres: &'static [&'static str],
    rating: f32,
    votes: u32,
    services: &'static [StreamingService],
) -> DemoEntry {
    DemoEntry {
        imdb_id,
        title,
        content_type: ContentType::Movie,
        year,
        genres,
        rating,
        votes,
        services,
    }
}

const fn series(
    imdb_id: &'static str,
    title: &'static str,
    year: u16,
    genres: &'static [&'static str],
    rating: f32,
    votes: u32,
    services: &'static [StreamingService],
) -> DemoEntry {
    DemoEntry {
        imdb_id,
        title,
        content_type: ContentType::Series,
        year,
        genres,
        rating,
        votes,
        services,
    }
}

const CATALOG: &[DemoEntry] = &[
    movie("tt0111161", "The Shawshank Redemption", 1994, &["Drama"], 9.3, 2_900_000, &[Netflix, Hbo]),
    movie("tt0068646", "The Godfather", 1972, &["Crime", "Drama"], 9.2, 2_000_000, &[Prime, Peacock]),
    movie("tt0468569", "The Dark Knight", 2008, &["Action", "Crime", "Drama"], 9.0, 2_800_000, &[Hbo, Netflix]),
    movie("tt1375666", "Inception", 2010, &["Action", "Science Fiction"], 8.8, 2_500_000, &[Netflix, Prime]),
    movie("tt0133093", "The Matrix", 1999, &["Action", "Science Fiction"], 8.7, 2_000_000, &[Hbo, Prime]),
    movie("tt0816692", "Interstellar", 2014, &["Adventure", "Drama", "Science Fiction"], 8.7, 2_100_000, &[Prime, Peacock]),
    movie("tt0245429", "Spirited Away", 2001, &["Animation", "Family", "Fantasy"], 8.6, 850_000, &[Hbo]),
    movie("tt0114709", "Toy Story", 1995, &["Animation", "Comedy", "Family"], 8.3, 1_100_000, &[Disney]),
    movie("tt2380307", "Coco", 2017, &["Animation", "Family", "Music"], 8.4, 600_000, &[Disney]),
    movie("tt4154796", "Avengers: Endgame", 2019, &["Action", "Adventure"], 8.4, 1_300_000, &[Disney]),
    movie("tt1745960", "Top Gun: Maverick", 2022, &["Action", "Drama"], 8.2, 700_000, &[Prime, Peacock]),
    movie("tt9770150", "Nomadland", 2020, &["Drama"], 7.3, 180_000, &[Hulu, Disney]),
    movie("tt15239678", "Dune: Part Two", 2024, &["Adventure", "Science Fiction"], 8.5, 600_000, &[Hbo]),
    movie("tt8589698", "Greyhound", 2020, &["Action", "Drama", "War"], 7.0, 120_000, &[Apple]),
    movie("tt13320622", "The Lost City", 2022, &["Action", "Comedy"], 6.1, 150_000, &[Prime, Hulu]),
    series("tt0903747", "Breaking Bad", 2008, &["Crime", "Drama"], 9.5, 2_200_000, &[Netflix]),
    series("tt0944947", "Game of Thrones", 2011, &["Drama", "Fantasy"], 9.2, 2_300_000, &[Hbo]),
    series("tt0386676", "The Office", 2005, &["Comedy"], 9.0, 700_000, &[Peacock]),
    series("tt4574334", "Stranger Things", 2016, &["Drama", "Fantasy", "Horror"], 8.7, 1_300_000, &[Netflix]),
    series("tt8589714", "Ted Lasso", 2020, &["Comedy", "Drama"], 8.8, 350_000, &[Apple]),
    series("tt11280740", "Severance", 2022, &["Drama", "Mystery", "Science Fiction"], 8.7, 250_000, &[Apple]),
    series("tt5834204", "The Handmaid's Tale", 2017, &["Drama", "Science Fiction"], 8.4, 270_000, &[Hulu]),
    series("tt14452776", "The Bear", 2022, &["Comedy", "Drama"], 8.5, 250_000, &[Hulu, Disney]),
    series("tt8111088", "The Mandalorian", 2019, &["Action", "Adventure", "Science Fiction"], 8.6, 600_000, &[Disney]),
    series("tt7660850", "Succession", 2018, &["Drama"], 8.9, 250_000, &[Hbo]),
    series("tt5753856", "Dark", 2017, &["Crime", "Drama", "Mystery"], 8.7, 470_000, &[Netflix]),
    series("tt1190634", "The Boys", 2019, &["Action", "Comedy", "Crime"], 8.7, 700_000, &[Prime]),
    series("tt2861424", "Rick and Morty", 2013, &["Animation", "Comedy"], 9.1, 600_000, &[Hulu, Hbo]),
];

impl DemoEntry {
    fn offered_by(&self, service: StreamingService) -> bool {
        self.services.contains(&service)
    }

    fn to_title(&self) -> Title {
        let mut title = Title::new(self.imdb_id, self.title, self.content_type);
        title.imdb_id = Some(self.imdb_id.to_string());
        title.year = Some(self.year);
        title.genres = self.genres.iter().map(|g| g.to_string()).collect();
        title.rating = Some(self.rating);
        title.vote_count = Some(self.votes);
        title.streaming_options = self
            .services
            .iter()
            .map(|service| StreamingOption {
                service: service.id().to_string(),
                service_name: service.display_name().to_string(),
                access_type: AccessType::Subscription,
                link: None,
                quality: Some("hd".to_string()),
                leaving_soon: Some(false),
                expires_at: None,
            })
            .collect();
        title
    }
}

/// Provider backed by a fixed catalog of well-known titles.
///
/// Country codes are accepted but ignored: every country sees the same
/// catalog. Filters are honoured the way the upstream would.
#[derive(Debug, Clone, Default)]
pub struct DemoProvider;

impl DemoProvider {
    /// Creates the demo provider.
    pub fn new() -> Self {
        Self
    }

    /// Number of distinct titles in the demo catalog.
    pub fn catalog_size() -> usize {
        CATALOG.len()
    }
}

fn matches_filter(entry: &DemoEntry, filter: &TitleFilter) -> bool {
    let genres = filter.normalized_genres();
    filter
        .content_type
        .is_none_or(|content_type| entry.content_type == content_type)
        && filter.min_rating.is_none_or(|min| entry.rating >= min)
        && filter.max_rating.is_none_or(|max| entry.rating <= max)
        && (genres.is_empty()
            || entry
                .genres
                .iter()
                .any(|genre| genres.contains(&genre.to_lowercase())))
}

#[async_trait]
impl CatalogProvider for DemoProvider {
    async fn fetch_catalog(
        &self,
        service: StreamingService,
        _country: &str,
        filter: &TitleFilter,
    ) -> Result<Vec<Title>, ProviderError> {
        Ok(CATALOG
            .iter()
            .filter(|entry| entry.offered_by(service))
            .filter(|entry| matches_filter(entry, filter))
            .map(DemoEntry::to_title)
            .collect())
    }

    async fn fetch_by_imdb_id(&self, imdb_id: &str, _country: &str) -> Result<Title, ProviderError> {
        CATALOG
            .iter()
            .find(|entry| entry.imdb_id.eq_ignore_ascii_case(imdb_id.trim()))
            .map(DemoEntry::to_title)
            .ok_or_else(|| ProviderError::NotFound {
                what: format!("title {imdb_id}"),
            })
    }

    async fn search_titles(&self, request: &SearchRequest) -> Result<Vec<Title>, ProviderError> {
        let needle = request.query.trim().to_lowercase();
        Ok(CATALOG
            .iter()
            .filter(|entry| entry.title.to_lowercase().contains(&needle))
            .filter(|entry| {
                request
                    .content_type
                    .is_none_or(|content_type| entry.content_type == content_type)
            })
            .filter(|entry| {
                request.services.is_empty()
                    || request.services.iter().any(|service| entry.offered_by(*service))
            })
            .map(DemoEntry::to_title)
            .collect())
    }
}
