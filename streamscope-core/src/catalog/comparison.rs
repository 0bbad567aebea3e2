//! Cross-service comparison and per-service statistics.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::model::{ContentType, StreamingService, Title};

/// Number of genres reported in service statistics.
pub const TOP_GENRE_COUNT: usize = 10;

/// Catalog size and rating overview for one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    pub service: StreamingService,
    pub service_name: &'static str,
    pub total_titles: usize,
    /// Mean over rated titles, 0 when nothing is rated
    pub average_rating: f64,
    pub movie_count: usize,
    pub series_count: usize,
}

/// How titles are shared between the compared services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OverlapStats {
    /// Distinct cross-reference ids across all services
    pub unique_titles: usize,
    /// Ids available on two or more services
    pub multi_service_titles: usize,
    /// Ids available on every requested service
    pub all_services_titles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub summaries: Vec<ServiceSummary>,
    pub overlap: OverlapStats,
}

/// Count of ratings in each band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RatingDistribution {
    #[serde(rename = "9-10")]
    pub nine_to_ten: usize,
    #[serde(rename = "8-9")]
    pub eight_to_nine: usize,
    #[serde(rename = "7-8")]
    pub seven_to_eight: usize,
    #[serde(rename = "6-7")]
    pub six_to_seven: usize,
    pub below_6: usize,
}

impl RatingDistribution {
    fn record(&mut self, rating: f32) {
        match rating {
            r if r >= 9.0 => self.nine_to_ten += 1,
            r if r >= 8.0 => self.eight_to_nine += 1,
            r if r >= 7.0 => self.seven_to_eight += 1,
            r if r >= 6.0 => self.six_to_seven += 1,
            _ => self.below_6 += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: usize,
}

/// Detailed breakdown of one service's catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatistics {
    pub total_titles: usize,
    pub total_movies: usize,
    pub total_series: usize,
    pub average_rating: f64,
    pub highest_rated: Option<f32>,
    pub lowest_rated: Option<f32>,
    pub rating_distribution: RatingDistribution,
    pub top_genres: Vec<GenreCount>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn average_rating(titles: &[Title]) -> f64 {
    let ratings: Vec<f64> = titles
        .iter()
        .filter_map(|title| title.rating)
        .map(f64::from)
        .collect();

    if ratings.is_empty() {
        return 0.0;
    }
    round2(ratings.iter().sum::<f64>() / ratings.len() as f64)
}

fn count_type(titles: &[Title], content_type: ContentType) -> usize {
    titles
        .iter()
        .filter(|title| title.content_type == content_type)
        .count()
}

pub fn summarize(service: StreamingService, titles: &[Title]) -> ServiceSummary {
    ServiceSummary {
        service,
        service_name: service.display_name(),
        total_titles: titles.len(),
        average_rating: average_rating(titles),
        movie_count: count_type(titles, ContentType::Movie),
        series_count: count_type(titles, ContentType::Series),
    }
}

/// Correlates titles across services by cross-reference id.
///
/// `requested_count` is the number of services the caller asked for, which
/// may exceed the number of catalogs supplied when some failed to load.
/// Titles without a cross-reference id are ignored.
pub fn overlap(catalogs: &[(StreamingService, &[Title])], requested_count: usize) -> OverlapStats {
    let mut presence: HashMap<&str, HashSet<StreamingService>> = HashMap::new();
    for (service, titles) in catalogs {
        for id in titles.iter().filter_map(Title::cross_reference_id) {
            presence.entry(id).or_default().insert(*service);
        }
    }

    OverlapStats {
        unique_titles: presence.len(),
        multi_service_titles: presence.values().filter(|s| s.len() >= 2).count(),
        all_services_titles: if requested_count == 0 {
            0
        } else {
            presence
                .values()
                .filter(|s| s.len() >= requested_count)
                .count()
        },
    }
}

/// Summaries in input order plus overlap statistics.
pub fn compare(catalogs: &[(StreamingService, &[Title])], requested_count: usize) -> Comparison {
    Comparison {
        summaries: catalogs
            .iter()
            .map(|(service, titles)| summarize(*service, titles))
            .collect(),
        overlap: overlap(catalogs, requested_count),
    }
}

/// Totals, rating extremes and bands, and the most common genres.
///
/// Genres are ranked by count, ties by name.
pub fn service_statistics(titles: &[Title]) -> ServiceStatistics {
    let ratings: Vec<f32> = titles.iter().filter_map(|title| title.rating).collect();

    let mut rating_distribution = RatingDistribution::default();
    for rating in &ratings {
        rating_distribution.record(*rating);
    }

    let mut genre_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for genre in titles.iter().flat_map(|title| title.genres.iter()) {
        *genre_counts.entry(genre.as_str()).or_default() += 1;
    }
    let mut top_genres: Vec<GenreCount> = genre_counts
        .into_iter()
        .map(|(genre, count)| GenreCount {
            genre: genre.to_string(),
            count,
        })
        .collect();
    // BTreeMap iteration already orders names; a stable sort keeps that for ties
    top_genres.sort_by(|a, b| b.count.cmp(&a.count));
    top_genres.truncate(TOP_GENRE_COUNT);

    ServiceStatistics {
        total_titles: titles.len(),
        total_movies: count_type(titles, ContentType::Movie),
        total_series: count_type(titles, ContentType::Series),
        average_rating: average_rating(titles),
        highest_rated: ratings.iter().copied().reduce(f32::max),
        lowest_rated: ratings.iter().copied().reduce(f32::min),
        rating_distribution,
        top_genres,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::provider::rated_title;

    fn with_ids(ids: &[&str]) -> Vec<Title> {
        ids.iter()
            .map(|id| rated_title(&format!("p-{id}"), Some(id), ContentType::Movie, None, None))
            .collect()
    }

    #[test]
    fn test_overlap_of_two_services() {
        let a = with_ids(&["x", "y", "z"]);
        let b = with_ids(&["y", "z", "w"]);
        let stats = overlap(
            &[
                (StreamingService::Netflix, a.as_slice()),
                (StreamingService::Prime, b.as_slice()),
            ],
            2,
        );

        assert_eq!(
            stats,
            OverlapStats {
                unique_titles: 4,
                multi_service_titles: 2,
                all_services_titles: 2,
            }
        );
    }

    #[test]
    fn test_overlap_counts_requested_services_not_loaded_ones() {
        let a = with_ids(&["x", "y"]);
        let b = with_ids(&["x", "y"]);
        let stats = overlap(
            &[
                (StreamingService::Netflix, a.as_slice()),
                (StreamingService::Prime, b.as_slice()),
            ],
            3,
        );
        assert_eq!(stats.multi_service_titles, 2);
        assert_eq!(stats.all_services_titles, 0);
    }

    #[test]
    fn test_titles_without_cross_reference_skip_overlap() {
        let mut a = with_ids(&["x"]);
        a.push(rated_title("loose", None, ContentType::Series, Some(8.0), None));
        let mut b = with_ids(&["x"]);
        b.push(rated_title("loose", Some(""), ContentType::Series, None, None));

        let result = compare(
            &[(StreamingService::Hulu, a.as_slice()), (StreamingService::Apple, b.as_slice())],
            2,
        );
        assert_eq!(result.overlap.unique_titles, 1);
        assert_eq!(result.summaries[0].total_titles, 2);
        assert_eq!(result.summaries[0].series_count, 1);
        assert_eq!(result.summaries[1].service, StreamingService::Apple);
    }

    #[test]
    fn test_summary_average_uses_rated_titles_only() {
        let titles = vec![
            rated_title("1", None, ContentType::Movie, Some(8.0), None),
            rated_title("2", None, ContentType::Movie, Some(7.0), None),
            rated_title("3", None, ContentType::Series, Some(7.25), None),
            rated_title("4", None, ContentType::Series, None, None),
        ];
        let summary = summarize(StreamingService::Disney, &titles);
        assert_eq!(summary.total_titles, 4);
        assert_eq!(summary.movie_count, 2);
        assert_eq!(summary.series_count, 2);
        assert_eq!(summary.average_rating, 7.42);
        assert_eq!(summary.service_name, "Disney+");
    }

    #[test]
    fn test_summary_with_no_ratings_averages_zero() {
        let titles = vec![rated_title("1", None, ContentType::Movie, None, None)];
        assert_eq!(summarize(StreamingService::Hbo, &titles).average_rating, 0.0);
        assert_eq!(summarize(StreamingService::Hbo, &[]).average_rating, 0.0);
    }

    #[test]
    fn test_service_statistics() {
        let mut titles = vec![
            rated_title("1", None, ContentType::Movie, Some(9.1), None),
            rated_title("2", None, ContentType::Movie, Some(8.0), None),
            rated_title("3", None, ContentType::Series, Some(6.5), None),
            rated_title("4", None, ContentType::Movie, Some(4.0), None),
            rated_title("5", None, ContentType::Series, None, None),
        ];
        titles[0].genres = vec!["Drama".to_string(), "Crime".to_string()];
        titles[1].genres = vec!["Drama".to_string()];
        titles[2].genres = vec!["Comedy".to_string()];

        let stats = service_statistics(&titles);
        assert_eq!(stats.total_titles, 5);
        assert_eq!(stats.total_movies, 3);
        assert_eq!(stats.total_series, 2);
        assert_eq!(stats.highest_rated, Some(9.1));
        assert_eq!(stats.lowest_rated, Some(4.0));
        assert_eq!(
            stats.rating_distribution,
            RatingDistribution {
                nine_to_ten: 1,
                eight_to_nine: 1,
                seven_to_eight: 0,
                six_to_seven: 1,
                below_6: 1,
            }
        );

        let genres: Vec<(&str, usize)> = stats
            .top_genres
            .iter()
            .map(|g| (g.genre.as_str(), g.count))
            .collect();
        assert_eq!(genres, vec![("Drama", 2), ("Comedy", 1), ("Crime", 1)]);
    }

    #[test]
    fn test_statistics_of_empty_catalog() {
        let stats = service_statistics(&[]);
        assert_eq!(stats.total_titles, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.highest_rated, None);
        assert!(stats.top_genres.is_empty());
    }

    #[test]
    fn test_distribution_serializes_band_names() {
        let json = serde_json::to_value(RatingDistribution::default()).unwrap();
        assert!(json.get("9-10").is_some());
        assert!(json.get("below_6").is_some());
    }
}
