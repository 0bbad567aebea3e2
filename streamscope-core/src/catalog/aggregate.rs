//! Filtering, ordering, pagination, and merging of catalog results
//!
//! Everything here is pure: inputs are borrowed snapshots and outputs are
//! freshly built vectors, so the cached catalogs are never touched.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use super::fetcher::{ServiceFailure, ServiceFetch};
use super::model::{StreamingService, Title};
use super::query::{PageRequest, SortOrder, TitleFilter};

/// One page of an ordered result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_results: usize,
    pub has_more: bool,
}

/// Ordered titles of a single service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceTitles {
    pub service: StreamingService,
    pub service_name: &'static str,
    pub titles: Vec<Title>,
    /// Titles came from an expired cache entry
    pub stale: bool,
}

/// Per-service top lists plus the services that could not be fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPerService {
    pub results: Vec<ServiceTitles>,
    pub failures: Vec<ServiceFailure>,
}

/// Applies content type, rating range, and genre filters, in that order.
///
/// A title without a rating is dropped as soon as either rating bound is
/// set. An inverted range (`min > max`) matches nothing.
pub fn filter_titles<'a, I>(titles: I, filter: &TitleFilter) -> Vec<Title>
where
    I: IntoIterator<Item = &'a Title>,
{
    let genres = filter.normalized_genres();

    titles
        .into_iter()
        .filter(|title| {
            filter
                .content_type
                .is_none_or(|content_type| title.content_type == content_type)
        })
        .filter(|title| matches_rating(title, filter))
        .filter(|title| genres.is_empty() || genres.iter().any(|genre| title.has_genre(genre)))
        .cloned()
        .collect()
}

fn matches_rating(title: &Title, filter: &TitleFilter) -> bool {
    if !filter.has_rating_bounds() {
        return true;
    }
    let Some(rating) = title.rating else {
        return false;
    };
    filter.min_rating.is_none_or(|min| rating >= min)
        && filter.max_rating.is_none_or(|max| rating <= max)
}

/// Rating desc (unrated last), vote count desc (missing last), id asc.
pub fn rating_order(a: &Title, b: &Title) -> Ordering {
    let by_rating = match (a.rating, b.rating) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_rating
        .then_with(|| b.vote_count.cmp(&a.vote_count))
        .then_with(|| a.id.cmp(&b.id))
}

fn year_order(a: &Title, b: &Title) -> Ordering {
    b.year.cmp(&a.year).then_with(|| rating_order(a, b))
}

fn title_order(a: &Title, b: &Title) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts titles in place. Every order ends on the id, so the result does
/// not depend on the input order.
pub fn sort_titles(titles: &mut [Title], order: SortOrder) {
    match order {
        SortOrder::Rating => titles.sort_by(rating_order),
        SortOrder::Year => titles.sort_by(year_order),
        SortOrder::Title => titles.sort_by(title_order),
    }
}

/// Slices one 1-indexed page out of an already ordered list.
///
/// Out-of-range pages yield no items with `has_more = false`.
pub fn paginate<T: Clone>(items: &[T], request: PageRequest) -> Page<T> {
    let request = PageRequest::new(request.page, request.page_size);
    let total_results = items.len();
    let start = request.offset().min(total_results);
    let end = start
        .saturating_add(request.page_size as usize)
        .min(total_results);

    Page {
        items: items[start..end].to_vec(),
        page: request.page,
        page_size: request.page_size,
        total_results,
        has_more: end < total_results,
    }
}

/// Filters, rating-sorts, and truncates one catalog.
pub fn top_titles(titles: &[Title], filter: &TitleFilter, limit: usize) -> Vec<Title> {
    let mut selected = filter_titles(titles, filter);
    sort_titles(&mut selected, SortOrder::Rating);
    selected.truncate(limit);
    selected
}

/// Concatenates successful catalogs in request order, keeping the first
/// title seen for each id.
pub fn merge_catalogs(outcomes: &[ServiceFetch]) -> Vec<Title> {
    let mut seen = HashSet::new();
    outcomes
        .iter()
        .filter_map(|outcome| outcome.result.as_ref().ok())
        .flat_map(|snapshot| snapshot.titles.iter())
        .filter(|title| seen.insert(title.id.as_str()))
        .cloned()
        .collect()
}

/// Builds a top list per service, grouped in request order.
pub fn top_per_service(
    outcomes: &[ServiceFetch],
    filter: &TitleFilter,
    limit: usize,
) -> TopPerService {
    let mut results = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match &outcome.result {
            Ok(snapshot) => results.push(ServiceTitles {
                service: outcome.service,
                service_name: outcome.service.display_name(),
                titles: top_titles(&snapshot.titles, filter, limit),
                stale: snapshot.stale,
            }),
            Err(error) => failures.push(ServiceFailure::new(outcome.service, error)),
        }
    }

    TopPerService { results, failures }
}
