//! Shared issue query logic, written once over [`QueryBackend`].

use bootrack_core::enums::{IssuePriority, RankBy};
use bootrack_core::geo::within_km;
use bootrack_core::issue::{IssueSummarized, Location};
use bootrack_core::predicate::Predicate;
use bootrack_core::query::{IssueQuery, Ordering, Page, RankQuery};
use bootrack_core::search::to_match_query;
use tracing::debug;

use crate::cursor::{BatchPage, BatchToken};
use crate::error::Result;
use crate::traits::{Listing, QueryBackend, SearchFilter};

/// Issues of a project ordered by `modifiedAt DESC`.
///
/// `limit == 1` with an offset returns the detailed projection of that single
/// issue instead. Offsets past the end yield an empty listing.
pub fn list_issues<B: QueryBackend + ?Sized>(
    backend: &B,
    project_id: i32,
    page: Page,
) -> Result<Listing> {
    let predicate = Predicate::project(project_id);
    if page.is_single_position() {
        let offset = page.offset.unwrap_or_default();
        return Ok(Listing::Detailed(backend.select_detailed(&predicate, offset)?));
    }
    let query = summary_query(backend, predicate).page(page);
    Ok(Listing::Summaries(backend.select_summaries(&query)?))
}

/// Full-text search within a project.
///
/// Blank search text adds no text condition, so the result is the plain
/// (optionally unresolved-only) listing in `modifiedAt DESC` order.
pub fn filter_issues<B: QueryBackend + ?Sized>(
    backend: &B,
    filter: &SearchFilter,
) -> Result<Vec<IssueSummarized>> {
    let match_query = to_match_query(&filter.search_text);
    let ordering = match match_query {
        Some(_) => Ordering::from(filter.sort_by),
        None => Ordering::ModifiedDesc,
    };
    let predicate = search_predicate(filter.project_id, match_query, filter.hide_resolved);
    let query = summary_query(backend, predicate)
        .ordering(ordering)
        .page(filter.page);
    backend.select_summaries(&query)
}

/// Count matching the same predicate [`filter_issues`] would use.
pub fn count_filtered_issues<B: QueryBackend + ?Sized>(
    backend: &B,
    project_id: i32,
    search_text: Option<&str>,
    hide_resolved: bool,
) -> Result<i64> {
    let match_query = search_text.and_then(to_match_query);
    backend.count_matching(&search_predicate(project_id, match_query, hide_resolved))
}

/// Top unresolved issues per priority by `metric`.
///
/// Groups come back in [`IssuePriority`] order; priorities with no
/// qualifying issue are left out.
pub fn rank_issues<B: QueryBackend + ?Sized>(
    backend: &B,
    project_id: i32,
    metric: RankBy,
) -> Result<Vec<Vec<IssueSummarized>>> {
    let query = RankQuery {
        predicate: Predicate::project(project_id).and(Predicate::hide_resolved(true)),
        metric,
        cutoff: backend.settings().rank_cutoff,
    };
    let ranked = backend.select_ranked(&query)?;
    Ok(group_by_priority(ranked))
}

/// Splits a flat ranked list into per-priority groups, keeping the order
/// within each group.
pub fn group_by_priority(ranked: Vec<IssueSummarized>) -> Vec<Vec<IssueSummarized>> {
    let mut groups: Vec<Vec<IssueSummarized>> = vec![Vec::new(); IssuePriority::ALL.len()];
    for summary in ranked {
        groups[summary.issue.priority.ordinal()].push(summary);
    }
    groups.retain(|group| !group.is_empty());
    groups
}

/// Stateless batch scan: the page at `token`, plus the token of the next one.
pub fn next_batch<B: QueryBackend + ?Sized>(
    backend: &B,
    token: &BatchToken,
    size: u32,
) -> Result<BatchPage> {
    let size = size.max(1);
    let query = summary_query(backend, Predicate::project(token.project_id))
        .page(Page::new(size, token.offset));
    let items = backend.select_summaries(&query)?;
    let next = if items.len() as u32 == size {
        Some(token.advance(size))
    } else {
        None
    };
    debug!(%token, returned = items.len(), "batch fetched");
    Ok(BatchPage { items, next })
}

/// Unresolved issues of a project within `max_km` of `target`, with locations.
pub fn filter_issues_by_distance<B: QueryBackend + ?Sized>(
    backend: &B,
    project_id: i32,
    target: Location,
    max_km: f64,
) -> Result<Vec<IssueSummarized>> {
    let predicate = Predicate::project(project_id)
        .and(Predicate::hide_resolved(true))
        .and(Predicate::has_location());
    let mut query = IssueQuery::new(predicate);
    query.include_location = true;
    let mut summaries = backend.select_summaries(&query)?;
    summaries.retain(|s| {
        s.issue
            .location
            .is_some_and(|location| within_km(target, location, max_km))
    });
    Ok(summaries)
}

fn summary_query<B: QueryBackend + ?Sized>(backend: &B, predicate: Predicate) -> IssueQuery {
    let mut query = IssueQuery::new(predicate);
    query.include_location = backend.settings().summary_includes_location;
    query
}

fn search_predicate(project_id: i32, match_query: Option<String>, hide_resolved: bool) -> Predicate {
    let mut predicate = Predicate::project(project_id).and(Predicate::hide_resolved(hide_resolved));
    if let Some(q) = match_query {
        predicate = predicate.and(Predicate::text(q));
    }
    predicate
}
