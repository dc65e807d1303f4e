//! Query plans handed to a storage backend.

use crate::enums::{RankBy, SortBy};
use crate::predicate::Predicate;

/// Default number of issues kept per priority group by the ranker.
pub const DEFAULT_RANK_CUTOFF: u32 = 3;

/// Offset/limit window. `None` means unbounded / from the start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// No limit, no offset.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// `limit == 1` with an explicit offset selects a single issue by position.
    pub fn is_single_position(&self) -> bool {
        self.limit == Some(1) && self.offset.is_some()
    }
}

/// Result order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ordering {
    /// `modifiedAt DESC`.
    #[default]
    ModifiedDesc,
    /// Full-text relevance, highest first. Requires a text condition.
    RelevanceDesc,
}

impl From<SortBy> for Ordering {
    fn from(sort: SortBy) -> Self {
        match sort {
            SortBy::Relevance => Ordering::RelevanceDesc,
            SortBy::Updated => Ordering::ModifiedDesc,
        }
    }
}

/// A summary listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueQuery {
    pub predicate: Predicate,
    pub ordering: Ordering,
    pub page: Page,
    /// Keep the location in the returned summaries.
    pub include_location: bool,
}

impl IssueQuery {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            ordering: Ordering::default(),
            page: Page::default(),
            include_location: false,
        }
    }

    pub fn ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }
}

/// A top-N-per-priority request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankQuery {
    pub predicate: Predicate,
    pub metric: RankBy,
    pub cutoff: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_position_requires_offset() {
        assert!(Page::new(1, 5).is_single_position());
        assert!(!Page::new(2, 5).is_single_position());
        let no_offset = Page {
            limit: Some(1),
            offset: None,
        };
        assert!(!no_offset.is_single_position());
    }

    #[test]
    fn sort_by_maps_to_ordering() {
        assert_eq!(Ordering::from(SortBy::Relevance), Ordering::RelevanceDesc);
        assert_eq!(Ordering::from(SortBy::Updated), Ordering::ModifiedDesc);
    }
}
