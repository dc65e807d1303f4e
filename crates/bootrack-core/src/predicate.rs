//! Reusable issue predicates.
//!
//! A [`Predicate`] is a conjunction of [`Condition`]s. Every query path
//! (listing, counting, full-text filtering, ranking, batching) takes the
//! same value, so filter logic lives here once and the storage backend only
//! renders each condition.

use serde::{Deserialize, Serialize};

/// A single filter term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// All issues of a project.
    InProject(i32),
    /// The unique issue with this composite key.
    Key { project_id: i32, number: i64 },
    /// `state != COMPLETED`.
    HideResolved,
    /// Full-text match against title and description. The string is an
    /// already-tokenized match query (see [`crate::search::to_match_query`]).
    TextMatches(String),
    /// The issue has a location.
    HasLocation,
}

/// AND-composed list of conditions. The empty predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    /// The tautological predicate.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn project(project_id: i32) -> Self {
        Self::from(Condition::InProject(project_id))
    }

    pub fn key(project_id: i32, number: i64) -> Self {
        Self::from(Condition::Key { project_id, number })
    }

    /// `state != COMPLETED` when `hide` is set, otherwise the empty predicate.
    pub fn hide_resolved(hide: bool) -> Self {
        if hide {
            Self::from(Condition::HideResolved)
        } else {
            Self::all()
        }
    }

    pub fn text(match_query: impl Into<String>) -> Self {
        Self::from(Condition::TextMatches(match_query.into()))
    }

    pub fn has_location() -> Self {
        Self::from(Condition::HasLocation)
    }

    /// Conjunction. Duplicate conditions are kept once.
    pub fn and(mut self, other: Predicate) -> Self {
        for condition in other.conditions {
            if !self.conditions.contains(&condition) {
                self.conditions.push(condition);
            }
        }
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_all(&self) -> bool {
        self.conditions.is_empty()
    }

    /// The project this predicate is scoped to, if any.
    pub fn project_id(&self) -> Option<i32> {
        self.conditions.iter().find_map(|c| match c {
            Condition::InProject(id) => Some(*id),
            Condition::Key { project_id, .. } => Some(*project_id),
            _ => None,
        })
    }

    /// The full-text match query, if any.
    pub fn match_query(&self) -> Option<&str> {
        self.conditions.iter().find_map(|c| match c {
            Condition::TextMatches(q) => Some(q.as_str()),
            _ => None,
        })
    }
}

impl From<Condition> for Predicate {
    fn from(condition: Condition) -> Self {
        Self {
            conditions: vec![condition],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hide_resolved_false_is_tautology() {
        assert!(Predicate::hide_resolved(false).is_all());
        assert_eq!(
            Predicate::hide_resolved(true).conditions(),
            &[Condition::HideResolved]
        );
    }

    #[test]
    fn and_composes_in_order_without_duplicates() {
        let p = Predicate::project(1)
            .and(Predicate::hide_resolved(true))
            .and(Predicate::project(1))
            .and(Predicate::text("\"login\""));
        assert_eq!(
            p.conditions(),
            &[
                Condition::InProject(1),
                Condition::HideResolved,
                Condition::TextMatches("\"login\"".into()),
            ]
        );
        assert_eq!(p.project_id(), Some(1));
        assert_eq!(p.match_query(), Some("\"login\""));
    }

    #[test]
    fn key_scopes_project() {
        let p = Predicate::key(4, 101);
        assert_eq!(p.project_id(), Some(4));
        assert_ne!(p, Predicate::project(4));
    }
}
