//! Typed single-field edits applied to an [`Issue`].

use serde::{Deserialize, Serialize};

use crate::enums::{IssuePriority, IssueState};
use crate::issue::{Issue, Location};
use crate::project::Project;

/// One editable aspect of an issue together with its new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FieldChange {
    /// Moves the issue to another project. The number and code are
    /// reassigned by the store when the moved issue is saved.
    Project(Project),
    Priority(IssuePriority),
    State(IssueState),
    Assignee(Option<i32>),
    Location(Option<Location>),
    Title(String),
    Description(String),
}

impl FieldChange {
    /// Field name as used on the wire.
    pub fn field(&self) -> &'static str {
        match self {
            FieldChange::Project(_) => "project",
            FieldChange::Priority(_) => "priority",
            FieldChange::State(_) => "state",
            FieldChange::Assignee(_) => "assignee",
            FieldChange::Location(_) => "location",
            FieldChange::Title(_) => "title",
            FieldChange::Description(_) => "description",
        }
    }
}

impl Issue {
    /// Applies `change` and reports whether the issue differs afterwards.
    pub fn apply_change(&mut self, change: FieldChange) -> bool {
        match change {
            FieldChange::Project(project) => {
                let changed = self.project_id != project.id;
                self.project_id = project.id;
                if changed {
                    self.code = String::new();
                }
                changed
            }
            FieldChange::Priority(priority) => replace(&mut self.priority, priority),
            FieldChange::State(state) => replace(&mut self.state, state),
            FieldChange::Assignee(assignee) => replace(&mut self.assignee_id, assignee),
            FieldChange::Location(location) => replace(&mut self.location, location),
            FieldChange::Title(title) => replace(&mut self.title, title),
            FieldChange::Description(description) => replace(&mut self.description, description),
        }
    }

    /// `true` when moving from an unresolved state to the resolved one.
    pub fn closes(&self, change: &FieldChange) -> bool {
        matches!(change, FieldChange::State(s) if s.is_resolved() && !self.is_resolved())
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueBuilder;

    #[test]
    fn apply_reports_changes() {
        let mut issue = IssueBuilder::new(1, 1, "t").build();
        assert!(issue.apply_change(FieldChange::Priority(IssuePriority::Major)));
        assert!(!issue.apply_change(FieldChange::Priority(IssuePriority::Major)));
        assert!(issue.apply_change(FieldChange::Assignee(Some(3))));
        assert_eq!(issue.assignee_id, Some(3));
        assert!(issue.apply_change(FieldChange::Location(Some(Location::new(1.0, 2.0)))));
    }

    #[test]
    fn project_change_clears_code() {
        let mut issue = IssueBuilder::new(1, 1, "t").code("GHST-100").build();
        let other = Project {
            id: 2,
            name: "Other".into(),
            code: "OTHR".into(),
        };
        assert!(issue.apply_change(FieldChange::Project(other)));
        assert_eq!(issue.project_id, 2);
        assert!(issue.code.is_empty());
    }

    #[test]
    fn closes_only_on_transition() {
        let issue = IssueBuilder::new(1, 1, "t").build();
        assert!(issue.closes(&FieldChange::State(IssueState::Completed)));
        assert!(!issue.closes(&FieldChange::State(IssueState::InProgress)));

        let done = IssueBuilder::new(1, 1, "t").state(IssueState::Completed).build();
        assert!(!done.closes(&FieldChange::State(IssueState::Completed)));
    }

    #[test]
    fn wire_format_is_tagged() {
        let json = serde_json::to_value(FieldChange::State(IssueState::InProgress)).unwrap();
        assert_eq!(json["field"], "state");
        assert_eq!(json["value"], "IN_PROGRESS");
    }
}
