//! Pure cache updates: each takes the previous value and returns the next.
//!
//! Issues are located by their unique `code`. An update that finds nothing
//! to change returns an unchanged copy.

use bootrack_core::comment::Comment;
use bootrack_core::enums::IssuePriority;
use bootrack_core::issue::{Issue, IssueDetailed, IssueSummarized};
use bootrack_core::notification::SessionNotification;
use bootrack_core::user::User;
use chrono::{DateTime, Utc};

/// Where an updated entry goes in its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Same position; a silent update such as a star or upvote toggle.
    InPlace,
    /// Moved to the top, matching `modifiedAt DESC` order after a full edit.
    Front,
}

fn summary_of(issue: &Issue, comment_count: i64) -> IssueSummarized {
    issue.summarize(comment_count, true)
}

fn place<T>(mut list: Vec<T>, index: usize, item: T, placement: Placement) -> Vec<T> {
    match placement {
        Placement::InPlace => list[index] = item,
        Placement::Front => {
            list.remove(index);
            list.insert(0, item);
        }
    }
    list
}

// ---------------------------------------------------------------------------
// Summary list
// ---------------------------------------------------------------------------

pub fn position_in(list: &[IssueSummarized], code: &str) -> Option<usize> {
    list.iter().position(|s| s.issue.code == code)
}

/// Puts `summary` at the top, dropping any older copy.
pub fn prepend_summary(list: &[IssueSummarized], summary: IssueSummarized) -> Vec<IssueSummarized> {
    let mut next = Vec::with_capacity(list.len() + 1);
    next.push(summary.clone());
    next.extend(
        list.iter()
            .filter(|s| s.issue.code != summary.issue.code)
            .cloned(),
    );
    next
}

/// Swaps in the new version of the issue stored under `code`, keeping its
/// comment count.
pub fn replace_summary_issue(
    list: &[IssueSummarized],
    code: &str,
    issue: &Issue,
    placement: Placement,
) -> Vec<IssueSummarized> {
    let Some(index) = position_in(list, code) else {
        return list.to_vec();
    };
    let updated = summary_of(issue, list[index].comment_count);
    place(list.to_vec(), index, updated, placement)
}

/// Adds `delta` comments and bumps `modifiedAt`; the entry moves to the top.
pub fn adjust_comment_count(
    list: &[IssueSummarized],
    code: &str,
    delta: i64,
    modified_at: DateTime<Utc>,
) -> Vec<IssueSummarized> {
    let Some(index) = position_in(list, code) else {
        return list.to_vec();
    };
    let updated = bump(&list[index], delta, modified_at);
    place(list.to_vec(), index, updated, Placement::Front)
}

fn bump(summary: &IssueSummarized, delta: i64, modified_at: DateTime<Utc>) -> IssueSummarized {
    let mut updated = summary.clone();
    updated.comment_count = (updated.comment_count + delta).max(0);
    updated.issue.modified_at = modified_at;
    updated
}

pub fn remove_summary(list: &[IssueSummarized], code: &str) -> Vec<IssueSummarized> {
    list.iter().filter(|s| s.issue.code != code).cloned().collect()
}

// ---------------------------------------------------------------------------
// Ranked groups
// ---------------------------------------------------------------------------

/// `(group, index)` of the entry stored under `code`.
pub fn ranked_position(groups: &[Vec<IssueSummarized>], code: &str) -> Option<(usize, usize)> {
    groups
        .iter()
        .enumerate()
        .find_map(|(g, group)| position_in(group, code).map(|i| (g, i)))
}

fn group_priority(group: &[IssueSummarized]) -> Option<IssuePriority> {
    group.first().map(|s| s.issue.priority)
}

fn without_empty(groups: Vec<Vec<IssueSummarized>>) -> Vec<Vec<IssueSummarized>> {
    groups.into_iter().filter(|g| !g.is_empty()).collect()
}

/// Swaps in the new version of a ranked issue.
///
/// In place, the entry keeps its slot. At the front, it goes to the top of
/// the group for its (possibly new) priority, created in priority order if
/// absent; a resolved issue leaves the ranking altogether.
pub fn replace_ranked_issue(
    groups: &[Vec<IssueSummarized>],
    code: &str,
    issue: &Issue,
    placement: Placement,
) -> Vec<Vec<IssueSummarized>> {
    let Some((g, i)) = ranked_position(groups, code) else {
        return groups.to_vec();
    };
    let mut next = groups.to_vec();
    let updated = summary_of(issue, next[g][i].comment_count);

    if placement == Placement::InPlace {
        next[g][i] = updated;
        return next;
    }

    next[g].remove(i);
    if !issue.is_resolved() {
        insert_at_front_of_group(&mut next, updated);
    }
    without_empty(next)
}

fn insert_at_front_of_group(groups: &mut Vec<Vec<IssueSummarized>>, summary: IssueSummarized) {
    let priority = summary.issue.priority;
    if let Some(group) = groups
        .iter_mut()
        .find(|g| group_priority(g) == Some(priority))
    {
        group.insert(0, summary);
        return;
    }
    let at = groups
        .iter()
        .position(|g| group_priority(g).is_some_and(|p| p.ordinal() > priority.ordinal()))
        .unwrap_or(groups.len());
    groups.insert(at, vec![summary]);
}

/// Ranked counterpart of [`adjust_comment_count`]; moves within its group.
pub fn adjust_ranked_comments(
    groups: &[Vec<IssueSummarized>],
    code: &str,
    delta: i64,
    modified_at: DateTime<Utc>,
) -> Vec<Vec<IssueSummarized>> {
    let Some((g, i)) = ranked_position(groups, code) else {
        return groups.to_vec();
    };
    let mut next = groups.to_vec();
    let updated = bump(&next[g][i], delta, modified_at);
    next[g] = place(next[g].clone(), i, updated, Placement::Front);
    next
}

pub fn remove_ranked(groups: &[Vec<IssueSummarized>], code: &str) -> Vec<Vec<IssueSummarized>> {
    without_empty(groups.iter().map(|g| remove_summary(g, code)).collect())
}

// ---------------------------------------------------------------------------
// Detailed issues
// ---------------------------------------------------------------------------

/// Adds or refreshes a detailed issue; it becomes the last entry.
pub fn upsert_detailed(list: &[IssueDetailed], detailed: IssueDetailed) -> Vec<IssueDetailed> {
    let mut next = remove_detailed(list, &detailed.issue.code);
    next.push(detailed);
    next
}

/// Replaces the issue stored under `code` (its code may have changed),
/// keeping the loaded comments.
pub fn replace_detailed_issue(list: &[IssueDetailed], code: &str, issue: &Issue) -> Vec<IssueDetailed> {
    let Some(old) = list.iter().find(|d| d.issue.code == code) else {
        return list.to_vec();
    };
    let updated = IssueDetailed {
        issue: issue.clone(),
        comments: old.comments.clone(),
    };
    let mut next = remove_detailed(list, code);
    next.push(updated);
    next
}

/// Appends `comment` to its issue and advances the issue's `modifiedAt`.
pub fn append_comment(list: &[IssueDetailed], code: &str, comment: &Comment) -> Vec<IssueDetailed> {
    let Some(old) = list.iter().find(|d| d.issue.code == code) else {
        return list.to_vec();
    };
    let mut updated = old.clone();
    updated.issue.modified_at = comment.modified_at;
    updated.comments.push(comment.clone());
    upsert_detailed(list, updated)
}

/// Swaps in an edited comment wherever it is loaded. The parent issue is
/// left as is.
pub fn replace_comment(list: &[IssueDetailed], comment: &Comment) -> Vec<IssueDetailed> {
    list.iter()
        .map(|d| {
            let mut d = d.clone();
            if let Some(slot) = d.comments.iter_mut().find(|c| c.id == comment.id) {
                *slot = comment.clone();
            }
            d
        })
        .collect()
}

/// Removes comment `id` from its issue and sets the issue's `modifiedAt`.
pub fn remove_comment(list: &[IssueDetailed], id: i64, modified_at: DateTime<Utc>) -> Vec<IssueDetailed> {
    let Some(old) = list.iter().find(|d| d.comments.iter().any(|c| c.id == id)) else {
        return list.to_vec();
    };
    let mut updated = old.clone();
    updated.comments.retain(|c| c.id != id);
    updated.issue.modified_at = modified_at;
    upsert_detailed(list, updated)
}

pub fn remove_detailed(list: &[IssueDetailed], code: &str) -> Vec<IssueDetailed> {
    list.iter().filter(|d| d.issue.code != code).cloned().collect()
}

// ---------------------------------------------------------------------------
// Notifications and users
// ---------------------------------------------------------------------------

/// Newest first: `fresh` goes ahead of what is already cached.
pub fn prepend_notifications(
    list: &[SessionNotification],
    fresh: Vec<SessionNotification>,
) -> Vec<SessionNotification> {
    let mut next = fresh;
    next.extend(list.iter().cloned());
    next
}

pub fn mark_notification(list: &[SessionNotification], id: i64, is_read: bool) -> Vec<SessionNotification> {
    list.iter()
        .map(|n| {
            let mut n = n.clone();
            if n.id == id {
                n.is_read = is_read;
            }
            n
        })
        .collect()
}

/// Replaces the user with the same id, or appends it.
pub fn replace_user(list: &[User], user: &User) -> Vec<User> {
    let mut next = list.to_vec();
    match next.iter_mut().find(|u| u.id == user.id) {
        Some(slot) => *slot = user.clone(),
        None => next.push(user.clone()),
    }
    next
}

#[cfg(test)]
mod tests {
    use bootrack_core::enums::IssueState;
    use bootrack_core::issue::IssueBuilder;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;

    fn issue(number: i64, priority: IssuePriority) -> Issue {
        IssueBuilder::new(1, 1, format!("Issue {number}"))
            .number(number)
            .code(format!("GHST-{number}"))
            .description("long text")
            .priority(priority)
            .build()
    }

    fn summary(number: i64, priority: IssuePriority, comments: i64) -> IssueSummarized {
        issue(number, priority).summarize(comments, false)
    }

    fn codes(list: &[IssueSummarized]) -> Vec<&str> {
        list.iter().map(|s| s.issue.code.as_str()).collect()
    }

    #[test]
    fn full_edit_moves_to_front_silent_toggle_does_not() {
        let list = vec![
            summary(102, IssuePriority::Normal, 0),
            summary(101, IssuePriority::Normal, 2),
            summary(100, IssuePriority::Normal, 0),
        ];
        let mut edited = issue(101, IssuePriority::Major);
        edited.title = "Renamed".into();

        let next = replace_summary_issue(&list, "GHST-101", &edited, Placement::Front);
        assert_eq!(codes(&next), vec!["GHST-101", "GHST-102", "GHST-100"]);
        assert_eq!(next[0].issue.title, "Renamed");
        assert_eq!(next[0].comment_count, 2);
        assert!(next[0].issue.description.is_empty());

        edited.upvotes = vec![7];
        let next = replace_summary_issue(&list, "GHST-101", &edited, Placement::InPlace);
        assert_eq!(codes(&next), vec!["GHST-102", "GHST-101", "GHST-100"]);
        assert_eq!(next[1].issue.upvotes, vec![7]);
    }

    #[test]
    fn unknown_code_is_a_no_op() {
        let list = vec![summary(100, IssuePriority::Minor, 0)];
        let other = issue(999, IssuePriority::Minor);
        assert_eq!(replace_summary_issue(&list, "GHST-999", &other, Placement::Front), list);
        assert_eq!(remove_summary(&list, "GHST-999"), list);
    }

    #[test]
    fn comment_count_follows_adds_and_deletes() {
        let list = vec![summary(101, IssuePriority::Normal, 0), summary(100, IssuePriority::Normal, 0)];
        let later = Utc::now() + Duration::seconds(5);

        let added = adjust_comment_count(&list, "GHST-100", 1, later);
        assert_eq!(codes(&added), vec!["GHST-100", "GHST-101"]);
        assert_eq!(added[0].comment_count, 1);
        assert_eq!(added[0].issue.modified_at, later);

        let removed = adjust_comment_count(&added, "GHST-100", -1, later);
        assert_eq!(removed[0].comment_count, 0);
        let floored = adjust_comment_count(&removed, "GHST-100", -1, later);
        assert_eq!(floored[0].comment_count, 0);
    }

    #[test]
    fn ranked_priority_change_regroups_in_priority_order() {
        let groups = vec![
            vec![summary(100, IssuePriority::Minor, 0), summary(101, IssuePriority::Minor, 0)],
            vec![summary(102, IssuePriority::Major, 0)],
        ];
        let raised = issue(101, IssuePriority::Normal);

        let next = replace_ranked_issue(&groups, "GHST-101", &raised, Placement::Front);
        assert_eq!(next.len(), 3);
        assert_eq!(codes(&next[0]), vec!["GHST-100"]);
        assert_eq!(codes(&next[1]), vec!["GHST-101"]);
        assert_eq!(codes(&next[2]), vec!["GHST-102"]);

        let lowered = issue(102, IssuePriority::Minor);
        let next = replace_ranked_issue(&next, "GHST-102", &lowered, Placement::Front);
        assert_eq!(next.len(), 2);
        assert_eq!(codes(&next[0]), vec!["GHST-102", "GHST-100"]);
    }

    #[test]
    fn closed_issue_leaves_the_ranking() {
        let groups = vec![vec![summary(100, IssuePriority::Major, 0)]];
        let mut closed = issue(100, IssuePriority::Major);
        closed.state = IssueState::Completed;
        assert!(replace_ranked_issue(&groups, "GHST-100", &closed, Placement::Front).is_empty());
    }

    #[test]
    fn ranked_comment_and_removal() {
        let groups = vec![vec![summary(100, IssuePriority::Major, 0), summary(101, IssuePriority::Major, 3)]];
        let now = Utc::now();
        let next = adjust_ranked_comments(&groups, "GHST-101", 1, now);
        assert_eq!(codes(&next[0]), vec!["GHST-101", "GHST-100"]);
        assert_eq!(next[0][0].comment_count, 4);

        let next = remove_ranked(&next, "GHST-101");
        assert_eq!(next.len(), 1);
        assert!(remove_ranked(&next, "GHST-100").is_empty());
    }

    #[test]
    fn detailed_comment_updates() {
        let parent = issue(100, IssuePriority::Normal);
        let list = vec![IssueDetailed {
            issue: parent.clone(),
            comments: vec![],
        }];
        let mut comment = Comment::draft(1, 100, 2, "first");
        comment.id = 9;
        comment.modified_at = parent.modified_at + Duration::seconds(1);

        let next = append_comment(&list, "GHST-100", &comment);
        assert_eq!(next[0].comments.len(), 1);
        assert_eq!(next[0].issue.modified_at, comment.modified_at);

        let mut edited = comment.clone();
        edited.content = "second".into();
        let next = replace_comment(&next, &edited);
        assert_eq!(next[0].comments[0].content, "second");

        let gone_at = comment.modified_at + Duration::seconds(1);
        let next = remove_comment(&next, 9, gone_at);
        assert!(next[0].comments.is_empty());
        assert_eq!(next[0].issue.modified_at, gone_at);
    }

    #[test]
    fn detailed_replace_keeps_comments_and_follows_new_code() {
        let mut comment = Comment::draft(1, 100, 2, "kept");
        comment.id = 1;
        let list = vec![IssueDetailed {
            issue: issue(100, IssuePriority::Normal),
            comments: vec![comment],
        }];
        let mut moved = issue(100, IssuePriority::Normal);
        moved.project_id = 2;
        moved.code = "LOKI-100".into();

        let next = replace_detailed_issue(&list, "GHST-100", &moved);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].issue.code, "LOKI-100");
        assert_eq!(next[0].comments.len(), 1);
    }
}
