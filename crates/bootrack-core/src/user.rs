//! User profile and settings bundle.

use serde::{Deserialize, Serialize};

use crate::enums::{UserDateFormat, UserSort};
use crate::issue::Location;
use crate::project::Project;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: i32,
    pub full_name: String,
    pub username: String,
    pub settings: UserSettings,
}

/// Per-user preferences.
///
/// The `star_on_*` flags add the user to an issue's watchers when the
/// matching event happens; `unstar_on_issue_close` removes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub avatar_icon: i32,
    pub avatar_tint: i32,
    pub default_project: Project,
    pub location: Location,
    /// Radius for the nearby-issues view, in kilometers.
    pub max_travel_distance: i32,
    pub date_format: UserDateFormat,
    pub default_sort: UserSort,
    pub notify_on_self_changes: bool,
    pub notify_on_mention: bool,
    pub unstar_on_issue_close: bool,
    pub star_on_issue_create: bool,
    pub star_on_issue_update: bool,
    pub star_on_issue_assigned: bool,
    pub star_on_issue_upvote: bool,
}

impl UserSettings {
    /// Settings given to new users of `default_project`.
    pub fn defaults_for(default_project: Project) -> Self {
        Self {
            avatar_icon: 0,
            avatar_tint: 0,
            default_project,
            location: Location::new(0.0, 0.0),
            max_travel_distance: 10,
            date_format: UserDateFormat::default(),
            default_sort: UserSort::default(),
            notify_on_self_changes: false,
            notify_on_mention: true,
            unstar_on_issue_close: false,
            star_on_issue_create: true,
            star_on_issue_update: false,
            star_on_issue_assigned: true,
            star_on_issue_upvote: false,
        }
    }
}
