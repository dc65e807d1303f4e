//! Enum types for the bootrack system.
//!
//! Every enum here is closed: parsing an unknown string is an error rather
//! than a catch-all variant, so unsupported `toggle`/`orderBy`/`sortBy`
//! arguments are rejected before any storage work happens.
//!
//! Each enum has:
//! - Custom Serialize/Deserialize (as its wire string)
//! - `as_str()`, `ALL` (declaration order), `Display`, `FromStr`

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported {kind} value: {value:?}")]
pub struct ParseEnumError {
    /// The enum that failed to parse (e.g. "toggle").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

// ---------------------------------------------------------------------------
// Macro: defines a closed enum with one wire string per variant.
// ---------------------------------------------------------------------------
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident, kind = $kind:expr, default = $default:ident,
        variants: [
            $( ($variant:ident, $str:expr, $label:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $variant, )+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            /// Returns the wire representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $str, )+
                }
            }

            /// Returns the human-readable label.
            pub fn label(&self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }

            /// Position of this variant in [`Self::ALL`].
            pub fn ordinal(&self) -> usize {
                Self::ALL.iter().position(|v| v == self).unwrap_or_default()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $str => Ok(Self::$variant), )+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Issue enums
// ---------------------------------------------------------------------------

define_enum! {
    /// Issue priority. Declaration order is the ranked-group order.
    IssuePriority, kind = "priority", default = Normal,
    variants: [
        (Minor, "MINOR", "Minor"),
        (Normal, "NORMAL", "Normal"),
        (Major, "MAJOR", "Major"),
    ]
}

define_enum! {
    /// Issue workflow state.
    IssueState, kind = "state", default = Submitted,
    variants: [
        (Submitted, "SUBMITTED", "Submitted"),
        (InProgress, "IN_PROGRESS", "In Progress"),
        (Completed, "COMPLETED", "Completed"),
    ]
}

impl IssueState {
    /// Returns `true` for the terminal state hidden by `hideResolved`.
    pub fn is_resolved(&self) -> bool {
        *self == Self::Completed
    }
}

// ---------------------------------------------------------------------------
// Query arguments
// ---------------------------------------------------------------------------

define_enum! {
    /// Which user-id set an add-or-remove toggle targets.
    Toggle, kind = "toggle", default = Stars,
    variants: [
        (Stars, "stars", "Stars"),
        (Upvotes, "upvotes", "Upvotes"),
    ]
}

define_enum! {
    /// Metric used by the top-N-per-priority ranker.
    RankBy, kind = "orderBy", default = Stars,
    variants: [
        (Stars, "stars", "Stars"),
        (Upvotes, "upvotes", "Upvotes"),
        (Open, "open", "Open"),
    ]
}

define_enum! {
    /// Result ordering for full-text filtering.
    SortBy, kind = "sortBy", default = Relevance,
    variants: [
        (Relevance, "relevance", "Relevance"),
        (Updated, "updated", "Updated"),
    ]
}

// ---------------------------------------------------------------------------
// User preference enums
// ---------------------------------------------------------------------------

define_enum! {
    /// Preferred sort for search results, stored in user settings.
    UserSort, kind = "defaultSort", default = Relevance,
    variants: [
        (Relevance, "RELEVANCE", "Relevance"),
        (Updated, "UPDATED", "Updated"),
    ]
}

impl From<UserSort> for SortBy {
    fn from(sort: UserSort) -> Self {
        match sort {
            UserSort::Relevance => SortBy::Relevance,
            UserSort::Updated => SortBy::Updated,
        }
    }
}

define_enum! {
    /// Timestamp display formats a user can choose from.
    ///
    /// The wire value is the sample rendering shown to the user.
    UserDateFormat, kind = "dateFormat", default = DayMonthYearTimeNamed,
    variants: [
        (DayMonthYearTimeNamed, "31 Dec 2000 23:59", "%d %b %Y %H:%M"),
        (DayMonthYearTime, "31/12/2000 23:59", "%d/%m/%Y %H:%M"),
        (DayMonthYearTimeAmPm, "31/12/2000 11:59PM", "%d/%m/%Y %I:%M%p"),
        (DayMonthYear, "31 Dec 2000", "%d %b %Y"),
        (MonthDayYearTimeNamed, "Dec 31 2000 23:59", "%b %d %Y %H:%M"),
        (MonthDayYearTime, "12/31/2000 23:59", "%m/%d/%Y %H:%M"),
        (MonthDayYearTimeAmPm, "12/31/2000 11:59PM", "%m/%d/%Y %I:%M%p"),
        (MonthDayYear, "Dec 31 2000", "%b %d %Y"),
    ]
}

impl UserDateFormat {
    /// Renders a timestamp with this format's chrono pattern.
    pub fn format(&self, ts: &chrono::DateTime<chrono::Utc>) -> String {
        ts.format(self.label()).to_string()
    }
}

// ---------------------------------------------------------------------------
// Notification types
// ---------------------------------------------------------------------------

/// Kind of event a notification reports, with its stable database id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    UpdatedIssue,
    ClosedIssue,
    DeletedIssue,
    CommentedOnIssue,
    Mentioned,
}

impl NotificationType {
    /// All types, ordered by id.
    pub const ALL: &'static [Self] = &[
        Self::UpdatedIssue,
        Self::ClosedIssue,
        Self::DeletedIssue,
        Self::CommentedOnIssue,
        Self::Mentioned,
    ];

    /// Row id in the `notification_types` table.
    pub fn id(&self) -> i32 {
        match self {
            Self::UpdatedIssue => 1,
            Self::ClosedIssue => 2,
            Self::DeletedIssue => 3,
            Self::CommentedOnIssue => 4,
            Self::Mentioned => 5,
        }
    }

    /// Message fragment placed between the sender name and the issue code.
    pub fn message(&self) -> &'static str {
        match self {
            Self::UpdatedIssue => " updated details in ",
            Self::ClosedIssue => " closed ",
            Self::DeletedIssue => " deleted ",
            Self::CommentedOnIssue => " left a comment in ",
            Self::Mentioned => " mentioned you in ",
        }
    }

    /// Looks up a type by its id.
    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.id() == id)
    }
}
