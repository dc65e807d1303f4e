//! Clap CLI definitions for the `bt` command.

use std::path::PathBuf;
use std::str::FromStr;

use bootrack_core::enums::{
    IssuePriority, IssueState, ParseEnumError, RankBy, UserDateFormat, UserSort,
};
use bootrack_core::issue::Location;
use bootrack_core::validation::validate_location;
use clap::{Args, Parser, Subcommand};

/// bt -- bootrack issue tracker.
///
/// Projects, issues, comments and notifications, either straight from the
/// local `.bootrack` database or through a running `bt serve`.
#[derive(Parser, Debug)]
#[command(
    name = "bt",
    about = "Issue tracker with search, ranking and nearby views",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Database file (default: from .bootrack/config.yaml).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Username to act as (default: client.user from config).
    #[arg(long = "as-user", global = true, env = "BT_USER")]
    pub as_user: Option<String>,

    /// Talk to the configured server (client.base-url) instead of the local database.
    #[arg(long, global = true)]
    pub remote: bool,

    /// Server URL; implies --remote.
    #[arg(long, global = true, env = "BT_SERVER")]
    pub server: Option<String>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create .bootrack/ with a config file, a database and optionally a
    /// first project and user.
    Init(InitArgs),

    /// List or add projects.
    Project(ProjectArgs),

    /// List, add or configure users.
    User(UserArgs),

    /// Create, show, edit, star, upvote or delete issues.
    Issue(IssueArgs),

    /// Add, edit or delete comments.
    Comment(CommentArgs),

    /// List a project's issues, newest first.
    List(ListArgs),

    /// Full-text search within a project.
    Search(SearchArgs),

    /// Top issues per priority.
    Rank(RankArgs),

    /// Unresolved issues within your travel distance.
    Near(NearArgs),

    /// Write a project's issues as JSON lines.
    Export(ExportArgs),

    /// Show and manage your notifications.
    #[command(alias = "inbox")]
    Notifications(NotificationsArgs),

    /// Run the HTTP API over the local database.
    Serve(ServeArgs),

    /// Generate shell completions.
    Completion(CompletionArgs),
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Name of a first project to create.
    #[arg(long = "project", requires = "code")]
    pub project_name: Option<String>,

    /// Code of the first project (3 to 5 characters).
    #[arg(long, requires = "project_name")]
    pub code: Option<String>,

    /// Username of a first user; becomes client.user in the config.
    #[arg(long, requires = "project_name")]
    pub user: Option<String>,

    /// Full name of the first user (default: the username).
    #[arg(long = "full-name", requires = "user")]
    pub full_name: Option<String>,

    /// Re-initialize even when a database already exists.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Project / User
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List all projects.
    List,
    /// Add a project.
    Add {
        /// Display name.
        name: String,
        /// Short code used in issue codes (3 to 5 characters).
        code: String,
    },
}

#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommands,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List all users.
    List,
    /// Add a user with default settings.
    Add(UserAddArgs),
    /// Show a user (default: yourself).
    Show {
        username: Option<String>,
    },
    /// Change your settings.
    Settings(UserSettingsArgs),
}

#[derive(Args, Debug)]
pub struct UserAddArgs {
    pub username: String,

    /// Full name (default: the username).
    #[arg(long = "full-name")]
    pub full_name: Option<String>,

    /// Default project code (default: the first project).
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct UserSettingsArgs {
    /// Default project code.
    #[arg(long = "default-project")]
    pub default_project: Option<String>,

    /// Home location as `LAT,LON`.
    #[arg(long, value_parser = parse_location)]
    pub location: Option<Location>,

    /// Radius for `bt near`, in kilometers.
    #[arg(long = "max-distance")]
    pub max_travel_distance: Option<i32>,

    /// Date format sample, e.g. "31/12/2000 23:59".
    #[arg(long = "date-format", value_parser = parse_date_format)]
    pub date_format: Option<UserDateFormat>,

    /// Search result order: relevance or updated.
    #[arg(long = "default-sort", value_parser = parse_upper::<UserSort>)]
    pub default_sort: Option<UserSort>,

    #[arg(long = "avatar-icon")]
    pub avatar_icon: Option<i32>,

    #[arg(long = "avatar-tint")]
    pub avatar_tint: Option<i32>,

    #[arg(long = "notify-on-self-changes")]
    pub notify_on_self_changes: Option<bool>,

    #[arg(long = "notify-on-mention")]
    pub notify_on_mention: Option<bool>,

    #[arg(long = "unstar-on-issue-close")]
    pub unstar_on_issue_close: Option<bool>,

    #[arg(long = "star-on-issue-create")]
    pub star_on_issue_create: Option<bool>,

    #[arg(long = "star-on-issue-update")]
    pub star_on_issue_update: Option<bool>,

    #[arg(long = "star-on-issue-assigned")]
    pub star_on_issue_assigned: Option<bool>,

    #[arg(long = "star-on-issue-upvote")]
    pub star_on_issue_upvote: Option<bool>,
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct IssueArgs {
    #[command(subcommand)]
    pub command: IssueCommands,
}

#[derive(Subcommand, Debug)]
pub enum IssueCommands {
    /// Create an issue.
    #[command(alias = "new")]
    Create(IssueCreateArgs),
    /// Show an issue with its comments.
    #[command(alias = "view")]
    Show {
        /// Issue code, e.g. GHST-101.
        code: String,
    },
    /// Show the issue at a position in the list (0 = newest).
    At {
        position: u32,
        /// Project code (default: your default project).
        #[arg(short = 'p', long)]
        project: Option<String>,
    },
    /// Change issue fields.
    Update(IssueUpdateArgs),
    /// Mark an issue completed.
    Close { code: String },
    /// Put a completed issue back in progress.
    Reopen { code: String },
    /// Star or unstar an issue.
    Star { code: String },
    /// Upvote or withdraw an upvote.
    Upvote { code: String },
    /// Delete an issue and its comments.
    Delete { code: String },
}

#[derive(Args, Debug)]
pub struct IssueCreateArgs {
    pub title: String,

    /// Project code (default: your default project).
    #[arg(short = 'p', long)]
    pub project: Option<String>,

    #[arg(short = 'd', long, default_value = "")]
    pub description: String,

    /// minor, normal or major.
    #[arg(long, value_parser = parse_upper::<IssuePriority>, default_value = "normal")]
    pub priority: IssuePriority,

    /// Assignee username.
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// Location as `LAT,LON`.
    #[arg(long, value_parser = parse_location)]
    pub location: Option<Location>,
}

#[derive(Args, Debug, Default)]
pub struct IssueUpdateArgs {
    pub code: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// minor, normal or major.
    #[arg(long, value_parser = parse_upper::<IssuePriority>)]
    pub priority: Option<IssuePriority>,

    /// submitted, in-progress or completed.
    #[arg(long, value_parser = parse_upper::<IssueState>)]
    pub state: Option<IssueState>,

    /// Assignee username.
    #[arg(short = 'a', long, conflicts_with = "unassign")]
    pub assignee: Option<String>,

    #[arg(long)]
    pub unassign: bool,

    /// Location as `LAT,LON`.
    #[arg(long, value_parser = parse_location, conflicts_with = "clear_location")]
    pub location: Option<Location>,

    #[arg(long = "clear-location")]
    pub clear_location: bool,

    /// Move the issue to another project (new number and code).
    #[arg(long = "move-to")]
    pub move_to: Option<String>,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct CommentArgs {
    #[command(subcommand)]
    pub command: CommentCommands,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// Comment on an issue. `@username` notifies that user.
    Add { code: String, text: String },
    /// Replace a comment's text.
    Edit { code: String, id: i64, text: String },
    /// Delete a comment.
    Delete { code: String, id: i64 },
}

// ---------------------------------------------------------------------------
// Listing and queries
// ---------------------------------------------------------------------------

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Project code (default: your default project).
    #[arg(short = 'p', long)]
    pub project: Option<String>,

    /// Page to show, starting at 1.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Fetch every issue in cursor batches instead of one page.
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    pub text: String,

    #[arg(short = 'p', long)]
    pub project: Option<String>,

    /// Leave out completed issues.
    #[arg(long = "hide-resolved")]
    pub hide_resolved: bool,

    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Args, Debug)]
pub struct RankArgs {
    /// stars, upvotes or open.
    #[arg(long = "by", value_parser = parse_lower::<RankBy>, default_value = "stars")]
    pub metric: RankBy,

    #[arg(short = 'p', long)]
    pub project: Option<String>,
}

#[derive(Args, Debug)]
pub struct NearArgs {
    #[arg(short = 'p', long)]
    pub project: Option<String>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[arg(short = 'p', long)]
    pub project: Option<String>,

    /// Output file (default: stdout).
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Issues fetched per batch (default: query.batch-size).
    #[arg(long = "batch-size")]
    pub batch_size: Option<u32>,

    /// Export detailed issues including comments.
    #[arg(long)]
    pub comments: bool,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct NotificationsArgs {
    #[command(subcommand)]
    pub command: Option<NotificationCommands>,
}

#[derive(Subcommand, Debug)]
pub enum NotificationCommands {
    /// List your session notifications (the default).
    List {
        /// Only unread ones.
        #[arg(long)]
        unread: bool,
    },
    /// Mark a notification read (or unread).
    Read {
        id: i64,
        #[arg(long)]
        unread: bool,
    },
    /// End the session: read notifications are dropped for good.
    Sync,
}

// ---------------------------------------------------------------------------
// Serve / Completion
// ---------------------------------------------------------------------------

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (default: server.bind).
    #[arg(long)]
    pub bind: Option<String>,

    /// Port (default: server.port; 0 picks a free one).
    #[arg(long)]
    pub port: Option<u16>,

    /// Worker threads (default: server.workers).
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

// ---------------------------------------------------------------------------
// Value parsers
// ---------------------------------------------------------------------------

/// Parses an enum whose wire form is upper snake case (`in-progress` → `IN_PROGRESS`).
fn parse_upper<T: FromStr<Err = ParseEnumError>>(s: &str) -> Result<T, String> {
    s.trim()
        .to_ascii_uppercase()
        .replace('-', "_")
        .parse()
        .map_err(|e: ParseEnumError| e.to_string())
}

fn parse_lower<T: FromStr<Err = ParseEnumError>>(s: &str) -> Result<T, String> {
    s.trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|e: ParseEnumError| e.to_string())
}

fn parse_date_format(s: &str) -> Result<UserDateFormat, String> {
    s.parse().map_err(|_| {
        let known: Vec<&str> = UserDateFormat::ALL.iter().map(|f| f.as_str()).collect();
        format!("unknown date format {s:?}; expected one of: {}", known.join(", "))
    })
}

/// `LAT,LON` in degrees.
pub fn parse_location(s: &str) -> Result<Location, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got {s:?}"))?;
    let coordinate = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|_| format!("not a coordinate: {v:?}"))
    };
    let location = Location::new(coordinate(lat)?, coordinate(lon)?);
    validate_location(location).map_err(|e| e.to_string())?;
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn enum_arguments_are_case_insensitive() {
        assert_eq!(parse_upper::<IssueState>("in-progress"), Ok(IssueState::InProgress));
        assert_eq!(parse_upper::<IssuePriority>("Major"), Ok(IssuePriority::Major));
        assert_eq!(parse_lower::<RankBy>("UPVOTES"), Ok(RankBy::Upvotes));
        assert!(parse_lower::<RankBy>("likes").is_err());
    }

    #[test]
    fn location_argument() {
        assert_eq!(parse_location("51.5, -0.12"), Ok(Location::new(51.5, -0.12)));
        assert!(parse_location("51.5").is_err());
        assert!(parse_location("91,0").is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["bt", "list", "--json", "--as-user", "ann"]).unwrap();
        assert!(cli.global.json);
        assert_eq!(cli.global.as_user.as_deref(), Some("ann"));
        assert!(matches!(cli.command, Some(Commands::List(_))));
    }

    #[test]
    fn init_project_needs_code() {
        assert!(Cli::try_parse_from(["bt", "init", "--project", "Ghost"]).is_err());
        assert!(Cli::try_parse_from(["bt", "init", "--project", "Ghost", "--code", "GHST"]).is_ok());
    }
}
