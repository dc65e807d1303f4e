//! Listing, counting, full-text and ranking queries for [`SqliteStore`].
//!
//! Predicates are rendered into a WHERE clause with numbered parameters.
//! Summaries join each issue to a pre-aggregated comment count; text
//! conditions join the FTS5 index, whose `bm25` score (title weighted 10x
//! description) is the relevance.

use rusqlite::types::ToSql;
use rusqlite::{Connection, Row};

use bootrack_core::enums::{IssueState, RankBy};
use bootrack_core::issue::{IssueDetailed, IssueSummarized};
use bootrack_core::predicate::{Condition, Predicate};
use bootrack_core::query::{IssueQuery, Ordering, RankQuery};

use crate::error::Result;
use crate::sqlite::comments::get_comments_on_conn;
use crate::sqlite::issues::{ISSUE_COLUMNS, scan_issue};
use crate::sqlite::store::SqliteStore;

/// Relevance expression; valid only when `issues_fts` is joined and matched.
const RELEVANCE: &str = "-bm25(issues_fts, 10.0, 1.0)";

/// Default order with a unique tie-breaker so pages never overlap.
const RECENCY_ORDER: &str = "i.modified_at DESC, i.id DESC";

// ---------------------------------------------------------------------------
// Predicate rendering
// ---------------------------------------------------------------------------

/// A predicate rendered to SQL.
pub(crate) struct RenderedPredicate {
    /// Extra JOIN clauses (the FTS index when text is matched).
    pub joins: String,
    pub where_sql: String,
    pub params: Vec<Box<dyn ToSql>>,
    /// Whether `issues_fts` takes part, making relevance available.
    pub has_text: bool,
}

impl RenderedPredicate {
    /// Next free `?N` index.
    fn next_param(&self) -> usize {
        self.params.len() + 1
    }

    fn push_param(&mut self, value: impl ToSql + 'static) -> String {
        let placeholder = format!("?{}", self.next_param());
        self.params.push(Box::new(value));
        placeholder
    }

    fn param_refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

pub(crate) fn render_predicate(predicate: &Predicate) -> RenderedPredicate {
    let mut where_clauses: Vec<String> = Vec::new();
    let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();
    let mut param_idx = 1;
    let mut match_terms: Vec<&str> = Vec::new();

    for condition in predicate.conditions() {
        match condition {
            Condition::InProject(project_id) => {
                where_clauses.push(format!("i.project_id = ?{param_idx}"));
                param_values.push(Box::new(*project_id));
                param_idx += 1;
            }
            Condition::Key { project_id, number } => {
                where_clauses.push(format!(
                    "i.project_id = ?{} AND i.number = ?{}",
                    param_idx,
                    param_idx + 1
                ));
                param_values.push(Box::new(*project_id));
                param_values.push(Box::new(*number));
                param_idx += 2;
            }
            Condition::HideResolved => {
                where_clauses.push(format!("i.state <> '{}'", IssueState::Completed.as_str()));
            }
            Condition::TextMatches(query) => match_terms.push(query),
            Condition::HasLocation => {
                where_clauses.push("i.latitude IS NOT NULL AND i.longitude IS NOT NULL".to_string());
            }
        }
    }

    // FTS5 accepts a single MATCH per table reference.
    let has_text = !match_terms.is_empty();
    let mut joins = String::new();
    if has_text {
        joins.push_str(" JOIN issues_fts ON issues_fts.rowid = i.id");
        let combined = match match_terms.as_slice() {
            [single] => (*single).to_string(),
            many => many
                .iter()
                .map(|q| format!("({q})"))
                .collect::<Vec<_>>()
                .join(" AND "),
        };
        where_clauses.push(format!("issues_fts MATCH ?{param_idx}"));
        param_values.push(Box::new(combined));
    }

    let where_sql = if where_clauses.is_empty() {
        "1 = 1".to_string()
    } else {
        where_clauses.join(" AND ")
    };

    RenderedPredicate {
        joins,
        where_sql,
        params: param_values,
        has_text,
    }
}

// ---------------------------------------------------------------------------
// SQL builders
// ---------------------------------------------------------------------------

/// Summary rows: no description, location only when asked for, comment
/// count coalesced to 0.
fn summary_select(rendered: &RenderedPredicate, include_location: bool) -> String {
    let location = if include_location {
        "i.latitude, i.longitude"
    } else {
        "NULL AS latitude, NULL AS longitude"
    };
    let relevance = if rendered.has_text { RELEVANCE } else { "0.0" };
    format!(
        "SELECT i.id, i.number, i.project_id, p.code || '-' || i.number AS code,
                i.author_id, i.assignee_id, i.title, '' AS description, i.priority, i.state,
                {location}, i.watchers, i.upvotes, i.created_at, i.modified_at,
                COALESCE(cc.comment_count, 0) AS comment_count,
                {relevance} AS relevance
           FROM issues i
           JOIN projects p ON p.id = i.project_id
           LEFT JOIN (
                SELECT project_id, issue_number, COUNT(*) AS comment_count
                  FROM comments
                 GROUP BY project_id, issue_number
           ) cc ON cc.project_id = i.project_id AND cc.issue_number = i.number
           {joins}
          WHERE {where_sql}",
        joins = rendered.joins,
        where_sql = rendered.where_sql,
    )
}

/// Ordering key of the ranker, largest first. Missing sets count as 0.
fn metric_sql(metric: RankBy) -> &'static str {
    match metric {
        RankBy::Stars => "COALESCE(json_array_length(s.watchers), 0)",
        RankBy::Upvotes => "COALESCE(json_array_length(s.upvotes), 0)",
        RankBy::Open => "(julianday('now') - julianday(s.created_at)) * 86400.0",
    }
}

fn scan_summary(row: &Row<'_>) -> rusqlite::Result<IssueSummarized> {
    Ok(IssueSummarized {
        issue: scan_issue(row)?,
        comment_count: row.get("comment_count")?,
    })
}

// ---------------------------------------------------------------------------
// Connection-level queries
// ---------------------------------------------------------------------------

pub(crate) fn select_summaries_on_conn(
    conn: &Connection,
    query: &IssueQuery,
) -> Result<Vec<IssueSummarized>> {
    let mut rendered = render_predicate(&query.predicate);
    let order_sql = match query.ordering {
        Ordering::RelevanceDesc if rendered.has_text => {
            format!("relevance DESC, {RECENCY_ORDER}")
        }
        _ => RECENCY_ORDER.to_string(),
    };
    let mut sql = format!(
        "{} ORDER BY {order_sql}",
        summary_select(&rendered, query.include_location)
    );
    if query.page.limit.is_some() || query.page.offset.is_some() {
        let limit = rendered.push_param(query.page.limit.map_or(-1, i64::from));
        let offset = rendered.push_param(i64::from(query.page.offset.unwrap_or(0)));
        sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
    }

    let param_refs = rendered.param_refs();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), scan_summary)?;
    let mut summaries = Vec::new();
    for row in rows {
        summaries.push(row?);
    }
    Ok(summaries)
}

pub(crate) fn count_matching_on_conn(conn: &Connection, predicate: &Predicate) -> Result<i64> {
    let rendered = render_predicate(predicate);
    let sql = format!(
        "SELECT COUNT(*) FROM issues i{joins} WHERE {where_sql}",
        joins = rendered.joins,
        where_sql = rendered.where_sql,
    );
    let param_refs = rendered.param_refs();
    Ok(conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?)
}

/// Dense rank per priority over the summary rows in a named CTE; the outer
/// filter keeps ranks within the cutoff. A row number over the same window
/// caps each group at `cutoff` rows when ranks tie.
pub(crate) fn select_ranked_on_conn(
    conn: &Connection,
    query: &RankQuery,
) -> Result<Vec<IssueSummarized>> {
    let mut rendered = render_predicate(&query.predicate);
    let summaries = summary_select(&rendered, false);
    let metric = metric_sql(query.metric);
    let cutoff = rendered.push_param(i64::from(query.cutoff));
    let sql = format!(
        "WITH summaries AS ({summaries}),
         issues_with_ranking AS (
             SELECT s.*,
                    DENSE_RANK() OVER (
                        PARTITION BY s.priority ORDER BY {metric} DESC
                    ) AS ranking,
                    ROW_NUMBER() OVER (
                        PARTITION BY s.priority
                        ORDER BY {metric} DESC, s.modified_at DESC, s.id DESC
                    ) AS row_num
               FROM summaries s
         )
         SELECT * FROM issues_with_ranking
          WHERE ranking <= {cutoff} AND row_num <= {cutoff}
          ORDER BY priority, ranking, row_num"
    );

    let param_refs = rendered.param_refs();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), scan_summary)?;
    let mut ranked = Vec::new();
    for row in rows {
        ranked.push(row?);
    }
    Ok(ranked)
}

pub(crate) fn select_detailed_on_conn(
    conn: &Connection,
    predicate: &Predicate,
    offset: u32,
) -> Result<Option<IssueDetailed>> {
    let mut rendered = render_predicate(predicate);
    let offset = rendered.push_param(i64::from(offset));
    let sql = format!(
        "SELECT {ISSUE_COLUMNS}
           FROM issues i
           JOIN projects p ON p.id = i.project_id{joins}
          WHERE {where_sql}
          ORDER BY {RECENCY_ORDER}
          LIMIT 1 OFFSET {offset}",
        joins = rendered.joins,
        where_sql = rendered.where_sql,
    );
    let param_refs = rendered.param_refs();
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(param_refs.as_slice(), scan_issue)?;
    let Some(issue) = rows.next().transpose()? else {
        return Ok(None);
    };
    let comments = get_comments_on_conn(conn, issue.project_id, issue.number)?;
    Ok(Some(IssueDetailed { issue, comments }))
}

// ---------------------------------------------------------------------------
// SqliteStore query methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    pub fn select_summaries_impl(&self, query: &IssueQuery) -> Result<Vec<IssueSummarized>> {
        let conn = self.lock_conn()?;
        select_summaries_on_conn(&conn, query)
    }

    pub fn count_matching_impl(&self, predicate: &Predicate) -> Result<i64> {
        let conn = self.lock_conn()?;
        count_matching_on_conn(&conn, predicate)
    }

    pub fn select_ranked_impl(&self, query: &RankQuery) -> Result<Vec<IssueSummarized>> {
        let conn = self.lock_conn()?;
        select_ranked_on_conn(&conn, query)
    }

    pub fn select_detailed_impl(
        &self,
        predicate: &Predicate,
        offset: u32,
    ) -> Result<Option<IssueDetailed>> {
        let conn = self.lock_conn()?;
        select_detailed_on_conn(&conn, predicate, offset)
    }

    /// Issue by composite key, with comments.
    pub fn get_issue_impl(&self, number: i64, project_id: i32) -> Result<Option<IssueDetailed>> {
        self.select_detailed_impl(&Predicate::key(project_id, number), 0)
    }
}
