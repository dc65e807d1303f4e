//! Issue listing, search, ranking and commands.
//!
//! ```text
//! GET    /projects/{pid}/issues
//! GET    /projects/{pid}/issues/count
//! GET    /projects/{pid}/issues/rank
//! GET    /projects/{pid}/issues/distance
//! GET    /projects/{pid}/issues/{number}
//! POST   /projects/{pid}/issues
//! PUT    /projects/{pid}/issues/{number}
//! DELETE /projects/{pid}/issues/{number}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use bootrack_core::enums::{RankBy, SortBy, Toggle};
use bootrack_core::issue::{Issue, Location};
use bootrack_core::query::Page;
use bootrack_core::validation::validate_location;
use bootrack_storage::{BatchToken, Listing, SearchFilter};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, blocking};

/// Response header carrying the token of the next cursor batch.
pub const NEXT_CURSOR_HEADER: &str = "Bootrack-Next-Cursor";

/// Offset value that switches a listing into cursor mode.
const CURSOR_OFFSET: i64 = -1;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    limit: Option<u32>,
    offset: Option<i64>,
    #[serde(default)]
    search_text: String,
    #[serde(default)]
    hide_resolved: bool,
    sort_by: Option<String>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountParams {
    #[serde(default)]
    search_text: String,
    #[serde(default)]
    hide_resolved: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankParams {
    order_by: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceParams {
    latitude: f64,
    longitude: f64,
    max_distance: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleParams {
    user_id: Option<i32>,
    toggle: Option<String>,
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[get("/projects/{pid}/issues")]
pub async fn list_issues(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    params: web::Query<ListParams>,
) -> ApiResult<HttpResponse> {
    let project_id = path.into_inner();
    let params = params.into_inner();

    if params.offset == Some(CURSOR_OFFSET) || params.cursor.is_some() {
        return cursor_batch(state, project_id, params).await;
    }
    let offset = params
        .offset
        .map(u32::try_from)
        .transpose()
        .map_err(|_| ApiError::invalid_request("offset must be -1 or a non-negative integer"))?;
    let page = Page {
        limit: params.limit,
        offset,
    };

    if page.is_single_position() {
        let offset = offset.unwrap_or_default();
        return match blocking(&state, move |s| s.repo().get_issue_at(project_id, offset)).await? {
            Some(detailed) => Ok(HttpResponse::Ok().json(detailed)),
            None => Err(ApiError::not_found(format!(
                "no issue at offset {offset} in project {project_id}"
            ))),
        };
    }

    if let Some(text) = non_blank(&params.search_text) {
        let sort_by = params
            .sort_by
            .as_deref()
            .map(str::parse::<SortBy>)
            .transpose()?
            .unwrap_or_default();
        let filter = SearchFilter {
            project_id,
            search_text: text,
            hide_resolved: params.hide_resolved,
            sort_by,
            page,
        };
        let found = blocking(&state, move |s| s.repo().filter_issues(&filter)).await?;
        return Ok(HttpResponse::Ok().json(found));
    }

    match blocking(&state, move |s| s.repo().list_issues(project_id, page)).await? {
        Listing::Summaries(summaries) => Ok(HttpResponse::Ok().json(summaries)),
        Listing::Detailed(detailed) => Ok(HttpResponse::Ok().json(detailed)),
    }
}

/// `offset=-1`: a stateless batch when a token is supplied, otherwise the
/// next batch of the server-held iterator.
async fn cursor_batch(
    state: web::Data<AppState>,
    project_id: i32,
    params: ListParams,
) -> ApiResult<HttpResponse> {
    let size = params.limit.unwrap_or(state.batch_size());
    let Some(raw) = params.cursor else {
        let items = blocking(&state, move |s| s.next_held_batch(project_id, size)).await?;
        return Ok(HttpResponse::Ok().json(items));
    };

    let token: BatchToken = raw.parse()?;
    if token.project_id != project_id {
        return Err(ApiError::invalid_request(format!(
            "cursor {token} does not belong to project {project_id}"
        )));
    }
    let page = blocking(&state, move |s| s.repo().next_batch(&token, size)).await?;
    debug!(%token, returned = page.items.len(), "cursor batch served");

    let mut response = HttpResponse::Ok();
    if let Some(next) = page.next {
        response.insert_header((NEXT_CURSOR_HEADER, next.to_string()));
    }
    Ok(response.json(page.items))
}

#[get("/projects/{pid}/issues/count")]
pub async fn count_issues(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    params: web::Query<CountParams>,
) -> ApiResult<HttpResponse> {
    let project_id = path.into_inner();
    let CountParams {
        search_text,
        hide_resolved,
    } = params.into_inner();
    let text = non_blank(&search_text);
    let count = blocking(&state, move |s| {
        s.repo()
            .count_filtered_issues(project_id, text.as_deref(), hide_resolved)
    })
    .await?;
    Ok(HttpResponse::Ok().json(count))
}

#[get("/projects/{pid}/issues/rank")]
pub async fn rank_issues(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    params: web::Query<RankParams>,
) -> ApiResult<HttpResponse> {
    let project_id = path.into_inner();
    let metric: RankBy = params.order_by.parse()?;
    let groups = blocking(&state, move |s| s.repo().rank_issues(project_id, metric)).await?;
    Ok(HttpResponse::Ok().json(groups))
}

#[get("/projects/{pid}/issues/distance")]
pub async fn issues_by_distance(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    params: web::Query<DistanceParams>,
) -> ApiResult<HttpResponse> {
    let project_id = path.into_inner();
    let target = Location::new(params.latitude, params.longitude);
    validate_location(target)?;
    let max_km = params.max_distance;
    if !max_km.is_finite() || max_km < 0.0 {
        return Err(ApiError::invalid_request("maxDistance must be a non-negative number"));
    }
    let nearby = blocking(&state, move |s| {
        s.repo().filter_issues_by_distance(project_id, target, max_km)
    })
    .await?;
    Ok(HttpResponse::Ok().json(nearby))
}

#[get("/projects/{pid}/issues/{number}")]
pub async fn get_issue(
    state: web::Data<AppState>,
    path: web::Path<(i32, i64)>,
) -> ApiResult<HttpResponse> {
    let (project_id, number) = path.into_inner();
    match blocking(&state, move |s| s.repo().get_issue(number, project_id)).await? {
        Some(detailed) => Ok(HttpResponse::Ok().json(detailed)),
        None => Err(ApiError::not_found(format!(
            "issue not found: {project_id}/{number}"
        ))),
    }
}

#[post("/projects/{pid}/issues")]
pub async fn create_issue(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<Issue>,
) -> ApiResult<HttpResponse> {
    let mut issue = body.into_inner();
    issue.project_id = path.into_inner();
    let created = blocking(&state, move |s| s.repo().add_issue(&issue)).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Full edit, or an add-or-remove toggle when `userId` and `toggle` are
/// both present. A body whose `projectId` differs from the path moves the
/// issue to that project; move and edit commit or fail together.
#[put("/projects/{pid}/issues/{number}")]
pub async fn update_issue(
    state: web::Data<AppState>,
    path: web::Path<(i32, i64)>,
    params: web::Query<ToggleParams>,
    body: web::Json<Issue>,
) -> ApiResult<HttpResponse> {
    let (project_id, number) = path.into_inner();
    let mut issue = body.into_inner();
    issue.number = number;

    let updated = match (params.user_id, params.toggle.as_deref()) {
        (Some(user_id), Some(toggle)) => {
            let toggle: Toggle = toggle.parse()?;
            issue.project_id = project_id;
            blocking(&state, move |s| s.repo().toggle_issue(&issue, user_id, toggle)).await?
        }
        (None, None) => {
            blocking(&state, move |s| s.repo().edit_issue_from(project_id, &issue)).await?
        }
        _ => {
            return Err(ApiError::invalid_request(
                "userId and toggle must be given together",
            ));
        }
    };
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/projects/{pid}/issues/{number}")]
pub async fn delete_issue(
    state: web::Data<AppState>,
    path: web::Path<(i32, i64)>,
) -> ApiResult<HttpResponse> {
    let (project_id, number) = path.into_inner();
    if blocking(&state, move |s| s.repo().delete_issue(number, project_id)).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::not_found(format!(
            "issue not found: {project_id}/{number}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use bootrack_core::enums::{IssuePriority, IssueState};
    use bootrack_core::issue::{IssueBuilder, IssueDetailed, IssueSummarized};
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::*;
    use crate::test_support::{seeded, test_app};

    fn codes(rows: &[IssueSummarized]) -> Vec<String> {
        rows.iter().map(|s| s.issue.code.clone()).collect()
    }

    #[actix_web::test]
    async fn offset_pages_and_single_position() {
        let (state, fixture) = seeded();
        fixture.add_issues(&state, 12);
        let app = actix_test::init_service(test_app(state)).await;
        let pid = fixture.project.id;

        let req = actix_test::TestRequest::get()
            .uri(&format!("/projects/{pid}/issues?limit=10&offset=10"))
            .to_request();
        let page: Vec<IssueSummarized> = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(page.len(), 2);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/projects/{pid}/issues?limit=1&offset=0"))
            .to_request();
        let detailed: IssueDetailed = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(detailed.issue.code, "GHST-111");

        let req = actix_test::TestRequest::get()
            .uri(&format!("/projects/{pid}/issues?limit=1&offset=40"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/projects/{pid}/issues?offset=-7"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn stateless_cursor_walks_all_issues() {
        let (state, fixture) = seeded();
        fixture.add_issues(&state, 5);
        let app = actix_test::init_service(test_app(state)).await;
        let pid = fixture.project.id;

        let mut cursor = Some(format!("{pid}:0"));
        let mut seen = Vec::new();
        while let Some(token) = cursor {
            let req = actix_test::TestRequest::get()
                .uri(&format!("/projects/{pid}/issues?offset=-1&limit=2&cursor={token}"))
                .to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            cursor = resp
                .headers()
                .get(NEXT_CURSOR_HEADER)
                .map(|v| v.to_str().unwrap().to_string());
            let batch: Vec<IssueSummarized> = actix_test::read_body_json(resp).await;
            seen.extend(codes(&batch));
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 5);
    }

    #[actix_web::test]
    async fn held_cursor_restarts_after_exhaustion() {
        let (state, fixture) = seeded();
        fixture.add_issues(&state, 3);
        let app = actix_test::init_service(test_app(state)).await;
        let uri = format!("/projects/{}/issues?offset=-1&limit=2", fixture.project.id);

        let mut sizes = Vec::new();
        for _ in 0..4 {
            let req = actix_test::TestRequest::get().uri(&uri).to_request();
            let batch: Vec<IssueSummarized> = actix_test::call_and_read_body_json(&app, req).await;
            sizes.push(batch.len());
        }
        assert_eq!(sizes, vec![2, 1, 0, 2]);
    }

    #[actix_web::test]
    async fn malformed_or_foreign_cursor_is_400() {
        let (state, fixture) = seeded();
        let app = actix_test::init_service(test_app(state)).await;
        let pid = fixture.project.id;

        for cursor in ["nonsense", "999:0"] {
            let req = actix_test::TestRequest::get()
                .uri(&format!("/projects/{pid}/issues?offset=-1&cursor={cursor}"))
                .to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "cursor {cursor}");
        }
    }

    #[actix_web::test]
    async fn search_and_count() {
        let (state, fixture) = seeded();
        let pid = fixture.project.id;
        for (title, issue_state) in [
            ("Login bug", IssueState::Submitted),
            ("Login page slow", IssueState::Completed),
            ("Broken footer", IssueState::Submitted),
        ] {
            state
                .repo()
                .add_issue(&IssueBuilder::new(pid, fixture.ann.id, title).state(issue_state).build())
                .unwrap();
        }
        let app = actix_test::init_service(test_app(state)).await;

        let req = actix_test::TestRequest::get()
            .uri(&format!(
                "/projects/{pid}/issues?searchText=login&hideResolved=true&sortBy=relevance&limit=10&offset=0"
            ))
            .to_request();
        let found: Vec<IssueSummarized> = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].issue.title, "Login bug");

        let req = actix_test::TestRequest::get()
            .uri(&format!("/projects/{pid}/issues/count?searchText=login"))
            .to_request();
        let count: i64 = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(count, 2);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/projects/{pid}/issues/count"))
            .to_request();
        let count: i64 = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(count, 3);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/projects/{pid}/issues?searchText=login&sortBy=newest"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn rank_groups_and_rejects_unknown_metric() {
        let (state, fixture) = seeded();
        let pid = fixture.project.id;
        for priority in [IssuePriority::Major, IssuePriority::Minor] {
            state
                .repo()
                .add_issue(&IssueBuilder::new(pid, fixture.ann.id, "ranked").priority(priority).build())
                .unwrap();
        }
        let app = actix_test::init_service(test_app(state)).await;

        let req = actix_test::TestRequest::get()
            .uri(&format!("/projects/{pid}/issues/rank?orderBy=upvotes"))
            .to_request();
        let groups: Vec<Vec<IssueSummarized>> = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0][0].issue.priority, IssuePriority::Minor);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/projects/{pid}/issues/rank?orderBy=age"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["code"], "invalid_request");
    }

    #[actix_web::test]
    async fn distance_filter_over_http() {
        let (state, fixture) = seeded();
        let pid = fixture.project.id;
        state
            .repo()
            .add_issue(
                &IssueBuilder::new(pid, fixture.ann.id, "near")
                    .location(Location::new(51.5007, -0.1246))
                    .build(),
            )
            .unwrap();
        let app = actix_test::init_service(test_app(state)).await;

        let req = actix_test::TestRequest::get()
            .uri(&format!(
                "/projects/{pid}/issues/distance?latitude=51.5014&longitude=-0.1419&maxDistance=5"
            ))
            .to_request();
        let nearby: Vec<IssueSummarized> = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(nearby.len(), 1);
        assert!(nearby[0].issue.location.is_some());

        let req = actix_test::TestRequest::get()
            .uri(&format!(
                "/projects/{pid}/issues/distance?latitude=91&longitude=0&maxDistance=5"
            ))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn create_edit_toggle_delete() {
        let (state, fixture) = seeded();
        let app = actix_test::init_service(test_app(state)).await;
        let pid = fixture.project.id;
        let draft = IssueBuilder::new(pid, fixture.ann.id, "Pothole on Main St").build();

        let req = actix_test::TestRequest::post()
            .uri(&format!("/projects/{pid}/issues"))
            .set_json(&draft)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let mut created: Issue = actix_test::read_body_json(resp).await;
        assert_eq!(created.code, "GHST-100");

        created.state = IssueState::InProgress;
        let req = actix_test::TestRequest::put()
            .uri(&format!("/projects/{pid}/issues/{}", created.number))
            .set_json(&created)
            .to_request();
        let edited: Issue = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(edited.state, IssueState::InProgress);

        let req = actix_test::TestRequest::put()
            .uri(&format!(
                "/projects/{pid}/issues/{}?userId={}&toggle=upvotes",
                created.number, fixture.bob.id
            ))
            .set_json(&edited)
            .to_request();
        let toggled: Issue = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(toggled.upvotes, vec![fixture.bob.id]);
        assert_eq!(toggled.modified_at, edited.modified_at);

        let req = actix_test::TestRequest::put()
            .uri(&format!(
                "/projects/{pid}/issues/{}?userId={}&toggle=likes",
                created.number, fixture.bob.id
            ))
            .set_json(&edited)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let uri = format!("/projects/{pid}/issues/{}", created.number);
        let req = actix_test::TestRequest::delete().uri(&uri).to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = actix_test::TestRequest::delete().uri(&uri).to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = actix_test::TestRequest::get().uri(&uri).to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn editing_missing_issue_is_404_and_bad_body_is_400() {
        let (state, fixture) = seeded();
        let app = actix_test::init_service(test_app(state)).await;
        let pid = fixture.project.id;

        let ghost = IssueBuilder::new(pid, fixture.ann.id, "ghost").build();
        let req = actix_test::TestRequest::put()
            .uri(&format!("/projects/{pid}/issues/777"))
            .set_json(&ghost)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = actix_test::TestRequest::post()
            .uri(&format!("/projects/{pid}/issues"))
            .set_json(serde_json::json!({ "title": 5 }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn editing_project_moves_issue() {
        let (state, fixture) = seeded();
        let other = state
            .repo()
            .add_project(&bootrack_core::project::Project::new("Other", "OTHR").unwrap())
            .unwrap();
        let issue = fixture.add_issues(&state, 1).remove(0);
        let app = actix_test::init_service(test_app(state)).await;

        let mut moved = issue.clone();
        moved.project_id = other.id;
        let req = actix_test::TestRequest::put()
            .uri(&format!("/projects/{}/issues/{}", issue.project_id, issue.number))
            .set_json(&moved)
            .to_request();
        let stored: Issue = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(stored.project_id, other.id);
        assert_eq!(stored.code, "OTHR-100");
    }

    #[actix_web::test]
    async fn rejected_move_edit_leaves_issue_in_place() {
        let (state, fixture) = seeded();
        let other = state
            .repo()
            .add_project(&bootrack_core::project::Project::new("Other", "OTHR").unwrap())
            .unwrap();
        let issue = fixture.add_issues(&state, 1).remove(0);
        let app = actix_test::init_service(test_app(state)).await;

        let mut moved = issue.clone();
        moved.project_id = other.id;
        moved.title = String::new();
        let req = actix_test::TestRequest::put()
            .uri(&format!("/projects/{}/issues/{}", issue.project_id, issue.number))
            .set_json(&moved)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/projects/{}/issues/{}", issue.project_id, issue.number))
            .to_request();
        let stored: Issue = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(stored.code, issue.code);
        assert_eq!(stored.title, issue.title);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/projects/{}/issues/100", other.id))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
