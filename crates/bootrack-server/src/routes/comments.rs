//! Comment commands. The issue key always comes from the path.

use actix_web::{HttpResponse, delete, post, put, web};
use bootrack_core::comment::Comment;

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, blocking};

#[post("/projects/{pid}/issues/{number}/comments")]
pub async fn create_comment(
    state: web::Data<AppState>,
    path: web::Path<(i32, i64)>,
    body: web::Json<Comment>,
) -> ApiResult<HttpResponse> {
    let (project_id, issue_number) = path.into_inner();
    let mut comment = body.into_inner();
    comment.project_id = project_id;
    comment.issue_number = issue_number;
    let created = blocking(&state, move |s| s.repo().add_comment(&comment)).await?;
    Ok(HttpResponse::Created().json(created))
}

#[put("/projects/{pid}/issues/{number}/comments/{id}")]
pub async fn update_comment(
    state: web::Data<AppState>,
    path: web::Path<(i32, i64, i64)>,
    body: web::Json<Comment>,
) -> ApiResult<HttpResponse> {
    let (project_id, issue_number, id) = path.into_inner();
    let mut comment = body.into_inner();
    comment.id = id;
    comment.project_id = project_id;
    comment.issue_number = issue_number;
    let updated = blocking(&state, move |s| s.repo().edit_comment(&comment)).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/projects/{pid}/issues/{number}/comments/{id}")]
pub async fn delete_comment(
    state: web::Data<AppState>,
    path: web::Path<(i32, i64, i64)>,
) -> ApiResult<HttpResponse> {
    let (_, _, id) = path.into_inner();
    if blocking(&state, move |s| s.repo().delete_comment(id)).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::not_found(format!("comment not found: {id}")))
    }
}
