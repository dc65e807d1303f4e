//! Projects and users.
//!
//! ```text
//! GET  /projects
//! POST /projects
//! GET  /users
//! POST /users
//! GET  /users/{id}
//! PUT  /users/{id}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use bootrack_core::project::Project;
use bootrack_core::user::User;

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, blocking};

#[get("/projects")]
pub async fn list_projects(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let projects = blocking(&state, |s| s.repo().get_all_projects()).await?;
    Ok(HttpResponse::Ok().json(projects))
}

#[post("/projects")]
pub async fn create_project(
    state: web::Data<AppState>,
    body: web::Json<Project>,
) -> ApiResult<HttpResponse> {
    let project = body.into_inner();
    let created = blocking(&state, move |s| s.repo().add_project(&project)).await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/users")]
pub async fn list_users(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let users = blocking(&state, |s| s.repo().get_all_users()).await?;
    Ok(HttpResponse::Ok().json(users))
}

#[post("/users")]
pub async fn create_user(state: web::Data<AppState>, body: web::Json<User>) -> ApiResult<HttpResponse> {
    let user = body.into_inner();
    let created = blocking(&state, move |s| s.repo().add_user(&user)).await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/users/{id}")]
pub async fn get_user(state: web::Data<AppState>, path: web::Path<i32>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    match blocking(&state, move |s| s.repo().get_user(id)).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(ApiError::not_found(format!("user not found: {id}"))),
    }
}

/// Replaces a user's profile and settings. The path id wins over the body.
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    body: web::Json<User>,
) -> ApiResult<HttpResponse> {
    let mut user = body.into_inner();
    user.id = path.into_inner();
    let id = user.id;
    let echoed = user.clone();
    if blocking(&state, move |s| s.repo().edit_user(&user)).await? {
        Ok(HttpResponse::Ok().json(echoed))
    } else {
        Err(ApiError::not_found(format!("user not found: {id}")))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use bootrack_core::user::User;
    use pretty_assertions::assert_eq;

    use crate::test_support::{seeded, test_app};

    #[actix_web::test]
    async fn lists_projects_and_users() {
        let (state, fixture) = seeded();
        let app = actix_test::init_service(test_app(state)).await;

        let req = actix_test::TestRequest::get().uri("/projects").to_request();
        let projects: Vec<serde_json::Value> = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0]["code"], fixture.project.code.as_str());

        let req = actix_test::TestRequest::get().uri("/users").to_request();
        let users: Vec<User> = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(users.len(), 2);
    }

    #[actix_web::test]
    async fn unknown_user_is_404() {
        let (state, _) = seeded();
        let app = actix_test::init_service(test_app(state)).await;

        let req = actix_test::TestRequest::get().uri("/users/999").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["code"], "not_found");
    }

    #[actix_web::test]
    async fn update_user_settings() {
        let (state, fixture) = seeded();
        let app = actix_test::init_service(test_app(state)).await;

        let mut user = fixture.ann.clone();
        user.settings.notify_on_self_changes = true;
        let req = actix_test::TestRequest::put()
            .uri(&format!("/users/{}", user.id))
            .set_json(&user)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/users/{}", user.id))
            .to_request();
        let stored: User = actix_test::call_and_read_body_json(&app, req).await;
        assert!(stored.settings.notify_on_self_changes);

        let req = actix_test::TestRequest::put()
            .uri("/users/4040")
            .set_json(&user)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn invalid_project_code_is_400() {
        let (state, _) = seeded();
        let app = actix_test::init_service(test_app(state)).await;

        let req = actix_test::TestRequest::post()
            .uri("/projects")
            .set_json(serde_json::json!({ "id": 0, "name": "Too long", "code": "TOOLONG" }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
