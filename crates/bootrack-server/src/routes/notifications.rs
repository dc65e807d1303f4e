//! Notification log and per-session views.
//!
//! ```text
//! GET  /notifications/sync
//! POST /notifications
//! GET  /notifications/{user_id}
//! PUT  /notifications/{id}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use bootrack_core::notification::Notification;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, blocking};

/// Body of a read-state update. A full session notification also parses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationUpdate {
    is_read: bool,
}

/// Merges session state back into the permanent log.
#[get("/notifications/sync")]
pub async fn sync_notifications(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    blocking(&state, |s| s.repo().sync_notifications()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/notifications")]
pub async fn create_notifications(
    state: web::Data<AppState>,
    body: web::Json<Vec<Notification>>,
) -> ApiResult<HttpResponse> {
    let batch = body.into_inner();
    let created = blocking(&state, move |s| s.repo().add_notifications(&batch)).await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/notifications/{user_id}")]
pub async fn notifications_for_user(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> ApiResult<HttpResponse> {
    let user_id = path.into_inner();
    let session = blocking(&state, move |s| s.repo().get_notifications_by_receiver(user_id)).await?;
    Ok(HttpResponse::Ok().json(session))
}

#[put("/notifications/{id}")]
pub async fn update_notification(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<NotificationUpdate>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let is_read = body.is_read;
    if blocking(&state, move |s| s.repo().edit_notification(id, is_read)).await? {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::not_found(format!("notification not in session: {id}")))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use bootrack_core::enums::NotificationType;
    use bootrack_core::notification::{Notification, SessionNotification};
    use pretty_assertions::assert_eq;

    use crate::test_support::{seeded, test_app};

    #[actix_web::test]
    async fn fan_out_read_and_sync() {
        let (state, fixture) = seeded();
        let issue = fixture.add_issues(&state, 1).remove(0);
        let app = actix_test::init_service(test_app(state)).await;

        let batch = vec![
            Notification::about(NotificationType::ClosedIssue, &issue, fixture.ann.id, fixture.bob.id),
            Notification::about(NotificationType::Mentioned, &issue, fixture.ann.id, fixture.bob.id),
        ];
        let req = actix_test::TestRequest::post()
            .uri("/notifications")
            .set_json(&batch)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let stored: Vec<Notification> = actix_test::read_body_json(resp).await;
        assert!(stored.iter().all(|n| n.id > 0));

        let uri = format!("/notifications/{}", fixture.bob.id);
        let req = actix_test::TestRequest::get().uri(&uri).to_request();
        let session: Vec<SessionNotification> = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(session.len(), 2);
        assert!(session.iter().all(|n| n.issue_code == issue.code));

        let read_id = session[0].id;
        let req = actix_test::TestRequest::put()
            .uri(&format!("/notifications/{read_id}"))
            .set_json(serde_json::json!({ "isRead": true }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = actix_test::TestRequest::get().uri("/notifications/sync").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = actix_test::TestRequest::get().uri(&uri).to_request();
        let after: Vec<SessionNotification> = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(after.len(), 1);
        assert_ne!(after[0].id, read_id);
        assert!(!after[0].is_read);
    }

    #[actix_web::test]
    async fn updating_unknown_notification_is_404() {
        let (state, _) = seeded();
        let app = actix_test::init_service(test_app(state)).await;

        let req = actix_test::TestRequest::put()
            .uri("/notifications/31337")
            .set_json(serde_json::json!({ "isRead": true }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
