//! Route handlers, one module per resource.

pub mod comments;
pub mod directory;
pub mod health;
pub mod issues;
pub mod notifications;

use actix_web::web;

use crate::error::ApiError;

/// Registers every route plus extractor configs that turn malformed
/// bodies, queries and paths into the JSON error envelope.
///
/// Fixed segments (`count`, `rank`, `distance`, `sync`) are registered
/// before the parameterised routes they would otherwise collide with.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::invalid_request(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::invalid_request(err.to_string()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        ApiError::not_found(err.to_string()).into()
    }))
    .service(health::health)
    .service(directory::list_projects)
    .service(directory::create_project)
    .service(directory::list_users)
    .service(directory::create_user)
    .service(directory::get_user)
    .service(directory::update_user)
    .service(issues::count_issues)
    .service(issues::rank_issues)
    .service(issues::issues_by_distance)
    .service(issues::list_issues)
    .service(issues::create_issue)
    .service(issues::get_issue)
    .service(issues::update_issue)
    .service(issues::delete_issue)
    .service(comments::create_comment)
    .service(comments::update_comment)
    .service(comments::delete_comment)
    .service(notifications::sync_notifications)
    .service(notifications::create_notifications)
    .service(notifications::notifications_for_user)
    .service(notifications::update_notification);
}
