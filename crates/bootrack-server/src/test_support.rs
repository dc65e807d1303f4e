//! Fixtures for handler tests.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, Error, web};
use bootrack_core::issue::{Issue, IssueBuilder};
use bootrack_core::project::Project;
use bootrack_core::user::{User, UserSettings};
use bootrack_storage::SqliteStore;

use crate::routes;
use crate::state::AppState;

pub(crate) struct Fixture {
    pub project: Project,
    pub ann: User,
    pub bob: User,
}

impl Fixture {
    /// Adds `n` issues authored by ann, titled `"issue {i}"`.
    pub fn add_issues(&self, state: &AppState, n: usize) -> Vec<Issue> {
        (0..n)
            .map(|i| {
                let draft = IssueBuilder::new(self.project.id, self.ann.id, format!("issue {i}")).build();
                state.repo().add_issue(&draft).unwrap()
            })
            .collect()
    }
}

fn user(username: &str, full_name: &str, project: &Project) -> User {
    User {
        id: 0,
        full_name: full_name.into(),
        username: username.into(),
        settings: UserSettings::defaults_for(project.clone()),
    }
}

/// In-memory store with project GHST and users ann and bob.
pub(crate) fn seeded() -> (AppState, Fixture) {
    let store = SqliteStore::open_in_memory().unwrap();
    let state = AppState::new(Arc::new(store));
    let project = state
        .repo()
        .add_project(&Project::new("Ghost Town", "GHST").unwrap())
        .unwrap();
    let ann = state.repo().add_user(&user("ann", "Ann Example", &project)).unwrap();
    let bob = state.repo().add_user(&user("bob", "Bob Example", &project)).unwrap();
    (state, Fixture { project, ann, bob })
}

pub(crate) fn test_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .configure(routes::configure)
}
