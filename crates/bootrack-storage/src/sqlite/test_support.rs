//! Fixtures shared by the SQLite tests.

use bootrack_core::project::Project;
use bootrack_core::user::{User, UserSettings};

use crate::sqlite::store::SqliteStore;

pub(crate) fn ghost_project() -> Project {
    Project {
        id: 0,
        name: "Ghost Town".into(),
        code: "GHST".into(),
    }
}

pub(crate) fn user_named(username: &str, project: &Project) -> User {
    User {
        id: 0,
        full_name: format!("{username} example"),
        username: username.into(),
        settings: UserSettings::defaults_for(project.clone()),
    }
}

/// In-memory store with the GHST project and one user, `ann`.
pub(crate) fn seeded_store() -> (SqliteStore, Project, User) {
    let store = SqliteStore::open_in_memory().unwrap();
    let project = store.add_project_impl(&ghost_project()).unwrap();
    let user = store.add_user_impl(&user_named("ann", &project)).unwrap();
    (store, project, user)
}
