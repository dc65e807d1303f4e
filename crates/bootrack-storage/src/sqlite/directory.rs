//! Users and projects for [`SqliteStore`].

use bootrack_core::project::Project;
use bootrack_core::user::{User, UserSettings};
use bootrack_core::validation::validate_project_code;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;

// ---------------------------------------------------------------------------
// Row scanning
// ---------------------------------------------------------------------------

fn scan_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        code: row.get("code")?,
    })
}

/// Reads a user row; settings are decoded separately since that can fail
/// with a JSON error.
fn scan_user_row(row: &Row<'_>) -> rusqlite::Result<(i32, String, String, String)> {
    Ok((
        row.get("id")?,
        row.get("full_name")?,
        row.get("username")?,
        row.get("settings")?,
    ))
}

fn decode_user((id, full_name, username, settings): (i32, String, String, String)) -> Result<User> {
    let settings: UserSettings = serde_json::from_str(&settings)?;
    Ok(User {
        id,
        full_name,
        username,
        settings,
    })
}

// ---------------------------------------------------------------------------
// Connection-level helpers
// ---------------------------------------------------------------------------

pub(crate) fn insert_project(conn: &Connection, project: &Project) -> Result<i32> {
    validate_project_code(&project.code)?;
    if project.name.trim().is_empty() {
        return Err(StorageError::validation("project name is required"));
    }
    conn.execute(
        "INSERT INTO projects (name, code) VALUES (?1, ?2)",
        params![project.name, project.code],
    )?;
    Ok(conn.last_insert_rowid() as i32)
}

pub(crate) fn get_project_on_conn(conn: &Connection, id: i32) -> Result<Option<Project>> {
    Ok(conn
        .query_row(
            "SELECT id, name, code FROM projects WHERE id = ?1",
            params![id],
            scan_project,
        )
        .optional()?)
}

fn get_user_where(conn: &Connection, clause: &str, value: &dyn rusqlite::ToSql) -> Result<Option<User>> {
    let sql = format!("SELECT id, full_name, username, settings FROM users WHERE {clause}");
    conn.query_row(&sql, [value], scan_user_row)
        .optional()?
        .map(decode_user)
        .transpose()
}

// ---------------------------------------------------------------------------
// SqliteStore directory methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    pub fn get_all_users_impl(&self) -> Result<Vec<User>> {
        let conn = self.lock_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, full_name, username, settings FROM users ORDER BY id")?;
        let rows = stmt.query_map([], scan_user_row)?;
        let mut users = Vec::new();
        for row in rows {
            users.push(decode_user(row?)?);
        }
        Ok(users)
    }

    pub fn get_user_impl(&self, id: i32) -> Result<Option<User>> {
        let conn = self.lock_conn()?;
        get_user_where(&conn, "id = ?1", &id)
    }

    pub fn find_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        let conn = self.lock_conn()?;
        get_user_where(&conn, "username = ?1", &username)
    }

    pub fn add_user_impl(&self, user: &User) -> Result<User> {
        if user.username.trim().is_empty() {
            return Err(StorageError::validation("username is required"));
        }
        let settings = serde_json::to_string(&user.settings)?;
        self.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO users (full_name, username, settings) VALUES (?1, ?2, ?3)",
                params![user.full_name, user.username, settings],
            )?;
            let id = tx.last_insert_rowid() as i32;
            get_user_where(tx, "id = ?1", &id)?
                .ok_or_else(|| StorageError::Invariant(format!("user {id} not returned after insert")))
        })
    }

    /// Replaces name, username and settings. Returns `false` if the user does
    /// not exist.
    pub fn edit_user_impl(&self, user: &User) -> Result<bool> {
        let settings = serde_json::to_string(&user.settings)?;
        self.with_transaction(|tx| {
            let changed = tx.execute(
                "UPDATE users SET full_name = ?1, username = ?2, settings = ?3 WHERE id = ?4",
                params![user.full_name, user.username, settings, user.id],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn get_all_projects_impl(&self) -> Result<Vec<Project>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT id, name, code FROM projects ORDER BY id")?;
        let rows = stmt.query_map([], scan_project)?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    pub fn get_project_impl(&self, id: i32) -> Result<Option<Project>> {
        let conn = self.lock_conn()?;
        get_project_on_conn(&conn, id)
    }

    pub fn add_project_impl(&self, project: &Project) -> Result<Project> {
        self.with_transaction(|tx| {
            let id = insert_project(tx, project)?;
            get_project_on_conn(tx, id)?.ok_or_else(|| {
                StorageError::Invariant(format!("project {id} not returned after insert"))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::{ghost_project, user_named};

    #[test]
    fn add_and_list_projects() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.add_project_impl(&ghost_project()).unwrap();
        assert!(project.id > 0);
        assert_eq!(project.code, "GHST");

        let all = store.get_all_projects_impl().unwrap();
        assert_eq!(all, vec![project.clone()]);
        assert_eq!(store.get_project_impl(project.id).unwrap(), Some(project));
        assert_eq!(store.get_project_impl(99).unwrap(), None);
    }

    #[test]
    fn project_code_is_validated() {
        let store = SqliteStore::open_in_memory().unwrap();
        let bad = Project {
            id: 0,
            name: "Bad".into(),
            code: "TOOLONG".into(),
        };
        let err = store.add_project_impl(&bad).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn user_round_trip_with_settings() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.add_project_impl(&ghost_project()).unwrap();
        let mut user = store.add_user_impl(&user_named("ann", &project)).unwrap();
        assert!(user.id > 0);

        user.settings.notify_on_self_changes = true;
        user.full_name = "Ann Other".into();
        assert!(store.edit_user_impl(&user).unwrap());

        let got = store.get_user_impl(user.id).unwrap().unwrap();
        assert_eq!(got, user);
        assert_eq!(
            store.find_user_by_username_impl("ann").unwrap().map(|u| u.id),
            Some(user.id)
        );
        assert!(store.find_user_by_username_impl("nobody").unwrap().is_none());
        assert_eq!(store.get_all_users_impl().unwrap().len(), 1);
    }

    #[test]
    fn edit_missing_user_is_false() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = store.add_project_impl(&ghost_project()).unwrap();
        let mut ghost = user_named("ghost", &project);
        ghost.id = 42;
        assert!(!store.edit_user_impl(&ghost).unwrap());
    }
}
