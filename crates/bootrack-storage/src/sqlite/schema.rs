//! DDL statements for the SQLite schema.
//!
//! Timestamps are stored as TEXT in ISO 8601 format with millisecond
//! precision. User-id sets (`watchers`, `upvotes`) and user settings are JSON
//! TEXT. Locations are a nullable latitude/longitude pair.

/// Current schema version. Bumped whenever the DDL changes.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Core DDL statements executed during `init_schema`.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // -- Projects ------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        code TEXT NOT NULL UNIQUE CHECK (length(code) BETWEEN 3 AND 5)
    )
    "#,
    // -- Users ---------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        full_name TEXT NOT NULL,
        username  TEXT NOT NULL UNIQUE,
        settings  TEXT NOT NULL DEFAULT '{}'
    )
    "#,
    // -- Per-project issue numbers -------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS issue_sequences (
        project_id  INTEGER PRIMARY KEY,
        next_number INTEGER NOT NULL DEFAULT 100,
        FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
    )
    "#,
    // -- Issues --------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS issues (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        number      INTEGER NOT NULL,
        project_id  INTEGER NOT NULL,
        author_id   INTEGER NOT NULL,
        assignee_id INTEGER,
        title       TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        priority    TEXT NOT NULL DEFAULT 'NORMAL',
        state       TEXT NOT NULL DEFAULT 'SUBMITTED',
        latitude    REAL,
        longitude   REAL,
        watchers    TEXT NOT NULL DEFAULT '[]',
        upvotes     TEXT NOT NULL DEFAULT '[]',
        created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        modified_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        UNIQUE (project_id, number),
        FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
        FOREIGN KEY (author_id) REFERENCES users(id),
        FOREIGN KEY (assignee_id) REFERENCES users(id) ON DELETE SET NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_issues_project_modified ON issues(project_id, modified_at)",
    "CREATE INDEX IF NOT EXISTS idx_issues_state ON issues(state)",
    // -- Full-text index over title and description --------------------------
    r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS issues_fts USING fts5(
        title, description, content='issues', content_rowid='id'
    )
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS issues_fts_insert AFTER INSERT ON issues BEGIN
        INSERT INTO issues_fts (rowid, title, description)
        VALUES (new.id, new.title, new.description);
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS issues_fts_delete AFTER DELETE ON issues BEGIN
        INSERT INTO issues_fts (issues_fts, rowid, title, description)
        VALUES ('delete', old.id, old.title, old.description);
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS issues_fts_update AFTER UPDATE OF title, description ON issues BEGIN
        INSERT INTO issues_fts (issues_fts, rowid, title, description)
        VALUES ('delete', old.id, old.title, old.description);
        INSERT INTO issues_fts (rowid, title, description)
        VALUES (new.id, new.title, new.description);
    END
    "#,
    // -- Comments ------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        issue_number INTEGER NOT NULL,
        project_id   INTEGER NOT NULL,
        author_id    INTEGER NOT NULL,
        content      TEXT NOT NULL,
        created_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        modified_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        FOREIGN KEY (project_id, issue_number) REFERENCES issues(project_id, number)
            ON DELETE CASCADE ON UPDATE CASCADE,
        FOREIGN KEY (author_id) REFERENCES users(id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_comments_issue ON comments(project_id, issue_number)",
    // Content edits stamp the comment and its parent issue.
    r#"
    CREATE TRIGGER IF NOT EXISTS comments_touch AFTER UPDATE OF content ON comments BEGIN
        UPDATE comments
           SET modified_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id = new.id;
        UPDATE issues
           SET modified_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE project_id = new.project_id AND number = new.issue_number;
    END
    "#,
    // -- Notifications -------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS notification_types (
        id      INTEGER PRIMARY KEY,
        message TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id                   INTEGER PRIMARY KEY AUTOINCREMENT,
        notification_type_id INTEGER NOT NULL,
        receiver_id          INTEGER NOT NULL,
        sender_id            INTEGER NOT NULL,
        issue_number         INTEGER NOT NULL,
        project_id           INTEGER NOT NULL,
        created_at           TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        FOREIGN KEY (notification_type_id) REFERENCES notification_types(id),
        FOREIGN KEY (receiver_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (sender_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (project_id, issue_number) REFERENCES issues(project_id, number)
            ON DELETE CASCADE ON UPDATE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_notifications_receiver ON notifications(receiver_id)",
    // Session view: ids mirror the permanent log.
    r#"
    CREATE TABLE IF NOT EXISTS session_notifications (
        id                   INTEGER PRIMARY KEY,
        notification_type_id INTEGER NOT NULL,
        receiver_id          INTEGER NOT NULL,
        sender_id            INTEGER NOT NULL,
        issue_number         INTEGER NOT NULL,
        project_id           INTEGER NOT NULL,
        created_at           TEXT NOT NULL,
        is_read              INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (receiver_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (sender_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY (project_id, issue_number) REFERENCES issues(project_id, number)
            ON DELETE CASCADE ON UPDATE CASCADE
    )
    "#,
    // -- Metadata table ------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

