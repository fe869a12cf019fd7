//! Durable store backed by `SQLite`.
//!
//! Records are stored as JSON blobs next to the columns the queries and
//! invariants need. Two constraints do the concurrency-sensitive work in
//! the database itself:
//!
//! - a partial unique index on `users(role) WHERE role = 'PM'` makes the
//!   single-manager seat atomic with the insert;
//! - issue updates are `UPDATE ... WHERE id = ? AND status = ?` with a
//!   changed-row check, which is the status compare-and-set.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use psync_core::issue::IssueStatus;
use psync_core::{Issue, Project, User};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{IssueStore, ProjectStore, StoreError, UserStore};

/// `SQLite` implementation of all three store traits.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Wraps an existing connection. The schema must already be
    /// initialized (see [`init_schema`](Self::init_schema)).
    #[must_use]
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Opens (or creates) a database file and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(backend)?;
        Self::init_schema(&conn).map_err(backend)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    /// Opens a fresh in-memory database with the schema initialized.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        Self::init_schema(&conn).map_err(backend)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    /// Initializes the database schema. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the underlying `rusqlite` error if a statement fails.
    pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                 id TEXT PRIMARY KEY,
                 email TEXT NOT NULL UNIQUE,
                 username TEXT NOT NULL UNIQUE,
                 role TEXT NOT NULL,
                 is_active INTEGER NOT NULL,
                 created_at TEXT NOT NULL,
                 record_json BLOB NOT NULL
             );
             CREATE TABLE IF NOT EXISTS projects (
                 id TEXT PRIMARY KEY,
                 is_active INTEGER NOT NULL,
                 created_at TEXT NOT NULL,
                 record_json BLOB NOT NULL
             );
             CREATE TABLE IF NOT EXISTS issues (
                 id TEXT PRIMARY KEY,
                 status TEXT NOT NULL,
                 project_id TEXT NOT NULL,
                 created_by TEXT NOT NULL,
                 assigned_to TEXT,
                 created_at TEXT NOT NULL,
                 record_json BLOB NOT NULL
             );",
        )?;

        // The manager seat: at most one row may carry the manager role.
        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_manager_seat \
             ON users(role) WHERE role = 'PM'",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_issues_assigned_to ON issues(assigned_to)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status)",
            [],
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Backend {
            message: "connection lock poisoned".to_string(),
        })
    }

    fn query_issues<P: rusqlite::Params>(&self, sql: &str, args: P) -> Result<Vec<Issue>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(backend)?;
        let rows = stmt
            .query_map(args, |row| row.get::<_, Vec<u8>>(0))
            .map_err(backend)?;

        let mut issues = Vec::new();
        for row in rows {
            let blob = row.map_err(backend)?;
            issues.push(decode(&blob)?);
        }
        Ok(issues)
    }
}

fn backend(err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend {
        message: err.to_string(),
    }
}

fn decode<T: serde::de::DeserializeOwned>(blob: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(blob).map_err(|e| StoreError::Backend {
        message: format!("record decode failed: {e}"),
    })
}

fn encode<T: serde::Serialize>(record: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(record).map_err(|e| StoreError::Backend {
        message: format!("record encode failed: {e}"),
    })
}

/// Maps a constraint violation on `users` to its typed error.
fn map_user_insert_error(err: rusqlite::Error, user: &User) -> StoreError {
    if let rusqlite::Error::SqliteFailure(e, Some(msg)) = &err {
        if e.code == rusqlite::ErrorCode::ConstraintViolation {
            // The partial unique index trips as a violation on users.role;
            // older SQLite builds name the index instead.
            if msg.contains("users.role") || msg.contains("idx_users_manager_seat") {
                return StoreError::ManagerSeatTaken;
            }
            if msg.contains("users.email") {
                return StoreError::DuplicateEmail {
                    email: user.email.clone(),
                };
            }
            if msg.contains("users.username") {
                return StoreError::DuplicateUsername {
                    username: user.username.clone(),
                };
            }
            if msg.contains("users.id") {
                return StoreError::DuplicateId { id: user.id };
            }
        }
    }
    backend(err)
}

impl IssueStore for SqliteStore {
    fn load(&self, id: Uuid) -> Result<Option<Issue>, StoreError> {
        let conn = self.conn()?;
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT record_json FROM issues WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)?;
        blob.map(|b| decode(&b)).transpose()
    }

    fn insert(&self, issue: &Issue) -> Result<(), StoreError> {
        let record_json = encode(issue)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO issues (id, status, project_id, created_by, assigned_to, created_at, record_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                issue.id.to_string(),
                issue.status.as_str(),
                issue.project_id.to_string(),
                issue.created_by.to_string(),
                issue.assigned_to.map(|id| id.to_string()),
                issue.created_at.to_rfc3339(),
                record_json,
            ],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(err, Some(msg)) = &e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains("issues.id")
                {
                    return StoreError::DuplicateId { id: issue.id };
                }
            }
            backend(e)
        })?;
        Ok(())
    }

    fn update(&self, issue: &Issue, expected_status: IssueStatus) -> Result<(), StoreError> {
        let record_json = encode(issue)?;
        let conn = self.conn()?;

        // Compare-and-set: the write lands only if the stored status is
        // still the one the caller's decision was made over.
        let changed = conn
            .execute(
                "UPDATE issues SET status = ?1, assigned_to = ?2, record_json = ?3
                 WHERE id = ?4 AND status = ?5",
                params![
                    issue.status.as_str(),
                    issue.assigned_to.map(|id| id.to_string()),
                    record_json,
                    issue.id.to_string(),
                    expected_status.as_str(),
                ],
            )
            .map_err(backend)?;

        if changed > 0 {
            return Ok(());
        }

        // Zero rows: either the id is gone or the status moved. Look once
        // to tell the two apart.
        let actual: Option<String> = conn
            .query_row(
                "SELECT status FROM issues WHERE id = ?1",
                params![issue.id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)?;

        match actual {
            None => Err(StoreError::IssueNotFound { id: issue.id }),
            Some(status) => Err(StoreError::StatusConflict {
                id: issue.id,
                expected: expected_status,
                actual: IssueStatus::parse(&status).map_err(backend)?,
            }),
        }
    }

    fn list_all(&self) -> Result<Vec<Issue>, StoreError> {
        self.query_issues(
            "SELECT record_json FROM issues ORDER BY created_at ASC, id ASC",
            [],
        )
    }

    fn list_assigned_to(&self, user_id: Uuid) -> Result<Vec<Issue>, StoreError> {
        self.query_issues(
            "SELECT record_json FROM issues WHERE assigned_to = ?1 \
             ORDER BY created_at ASC, id ASC",
            params![user_id.to_string()],
        )
    }

    fn list_created_by(&self, user_id: Uuid) -> Result<Vec<Issue>, StoreError> {
        self.query_issues(
            "SELECT record_json FROM issues WHERE created_by = ?1 \
             ORDER BY created_at ASC, id ASC",
            params![user_id.to_string()],
        )
    }

    fn list_with_status(&self, status: IssueStatus) -> Result<Vec<Issue>, StoreError> {
        self.query_issues(
            "SELECT record_json FROM issues WHERE status = ?1 \
             ORDER BY created_at ASC, id ASC",
            params![status.as_str()],
        )
    }

    fn list_for_project(&self, project_id: Uuid) -> Result<Vec<Issue>, StoreError> {
        self.query_issues(
            "SELECT record_json FROM issues WHERE project_id = ?1 \
             ORDER BY created_at ASC, id ASC",
            params![project_id.to_string()],
        )
    }
}

impl ProjectStore for SqliteStore {
    fn load(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let conn = self.conn()?;
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT record_json FROM projects WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)?;
        blob.map(|b| decode(&b)).transpose()
    }

    fn insert(&self, project: &Project) -> Result<(), StoreError> {
        let record_json = encode(project)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO projects (id, is_active, created_at, record_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                project.id.to_string(),
                i32::from(project.is_active),
                project.created_at.to_rfc3339(),
                record_json,
            ],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(err, Some(msg)) = &e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation
                    && msg.contains("projects.id")
                {
                    return StoreError::DuplicateId { id: project.id };
                }
            }
            backend(e)
        })?;
        Ok(())
    }

    fn update(&self, project: &Project) -> Result<(), StoreError> {
        let record_json = encode(project)?;
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE projects SET is_active = ?1, record_json = ?2 WHERE id = ?3",
                params![
                    i32::from(project.is_active),
                    record_json,
                    project.id.to_string(),
                ],
            )
            .map_err(backend)?;
        if changed == 0 {
            return Err(StoreError::Backend {
                message: format!("project not found: {}", project.id),
            });
        }
        Ok(())
    }

    fn list_active(&self) -> Result<Vec<Project>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT record_json FROM projects WHERE is_active = 1 \
                 ORDER BY created_at ASC, id ASC",
            )
            .map_err(backend)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, Vec<u8>>(0))
            .map_err(backend)?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(decode(&row.map_err(backend)?)?);
        }
        Ok(projects)
    }

    fn list_all(&self) -> Result<Vec<Project>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT record_json FROM projects ORDER BY created_at ASC, id ASC")
            .map_err(backend)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, Vec<u8>>(0))
            .map_err(backend)?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(decode(&row.map_err(backend)?)?);
        }
        Ok(projects)
    }
}

impl UserStore for SqliteStore {
    fn load(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT record_json FROM users WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)?;
        blob.map(|b| decode(&b)).transpose()
    }

    fn insert(&self, user: &User) -> Result<(), StoreError> {
        let record_json = encode(user)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (id, email, username, role, is_active, created_at, record_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id.to_string(),
                user.email,
                user.username,
                user.role.as_str(),
                i32::from(user.is_active),
                user.created_at.to_rfc3339(),
                record_json,
            ],
        )
        .map_err(|e| map_user_insert_error(e, user))?;
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT record_json FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)?;
        blob.map(|b| decode(&b)).transpose()
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        let blob: Option<Vec<u8>> = conn
            .query_row(
                "SELECT record_json FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)?;
        blob.map(|b| decode(&b)).transpose()
    }

    fn list_active(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT record_json FROM users WHERE is_active = 1 \
                 ORDER BY created_at ASC, id ASC",
            )
            .map_err(backend)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, Vec<u8>>(0))
            .map_err(backend)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(decode(&row.map_err(backend)?)?);
        }
        Ok(users)
    }

    fn manager_exists(&self) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM users WHERE role = 'PM' LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)?;
        Ok(found.is_some())
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(backend)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
