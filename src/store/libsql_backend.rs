//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::onboarding::model::{ComponentKind, Page, User, UserUpdate};
use crate::onboarding::state::OnboardingStep;
use crate::store::schema;
use crate::store::traits::{Database, LayoutRow};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and create the schema.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn query_user(&self, column: &str, value: &str) -> Result<Option<User>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
                params![value],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_user by {column}: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_user(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_user by {column}: {e}"))),
        }
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Timestamp format written to the DB. Fixed precision keeps text ordering
/// identical to time ordering.
fn now_str() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    // Try RFC 3339 first (our canonical write format)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    // Try SQLite datetime() output without fractional seconds
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Convert `Option<String>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, about_me, street_address, city, state, zip, birthdate, current_step, completed, created_at, updated_at";

/// Map a libsql Row to a User. Column order matches USER_COLUMNS.
fn row_to_user(row: &libsql::Row) -> Result<User, DatabaseError> {
    let read = |e: libsql::Error| DatabaseError::Query(format!("user row parse: {e}"));

    let step_num: i64 = row.get(9).map_err(read)?;
    let current_step = u8::try_from(step_num)
        .map_err(|e| e.to_string())
        .and_then(OnboardingStep::try_from)
        .map_err(DatabaseError::Serialization)?;
    let completed: i64 = row.get(10).map_err(read)?;
    let created_str: String = row.get(11).map_err(read)?;
    let updated_str: String = row.get(12).map_err(read)?;

    Ok(User {
        id: row.get(0).map_err(read)?,
        email: row.get(1).map_err(read)?,
        password_hash: row.get(2).map_err(read)?,
        about_me: row.get::<String>(3).ok(),
        street_address: row.get::<String>(4).ok(),
        city: row.get::<String>(5).ok(),
        state: row.get::<String>(6).ok(),
        zip: row.get::<String>(7).ok(),
        birthdate: row.get::<String>(8).ok(),
        current_step,
        completed: completed != 0,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        schema::init_schema(self.conn()).await
    }

    // ── Users ───────────────────────────────────────────────────────

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let now = now_str();

        self.conn()
            .execute(
                "INSERT INTO users (id, email, password_hash, current_step, completed, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
                params![
                    id.as_str(),
                    email,
                    password_hash,
                    i64::from(OnboardingStep::Account.number()),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("UNIQUE") {
                    DatabaseError::Constraint(format!("email already registered: {email}"))
                } else {
                    DatabaseError::Query(format!("create_user: {msg}"))
                }
            })?;

        debug!(user_id = %id, "User created");
        self.get_user(&id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "user".to_string(),
                id: id.clone(),
            })
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        self.query_user("email", email).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        self.query_user("id", id).await
    }

    async fn update_user(
        &self,
        id: &str,
        update: &UserUpdate,
    ) -> Result<Option<User>, DatabaseError> {
        let Some(mut user) = self.get_user(id).await? else {
            return Ok(None);
        };
        if update.is_empty() {
            return Ok(Some(user));
        }
        update.apply_to(&mut user);

        self.conn()
            .execute(
                "UPDATE users SET about_me = ?1, street_address = ?2, city = ?3, state = ?4,
                     zip = ?5, birthdate = ?6, current_step = ?7, completed = ?8, updated_at = ?9
                 WHERE id = ?10",
                params![
                    opt_text(user.about_me.as_deref()),
                    opt_text(user.street_address.as_deref()),
                    opt_text(user.city.as_deref()),
                    opt_text(user.state.as_deref()),
                    opt_text(user.zip.as_deref()),
                    opt_text(user.birthdate.as_deref()),
                    i64::from(user.current_step.number()),
                    i64::from(user.completed),
                    now_str(),
                    id,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_user: {e}")))?;

        debug!(user_id = %id, step = %user.current_step, "User updated");
        self.get_user(id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, rowid DESC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_users: {e}")))?;

        let mut users = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_users: {e}")))?
        {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    // ── Page layout ─────────────────────────────────────────────────

    async fn get_layout_rows(&self) -> Result<Vec<LayoutRow>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT page_number, component_name FROM onboarding_config
                 ORDER BY page_number ASC, position ASC",
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_layout_rows: {e}")))?;

        let mut layout = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_layout_rows: {e}")))?
        {
            let page: i64 = row
                .get(0)
                .map_err(|e| DatabaseError::Query(format!("get_layout_rows row parse: {e}")))?;
            let name: String = row
                .get(1)
                .map_err(|e| DatabaseError::Query(format!("get_layout_rows row parse: {e}")))?;
            match (u8::try_from(page), name.parse::<ComponentKind>()) {
                (Ok(page), Ok(component)) => layout.push((page, component)),
                _ => warn!(page, component = %name, "Skipping unreadable layout row"),
            }
        }
        Ok(layout)
    }

    async fn replace_layout(&self, rows: &[(Page, ComponentKind)]) -> Result<(), DatabaseError> {
        let tx = self
            .conn()
            .transaction()
            .await
            .map_err(|e| DatabaseError::Query(format!("replace_layout begin: {e}")))?;

        let written = async {
            tx.execute("DELETE FROM onboarding_config", ())
                .await
                .map_err(|e| DatabaseError::Query(format!("replace_layout delete: {e}")))?;

            let now = now_str();
            for (position, (page, component)) in rows.iter().enumerate() {
                tx.execute(
                    "INSERT INTO onboarding_config (id, page_number, component_name, position, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    params![
                        Uuid::new_v4().to_string(),
                        i64::from(page.number()),
                        component.as_str(),
                        position as i64,
                        now.as_str(),
                    ],
                )
                .await
                .map_err(|e| DatabaseError::Query(format!("replace_layout insert: {e}")))?;
            }
            Ok::<(), DatabaseError>(())
        }
        .await;

        if let Err(e) = written {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "Failed to roll back layout replacement");
            }
            return Err(e);
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Query(format!("replace_layout commit: {e}")))?;

        debug!(rows = rows.len(), "Onboarding layout replaced");
        Ok(())
    }
}
