//! Table definitions for the libSQL backend.
//!
//! The schema is created idempotently on open; there is no version tracking.

use libsql::Connection;

use crate::error::DatabaseError;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        about_me TEXT,
        street_address TEXT,
        city TEXT,
        state TEXT,
        zip TEXT,
        birthdate TEXT,
        current_step INTEGER NOT NULL DEFAULT 1 CHECK (current_step BETWEEN 1 AND 4),
        completed INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at);

    CREATE TABLE IF NOT EXISTS onboarding_config (
        id TEXT PRIMARY KEY,
        page_number INTEGER NOT NULL CHECK (page_number IN (2, 3)),
        component_name TEXT NOT NULL UNIQUE
            CHECK (component_name IN ('about_me', 'address', 'birthdate')),
        position INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_onboarding_config_page ON onboarding_config(page_number);
"#;

/// Create all tables and indexes if missing.
pub async fn init_schema(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(SCHEMA)
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to create schema: {e}")))?;
    tracing::info!("Database schema ready");
    Ok(())
}
