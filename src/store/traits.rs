//! `Database` trait — single async interface for all persistence.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::onboarding::model::{ComponentKind, Page, User, UserUpdate};

/// A stored page assignment row, as read back from the config table.
pub type LayoutRow = (u8, ComponentKind);

/// Backend-agnostic database trait covering users and the page layout.
#[async_trait]
pub trait Database: Send + Sync {
    /// Create tables if they don't exist yet.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Users ───────────────────────────────────────────────────────

    /// Insert a new user at step 1 and return the stored row.
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, DatabaseError>;

    /// Look up a user by email.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Look up a user by ID.
    async fn get_user(&self, id: &str) -> Result<Option<User>, DatabaseError>;

    /// Apply a partial update. Returns the updated row, or `None` if no
    /// user has this ID.
    async fn update_user(&self, id: &str, update: &UserUpdate)
    -> Result<Option<User>, DatabaseError>;

    /// All users, most recently created first.
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;

    // ── Page layout ─────────────────────────────────────────────────

    /// Stored `(page_number, component)` rows, by page then insertion order.
    async fn get_layout_rows(&self) -> Result<Vec<LayoutRow>, DatabaseError>;

    /// Replace every stored row with `rows`.
    async fn replace_layout(&self, rows: &[(Page, ComponentKind)]) -> Result<(), DatabaseError>;
}
