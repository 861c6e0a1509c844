//! Persistence layer — libSQL-backed storage for users and the page layout.

pub mod libsql_backend;
pub mod schema;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Database, LayoutRow};
