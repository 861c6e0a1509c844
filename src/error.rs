//! Error types for the onboarding service.

use std::collections::BTreeMap;

use crate::onboarding::model::{ComponentKind, Page};
use crate::onboarding::state::OnboardingStep;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Page assignment errors. The messages are shown to the admin as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("Each page must have at least one component.")]
    WouldEmptyPage { page: Page },

    #[error("{component} is not assigned to page {page}.")]
    NotOnPage { component: ComponentKind, page: Page },

    #[error("{component} is assigned more than once.")]
    Duplicate { component: ComponentKind },

    #[error("Page {page} has no components. Each page must have at least one component.")]
    EmptyPage { page: Page },
}

/// Onboarding flow errors.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Please correct the highlighted fields")]
    Validation { fields: BTreeMap<String, String> },

    #[error("No onboarding record for user {0}")]
    UnknownUser(String),

    #[error("Onboarding has already been completed")]
    AlreadyCompleted,

    #[error("Step {requested} cannot be submitted while at step {current}")]
    InvalidStep {
        requested: OnboardingStep,
        current: OnboardingStep,
    },

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
