//! Onboarding wizard — configurable multi-step user onboarding service.

pub mod config;
pub mod error;
pub mod onboarding;
pub mod store;
