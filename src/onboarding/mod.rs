//! Onboarding wizard — a three-step account flow whose second and third
//! pages are assembled from admin-assigned form components.
//!
//! Step 1 always collects email and password. Pages 2 and 3 render whatever
//! subset of `about_me`, `address` and `birthdate` the [`PageLayout`] places
//! on them, and validation follows the same layout.

pub mod layout;
pub mod manager;
pub mod model;
pub mod routes;
pub mod state;
pub mod validation;

pub use layout::PageLayout;
pub use manager::{OnboardingManager, StartOutcome};
pub use model::{Address, ComponentInfo, ComponentKind, Page, ProfileForm, User, UserUpdate};
pub use routes::{OnboardingRouteState, onboarding_routes};
pub use state::{OnboardingSession, OnboardingStep};
pub use validation::{StepValidator, ValidationReport};
