//! OnboardingManager — coordinates validation, step transitions, and the
//! page layout on top of the store.

use std::sync::Arc;

use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use super::layout::PageLayout;
use super::model::{ProfileForm, User, UserUpdate};
use super::state::{OnboardingSession, OnboardingStep};
use super::validation::{StepFields, StepValidator};
use crate::error::{LayoutError, OnboardingError};
use crate::store::Database;

/// Result of submitting the account step.
#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub session: OnboardingSession,
    /// Whether a new user row was created (false when the email was known).
    pub created: bool,
}

/// Coordinates the onboarding flow: validation, step tracking, and the
/// admin-editable page layout.
pub struct OnboardingManager {
    db: Arc<dyn Database>,
    validator: StepValidator,
    bcrypt_cost: u32,
}

impl OnboardingManager {
    pub fn new(db: Arc<dyn Database>, bcrypt_cost: u32) -> Self {
        Self {
            db,
            validator: StepValidator::new(),
            bcrypt_cost,
        }
    }

    // ── Layout ──────────────────────────────────────────────────────

    /// Current page layout. Falls back to the default layout when the
    /// store can't be read.
    pub async fn load_layout(&self) -> PageLayout {
        match self.db.get_layout_rows().await {
            Ok(rows) => PageLayout::from_rows(rows),
            Err(e) => {
                warn!(error = %e, "Failed to load onboarding layout, using defaults");
                PageLayout::default()
            }
        }
    }

    /// The stored layout, failing when the store can't be read. Edits start
    /// from this so a read error never overwrites the saved layout.
    async fn stored_layout(&self) -> Result<PageLayout, OnboardingError> {
        Ok(PageLayout::from_rows(self.db.get_layout_rows().await?))
    }

    /// Validate and persist a whole layout.
    pub async fn save_layout(&self, layout: &PageLayout) -> Result<(), OnboardingError> {
        layout.check()?;
        self.db.replace_layout(&layout.to_rows()).await?;
        info!(layout = ?layout, "Onboarding layout saved");
        Ok(())
    }

    /// Load the layout, apply `edit`, and persist the result.
    ///
    /// A rejected edit or a failed read leaves the stored layout untouched.
    pub async fn edit_layout<F>(&self, edit: F) -> Result<PageLayout, OnboardingError>
    where
        F: FnOnce(&mut PageLayout) -> Result<(), LayoutError>,
    {
        let mut layout = self.stored_layout().await?;
        edit(&mut layout)?;
        self.save_layout(&layout).await?;
        Ok(layout)
    }

    // ── Flow ────────────────────────────────────────────────────────

    /// Submit the account step: validate, find or create the user, and
    /// move them to page 2.
    pub async fn start(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<StartOutcome, OnboardingError> {
        let email = email.trim();
        self.validator
            .validate_account(email, password.expose_secret())
            .into_result()?;

        let (user, created) = match self.db.get_user_by_email(email).await? {
            Some(user) if user.completed => return Err(OnboardingError::AlreadyCompleted),
            Some(user) => (user, false),
            None => {
                let hash = bcrypt::hash(password.expose_secret(), self.bcrypt_cost)
                    .map_err(|e| OnboardingError::Hashing(e.to_string()))?;
                (self.db.create_user(email, &hash).await?, true)
            }
        };

        let user = self
            .persist(&user.id, &UserUpdate::step(OnboardingStep::PageTwo))
            .await?;
        info!(user_id = %user.id, created, "Account step completed");
        Ok(StartOutcome {
            session: OnboardingSession::from_user(&user),
            created,
        })
    }

    /// Restore progress for a returning user who hasn't finished.
    pub async fn resume(&self, email: &str) -> Result<Option<OnboardingSession>, OnboardingError> {
        let user = self.db.get_user_by_email(email.trim()).await?;
        Ok(user
            .filter(|u| !u.completed)
            .map(|u| OnboardingSession::from_user(&u)))
    }

    /// Validate and save page 2 or page 3, advancing the user one step.
    ///
    /// A user may re-submit an earlier page after going back, but never a
    /// page ahead of their stored step.
    pub async fn submit_step(
        &self,
        user_id: &str,
        step: OnboardingStep,
        form: &ProfileForm,
        today: NaiveDate,
    ) -> Result<OnboardingSession, OnboardingError> {
        let user = self.require_user(user_id).await?;
        if user.completed {
            return Err(OnboardingError::AlreadyCompleted);
        }
        let invalid = || OnboardingError::InvalidStep {
            requested: step,
            current: user.current_step,
        };
        if step.page().is_none() || step > user.current_step {
            return Err(invalid());
        }

        let layout = self.load_layout().await;
        let fields = StepFields {
            email: &user.email,
            password: "",
            form,
        };
        self.validator
            .validate_step(step, &layout, &fields, today)
            .into_result()?;

        let mut session = OnboardingSession {
            step,
            ..OnboardingSession::from_user(&user)
        };
        let next = session.advance().map_err(|_| invalid())?;
        let update = UserUpdate {
            current_step: Some(next),
            completed: session.completed.then_some(true),
            ..form.to_update()
        };
        let user = self.persist(user_id, &update).await?;
        if user.completed {
            info!(user_id = %user.id, "Onboarding completed");
        } else {
            debug!(user_id = %user.id, step = %user.current_step, "Step submitted");
        }
        Ok(OnboardingSession::from_user(&user))
    }

    /// Move the user back one step.
    pub async fn go_back(&self, user_id: &str) -> Result<OnboardingSession, OnboardingError> {
        let user = self.require_user(user_id).await?;
        let mut session = OnboardingSession::from_user(&user);
        let previous = session.go_back().map_err(|_| OnboardingError::InvalidStep {
            requested: user.current_step.previous().unwrap_or(user.current_step),
            current: user.current_step,
        })?;
        let user = self.persist(user_id, &UserUpdate::step(previous)).await?;
        Ok(OnboardingSession::from_user(&user))
    }

    /// All users, newest first, for the data page.
    pub async fn list_users(&self) -> Result<Vec<User>, OnboardingError> {
        Ok(self.db.list_users().await?)
    }

    async fn require_user(&self, user_id: &str) -> Result<User, OnboardingError> {
        self.db
            .get_user(user_id)
            .await?
            .ok_or_else(|| OnboardingError::UnknownUser(user_id.to_string()))
    }

    async fn persist(&self, user_id: &str, update: &UserUpdate) -> Result<User, OnboardingError> {
        self.db
            .update_user(user_id, update)
            .await?
            .ok_or_else(|| OnboardingError::UnknownUser(user_id.to_string()))
    }
}
