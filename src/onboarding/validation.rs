//! Step validation — required-field checks run before a step may advance.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use super::layout::PageLayout;
use super::model::{ComponentKind, ProfileForm};
use super::state::OnboardingStep;
use crate::error::OnboardingError;

/// Minimum password length accepted on the account step.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Maximum length of the about-me text.
pub const MAX_ABOUT_ME_LEN: usize = 500;

/// Field values collected for a step.
#[derive(Debug, Clone, Copy)]
pub struct StepFields<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub form: &'a ProfileForm,
}

/// Outcome of validating one step: pass/fail plus a message per failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: BTreeMap<String, String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    fn reject(&mut self, field: &str, message: &str) {
        self.errors.insert(field.to_string(), message.to_string());
    }

    /// Convert into an error carrying the field messages when invalid.
    pub fn into_result(self) -> Result<(), OnboardingError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(OnboardingError::Validation {
                fields: self.errors,
            })
        }
    }
}

/// Checks required fields per step.
pub struct StepValidator {
    email_pattern: Regex,
}

impl Default for StepValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl StepValidator {
    pub fn new() -> Self {
        Self {
            email_pattern: Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid"),
        }
    }

    /// Validate the fields for `step` against the components `layout` puts on it.
    ///
    /// `today` bounds the birth date; callers pass the current UTC date.
    pub fn validate_step(
        &self,
        step: OnboardingStep,
        layout: &PageLayout,
        fields: &StepFields<'_>,
        today: NaiveDate,
    ) -> ValidationReport {
        match step {
            OnboardingStep::Account => self.validate_account(fields.email, fields.password),
            OnboardingStep::PageTwo | OnboardingStep::PageThree => {
                let mut report = ValidationReport::default();
                if let Some(page) = step.page() {
                    for component in layout.components(page) {
                        check_component(*component, fields.form, today, &mut report);
                    }
                }
                report
            }
            OnboardingStep::Complete => ValidationReport::default(),
        }
    }

    /// Step 1: plausible email and a long-enough password.
    pub fn validate_account(&self, email: &str, password: &str) -> ValidationReport {
        let mut report = ValidationReport::default();
        if email.is_empty() || !self.email_pattern.is_match(email) {
            report.reject("email", "Please enter a valid email address");
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            report.reject("password", "Password must be at least 6 characters long");
        }
        report
    }
}

fn check_component(
    component: ComponentKind,
    form: &ProfileForm,
    today: NaiveDate,
    report: &mut ValidationReport,
) {
    match component {
        ComponentKind::AboutMe => match form.about_me.as_deref() {
            None => report.reject("about_me", "Please tell us about yourself"),
            Some(text) if text.trim().is_empty() => {
                report.reject("about_me", "Please tell us about yourself")
            }
            // Stored as submitted, so the cap counts padding too.
            Some(text) if text.chars().count() > MAX_ABOUT_ME_LEN => {
                report.reject("about_me", "About me must be 500 characters or fewer")
            }
            Some(_) => {}
        },
        ComponentKind::Address => {
            if !form.address.as_ref().is_some_and(|a| a.is_complete()) {
                report.reject("address", "Please fill in all address fields");
            }
        }
        ComponentKind::Birthdate => match form.birthdate.as_deref().map(str::trim) {
            None | Some("") => report.reject("birthdate", "Please select your birth date"),
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) if date > today => {
                    report.reject("birthdate", "Birth date cannot be in the future")
                }
                Ok(_) => {}
                Err(_) => report.reject("birthdate", "Please enter a valid birth date"),
            },
        },
    }
}
