//! User record, form components, and page identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::OnboardingStep;

/// One of the interchangeable form sections an admin can place on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    AboutMe,
    Address,
    Birthdate,
}

impl ComponentKind {
    /// Every component, in display order.
    pub const ALL: [ComponentKind; 3] = [Self::AboutMe, Self::Address, Self::Birthdate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AboutMe => "about_me",
            Self::Address => "address",
            Self::Birthdate => "birthdate",
        }
    }

    /// Human-readable title for the admin panel.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AboutMe => "About Me",
            Self::Address => "Address Information",
            Self::Birthdate => "Date of Birth",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AboutMe => "Large text area for users to describe themselves",
            Self::Address => "Address collection fields (street, city, state, zip)",
            Self::Birthdate => "Date picker for birth date selection",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "about_me" => Ok(Self::AboutMe),
            "address" => Ok(Self::Address),
            "birthdate" => Ok(Self::Birthdate),
            other => Err(format!("Unknown component: {other}")),
        }
    }
}

/// A configurable onboarding page. Only pages 2 and 3 host components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Page {
    Two,
    Three,
}

impl Page {
    pub const ALL: [Page; 2] = [Self::Two, Self::Three];

    pub fn number(&self) -> u8 {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// The other configurable page.
    pub fn other(&self) -> Page {
        match self {
            Self::Two => Self::Three,
            Self::Three => Self::Two,
        }
    }

    /// Component placed on this page when the stored layout leaves it empty.
    pub fn default_component(&self) -> ComponentKind {
        match self {
            Self::Two => ComponentKind::AboutMe,
            Self::Three => ComponentKind::Address,
        }
    }
}

impl TryFrom<u8> for Page {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(format!("Page {other} is not configurable (expected 2 or 3)")),
        }
    }
}

impl From<Page> for u8 {
    fn from(page: Page) -> Self {
        page.number()
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// A user going through (or done with) onboarding.
///
/// The password hash never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    pub current_step: OnboardingStep,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied to a user row. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub about_me: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub birthdate: Option<String>,
    pub current_step: Option<OnboardingStep>,
    pub completed: Option<bool>,
}

impl UserUpdate {
    /// Update that only moves the user to `step`.
    pub fn step(step: OnboardingStep) -> Self {
        Self {
            current_step: Some(step),
            completed: step.is_terminal().then_some(true),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Copy every set field onto `user`.
    pub fn apply_to(&self, user: &mut User) {
        let fields = [
            (&self.about_me, &mut user.about_me),
            (&self.street_address, &mut user.street_address),
            (&self.city, &mut user.city),
            (&self.state, &mut user.state),
            (&self.zip, &mut user.zip),
            (&self.birthdate, &mut user.birthdate),
        ];
        for (value, slot) in fields {
            if let Some(v) = value {
                *slot = Some(v.clone());
            }
        }
        if let Some(step) = self.current_step {
            user.current_step = step;
        }
        if let Some(completed) = self.completed {
            user.completed = completed;
        }
    }
}

/// The four address sub-fields, submitted together.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
}

impl Address {
    /// Whether every sub-field holds non-blank text.
    pub fn is_complete(&self) -> bool {
        [&self.street_address, &self.city, &self.state, &self.zip]
            .into_iter()
            .all(|f| f.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }

    fn is_blank(&self) -> bool {
        [&self.street_address, &self.city, &self.state, &self.zip]
            .into_iter()
            .all(Option::is_none)
    }
}

/// Profile values collected on pages 2 and 3.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
}

impl ProfileForm {
    /// Rebuild the form from stored values so a returning user can resume.
    pub fn from_user(user: &User) -> Self {
        let address = Address {
            street_address: user.street_address.clone(),
            city: user.city.clone(),
            state: user.state.clone(),
            zip: user.zip.clone(),
        };
        Self {
            about_me: user.about_me.clone(),
            address: (!address.is_blank()).then_some(address),
            birthdate: user.birthdate.clone(),
        }
    }

    /// Convert the submitted values into a row update. Empty strings are
    /// skipped so they never clear a stored value.
    pub fn to_update(&self) -> UserUpdate {
        fn filled(v: &Option<String>) -> Option<String> {
            v.as_ref().filter(|s| !s.is_empty()).cloned()
        }

        let mut update = UserUpdate {
            about_me: filled(&self.about_me),
            birthdate: filled(&self.birthdate.as_deref().map(|s| s.trim().to_string())),
            ..Default::default()
        };
        if let Some(ref address) = self.address {
            update.street_address = filled(&address.street_address);
            update.city = filled(&address.city);
            update.state = filled(&address.state);
            update.zip = filled(&address.zip);
        }
        update
    }
}

/// Admin-facing description of a component.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentInfo {
    pub name: ComponentKind,
    pub label: &'static str,
    pub description: &'static str,
}

impl From<ComponentKind> for ComponentInfo {
    fn from(kind: ComponentKind) -> Self {
        Self {
            name: kind,
            label: kind.label(),
            description: kind.description(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: "u1".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$2b$04$hash".to_string(),
            about_me: Some("Likes engines".to_string()),
            street_address: Some("1 Main St".to_string()),
            city: Some("London".to_string()),
            state: None,
            zip: None,
            birthdate: None,
            current_step: OnboardingStep::PageThree,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn component_serde_matches_display() {
        for kind in ComponentKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
            assert_eq!(kind.as_str().parse::<ComponentKind>().unwrap(), kind);
        }
        assert!("photo".parse::<ComponentKind>().is_err());
    }

    #[test]
    fn page_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Page::Two).unwrap(), "2");
        let parsed: Page = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, Page::Three);
        assert!(serde_json::from_str::<Page>("4").is_err());
        assert!(serde_json::from_str::<Page>("1").is_err());
    }

    #[test]
    fn page_other_flips() {
        assert_eq!(Page::Two.other(), Page::Three);
        assert_eq!(Page::Three.other(), Page::Two);
    }

    #[test]
    fn user_json_hides_password_hash() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["current_step"], 3);
        assert_eq!(json["email"], "ada@example.com");
        assert!(json.get("zip").is_none());
    }

    #[test]
    fn address_completeness() {
        let mut address = Address {
            street_address: Some("1 Main St".into()),
            city: Some("Springfield".into()),
            state: Some("IL".into()),
            zip: Some("  ".into()),
        };
        assert!(!address.is_complete());
        address.zip = Some("62701".into());
        assert!(address.is_complete());
    }

    #[test]
    fn form_restores_from_user() {
        let form = ProfileForm::from_user(&sample_user());
        assert_eq!(form.about_me.as_deref(), Some("Likes engines"));
        let address = form.address.unwrap();
        assert_eq!(address.city.as_deref(), Some("London"));
        assert!(address.zip.is_none());
        assert!(form.birthdate.is_none());
    }

    #[test]
    fn form_without_address_fields_restores_none() {
        let mut user = sample_user();
        user.street_address = None;
        user.city = None;
        assert!(ProfileForm::from_user(&user).address.is_none());
    }

    #[test]
    fn form_update_skips_empty_values() {
        let form = ProfileForm {
            about_me: Some(String::new()),
            address: None,
            birthdate: Some("1990-01-01".into()),
        };
        let update = form.to_update();
        assert!(update.about_me.is_none());
        assert_eq!(update.birthdate.as_deref(), Some("1990-01-01"));
        assert!(update.current_step.is_none());
    }

    #[test]
    fn form_update_trims_birthdate() {
        let form = ProfileForm {
            birthdate: Some(" 1990-01-01 ".into()),
            ..Default::default()
        };
        assert_eq!(form.to_update().birthdate.as_deref(), Some("1990-01-01"));
    }

    #[test]
    fn empty_address_fields_keep_stored_values() {
        let mut user = sample_user();
        let form = ProfileForm {
            address: Some(Address {
                street_address: Some("1 High Street".into()),
                city: Some(String::new()),
                state: None,
                zip: Some(String::new()),
            }),
            ..Default::default()
        };
        form.to_update().apply_to(&mut user);
        assert_eq!(user.street_address.as_deref(), Some("1 High Street"));
        assert_eq!(user.city.as_deref(), Some("London"));
        assert!(user.zip.is_none());
    }

    #[test]
    fn apply_leaves_unset_fields_alone() {
        let mut user = sample_user();
        let update = UserUpdate {
            zip: Some("SW1A 1AA".into()),
            ..UserUpdate::step(OnboardingStep::Complete)
        };
        update.apply_to(&mut user);
        assert_eq!(user.zip.as_deref(), Some("SW1A 1AA"));
        assert_eq!(user.city.as_deref(), Some("London"));
        assert_eq!(user.current_step, OnboardingStep::Complete);
        assert!(user.completed);
    }

    #[test]
    fn step_update_marks_completion_only_when_terminal() {
        assert_eq!(UserUpdate::step(OnboardingStep::PageTwo).completed, None);
        assert_eq!(UserUpdate::step(OnboardingStep::Complete).completed, Some(true));
        assert!(UserUpdate::default().is_empty());
    }
}
