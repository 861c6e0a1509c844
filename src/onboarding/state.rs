//! Onboarding state machine — tracks which step a user is on.

use serde::{Deserialize, Serialize};

use super::model::{Page, ProfileForm, User};

/// The steps of the onboarding wizard.
///
/// Progresses linearly: Account → PageTwo → PageThree → Complete.
/// Serialized as the step number (1–4), which is also what gets stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OnboardingStep {
    Account,
    PageTwo,
    PageThree,
    Complete,
}

impl OnboardingStep {
    pub fn number(&self) -> u8 {
        match self {
            Self::Account => 1,
            Self::PageTwo => 2,
            Self::PageThree => 3,
            Self::Complete => 4,
        }
    }

    /// Check if a forward transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStep) -> bool {
        use OnboardingStep::*;
        matches!(
            (self, target),
            (Account, PageTwo) | (PageTwo, PageThree) | (PageThree, Complete)
        )
    }

    /// Whether this step is terminal (onboarding is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            Account => Some(PageTwo),
            PageTwo => Some(PageThree),
            PageThree => Some(Complete),
            Complete => None,
        }
    }

    /// The step "Back" leads to. Completed onboarding cannot go back.
    pub fn previous(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            Account | Complete => None,
            PageTwo => Some(Account),
            PageThree => Some(PageTwo),
        }
    }

    /// The configurable page shown at this step, if any.
    pub fn page(&self) -> Option<Page> {
        match self {
            Self::PageTwo => Some(Page::Two),
            Self::PageThree => Some(Page::Three),
            Self::Account | Self::Complete => None,
        }
    }
}

impl Default for OnboardingStep {
    fn default() -> Self {
        Self::Account
    }
}

impl From<Page> for OnboardingStep {
    fn from(page: Page) -> Self {
        match page {
            Page::Two => Self::PageTwo,
            Page::Three => Self::PageThree,
        }
    }
}

impl TryFrom<u8> for OnboardingStep {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Account),
            2 => Ok(Self::PageTwo),
            3 => Ok(Self::PageThree),
            4 => Ok(Self::Complete),
            other => Err(format!("Step {other} is out of range (expected 1-4)")),
        }
    }
}

impl From<OnboardingStep> for u8 {
    fn from(step: OnboardingStep) -> Self {
        step.number()
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// A user's progress through the wizard, as seen by the front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingSession {
    pub user_id: String,
    pub email: String,
    /// Current step.
    pub step: OnboardingStep,
    pub completed: bool,
    /// Values collected so far, restored from the user record.
    pub form: ProfileForm,
}

impl OnboardingSession {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            step: user.current_step,
            completed: user.completed,
            form: ProfileForm::from_user(user),
        }
    }

    /// Advance to the next step. Returns an error if already at the terminal step.
    pub fn advance(&mut self) -> Result<OnboardingStep, String> {
        let next = self
            .step
            .next()
            .ok_or_else(|| "Already at terminal step".to_string())?;
        if !self.step.can_transition_to(next) {
            return Err(format!("Cannot transition from {} to {}", self.step, next));
        }
        self.step = next;
        self.completed = next.is_terminal();
        Ok(next)
    }

    /// Step back one page. Returns an error at the first or terminal step.
    pub fn go_back(&mut self) -> Result<OnboardingStep, String> {
        let previous = self
            .step
            .previous()
            .ok_or_else(|| format!("Cannot go back from step {}", self.step))?;
        self.step = previous;
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at(step: OnboardingStep) -> OnboardingSession {
        OnboardingSession {
            user_id: "u1".to_string(),
            email: "a@b.co".to_string(),
            step,
            completed: false,
            form: ProfileForm::default(),
        }
    }

    #[test]
    fn valid_transitions() {
        use OnboardingStep::*;
        let transitions = [(Account, PageTwo), (PageTwo, PageThree), (PageThree, Complete)];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use OnboardingStep::*;
        // Skip steps
        assert!(!Account.can_transition_to(PageThree));
        assert!(!PageTwo.can_transition_to(Complete));
        // Go backward
        assert!(!PageThree.can_transition_to(PageTwo));
        // Terminal
        assert!(!Complete.can_transition_to(Account));
        // Self-transition
        assert!(!PageTwo.can_transition_to(PageTwo));
    }

    #[test]
    fn is_terminal() {
        use OnboardingStep::*;
        assert!(Complete.is_terminal());
        assert!(!Account.is_terminal());
        assert!(!PageThree.is_terminal());
    }

    #[test]
    fn next_walks_all_steps() {
        use OnboardingStep::*;
        let mut current = Account;
        for expected_next in [PageTwo, PageThree, Complete] {
            let next = current.next().unwrap();
            assert_eq!(next, expected_next);
            current = next;
        }
        assert!(current.next().is_none());
    }

    #[test]
    fn previous_stops_at_account_and_complete() {
        use OnboardingStep::*;
        assert_eq!(PageThree.previous(), Some(PageTwo));
        assert_eq!(PageTwo.previous(), Some(Account));
        assert_eq!(Account.previous(), None);
        assert_eq!(Complete.previous(), None);
    }

    #[test]
    fn pages_map_to_steps() {
        assert_eq!(OnboardingStep::PageTwo.page(), Some(Page::Two));
        assert_eq!(OnboardingStep::PageThree.page(), Some(Page::Three));
        assert_eq!(OnboardingStep::Account.page(), None);
        for page in Page::ALL {
            assert_eq!(OnboardingStep::from(page).page(), Some(page));
        }
    }

    #[test]
    fn display_matches_serde() {
        use OnboardingStep::*;
        for step in [Account, PageTwo, PageThree, Complete] {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("{step}"), json, "Display and serde should match for {step:?}");
        }
        assert!(serde_json::from_str::<OnboardingStep>("0").is_err());
        assert!(serde_json::from_str::<OnboardingStep>("5").is_err());
    }

    #[test]
    fn session_advance_walks_all_steps() {
        let mut session = session_at(OnboardingStep::default());
        for expected in [
            OnboardingStep::PageTwo,
            OnboardingStep::PageThree,
            OnboardingStep::Complete,
        ] {
            assert_eq!(session.advance().unwrap(), expected);
        }
        assert!(session.completed);

        // Should fail at terminal
        assert!(session.advance().is_err());
    }

    #[test]
    fn session_go_back() {
        let mut session = session_at(OnboardingStep::PageThree);
        assert_eq!(session.go_back().unwrap(), OnboardingStep::PageTwo);
        assert_eq!(session.go_back().unwrap(), OnboardingStep::Account);
        assert!(session.go_back().is_err());
        assert_eq!(session.step, OnboardingStep::Account);
    }
}
