//! Intake state machine: which step a sender is on and where input takes them.
//!
//! `transition` is pure. The manager applies its side effects (persisting,
//! booking, answering) and may still drop the session when persistence fails.

use serde::{Deserialize, Serialize};

/// Steps of the intake conversation.
///
/// Having no session at all is the implicit starting point; it is not a
/// stored step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    Name,
    Email,
    Business,
    DemoChoice,
    DemoDate,
    DemoTime,
    QuestionMode,
}

impl IntakeStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: IntakeStep) -> bool {
        use IntakeStep::*;
        matches!(
            (self, target),
            (Name, Email)
                | (Email, Business)
                | (Business, DemoChoice)
                | (DemoChoice, DemoChoice)
                | (DemoChoice, DemoDate)
                | (DemoChoice, QuestionMode)
                | (DemoDate, DemoTime)
                | (DemoTime, QuestionMode)
                | (QuestionMode, QuestionMode)
                | (QuestionMode, DemoDate)
        )
    }
}

impl std::fmt::Display for IntakeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Business => "business",
            Self::DemoChoice => "demo_choice",
            Self::DemoDate => "demo_date",
            Self::DemoTime => "demo_time",
            Self::QuestionMode => "question_mode",
        };
        write!(f, "{s}")
    }
}

/// Side effect the manager performs for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create the session and ask for a name.
    Start,
    StoreName,
    StoreEmail,
    StoreBusiness,
    /// User accepted a demo; ask for a date.
    StartScheduling,
    /// Unrecognised answer to the demo question.
    RepromptDemoChoice,
    /// Persist the lead without demo fields.
    SkipDemo,
    StoreDemoDate,
    /// Persist the full lead, resolve the slot and book it.
    CompleteBooking,
    Help,
    /// Say goodbye and drop the session.
    Exit,
    /// Scheduling requested again from question mode.
    Reschedule,
    /// Answer the text from the reference document.
    Ask,
}

/// Outcome of feeding one message to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub action: Action,
    /// Step after the action; `None` means the session ends.
    pub next: Option<IntakeStep>,
}

const AFFIRMATIVE: &[&str] = &["yes", "demo", "y", "sure", "okay"];
const NEGATIVE: &[&str] = &["no", "n", "skip", "not now", "later"];
const HELP: &[&str] = &["help", "menu", "options"];
const EXIT: &[&str] = &["quit", "exit", "bye"];
const RESCHEDULE: &[&str] = &["demo", "schedule demo", "book demo", "demo meeting"];

/// Keyword matching is case-insensitive and ignores surrounding whitespace.
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

fn is_one_of(normalized: &str, keywords: &[&str]) -> bool {
    keywords.contains(&normalized)
}

/// Compute the action and next step for `input` received in `current`.
pub fn transition(current: Option<IntakeStep>, input: &str) -> Transition {
    use IntakeStep::*;

    let Some(step) = current else {
        return Transition {
            action: Action::Start,
            next: Some(Name),
        };
    };
    let normalized = normalize(input);

    let (action, next) = match step {
        Name => (Action::StoreName, Some(Email)),
        Email => (Action::StoreEmail, Some(Business)),
        Business => (Action::StoreBusiness, Some(DemoChoice)),
        DemoChoice if is_one_of(&normalized, AFFIRMATIVE) => {
            (Action::StartScheduling, Some(DemoDate))
        }
        DemoChoice if is_one_of(&normalized, NEGATIVE) => (Action::SkipDemo, Some(QuestionMode)),
        DemoChoice => (Action::RepromptDemoChoice, Some(DemoChoice)),
        DemoDate => (Action::StoreDemoDate, Some(DemoTime)),
        DemoTime => (Action::CompleteBooking, Some(QuestionMode)),
        QuestionMode if is_one_of(&normalized, HELP) => (Action::Help, Some(QuestionMode)),
        QuestionMode if is_one_of(&normalized, EXIT) => (Action::Exit, None),
        QuestionMode if is_one_of(&normalized, RESCHEDULE) => (Action::Reschedule, Some(DemoDate)),
        QuestionMode => (Action::Ask, Some(QuestionMode)),
    };
    Transition { action, next }
}
