//! Intake conversation: onboard a lead, optionally book a demo, then answer
//! questions about the reference document.
//!
//! Each sender walks name → email → business → demo choice, optionally
//! date → time, and ends in question mode. Sessions live in memory only.

pub mod manager;
pub mod model;
pub mod prompts;
pub mod routes;
pub mod state;

pub use manager::{Clock, IntakeManager};
pub use model::{CollectedFields, Session};
pub use routes::{IntakeRouteState, intake_routes, twiml_message};
pub use state::{Action, IntakeStep, Transition, transition};
