//! Intake Assist: conversational lead intake with demo scheduling and
//! question answering over a reference document.

pub mod answer;
pub mod channels;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod onboarding;
pub mod schedule;
pub mod store;
