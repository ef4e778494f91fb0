//! IntakeManager: per-sender sessions, step transitions, and the side
//! effects each transition triggers.
//!
//! Every sender has its own async lock slot so that "read step, compute next
//! step, write back" is atomic per sender while different senders proceed
//! concurrently. No error leaves this module; every outcome is reply text.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::answer::AnswerSynthesizer;
use crate::error::CalendarError;
use crate::knowledge::KnowledgeBase;
use crate::schedule::{CalendarClient, DemoBooking, resolve};
use crate::store::LeadStore;

use super::model::Session;
use super::prompts;
use super::state::{Action, IntakeStep, transition};

/// Source of "now" for date resolution.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

type Slot = Arc<tokio::sync::Mutex<Option<Session>>>;

/// Coordinates intake sessions, lead persistence, demo booking, and
/// question answering.
pub struct IntakeManager {
    sessions: Mutex<HashMap<String, Slot>>,
    store: Arc<dyn LeadStore>,
    knowledge: Arc<KnowledgeBase>,
    synthesizer: Arc<AnswerSynthesizer>,
    calendar: Option<Arc<dyn CalendarClient>>,
    clock: Clock,
}

impl IntakeManager {
    pub fn new(
        store: Arc<dyn LeadStore>,
        knowledge: Arc<KnowledgeBase>,
        synthesizer: Arc<AnswerSynthesizer>,
        calendar: Option<Arc<dyn CalendarClient>>,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            store,
            knowledge,
            synthesizer,
            calendar,
            clock: Arc::new(|| chrono::Local::now().naive_local()),
        }
    }

    /// Replace the clock used to resolve demo dates.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Reference document readiness, for health checks.
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Number of senders with a live session entry.
    pub fn active_sessions(&self) -> usize {
        self.lock_sessions().len()
    }

    /// Current step for `sender`, or `None` when no session exists.
    pub async fn current_step(&self, sender: &str) -> Option<IntakeStep> {
        let slot = self.lock_sessions().get(sender).cloned()?;
        let guard = slot.lock().await;
        guard.as_ref().map(|s| s.step)
    }

    /// Process one inbound message and produce the reply text.
    pub async fn handle_message(&self, sender: &str, text: &str) -> String {
        loop {
            let slot = self.slot_for(sender);
            let mut session = slot.lock().await;
            // The slot may have been retired while we waited for it.
            if !self.is_current(sender, &slot) {
                continue;
            }

            let reply = self.advance(sender, text, &mut session).await;
            if session.is_none() {
                self.retire(sender, &slot);
            }
            return reply;
        }
    }

    async fn advance(&self, sender: &str, text: &str, session: &mut Option<Session>) -> String {
        let transition = transition(session.as_ref().map(|s| s.step), text);
        let input = text.trim().to_string();
        let state = session.get_or_insert_with(Session::new);

        let reply = match transition.action {
            Action::Start => {
                info!(sender, "New intake session");
                prompts::WELCOME.to_string()
            }
            Action::StoreName => {
                state.fields.name = input;
                prompts::ASK_EMAIL.to_string()
            }
            Action::StoreEmail => {
                state.fields.email = input;
                prompts::ASK_BUSINESS.to_string()
            }
            Action::StoreBusiness => {
                state.fields.business_name = input;
                prompts::ASK_DEMO.to_string()
            }
            Action::StartScheduling => prompts::ASK_DATE.to_string(),
            Action::RepromptDemoChoice => prompts::REPROMPT_DEMO.to_string(),
            Action::Reschedule => prompts::ASK_DATE_AGAIN.to_string(),
            Action::SkipDemo => {
                let lead = state.fields.partial_lead(sender);
                match self.store.save_lead(&lead).await {
                    Ok(record) => {
                        info!(sender, lead_id = %record.id, "Lead saved without demo");
                        prompts::demo_skipped()
                    }
                    Err(e) => {
                        warn!(sender, error = %e, "Failed to save lead; dropping session");
                        *session = None;
                        return prompts::SAVE_FAILED.to_string();
                    }
                }
            }
            Action::StoreDemoDate => {
                state.fields.demo_date = Some(input);
                prompts::ASK_TIME.to_string()
            }
            Action::CompleteBooking => {
                state.fields.demo_time = Some(input);
                let lead = state.fields.full_lead(sender);
                match self.store.save_lead(&lead).await {
                    Ok(record) => info!(sender, lead_id = %record.id, "Lead saved with demo"),
                    Err(e) => {
                        warn!(sender, error = %e, "Failed to save lead; dropping session");
                        *session = None;
                        return prompts::SAVE_FAILED.to_string();
                    }
                }

                let resolved = resolve(
                    lead.demo_date.as_deref().unwrap_or_default(),
                    lead.demo_time.as_deref().unwrap_or_default(),
                    (self.clock)(),
                );
                debug!(
                    sender,
                    at = %resolved.at,
                    source = ?resolved.date_source,
                    time_defaulted = resolved.time_defaulted,
                    "Resolved demo slot"
                );
                let booking = state.fields.booking(resolved.at);
                prompts::demo_booked(self.book(sender, &booking).await)
            }
            Action::Help => prompts::HELP.to_string(),
            Action::Exit => {
                info!(sender, "Session ended by user");
                *session = None;
                return prompts::GOODBYE.to_string();
            }
            Action::Ask => {
                let chunks = self.knowledge.retrieve(&input).await;
                debug!(sender, chunks = chunks.len(), "Answering question");
                self.synthesizer.answer(&input, &chunks).await
            }
        };

        if let (Some(state), Some(next)) = (session.as_mut(), transition.next) {
            if state.step != next {
                debug!(sender, from = %state.step, to = %next, "Intake step transition");
            }
            state.step = next;
        }
        reply
    }

    /// Book the demo; `false` on any calendar failure.
    async fn book(&self, sender: &str, booking: &DemoBooking) -> bool {
        let result = match &self.calendar {
            Some(calendar) => calendar.book_demo(booking).await,
            None => Err(CalendarError::NotConfigured),
        };
        match result {
            Ok(link) => {
                info!(sender, start = %booking.start, link = %link, "Demo booked");
                true
            }
            Err(e) => {
                warn!(sender, error = %e, "Calendar booking failed; lead kept");
                false
            }
        }
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn slot_for(&self, sender: &str) -> Slot {
        self.lock_sessions()
            .entry(sender.to_string())
            .or_default()
            .clone()
    }

    fn is_current(&self, sender: &str, slot: &Slot) -> bool {
        self.lock_sessions()
            .get(sender)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    fn retire(&self, sender: &str, slot: &Slot) {
        let mut sessions = self.lock_sessions();
        if sessions.get(sender).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            sessions.remove(sender);
        }
    }
}
