//! Fixed reply texts for the intake dialogue.

pub const WELCOME: &str = "Welcome! Please provide your name:";

pub const ASK_EMAIL: &str = "Thank you! Please provide your email address:";

pub const ASK_BUSINESS: &str = "Great! Please provide your business name:";

pub const ASK_DEMO: &str =
    "Great! Would you like to schedule a demo meeting? Please reply with 'yes', 'demo', or 'no'.";

pub const REPROMPT_DEMO: &str = "Please reply with 'yes' if you want to schedule a demo, \
or 'no' if you'd like to skip it for now.";

pub const ASK_DATE: &str = "Perfect! Let's schedule a demo meeting. What is your preferred date \
for the demo? (e.g., Monday, Tuesday, or specific date like 15th March)";

pub const ASK_DATE_AGAIN: &str = "Great! Let's schedule a demo meeting. What is your preferred date \
for the demo? (e.g., Monday, Tuesday, or specific date like 15th March)";

pub const ASK_TIME: &str = "Perfect! What time would you prefer for the demo? \
(e.g., 10:00 AM, 2:30 PM, or any time that works for you)";

const QUESTION_MODE_HINT: &str = "You can now ask me any questions about our services or the PDF \
content. Type 'help' for options or ask your question directly!";

pub const SAVE_FAILED: &str = "Sorry, there was an error saving your information. Please try again.";

pub const HELP: &str = "You can ask me questions about the PDF content. Just type your question \
and I'll search for relevant information!";

pub const GOODBYE: &str = "Thank you for using our service! Goodbye!";

/// Reply after the lead was saved without a demo.
pub fn demo_skipped() -> String {
    format!("No problem! Your information has been saved. {QUESTION_MODE_HINT}")
}

/// Reply after the lead was saved and the calendar booking attempted.
pub fn demo_booked(calendar_ok: bool) -> String {
    if calendar_ok {
        format!(
            "Thank you! Your information and demo schedule have been saved successfully. \
             A calendar invitation has been sent to your email. {QUESTION_MODE_HINT}"
        )
    } else {
        format!(
            "Thank you! Your information has been saved. There was an issue creating the \
             calendar event, but we'll contact you about the demo. {QUESTION_MODE_HINT}"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_replies_differ_on_calendar_outcome() {
        assert!(demo_booked(true).contains("calendar invitation has been sent"));
        assert!(demo_booked(false).contains("issue creating the calendar event"));
        assert!(demo_booked(false).ends_with("ask your question directly!"));
    }

    #[test]
    fn skipped_reply_mentions_help() {
        assert!(demo_skipped().starts_with("No problem!"));
        assert!(demo_skipped().contains("Type 'help'"));
    }
}
