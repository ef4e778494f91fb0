//! Session and collected-field models.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::schedule::DemoBooking;
use crate::store::NewLead;

use super::state::IntakeStep;

/// Lead details gathered during intake.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CollectedFields {
    pub name: String,
    pub email: String,
    pub business_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_time: Option<String>,
}

impl CollectedFields {
    /// Lead without demo fields, for a skipped demo.
    pub fn partial_lead(&self, sender: &str) -> NewLead {
        NewLead {
            sender: sender.to_string(),
            name: self.name.clone(),
            email: self.email.clone(),
            business_name: self.business_name.clone(),
            demo_date: None,
            demo_time: None,
        }
    }

    /// Lead including whatever demo text was captured.
    pub fn full_lead(&self, sender: &str) -> NewLead {
        NewLead {
            demo_date: self.demo_date.clone(),
            demo_time: self.demo_time.clone(),
            ..self.partial_lead(sender)
        }
    }

    /// Calendar booking for a resolved start time.
    pub fn booking(&self, start: NaiveDateTime) -> DemoBooking {
        DemoBooking {
            name: self.name.clone(),
            email: self.email.clone(),
            business_name: self.business_name.clone(),
            demo_date: self.demo_date.clone().unwrap_or_default(),
            demo_time: self.demo_time.clone().unwrap_or_default(),
            start,
        }
    }
}

/// One sender's conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub step: IntakeStep,
    pub fields: CollectedFields,
}

impl Session {
    /// A fresh session waiting for the sender's name.
    pub fn new() -> Self {
        Self {
            step: IntakeStep::Name,
            fields: CollectedFields::default(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
