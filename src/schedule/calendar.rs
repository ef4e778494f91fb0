//! Calendar booking for demo meetings.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeDelta};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::CalendarConfig;
use crate::error::CalendarError;

const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MEETING_LENGTH_HOURS: i64 = 1;
const EMAIL_REMINDER_MINUTES: u32 = 24 * 60;
const POPUP_REMINDER_MINUTES: u32 = 30;

/// Everything needed to book one demo meeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoBooking {
    pub name: String,
    pub email: String,
    pub business_name: String,
    /// Date text as the user typed it.
    pub demo_date: String,
    /// Time text as the user typed it.
    pub demo_time: String,
    /// Resolved meeting start.
    pub start: NaiveDateTime,
}

/// Books demo meetings on an external calendar.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Create the event and return a link to it.
    async fn book_demo(&self, booking: &DemoBooking) -> Result<String, CalendarError>;
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    pub attendees: Vec<Attendee>,
    pub reminders: Reminders,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Attendee {
    pub email: String,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    pub overrides: Vec<ReminderOverride>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ReminderOverride {
    pub method: &'static str,
    pub minutes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    #[serde(default)]
    html_link: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

/// Build the `events.insert` body for a booking.
pub fn event_request(booking: &DemoBooking, timezone: &str) -> EventRequest {
    let end = booking
        .start
        .checked_add_signed(TimeDelta::hours(MEETING_LENGTH_HOURS))
        .unwrap_or(booking.start);
    let at = |t: NaiveDateTime| EventTime {
        date_time: t.format("%Y-%m-%dT%H:%M:%S").to_string(),
        time_zone: timezone.to_string(),
    };

    EventRequest {
        summary: format!("Demo Meeting - {}", booking.business_name),
        description: format!(
            "Demo meeting with {} from {}\nEmail: {}\nDemo Date: {}\nDemo Time: {}",
            booking.name, booking.business_name, booking.email, booking.demo_date, booking.demo_time
        ),
        start: at(booking.start),
        end: at(end),
        attendees: vec![Attendee {
            email: booking.email.clone(),
        }],
        reminders: Reminders {
            use_default: false,
            overrides: vec![
                ReminderOverride {
                    method: "email",
                    minutes: EMAIL_REMINDER_MINUTES,
                },
                ReminderOverride {
                    method: "popup",
                    minutes: POPUP_REMINDER_MINUTES,
                },
            ],
        },
    }
}

/// Google Calendar v3 REST client authenticated with an OAuth bearer token.
pub struct GoogleCalendarClient {
    client: reqwest::Client,
    base_url: String,
    calendar_id: String,
    access_token: SecretString,
    timezone: String,
}

impl GoogleCalendarClient {
    pub fn new(config: &CalendarConfig, timezone: &str) -> Result<Self, CalendarError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CalendarError::RequestFailed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: GOOGLE_CALENDAR_API.to_string(),
            calendar_id: config.calendar_id.clone(),
            access_token: config.access_token.clone(),
            timezone: timezone.to_string(),
        })
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `{base}/calendars/{id}/events`, with the calendar id percent-encoded.
    fn events_url(&self) -> Result<reqwest::Url, CalendarError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| CalendarError::RequestFailed(format!("invalid calendar API URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CalendarError::RequestFailed("calendar API URL has no path".to_string()))?
            .pop_if_empty()
            .extend(["calendars", self.calendar_id.as_str(), "events"]);
        Ok(url)
    }
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    async fn book_demo(&self, booking: &DemoBooking) -> Result<String, CalendarError> {
        let body = event_request(booking, &self.timezone);
        let resp = self
            .client
            .post(self.events_url()?)
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| CalendarError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(CalendarError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let event: EventResponse = resp
            .json()
            .await
            .map_err(|e| CalendarError::RequestFailed(format!("invalid event response: {e}")))?;
        Ok(event.html_link.or(event.id).unwrap_or_default())
    }
}
