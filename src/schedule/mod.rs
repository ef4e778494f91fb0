//! Demo scheduling: fuzzy date/time resolution and calendar booking.

pub mod calendar;
pub mod resolver;

pub use calendar::{CalendarClient, DemoBooking, GoogleCalendarClient, event_request};
pub use resolver::{DateSource, ResolvedDateTime, resolve};
