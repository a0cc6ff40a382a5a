//! Reading recently updated events from Google Calendar.

mod client;
pub mod models;
pub mod time;

pub use client::{truncate_items, CalendarReader, GoogleCalendarClient, ListQuery};
pub use models::{CalendarItem, EventDateTime, EventsPage, OrderBy};
