// Export components
pub mod event_store;
pub mod google_calendar;

// Re-export the seams the pipeline is built on
pub use event_store::{EventStore, RedisEventStore};
pub use google_calendar::{CalendarReader, GoogleCalendarClient};
