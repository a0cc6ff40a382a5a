mod common;

use calendar_mirror::components::event_store::{EventRecord, WriteMode};
use calendar_mirror::components::google_calendar::{CalendarItem, EventsPage, OrderBy};
use calendar_mirror::config::{Config, FileSettings};
use calendar_mirror::error::{env_error, Error};
use common::test_config;
use std::collections::HashMap;
use std::fs;

/// Smoke test to verify that a test config is valid
#[test]
fn test_config_validates() {
    let config = test_config();
    assert!(config.validate().is_ok());
    assert_eq!(config.lookback(), chrono::Duration::hours(24));
}

/// Settings file values are picked up
#[test]
fn test_config_file_is_read() {
    let path = std::env::temp_dir().join(format!("calendar-mirror-{}.toml", uuid::Uuid::new_v4()));
    fs::write(
        &path,
        r#"
max_results = 5
order_by = "startTime"
write_mode = "bulk_insert"
key_prefix = "vrc_events"
run_lock = false
"#,
    )
    .unwrap();

    let settings = FileSettings::read(&path, true).unwrap();
    fs::remove_file(&path).ok();

    let env: HashMap<&str, &str> = HashMap::from([
        ("GOOGLE_API_KEY", "key"),
        ("GOOGLE_CALENDAR_ID", "cal"),
        ("REDIS_URL", "redis://localhost:6379"),
    ]);
    let config = Config::from_sources(settings, |k| env.get(k).map(|v| v.to_string())).unwrap();

    assert_eq!(config.max_results, 5);
    assert_eq!(config.order_by, OrderBy::StartTime);
    assert_eq!(config.write_mode, WriteMode::BulkInsert);
    assert_eq!(config.key_prefix, "vrc_events");
    assert!(!config.run_lock);
}

/// A missing optional file falls back to defaults, a missing required one is an error
#[test]
fn test_config_file_missing() {
    let path = std::env::temp_dir().join(format!("calendar-mirror-missing-{}.toml", uuid::Uuid::new_v4()));

    let settings = FileSettings::read(&path, false).unwrap();
    assert!(settings.max_results.is_none());

    assert!(matches!(FileSettings::read(&path, true), Err(Error::Io(_))));
}

/// A malformed file is reported as a serialization error
#[test]
fn test_config_file_malformed() {
    let path = std::env::temp_dir().join(format!("calendar-mirror-bad-{}.toml", uuid::Uuid::new_v4()));
    fs::write(&path, "max_results = \"lots\"").unwrap();

    let result = FileSettings::read(&path, true);
    fs::remove_file(&path).ok();

    assert!(matches!(result, Err(Error::Serialization(_))));
}

/// A raw API page maps straight to records
#[test]
fn test_page_to_records() {
    let page: EventsPage = serde_json::from_str(
        r#"{"items": [
            {"id": "e1", "summary": "Meetup", "description": "",
             "start": {"dateTime": "2024-01-01T10:00:00Z"},
             "end": {"dateTime": "2024-01-01T12:00:00Z"}},
            {"id": "e2"}
        ]}"#,
    )
    .unwrap();

    let records: Vec<EventRecord> = page.items.iter().map(EventRecord::from).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].summary, "Meetup");
    assert!(!records[0].to_document().unwrap().contains("description"));
    assert_eq!(records[1], EventRecord { id: "e2".to_string(), ..Default::default() });
    assert_eq!(EventRecord::from(&CalendarItem::default()), EventRecord::default());
}

/// Error messages name what went wrong
#[test]
fn test_error_messages() {
    assert_eq!(
        env_error("GOOGLE_API_KEY").to_string(),
        "Environment error: Missing environment variable: GOOGLE_API_KEY"
    );
    assert_eq!(
        Error::RunInProgress("events:lock:cal".to_string()).to_string(),
        "Run lock events:lock:cal is held by another run"
    );
}
