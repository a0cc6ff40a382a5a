#![allow(dead_code)]

use async_trait::async_trait;
use calendar_mirror::components::event_store::{
    event_key, EventRecord, EventStore, WriteMode, WriteReport,
};
use calendar_mirror::components::google_calendar::{
    truncate_items, CalendarItem, CalendarReader, EventDateTime, ListQuery, OrderBy,
};
use calendar_mirror::config::Config;
use calendar_mirror::error::{
    remote_fetch_error, store_connection_error, store_write_error, SyncResult,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Configuration pointing at nothing real
pub fn test_config() -> Config {
    Config {
        google_api_key: "test_api_key".to_string(),
        google_calendar_id: "test_calendar_id".to_string(),
        redis_url: "redis://127.0.0.1:6379".to_string(),
        api_base_url: "http://localhost:8080/calendar/v3".to_string(),
        max_results: 50,
        lookback_hours: 24,
        order_by: OrderBy::Updated,
        write_mode: WriteMode::Upsert,
        key_prefix: "events".to_string(),
        timezone: chrono_tz::UTC,
        run_lock: false,
        run_lock_ttl_secs: 300,
    }
}

/// Timed calendar item
pub fn item(id: &str, summary: &str, description: &str, start: &str, end: &str) -> CalendarItem {
    let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
    CalendarItem {
        id: id.to_string(),
        summary: opt(summary),
        description: opt(description),
        start: Some(EventDateTime {
            date_time: opt(start),
            ..Default::default()
        }),
        end: Some(EventDateTime {
            date_time: opt(end),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Calendar reader returning canned items, or failing like a dropped connection
#[derive(Debug, Default)]
pub struct MockCalendarReader {
    items: Vec<CalendarItem>,
    fail: bool,
    queries: Mutex<Vec<ListQuery>>,
}

impl MockCalendarReader {
    pub fn with_items(items: Vec<CalendarItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Queries received so far
    pub fn queries(&self) -> Vec<ListQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarReader for MockCalendarReader {
    async fn list_recently_updated_events(&self, query: &ListQuery) -> SyncResult<Vec<CalendarItem>> {
        self.queries.lock().unwrap().push(query.clone());

        if self.fail {
            return Err(remote_fetch_error("Failed to list events: simulated network error"));
        }
        Ok(truncate_items(self.items.clone(), query.max_results))
    }
}

/// What the mock store saw; shared so tests can inspect it after the store is consumed
#[derive(Debug, Default)]
pub struct StoreState {
    pub documents: HashMap<String, String>,
    pub write_calls: usize,
    pub close_calls: usize,
}

/// In-memory event store with Redis-like key semantics
#[derive(Debug, Clone)]
pub struct MockEventStore {
    mode: WriteMode,
    state: Arc<Mutex<StoreState>>,
    failing_ids: HashSet<String>,
    fail_close: bool,
}

impl MockEventStore {
    pub fn new(mode: WriteMode) -> Self {
        Self {
            mode,
            state: Arc::new(Mutex::new(StoreState::default())),
            failing_ids: HashSet::new(),
            fail_close: false,
        }
    }

    /// Make writes of these ids fail
    pub fn failing_on(mut self, ids: &[&str]) -> Self {
        self.failing_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    /// Make `close` fail
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn state(&self) -> Arc<Mutex<StoreState>> {
        Arc::clone(&self.state)
    }

    /// Stored document for `id`, decoded
    pub fn document(&self, id: &str) -> Option<serde_json::Value> {
        let state = self.state.lock().unwrap();
        state
            .documents
            .get(&event_key("events", id))
            .map(|doc| serde_json::from_str(doc).unwrap())
    }

    pub fn document_count(&self) -> usize {
        self.state.lock().unwrap().documents.len()
    }

    pub fn write_calls(&self) -> usize {
        self.state.lock().unwrap().write_calls
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }
}

#[async_trait]
impl EventStore for MockEventStore {
    fn mode(&self) -> WriteMode {
        self.mode
    }

    async fn write(&mut self, records: &[EventRecord]) -> SyncResult<WriteReport> {
        let mut state = self.state.lock().unwrap();
        state.write_calls += 1;

        match self.mode {
            WriteMode::Upsert => {
                let mut report = WriteReport::default();
                for record in records {
                    if self.failing_ids.contains(&record.id) {
                        report.failed.push(record.id.clone());
                        continue;
                    }
                    state
                        .documents
                        .insert(event_key("events", &record.id), record.to_document()?);
                    report.written += 1;
                }
                Ok(report)
            }
            WriteMode::BulkInsert => {
                let clash = records.iter().any(|r| {
                    self.failing_ids.contains(&r.id)
                        || state.documents.contains_key(&event_key("events", &r.id))
                });
                if clash {
                    return Err(store_write_error("Bulk insert rejected"));
                }
                for record in records {
                    state
                        .documents
                        .insert(event_key("events", &record.id), record.to_document()?);
                }
                Ok(WriteReport {
                    written: records.len(),
                    failed: Vec::new(),
                })
            }
        }
    }

    async fn close(&mut self) -> SyncResult<()> {
        self.state.lock().unwrap().close_calls += 1;
        if self.fail_close {
            return Err(store_connection_error("simulated disconnect failure"));
        }
        Ok(())
    }
}
