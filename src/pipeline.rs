//! One mirroring run: fetch recently updated events and write them to the store.

use crate::components::event_store::{EventRecord, EventStore, RedisEventStore};
use crate::components::google_calendar::{CalendarReader, GoogleCalendarClient, ListQuery};
use crate::config::Config;
use crate::error::SyncResult;
use chrono::Utc;
use tracing::{error, info, warn};

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    /// Items without an id, never written
    pub skipped: usize,
    pub written: usize,
    pub failed: usize,
}

/// Run once against Google Calendar and Redis
pub async fn run(config: &Config) -> SyncResult<RunSummary> {
    let store = RedisEventStore::connect(config).await.map_err(|e| {
        error!("Failed to open event store: {}", e);
        e
    })?;

    let reader = match GoogleCalendarClient::new(&config.api_base_url, &config.google_api_key) {
        Ok(reader) => reader,
        Err(e) => {
            error!("Failed to create Calendar client: {}", e);
            release(store).await;
            return Err(e);
        }
    };

    execute(config, &reader, store).await
}

/// Fetch, map and write with the given reader and store. The store is always released.
pub async fn execute<R, S>(config: &Config, reader: &R, mut store: S) -> SyncResult<RunSummary>
where
    R: CalendarReader + ?Sized,
    S: EventStore,
{
    let result = mirror(config, reader, &mut store).await;
    release(store).await;

    match &result {
        Ok(summary) => info!(
            fetched = summary.fetched,
            skipped = summary.skipped,
            written = summary.written,
            failed = summary.failed,
            "Run finished"
        ),
        Err(e) => error!("Run failed: {}", e),
    }

    result
}

async fn mirror<R, S>(config: &Config, reader: &R, store: &mut S) -> SyncResult<RunSummary>
where
    R: CalendarReader + ?Sized,
    S: EventStore,
{
    let query = ListQuery::recently_updated(
        &config.google_calendar_id,
        Utc::now(),
        config.lookback(),
        &config.timezone,
        config.order_by,
        config.max_results,
    )?;
    info!(updated_min = %query.updated_min, "Listing recently updated events");

    let items = reader.list_recently_updated_events(&query).await?;
    let mut summary = RunSummary {
        fetched: items.len(),
        ..RunSummary::default()
    };

    // A blank id would land on the bare `<prefix>:` key
    let mut records = Vec::with_capacity(items.len());
    for item in &items {
        if item.id.trim().is_empty() {
            warn!(summary = ?item.summary, "Skipping event without an id");
            summary.skipped += 1;
        } else {
            records.push(EventRecord::from(item));
        }
    }

    if records.is_empty() {
        info!("No events to write since {}", query.updated_min);
        return Ok(summary);
    }

    info!(count = records.len(), mode = %store.mode(), "Writing events");
    let report = store.write(&records).await?;
    if !report.is_complete() {
        warn!(failed = ?report.failed, "Some events were not saved");
    }

    summary.written = report.written;
    summary.failed = report.failed.len();
    Ok(summary)
}

async fn release<S: EventStore>(mut store: S) {
    if let Err(e) = store.close().await {
        warn!("Failed to release event store: {}", e);
    }
}
