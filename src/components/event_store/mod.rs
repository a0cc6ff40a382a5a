//! Persisting mirrored events.

pub mod record;
mod redis_store;

pub use record::EventRecord;
pub use redis_store::{bulk_insert_command, event_key, lock_key, RedisEventStore};

use crate::error::SyncResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a run's records reach the store. One mode per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// One overwrite per record; a failed record does not stop the others
    #[default]
    Upsert,
    /// A single all-or-nothing insert of every record
    BulkInsert,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Upsert => f.write_str("upsert"),
            WriteMode::BulkInsert => f.write_str("bulk_insert"),
        }
    }
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upsert" => Ok(WriteMode::Upsert),
            "bulk_insert" | "bulk-insert" | "bulk" => Ok(WriteMode::BulkInsert),
            other => Err(format!("unknown write mode: {}", other)),
        }
    }
}

/// Outcome of one `write` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: usize,
    /// Ids of records that could not be written
    pub failed: Vec<String>,
}

impl WriteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Destination for event records
#[async_trait]
pub trait EventStore: Send {
    /// Write mode this store was configured with
    fn mode(&self) -> WriteMode;

    /// Persist `records` keyed by event id
    async fn write(&mut self, records: &[EventRecord]) -> SyncResult<WriteReport>;

    /// Release the store's resources. Called once per run, whatever the outcome.
    async fn close(&mut self) -> SyncResult<()>;
}
