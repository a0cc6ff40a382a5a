use super::{EventRecord, EventStore, WriteMode, WriteReport};
use crate::config::Config;
use crate::error::{store_connection_error, store_write_error, Error, SyncResult};
use async_trait::async_trait;
use redis::aio::{ConnectionLike, MultiplexedConnection};
use redis::{Client as RedisClient, Cmd, Script, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Deletes the lock only while it still holds this run's token
const RELEASE_LOCK_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Key of the document for event `id`
pub fn event_key(prefix: &str, id: &str) -> String {
    format!("{}:{}", prefix, id)
}

/// Key of the run lock for `calendar_id`
pub fn lock_key(prefix: &str, calendar_id: &str) -> String {
    format!("{}:lock:{}", prefix, calendar_id)
}

/// Single MSETNX carrying every record; Redis applies it only if no key exists yet
pub fn bulk_insert_command(prefix: &str, records: &[EventRecord]) -> SyncResult<Cmd> {
    let mut cmd = redis::cmd("MSETNX");
    for record in records {
        cmd.arg(event_key(prefix, &record.id)).arg(record.to_document()?);
    }
    Ok(cmd)
}

/// Lock held for the duration of one run
#[derive(Debug)]
struct RunLock {
    key: String,
    token: String,
}

impl RunLock {
    async fn acquire<C: ConnectionLike + Send>(conn: &mut C, key: String, ttl_secs: u64) -> SyncResult<Self> {
        let token = Uuid::new_v4().to_string();
        let reply: Value = redis::cmd("SET")
            .arg(&key)
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(ttl_secs.saturating_mul(1000))
            .query_async(conn)
            .await
            .map_err(|e| store_connection_error(&format!("Failed to take run lock: {}", e)))?;

        if matches!(reply, Value::Nil) {
            return Err(Error::RunInProgress(key));
        }

        info!(lock = %key, "Run lock acquired");
        Ok(Self { key, token })
    }

    async fn release<C: ConnectionLike + Send>(self, conn: &mut C) -> SyncResult<()> {
        let removed: i64 = Script::new(RELEASE_LOCK_SCRIPT)
            .key(&self.key)
            .arg(&self.token)
            .invoke_async(conn)
            .await
            .map_err(|e| store_connection_error(&format!("Failed to release run lock: {}", e)))?;

        if removed == 0 {
            return Err(store_connection_error(&format!(
                "Run lock {} expired before release",
                self.key
            )));
        }

        info!(lock = %self.key, "Run lock released");
        Ok(())
    }
}

/// Event store backed by Redis, one JSON document per event key
pub struct RedisEventStore<C = MultiplexedConnection> {
    conn: C,
    key_prefix: String,
    mode: WriteMode,
    lock: Option<RunLock>,
}

impl RedisEventStore {
    /// Connect to Redis and, when enabled, take the run lock for the configured calendar
    pub async fn connect(config: &Config) -> SyncResult<Self> {
        let client = RedisClient::open(config.redis_url.as_str())
            .map_err(|e| store_connection_error(&format!("Failed to create Redis client: {}", e)))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| store_connection_error(&format!("Failed to connect to Redis: {}", e)))?;

        let mut store = Self::from_connection(conn, &config.key_prefix, config.write_mode);
        if config.run_lock {
            store
                .take_run_lock(&config.google_calendar_id, config.run_lock_ttl_secs)
                .await?;
        }

        Ok(store)
    }
}

impl<C: ConnectionLike + Send> RedisEventStore<C> {
    /// Store over an already open connection, without a run lock
    pub fn from_connection(conn: C, key_prefix: &str, mode: WriteMode) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.to_string(),
            mode,
            lock: None,
        }
    }

    /// Take the run lock for `calendar_id`; `close` releases it
    pub async fn take_run_lock(&mut self, calendar_id: &str, ttl_secs: u64) -> SyncResult<()> {
        let key = lock_key(&self.key_prefix, calendar_id);
        self.lock = Some(RunLock::acquire(&mut self.conn, key, ttl_secs).await?);
        Ok(())
    }

    async fn upsert_all(&mut self, records: &[EventRecord]) -> WriteReport {
        let mut report = WriteReport::default();

        for record in records {
            match self.upsert(record).await {
                Ok(()) => report.written += 1,
                Err(e) => {
                    error!(event_id = %record.id, "Failed to save event: {}", e);
                    report.failed.push(record.id.clone());
                }
            }
        }

        report
    }

    async fn upsert(&mut self, record: &EventRecord) -> SyncResult<()> {
        let key = event_key(&self.key_prefix, &record.id);
        let document = record.to_document()?;

        () = redis::cmd("SET")
            .arg(&key)
            .arg(document)
            .query_async(&mut self.conn)
            .await
            .map_err(|e| store_write_error(&format!("Failed to save {}: {}", key, e)))?;

        Ok(())
    }

    async fn bulk_insert(&mut self, records: &[EventRecord]) -> SyncResult<WriteReport> {
        let cmd = bulk_insert_command(&self.key_prefix, records)?;

        let inserted: bool = cmd
            .query_async(&mut self.conn)
            .await
            .map_err(|e| store_write_error(&format!("Bulk insert failed: {}", e)))?;

        if !inserted {
            return Err(store_write_error(&format!(
                "Bulk insert of {} events rejected: at least one event key already exists",
                records.len()
            )));
        }

        Ok(WriteReport {
            written: records.len(),
            failed: Vec::new(),
        })
    }
}

#[async_trait]
impl<C: ConnectionLike + Send> EventStore for RedisEventStore<C> {
    fn mode(&self) -> WriteMode {
        self.mode
    }

    async fn write(&mut self, records: &[EventRecord]) -> SyncResult<WriteReport> {
        if records.is_empty() {
            return Ok(WriteReport::default());
        }

        match self.mode {
            WriteMode::Upsert => Ok(self.upsert_all(records).await),
            WriteMode::BulkInsert => self.bulk_insert(records).await,
        }
    }

    async fn close(&mut self) -> SyncResult<()> {
        match self.lock.take() {
            Some(lock) => lock.release(&mut self.conn).await,
            None => Ok(()),
        }
    }
}

impl<C> Drop for RedisEventStore<C> {
    fn drop(&mut self) {
        if let Some(lock) = &self.lock {
            warn!(lock = %lock.key, "Store dropped without release; lock will expire on its own");
        }
    }
}
