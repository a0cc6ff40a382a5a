use crate::components::event_store::WriteMode;
use crate::components::google_calendar::OrderBy;
use crate::error::{config_error, env_error, Error, SyncResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Default Google Calendar API root
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
/// Default page size for the listing request
pub const DEFAULT_MAX_RESULTS: u32 = 50;
/// Largest page the events.list endpoint will return
pub const MAX_RESULTS_LIMIT: u32 = 2500;
/// Default trailing window for `updatedMin`
pub const DEFAULT_LOOKBACK_HOURS: u32 = 24;
/// Longest accepted trailing window, one leap year
pub const MAX_LOOKBACK_HOURS: u32 = 366 * 24;
/// Default prefix for event document keys
pub const DEFAULT_KEY_PREFIX: &str = "events";
/// Default run lock expiry
pub const DEFAULT_RUN_LOCK_TTL_SECS: u64 = 300;
/// Config file read when `CALENDAR_MIRROR_CONFIG` is not set
pub const DEFAULT_CONFIG_PATH: &str = "config/poller.toml";

/// Optional settings read from the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileSettings {
    pub max_results: Option<u32>,
    pub lookback_hours: Option<u32>,
    pub order_by: Option<OrderBy>,
    pub write_mode: Option<WriteMode>,
    pub key_prefix: Option<String>,
    pub timezone: Option<String>,
    pub run_lock: Option<bool>,
    pub run_lock_ttl_secs: Option<u64>,
    pub api_base_url: Option<String>,
}

impl FileSettings {
    /// Read settings from a TOML file. A missing file yields defaults unless `required`.
    pub fn read(path: &Path, required: bool) -> SyncResult<Self> {
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Process-wide configuration, resolved once at startup
#[derive(Clone)]
pub struct Config {
    /// Google API key used for the public calendar listing
    pub google_api_key: String,
    /// Google Calendar ID to mirror
    pub google_calendar_id: String,
    /// Redis connection URL
    pub redis_url: String,
    /// Root of the Calendar API, without trailing slash
    pub api_base_url: String,
    /// Page size for the listing request
    pub max_results: u32,
    /// Trailing window for `updatedMin`, in hours
    pub lookback_hours: u32,
    pub order_by: OrderBy,
    pub write_mode: WriteMode,
    /// Prefix for event document and lock keys
    pub key_prefix: String,
    /// Timezone used to render `updatedMin`
    pub timezone: Tz,
    /// Whether to take the run lock before fetching
    pub run_lock: bool,
    pub run_lock_ttl_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("google_api_key", &"<redacted>")
            .field("google_calendar_id", &self.google_calendar_id)
            .field("redis_url", &self.redis_url)
            .field("api_base_url", &self.api_base_url)
            .field("max_results", &self.max_results)
            .field("lookback_hours", &self.lookback_hours)
            .field("order_by", &self.order_by)
            .field("write_mode", &self.write_mode)
            .field("key_prefix", &self.key_prefix)
            .field("timezone", &self.timezone)
            .field("run_lock", &self.run_lock)
            .field("run_lock_ttl_secs", &self.run_lock_ttl_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from the dotenv file, the config file and the environment
    pub fn load() -> SyncResult<Self> {
        load_env_file(env::var("ENV_FILE").ok().as_deref())?;

        let settings = match env::var("CALENDAR_MIRROR_CONFIG") {
            Ok(path) => FileSettings::read(Path::new(&path), true)?,
            Err(_) => FileSettings::read(Path::new(DEFAULT_CONFIG_PATH), false)?,
        };

        Self::from_sources(settings, |name| env::var(name).ok())
    }

    /// Build configuration from file settings, letting `var` lookups override them
    pub fn from_sources<F>(settings: FileSettings, var: F) -> SyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| var(name).ok_or_else(|| env_error(name));

        let google_api_key = required("GOOGLE_API_KEY")?;
        let google_calendar_id = required("GOOGLE_CALENDAR_ID")?;
        let redis_url = required("REDIS_URL")?;

        let max_results = parse_var(&var, "MAX_RESULTS")?
            .or(settings.max_results)
            .unwrap_or(DEFAULT_MAX_RESULTS);
        let lookback_hours = parse_var(&var, "LOOKBACK_HOURS")?
            .or(settings.lookback_hours)
            .unwrap_or(DEFAULT_LOOKBACK_HOURS);
        let order_by = parse_var(&var, "ORDER_BY")?
            .or(settings.order_by)
            .unwrap_or_default();
        let write_mode = parse_var(&var, "WRITE_MODE")?
            .or(settings.write_mode)
            .unwrap_or_default();
        let key_prefix = var("EVENT_KEY_PREFIX")
            .or(settings.key_prefix)
            .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string());
        let timezone_name = var("TIMEZONE")
            .or(settings.timezone)
            .unwrap_or_else(|| String::from("UTC"));
        let timezone = timezone_name
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone: {}", timezone_name)))?;
        let run_lock = parse_var(&var, "RUN_LOCK")?
            .or(settings.run_lock)
            .unwrap_or(true);
        let run_lock_ttl_secs = parse_var(&var, "RUN_LOCK_TTL_SECS")?
            .or(settings.run_lock_ttl_secs)
            .unwrap_or(DEFAULT_RUN_LOCK_TTL_SECS);
        let api_base_url = var("GOOGLE_API_BASE_URL")
            .or(settings.api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let config = Config {
            google_api_key,
            google_calendar_id,
            redis_url,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            max_results,
            lookback_hours,
            order_by,
            write_mode,
            key_prefix,
            timezone,
            run_lock,
            run_lock_ttl_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that the types alone do not enforce
    pub fn validate(&self) -> SyncResult<()> {
        if self.google_calendar_id.trim().is_empty() {
            return Err(config_error("GOOGLE_CALENDAR_ID must not be empty"));
        }
        if self.max_results == 0 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(config_error(&format!(
                "MAX_RESULTS must be between 1 and {}, got {}",
                MAX_RESULTS_LIMIT, self.max_results
            )));
        }
        if self.lookback_hours == 0 || self.lookback_hours > MAX_LOOKBACK_HOURS {
            return Err(config_error(&format!(
                "LOOKBACK_HOURS must be between 1 and {}, got {}",
                MAX_LOOKBACK_HOURS, self.lookback_hours
            )));
        }
        if self.run_lock && self.run_lock_ttl_secs == 0 {
            return Err(config_error("RUN_LOCK_TTL_SECS must be positive"));
        }
        Ok(())
    }

    /// Lookback window as a duration
    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.lookback_hours))
    }
}

/// Export a dotenv file into the process environment without overriding set variables.
/// `env_file` names an alternative to `.env`, such as `.env.dev`, and must exist.
pub fn load_env_file(env_file: Option<&str>) -> SyncResult<()> {
    match env_file {
        Some(path) => {
            dotenvy::from_filename(path).map_err(|e| {
                Error::Environment(format!("Failed to load env file {}: {}", path, e))
            })?;
        }
        None => {
            dotenv().ok();
        }
    }
    Ok(())
}

fn parse_var<T, F>(var: &F, name: &str) -> SyncResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| config_error(&format!("Invalid {} value: {}", name, raw))),
        None => Ok(None),
    }
}
