use crate::config::{load_env_file, Config};
use crate::logging::CloudLoggingFormat;
use crate::pipeline;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,hyper_util=warn,reqwest=warn";

/// Export the dotenv file (`.env`, or `ENV_FILE`) so logging and config both see it
pub fn load_env() -> miette::Result<()> {
    load_env_file(std::env::var("ENV_FILE").ok().as_deref())?;
    Ok(())
}

/// Whether `LOG_FORMAT` asks for JSON lines
pub fn json_logging_requested(log_format: Option<&str>) -> bool {
    log_format.is_some_and(|v| v.trim().eq_ignore_ascii_case("json"))
}

/// Initialize logging with environment-based configuration.
/// `LOG_FORMAT=json` emits Cloud Logging JSON lines with severity and source location.
pub fn init_logging() -> miette::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = json_logging_requested(std::env::var("LOG_FORMAT").ok().as_deref());

    let result = if json {
        let subscriber = fmt()
            .event_format(CloudLoggingFormat)
            .with_env_filter(filter)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = fmt().with_env_filter(filter).finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    result.map_err(|e| miette::miette!("Failed to set up logging: {}", e))
}

/// Load and validate the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => {
            info!(
                calendar_id = %config.google_calendar_id,
                write_mode = %config.write_mode,
                max_results = config.max_results,
                lookback_hours = config.lookback_hours,
                "Configuration loaded"
            );
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Run the mirror once. Failures are logged by the pipeline and do not end the process abnormally.
pub async fn run_once(config: &Config) -> bool {
    pipeline::run(config).await.is_ok()
}
