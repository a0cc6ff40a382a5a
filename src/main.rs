use calendar_mirror::startup;
use tracing::info;

// A run is a strictly sequential chain of awaits; one thread is enough
#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    // Export .env first so RUST_LOG and LOG_FORMAT from it apply
    startup::load_env()?;

    // Initialize logging
    startup::init_logging()?;

    info!("Starting calendar mirror");

    // Load configuration
    let config = startup::load_config()?;

    // Mirror once; scheduling is left to the caller
    if startup::run_once(&config).await {
        info!("Calendar mirror finished");
    }

    Ok(())
}
