use anyhow::{Context, Result};
use chrono::Utc;
use fieldglass_scraper::state::AppState;
use shared::config::Config;
use shared::types::ScraperInput;
use shared::ScraperError;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Raw job input: the `INPUT` variable wins over a file path argument.
fn read_input() -> std::result::Result<String, ScraperError> {
    if let Ok(raw) = env::var("INPUT") {
        return Ok(raw);
    }
    let path = env::args()
        .nth(1)
        .ok_or_else(|| ScraperError::input_validation("no input: set INPUT or pass a JSON file path"))?;
    std::fs::read_to_string(&path)
        .map_err(|e| ScraperError::input_validation(format!("cannot read input file {}: {}", path, e)))
}

async fn run(config: Config) -> std::result::Result<(), ScraperError> {
    let input = ScraperInput::parse(&read_input()?)?;
    info!("📥 Scraper input: {:?}", input.masked());

    let state = AppState::new(config, input.event_bus.clone())
        .map_err(|e| ScraperError::configuration(e.to_string()))?;
    state.runner().run(&input, Utc::now().date_naive()).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.app.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("🚀 Fieldglass scraper starting ({})", config.app.environment);

    if let Err(e) = run(config).await {
        match e.page_context() {
            Some(url) => error!(code = e.error_code(), url, "❌ Scraper failed: {}", e),
            None => error!(code = e.error_code(), "❌ Scraper failed: {}", e),
        }
        std::process::exit(e.exit_code());
    }

    info!("🏁 Scraper finished");
    Ok(())
}
