use std::error::Error;

mod app;
mod cli;
mod config;
mod error;
mod models;
mod parsing;
mod processor;
mod scraping;
mod shutdown;

use app::App;
use cli::CliArgs;
use error::AppError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Parse CLI arguments
    let cli_args = CliArgs::parse_args();

    // Validate CLI arguments
    cli_args.validate()?;

    tracing_subscriber::fmt()
        .with_max_level(cli_args.tracing_level())
        .with_target(false)
        .init();

    tracing::info!("Starting order history export");

    // Setup shutdown handling
    let shutdown_manager = shutdown::setup_shutdown_handler().await?;

    // Load configuration with CLI overrides
    let config = config::AppConfig::load_with_cli_args(&cli_args)?;
    let output_path = config.output.path.clone();

    let mut app = App::new_with_config(config, cli_args.year, shutdown_manager)?;

    match app.run().await {
        Ok(totals) => {
            tracing::info!("Export finished: {}", totals);
            tracing::info!("Rows written to {}", output_path.display());
        }
        Err(AppError::Interrupted) => {
            tracing::info!("Export interrupted; rows written so far are in {}", output_path.display());
        }
        Err(e) => {
            tracing::error!("Application error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
