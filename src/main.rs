use clap::Parser;

use rolekeeper_backend::cli::{execute_command, Cli};
use rolekeeper_backend::config::{init_logging, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let settings = Settings::from_env()?;
    init_logging(settings.logging())?;
    tracing::debug!(?settings, "Settings loaded");

    let cli = Cli::parse();
    execute_command(cli, &settings).await
}
