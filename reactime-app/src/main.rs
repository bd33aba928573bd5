mod app;
mod cli;
mod driver;
mod render;
mod synthetic;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use app::App;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = cli::AppConfig::load(&cli).context("Failed to load configuration")?;
    let app = App::new(config)?;
    app.run()?;

    Ok(())
}
