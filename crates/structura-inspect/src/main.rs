//! Structura command-line tool
//!
//! Lists and shows structure metadata of the configured document types and
//! hydrates documents from a JSON dump of repository nodes.

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod error;

use cli::Cli;
use commands::Inspector;
use config::InspectConfig;
use error::Result;

fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Log to stderr so stdout stays valid JSON
    let filter = if cli.debug {
        EnvFilter::new("structura=debug,structura_registry=debug,structura_inspect=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("structura=info,structura_registry=info,structura_inspect=info")
        })
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = InspectConfig::from_env()?.with_overrides(
        cli.config.clone(),
        cli.default_locale.clone(),
        cli.cache_dir.clone(),
    );
    debug!("Using configuration {:?}", config);

    let inspector = Inspector::new(config.load()?);
    match inspector.run(&cli.command) {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            Err(e)
        }
    }
}
