// Codepin code generator
// Main entry point for the codepin binary

use clap::Parser;
use codepin_engine::cli::{Cli, Command};
use codepin_engine::config::Config;
use codepin_engine::handlers::{
    handle_doctor, handle_generate, handle_history, handle_init, OutputFormat,
};
use codepin_engine::secrets::SecretManager;
use codepin_engine::telemetry::init_telemetry_with_level;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log wins over the config file; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Codepin v{} ({} - {})", version, commit, timestamp);

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let secrets = Arc::new(SecretManager::from_env());

    match cli.command {
        Command::Generate {
            wallet,
            folder,
            prompt,
        } => {
            tracing::info!("Generating project '{}'", folder);
            handle_generate(wallet, folder, prompt, &config, secrets, format).await
        }

        Command::History { wallet, limit } => {
            tracing::info!("Showing last {} manifests", limit);
            handle_history(wallet, limit, &config, format).await
        }

        Command::Init => {
            tracing::info!("Initializing database...");
            handle_init(&config, format).await
        }

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, secrets, format).await
        }
    }
}
