// Codepin API server
// Serves the generation pipeline over HTTP

use codepin_engine::config::Config;
use codepin_engine::db::{Database, ManifestStore};
use codepin_engine::pipeline::Pipeline;
use codepin_engine::secrets::SecretManager;
use codepin_engine::telemetry::init_telemetry_with_level;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // CODEPIN_CONFIG points at an alternate configuration file
    let config = match std::env::var_os("CODEPIN_CONFIG") {
        Some(path) => Config::load_from_path(&PathBuf::from(path))?,
        None => Config::load_or_create()?,
    };

    init_telemetry_with_level(&config.core.log_level);
    tracing::info!("Codepin API v{}", env!("CARGO_PKG_VERSION"));

    let database = Database::new(&config.database_path()).await?;
    if database
        .manifests()
        .ensure_owner(&config.manifest.owner_key)
        .await?
    {
        tracing::info!(
            "Created manifest document '{}'",
            config.manifest.owner_key
        );
    }

    let secrets = Arc::new(SecretManager::from_env());
    let pipeline = Arc::new(Pipeline::from_config(&config, secrets, &database)?);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
    };

    api_server::serve(listener, api_server::router(pipeline), shutdown).await?;

    database.close().await
}
