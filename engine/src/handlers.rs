//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - generate: Run the pipeline once
//! - history: Show recorded manifests
//! - init: Create the database and the manifest document
//! - doctor: Validate configuration, credentials and database

use anyhow::{Context, Result};
use sdk::errors::PipelineErrorExt;
use sdk::types::GenerationRequest;
use serde_json::json;
use std::sync::Arc;

use crate::config::Config;
use crate::db::{Database, ManifestEntry, ManifestStore};
use crate::llm::openai::OpenAICompatibleBackend;
use crate::llm::ChatBackend;
use crate::pipeline::{outcome_of, Pipeline};
use crate::secrets::SecretManager;
use crate::storage::gateway_url;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Generate, publish and record one project
pub async fn handle_generate(
    wallet: String,
    folder: String,
    prompt: String,
    config: &Config,
    secrets: Arc<SecretManager>,
    format: OutputFormat,
) -> Result<()> {
    let request = GenerationRequest::new(wallet, folder, prompt)?;

    let database = Database::new(&config.database_path())
        .await
        .context("Failed to open database")?;
    let pipeline = Pipeline::from_config(config, secrets, &database)?;

    if let OutputFormat::Text = format {
        println!("Generating '{}'...", request.folder());
        println!();
    }

    let result = pipeline.run(&request).await;
    let outcome = outcome_of(&result);

    match (&result, format) {
        (Ok(report), OutputFormat::Text) => {
            println!("✓ Published {} files", report.entry.uploads.len());
            for upload in &report.entry.uploads {
                let location = match &config.storage.gateway {
                    Some(gateway) => gateway_url(gateway, upload),
                    None => upload.cid.clone(),
                };
                println!("  {:<24} {}", upload.name, location);
            }
            println!();
            if report.used_fallback_context {
                println!("  Research context unavailable, fallback text was used");
            }
            println!("  Duration: {}ms", report.duration_ms);
        }
        (Ok(report), OutputFormat::Json) => {
            let output = json!({
                "success": outcome.success,
                "manifest": report.entry,
                "used_fallback_context": report.used_fallback_context,
                "duration_ms": report.duration_ms
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        (Err(e), OutputFormat::Text) => {
            println!("✗ Generation failed: {}", e.user_hint());
        }
        (Err(_), OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    database.close().await?;

    result.map(|_| ()).map_err(Into::into)
}

/// Show recorded manifests, newest first
pub async fn handle_history(
    wallet: Option<String>,
    limit: usize,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let database = Database::new(&config.database_path())
        .await
        .context("Failed to open database")?;
    let repo = database.manifests();
    let owner_key = &config.manifest.owner_key;

    let entries: Vec<ManifestEntry> = match &wallet {
        Some(wallet) => repo.entries_for(owner_key, wallet, limit).await?,
        None => {
            let mut entries = repo.manifests(owner_key).await?;
            entries.reverse();
            entries.truncate(limit);
            entries
        }
    };

    match format {
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No manifests recorded");
                return Ok(());
            }

            println!("Manifest History (last {}):", limit);
            println!();

            for entry in &entries {
                println!("Folder: {}", entry.folder);
                println!("  Wallet: {}", entry.owner);
                println!("  Files: {}", entry.uploads.len());
                if let Some(readme) = entry.uploads.first() {
                    println!("  README: {}", readme.cid);
                }
                println!(
                    "  Created: {}",
                    entry.created_at.format("%Y-%m-%d %H:%M:%S")
                );
                println!();
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "manifests": entries,
                "count": entries.len(),
                "limit": limit
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Create the database and the configured manifest document
pub async fn handle_init(config: &Config, format: OutputFormat) -> Result<()> {
    let db_path = config.database_path();
    let database = Database::new(&db_path)
        .await
        .context("Failed to open database")?;

    let created = database
        .manifests()
        .ensure_owner(&config.manifest.owner_key)
        .await?;

    match format {
        OutputFormat::Text => {
            println!("Database: {}", db_path.display());
            if created {
                println!(
                    "✓ Created manifest document '{}'",
                    config.manifest.owner_key
                );
            } else {
                println!(
                    "✓ Manifest document '{}' already exists",
                    config.manifest.owner_key
                );
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "database": db_path,
                "owner_key": config.manifest.owner_key,
                "created": created
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    database.close().await
}

/// Validate configuration, credentials and database
pub async fn handle_doctor(
    config: &Config,
    secrets: Arc<SecretManager>,
    format: OutputFormat,
) -> Result<()> {
    let mut issues = Vec::new();
    let mut checks = Vec::new();

    // Config is already validated when loaded
    checks.push(("Configuration", "Valid"));

    if config.core.data_dir.exists() {
        checks.push(("Data directory", "Exists"));
    } else {
        checks.push(("Data directory", "Missing"));
        issues.push(format!(
            "Data directory does not exist: {:?}",
            config.core.data_dir
        ));
    }

    let db_path = config.database_path();
    if db_path.exists() {
        checks.push(("Database", "Exists"));

        match Database::new(&db_path).await {
            Ok(database) => {
                checks.push(("Database connection", "OK"));

                match database
                    .manifests()
                    .owner_exists(&config.manifest.owner_key)
                    .await
                {
                    Ok(true) => checks.push(("Manifest document", "Present")),
                    Ok(false) => {
                        checks.push(("Manifest document", "Missing"));
                        issues.push(
                            "Manifest document missing. Run 'codepin init' to create it."
                                .to_string(),
                        );
                    }
                    Err(e) => {
                        checks.push(("Manifest document", "Error"));
                        issues.push(format!("Cannot read manifest document: {}", e));
                    }
                }

                database.close().await.ok();
            }
            Err(e) => {
                checks.push(("Database connection", "Failed"));
                issues.push(format!("Cannot connect to database: {}", e));
            }
        }
    } else {
        checks.push(("Database", "Not initialized"));
        issues.push("Database not initialized. Run 'codepin init' to initialize.".to_string());
    }

    match generation_backend_ready(config, secrets.clone()).await {
        Ok(true) => checks.push(("Generation backend", "Ready")),
        Ok(false) => {
            checks.push(("Generation backend", "API key not configured"));
            issues.push(format!(
                "{} is not set. Generation will fail.",
                config.generation.api_key_env
            ));
        }
        Err(e) => {
            checks.push(("Generation backend", "Unavailable"));
            issues.push(format!("Cannot build generation backend: {}", e));
        }
    }

    if config.research.enabled {
        checks.push(("Research context", "Enabled"));
    } else {
        checks.push(("Research context", "Disabled (fallback text)"));
    }

    match config.storage.backend.as_str() {
        "pinata" => {
            if secrets.has_secret(&config.storage.jwt_env) {
                checks.push(("Pinata JWT", "Configured"));
            } else {
                checks.push(("Pinata JWT", "Not configured"));
                issues.push(format!(
                    "{} is not set. Uploads will fail.",
                    config.storage.jwt_env
                ));
            }
        }
        _ => checks.push(("Storage", "In-memory (uploads are not persisted)")),
    }

    match format {
        OutputFormat::Text => {
            println!("Codepin System Diagnostics");
            println!("============================");
            println!();

            println!("System Checks:");
            for (check, status) in &checks {
                println!("  {:<25} {}", format!("{}:", check), status);
            }

            println!();

            if issues.is_empty() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({
                        "name": name,
                        "status": status
                    })
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Build the configured chat backend and ask whether it can serve requests
async fn generation_backend_ready(
    config: &Config,
    secrets: Arc<SecretManager>,
) -> Result<bool, crate::llm::LLMError> {
    let backend = OpenAICompatibleBackend::from_config(&config.generation, secrets)?;
    Ok(backend.check_health().await)
}
