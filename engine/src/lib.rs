//! Codepin Engine Library
//!
//! This library provides the generation pipeline and its adapters.
//! It is used by the CLI binary, the API server and integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// Telemetry and Observability
pub mod telemetry;

/// Chat backend abstraction layer
pub mod llm;

/// Research context providers
pub mod context;

/// Content-addressed storage backends
pub mod storage;

/// Database persistence module
pub mod db;

/// Generation pipeline
pub mod pipeline;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
