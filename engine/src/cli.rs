//! CLI interface for Codepin
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for running the generation
//! pipeline from a terminal.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Codepin code generator
///
/// Generates a small Node.js project from a prompt, pins every file to IPFS
/// and records the upload manifest.
#[derive(Parser, Debug)]
#[command(name = "codepin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate, publish and record a project
    Generate {
        /// Wallet address the manifest is recorded for
        #[arg(short, long)]
        wallet: String,

        /// Folder name announced in the README
        #[arg(short, long)]
        folder: String,

        /// The coding task
        prompt: String,
    },

    /// Show recorded manifests
    History {
        /// Only show manifests for this wallet
        #[arg(short, long)]
        wallet: Option<String>,

        /// Number of manifests to show (default: 10)
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Create the database and the manifest document
    Init,

    /// Run system diagnostics
    Doctor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["codepin", "doctor"]);
        assert!(matches!(cli.command, Command::Doctor));
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["codepin", "--json", "--log", "debug", "init"]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
    }

    #[test]
    fn test_generate_command() {
        let cli = Cli::parse_from([
            "codepin",
            "generate",
            "--wallet",
            "0xABC",
            "--folder",
            "demo",
            "build a hello world server",
        ]);
        if let Command::Generate {
            wallet,
            folder,
            prompt,
        } = cli.command
        {
            assert_eq!(wallet, "0xABC");
            assert_eq!(folder, "demo");
            assert_eq!(prompt, "build a hello world server");
        } else {
            panic!("Expected Generate command");
        }
    }

    #[test]
    fn test_generate_requires_wallet() {
        let result = Cli::try_parse_from(["codepin", "generate", "--folder", "demo", "task"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_history_command() {
        let cli = Cli::parse_from(["codepin", "history", "--wallet", "0xABC", "--limit", "20"]);
        if let Command::History { wallet, limit } = cli.command {
            assert_eq!(wallet.as_deref(), Some("0xABC"));
            assert_eq!(limit, 20);
        } else {
            panic!("Expected History command");
        }
    }

    #[test]
    fn test_history_defaults() {
        let cli = Cli::parse_from(["codepin", "history"]);
        if let Command::History { wallet, limit } = cli.command {
            assert!(wallet.is_none());
            assert_eq!(limit, 10);
        } else {
            panic!("Expected History command");
        }
    }
}
