//! CLI command definitions and dispatch.

pub mod check;
pub mod reserve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use testpool_core::config::AppConfig;
use testpool_core::error::AppError;
use testpool_store::{AllocationStore, PoolService};

use crate::output::OutputFormat;

/// Test data portal: reserve test identifiers from the shared pool
#[derive(Debug, Parser)]
#[command(name = "testpool", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Pool file to use instead of the configured one
    #[arg(short, long)]
    pub pool: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check the pool file and repair missing columns
    Check,
    /// Reserve the next free identifier
    Reserve(reserve::ReserveArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = self.load_config()?;
        let service = PoolService::new(AllocationStore::from_config(&config.pool));

        match &self.command {
            Commands::Check => check::execute(&service, self.format).await,
            Commands::Reserve(args) => reserve::execute(args, &service, self.format).await,
        }
    }

    /// Load configuration from file, then apply command-line overrides
    fn load_config(&self) -> Result<AppConfig, AppError> {
        let mut config = AppConfig::from_file(&self.config)?;
        if let Some(pool) = &self.pool {
            config.pool.path = pool.clone();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testpool_store::RequestKind;

    #[test]
    fn test_parse_reserve_with_overrides() {
        let cli = Cli::try_parse_from([
            "testpool", "--format", "json", "--pool", "/tmp/pool.csv", "reserve", "--kind",
            "device", "--tag", "TC-9",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.pool.as_deref(), Some("/tmp/pool.csv"));
        match cli.command {
            Commands::Reserve(args) => {
                assert_eq!(args.kind, RequestKind::Device);
                assert_eq!(args.tag.as_deref(), Some("TC-9"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["testpool", "reserve", "--kind", "cabinet"]).is_err());
    }

    #[test]
    fn test_pool_override_applies() {
        let cli = Cli::try_parse_from([
            "testpool",
            "--config",
            "/nonexistent/testpool.toml",
            "--pool",
            "elsewhere.csv",
            "check",
        ])
        .unwrap();

        let config = cli.load_config().unwrap();
        assert_eq!(config.pool.path, "elsewhere.csv");
    }
}
