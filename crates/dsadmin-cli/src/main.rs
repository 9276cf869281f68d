//! # dsadmin — Catalog Administration CLI Entry Point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Uses clap derive macros for the argument surface and tracing for
//! diagnostics, with verbosity controlled by repeated `-v` flags.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dsadmin_cli::{
    run_activate, run_create, run_deactivate, run_keys, run_update, ActivateArgs, CreateArgs,
    KeysArgs, UpdateArgs,
};

/// Administration tool for the dataset catalog and API-key table.
#[derive(Parser, Debug)]
#[command(name = "dsadmin", version, about)]
struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the settings file (defaults to $DSADMIN_CONFIG, then ./dsadmin.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a new dataset record to the catalog.
    Create(CreateArgs),

    /// Replace the configuration body of an existing record.
    Update(UpdateArgs),

    /// Set a record's active flag to true.
    Activate(ActivateArgs),

    /// Set a record's active flag to false.
    Deactivate(ActivateArgs),

    /// Generate, rotate, and expire API keys.
    Keys(KeysArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Create(args) => run_create(&args, config),
        Commands::Update(args) => run_update(&args, config),
        Commands::Activate(args) => run_activate(&args, config),
        Commands::Deactivate(args) => run_deactivate(&args, config),
        Commands::Keys(args) => run_keys(&args, config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsadmin_cli::keys::KeysCommand;

    #[test]
    fn cli_parse_create_with_inactive() {
        let cli =
            Cli::try_parse_from(["dsadmin", "create", "EDDGridFromDap", "sst", "sst.xml", "--inactive"])
                .unwrap();
        match cli.command {
            Commands::Create(args) => {
                assert_eq!(args.dataset_type, "EDDGridFromDap");
                assert_eq!(args.dataset_id, "sst");
                assert!(args.inactive);
                assert!(!args.active);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_conflicting_flags() {
        assert!(Cli::try_parse_from([
            "dsadmin", "update", "sst", "sst.xml", "--active", "--inactive"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "dsadmin", "update", "sst", "sst.xml", "--inactive", "--preserve-active"
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_keys_rotate_defaults() {
        let cli = Cli::try_parse_from(["dsadmin", "keys", "rotate", "ops"]).unwrap();
        match cli.command {
            Commands::Keys(KeysArgs {
                command:
                    KeysCommand::Rotate {
                        name,
                        expiry_weeks,
                        old_expiry_weeks,
                    },
            }) => {
                assert_eq!(name, "ops");
                assert_eq!(expiry_weeks, 12);
                assert_eq!(old_expiry_weeks, 4);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parse_global_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["dsadmin", "activate", "sst", "--config", "/etc/dsadmin.toml"])
                .unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/etc/dsadmin.toml")));
        assert!(matches!(cli.command, Commands::Activate(_)));
    }
}
