//! # Keys Subcommand
//!
//! API-key lifecycle management. `generate` and `rotate` print the
//! credential exactly once; only hashes are stored, so a lost secret
//! means another rotation.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};

use dsadmin_core::Settings;

/// Arguments for the `dsadmin keys` subcommand.
#[derive(Args, Debug)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommand,
}

/// Key lifecycle subcommands.
#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    /// Create a new API key and print the one-time credential.
    Generate {
        /// Key name (letters, digits, `-` and `_` only).
        name: String,

        /// Free-form description recorded alongside the key.
        description: String,

        /// Weeks until the key expires.
        #[arg(long, default_value_t = 12)]
        expiry_weeks: i64,
    },

    /// Replace a key's secret, leaving the old one valid for a grace window.
    Rotate {
        /// Name of the key to rotate.
        name: String,

        /// Weeks until the new secret expires.
        #[arg(long, default_value_t = 12)]
        expiry_weeks: i64,

        /// Weeks the old secret keeps working after rotation.
        #[arg(long, default_value_t = 4)]
        old_expiry_weeks: i64,
    },

    /// Revoke a key immediately. The row stays on record for audit.
    Expire {
        /// Name of the key to expire.
        name: String,
    },
}

pub fn run_keys(args: &KeysArgs, config: Option<&Path>) -> Result<u8> {
    let settings = Settings::load(config)?;
    let store = settings.key_store();

    match &args.command {
        KeysCommand::Generate {
            name,
            description,
            expiry_weeks,
        } => {
            let credential = store.generate(name, description, *expiry_weeks)?;
            println!("New API key (shown once, store it now):");
            println!("{credential}");
        }
        KeysCommand::Rotate {
            name,
            expiry_weeks,
            old_expiry_weeks,
        } => {
            let credential = store.rotate(name, *expiry_weeks, *old_expiry_weeks)?;
            println!("Rotated API key (shown once, store it now):");
            println!("{credential}");
        }
        KeysCommand::Expire { name } => {
            store.expire(name)?;
            println!("API key {name} expired");
        }
    }
    Ok(0)
}
