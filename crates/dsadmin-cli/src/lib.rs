//! # dsadmin-cli — Catalog Administration CLI
//!
//! Provides the `dsadmin` command-line interface for operators working
//! directly on the dataset catalog and the API-key credential table.
//!
//! ## Subcommands
//!
//! - `dsadmin create` — Add a new dataset record to the catalog.
//! - `dsadmin update` — Replace the configuration body of a record.
//! - `dsadmin activate` / `dsadmin deactivate` — Flip a record's active flag.
//! - `dsadmin keys` — Generate, rotate, and expire API keys.
//!
//! All mutations go through the same locked code paths as the HTTP API,
//! so the CLI can be used safely while the service is running. Audit log
//! lines attribute CLI mutations to the `.cli` actor.

pub mod datasets;
pub mod keys;

pub use datasets::{
    run_activate, run_create, run_deactivate, run_update, ActivateArgs, CreateArgs, UpdateArgs,
};
pub use keys::{run_keys, KeysArgs};
