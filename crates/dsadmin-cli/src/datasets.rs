//! # Dataset Subcommands
//!
//! Catalog mutations driven from the command line. Each subcommand loads
//! the settings file, opens the catalog, and performs a single locked
//! mutation attributed to the `.cli` actor.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use dsadmin_core::{Settings, CLI_ACTOR};

/// Arguments for `dsadmin create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Dataset type (e.g. "EDDTableFromNcFiles").
    pub dataset_type: String,

    /// Unique dataset identifier.
    pub dataset_id: String,

    /// File containing the dataset configuration fragment.
    pub xml_file: PathBuf,

    /// Create the record active (the default).
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,

    /// Create the record inactive.
    #[arg(long)]
    pub inactive: bool,
}

/// Arguments for `dsadmin update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Identifier of the record to update.
    pub dataset_id: String,

    /// File containing the replacement configuration fragment.
    pub xml_file: PathBuf,

    /// Mark the record active after the update.
    #[arg(long, conflicts_with_all = ["inactive", "preserve_active"])]
    pub active: bool,

    /// Mark the record inactive after the update.
    #[arg(long, conflicts_with = "preserve_active")]
    pub inactive: bool,

    /// Keep the record's current active flag (the default).
    #[arg(long)]
    pub preserve_active: bool,
}

/// Arguments for `dsadmin activate` and `dsadmin deactivate`.
#[derive(Args, Debug)]
pub struct ActivateArgs {
    /// Identifier of the record.
    pub dataset_id: String,
}

impl UpdateArgs {
    /// Resolve the three flag spellings to the catalog's optional flag:
    /// `None` preserves whatever the record currently has.
    fn resolved_active(&self) -> Option<bool> {
        if self.active {
            Some(true)
        } else if self.inactive {
            Some(false)
        } else {
            None
        }
    }
}

pub fn run_create(args: &CreateArgs, config: Option<&Path>) -> Result<u8> {
    let settings = Settings::load(config)?;
    let catalog = settings.catalog();
    let body = read_fragment(&args.xml_file)?;
    let active = !args.inactive;
    catalog.add(&args.dataset_type, &args.dataset_id, &body, active, CLI_ACTOR)?;
    println!("Dataset {} created", args.dataset_id);
    Ok(0)
}

pub fn run_update(args: &UpdateArgs, config: Option<&Path>) -> Result<u8> {
    let settings = Settings::load(config)?;
    let catalog = settings.catalog();
    let body = read_fragment(&args.xml_file)?;
    catalog.update(&args.dataset_id, &body, args.resolved_active(), CLI_ACTOR)?;
    println!("Dataset {} updated", args.dataset_id);
    Ok(0)
}

pub fn run_activate(args: &ActivateArgs, config: Option<&Path>) -> Result<u8> {
    let settings = Settings::load(config)?;
    settings.catalog().activate(&args.dataset_id, CLI_ACTOR)?;
    println!("Dataset {} activated", args.dataset_id);
    Ok(0)
}

pub fn run_deactivate(args: &ActivateArgs, config: Option<&Path>) -> Result<u8> {
    let settings = Settings::load(config)?;
    settings.catalog().deactivate(&args.dataset_id, CLI_ACTOR)?;
    println!("Dataset {} deactivated", args.dataset_id);
    Ok(0)
}

fn read_fragment(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("could not read dataset XML from {}", path.display()))
}
