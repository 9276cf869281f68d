//! # dsadmin-core — Catalog, Credentials, and the Lock Between Them
//!
//! Core of the dsadmin toolchain. Two small persistent stores sit behind
//! plain mutation functions:
//!
//! - the **catalog** ([`catalog::Catalog`]) — an ERDDAP-style XML document
//!   of dataset configuration records, and
//! - the **key store** ([`keys::KeyStore`]) — a CSV table of API keys that
//!   authorize catalog mutations.
//!
//! Both serialize mutating access through the marker-file advisory lock in
//! [`lock`], which works on filesystems with no native locking guarantee.
//! Between operations the files are the only durable state; nothing is
//! cached across calls, and no operation ever locks both files at once.
//!
//! ## Crate Policy
//!
//! - Operations are synchronous; concurrency comes only from multiple
//!   callers, and the per-file lock serializes them.
//! - Dependencies are explicit: paths and lock budgets arrive through
//!   [`config::Settings`], time and randomness through the [`keys::Clock`]
//!   and [`keys::SecretSource`] traits.
//! - No `unsafe`, no `panic!()`/`.unwrap()` outside tests.

pub mod catalog;
pub mod config;
pub mod keys;
pub mod lock;
pub mod record;

pub use catalog::{Catalog, CatalogError, DatasetRecord};
pub use config::{Settings, SettingsError};
pub use keys::{KeyError, KeyStore};
pub use lock::{FileLock, LockError, LockGuard};

/// Audit identity for mutations made outside the HTTP boundary.
pub const CLI_ACTOR: &str = ".cli";
