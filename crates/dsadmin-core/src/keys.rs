//! # API Key Store
//!
//! Credential lifecycle for the keys that authorize catalog mutations:
//! generation, rotation with a grace window, expiry, and verification.
//! No external identity provider; the store is one CSV file.
//!
//! ## Key material
//!
//! A caller presents `name.secret`. The secret is never persisted: the
//! store keeps `hash = PBKDF2-HMAC-SHA256(secret, salt, 300_000 rounds)`
//! and the per-key random salt. Rotation moves the current hash/salt
//! into the `old_*` columns with their own expiry, so the previous
//! secret keeps authenticating until the grace window closes.
//!
//! ## Locking
//!
//! Generation, rotation, and expiry hold the file's advisory lock for
//! their read-modify-write span. Verification reads without the lock:
//! writers replace the whole file only while holding it, so a reader
//! sees either the previous or the next snapshot, never a torn one.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::lock::{FileLock, LockError};
use crate::record::{format_timestamp, parse_timestamp};

/// PBKDF2-HMAC-SHA256 round count for stored hashes.
pub const PBKDF2_ROUNDS: u32 = 300_000;

/// Random bytes in a generated secret (base64url, no padding).
const SECRET_BYTES: usize = 48;

/// Random bytes in a generated salt (hex).
const SALT_BYTES: usize = 32;

/// Credential store failure.
///
/// [`KeyError::Unauthenticated`] deliberately carries no detail: whether
/// the name was unknown, the secret wrong, or the key expired must not be
/// distinguishable by a caller probing the store.
#[derive(Error, Debug)]
pub enum KeyError {
    /// Key names are restricted to letters, digits, `_`, and `-`.
    #[error("invalid key name: {0}")]
    InvalidName(String),

    /// An entry with this name already exists.
    #[error("key list already contains an entry named {0}")]
    DuplicateName(String),

    /// No entry with this name exists.
    #[error("key list does not contain an entry named {0}")]
    NotFound(String),

    /// An expiry offset that does not fit in a timestamp.
    #[error("expiry weeks out of range: {0}")]
    InvalidExpiry(i64),

    /// The presented credential did not authenticate.
    #[error("invalid API key")]
    Unauthenticated,

    /// The key file lock could not be obtained.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Reading or writing the key file failed.
    #[error("key file error: {0}")]
    Io(#[from] std::io::Error),

    /// The key file is not a readable CSV table.
    #[error("key file parse error: {0}")]
    Csv(#[from] csv::Error),

    /// A stored timestamp does not match the fixed format.
    #[error("malformed timestamp in key file: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

/// Time source, injected so expiry logic is testable with a fixed clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of secrets and salts, injected so generation is testable with
/// fixed randomness.
pub trait SecretSource: Send + Sync {
    /// A fresh high-entropy secret, as presented to the administrator.
    fn secret(&self) -> String;
    /// A fresh per-key salt, as persisted next to the hash.
    fn salt(&self) -> String;
}

/// OS randomness: 48-byte base64url secrets, 32-byte hex salts.
#[derive(Debug, Default)]
pub struct OsRngSecrets;

impl SecretSource for OsRngSecrets {
    fn secret(&self) -> String {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    fn salt(&self) -> String {
        let mut bytes = [0u8; SALT_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// One row of the credential file.
///
/// `old_hash`/`old_salt`/`old_expiry` are empty except inside the
/// interval between a rotation and the old key's expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub name: String,
    pub hash: String,
    pub expiry: DateTime<Utc>,
    pub salt: String,
    pub old_hash: String,
    pub old_expiry: Option<DateTime<Utc>>,
    pub old_salt: String,
    pub description: String,
}

/// The credential store: one CSV file plus its advisory lock.
pub struct KeyStore {
    path: PathBuf,
    lock: FileLock,
    clock: Box<dyn Clock>,
    secrets: Box<dyn SecretSource>,
}

impl KeyStore {
    /// Store over `path` with the system clock and OS randomness.
    pub fn new(path: impl Into<PathBuf>, lock: FileLock) -> Self {
        Self {
            path: path.into(),
            lock,
            clock: Box::new(SystemClock),
            secrets: Box::new(OsRngSecrets),
        }
    }

    /// Convenience constructor building the lock from the target path.
    pub fn open(path: impl Into<PathBuf>, max_attempts: u32, retry_delay: Duration) -> Self {
        let path = path.into();
        let lock = FileLock::new(&path, max_attempts, retry_delay);
        Self::new(path, lock)
    }

    /// Replace the clock (tests).
    #[must_use]
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the secret source (tests).
    #[must_use]
    pub fn with_secret_source(mut self, secrets: Box<dyn SecretSource>) -> Self {
        self.secrets = secrets;
        self
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a key and return the presentable `name.secret` string.
    ///
    /// The secret is shown exactly once; only its hash survives.
    pub fn generate(
        &self,
        name: &str,
        description: &str,
        expiry_weeks: i64,
    ) -> Result<String, KeyError> {
        if !valid_name(name) {
            return Err(KeyError::InvalidName(name.to_string()));
        }
        let expiry_offset = weeks(expiry_weeks)?;
        let _guard = self.lock.acquire()?;
        let mut entries = self.read_entries()?;
        if entries.iter().any(|entry| entry.name == name) {
            return Err(KeyError::DuplicateName(name.to_string()));
        }

        let secret = self.secrets.secret();
        let salt = self.secrets.salt();
        entries.push(KeyEntry {
            name: name.to_string(),
            hash: hash_secret(&secret, &salt),
            expiry: self.clock.now() + expiry_offset,
            salt,
            old_hash: String::new(),
            old_expiry: None,
            old_salt: String::new(),
            description: description.to_string(),
        });
        self.write_entries(&entries)?;
        tracing::info!(name = %name, "API key created");
        Ok(format!("{name}.{secret}"))
    }

    /// Rotate a key: current material moves to the `old_*` columns with a
    /// grace window of `old_expiry_weeks`, fresh material replaces it.
    /// Returns the new `name.secret`, shown exactly once.
    pub fn rotate(
        &self,
        name: &str,
        expiry_weeks: i64,
        old_expiry_weeks: i64,
    ) -> Result<String, KeyError> {
        let expiry_offset = weeks(expiry_weeks)?;
        let old_expiry_offset = weeks(old_expiry_weeks)?;
        let _guard = self.lock.acquire()?;
        let mut entries = self.read_entries()?;
        let entry = entries
            .iter_mut()
            .find(|entry| entry.name == name)
            .ok_or_else(|| KeyError::NotFound(name.to_string()))?;

        let now = self.clock.now();
        let secret = self.secrets.secret();
        let salt = self.secrets.salt();
        entry.old_hash = std::mem::take(&mut entry.hash);
        entry.old_salt = std::mem::replace(&mut entry.salt, salt);
        entry.old_expiry = Some(now + old_expiry_offset);
        entry.hash = hash_secret(&secret, &entry.salt);
        entry.expiry = now + expiry_offset;
        self.write_entries(&entries)?;
        tracing::info!(name = %name, "API key rotated");
        Ok(format!("{name}.{secret}"))
    }

    /// Revoke a key immediately. The row stays on record for audit; both
    /// current and previous material stop verifying.
    pub fn expire(&self, name: &str) -> Result<(), KeyError> {
        let _guard = self.lock.acquire()?;
        let mut entries = self.read_entries()?;
        let entry = entries
            .iter_mut()
            .find(|entry| entry.name == name)
            .ok_or_else(|| KeyError::NotFound(name.to_string()))?;

        entry.hash = String::new();
        entry.expiry = self.clock.now();
        entry.old_hash = String::new();
        entry.old_expiry = None;
        self.write_entries(&entries)?;
        tracing::info!(name = %name, "API key expired");
        Ok(())
    }

    /// Verify a `Bearer name.secret` header value and return the key name.
    ///
    /// Checks current material first, then the previous material inside
    /// its grace window. Hash comparison is constant-time. Every failure
    /// mode collapses into [`KeyError::Unauthenticated`].
    pub fn verify(&self, bearer: &str) -> Result<String, KeyError> {
        let presented = bearer
            .strip_prefix("Bearer ")
            .ok_or(KeyError::Unauthenticated)?
            .trim_matches(' ');
        let (name, secret) = presented.split_once('.').ok_or(KeyError::Unauthenticated)?;

        let entries = self.read_entries()?;
        let entry = entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or(KeyError::Unauthenticated)?;

        let now = self.clock.now();
        if now < entry.expiry && hashes_match(&hash_secret(secret, &entry.salt), &entry.hash) {
            tracing::info!(name = %name, "access granted");
            return Ok(name.to_string());
        }
        if let Some(old_expiry) = entry.old_expiry {
            if now < old_expiry
                && hashes_match(&hash_secret(secret, &entry.old_salt), &entry.old_hash)
            {
                tracing::info!(name = %name, "access granted via previous key");
                return Ok(name.to_string());
            }
        }
        Err(KeyError::Unauthenticated)
    }

    /// All entries. Missing file reads as empty.
    pub fn entries(&self) -> Result<Vec<KeyEntry>, KeyError> {
        self.read_entries()
    }

    fn read_entries(&self) -> Result<Vec<KeyEntry>, KeyError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;
        let mut entries = Vec::new();
        for row in reader.records() {
            let row = row?;
            if row.iter().all(|field| field.is_empty()) {
                continue;
            }
            let field = |index: usize| row.get(index).unwrap_or("").to_string();
            let old_expiry_text = field(5);
            entries.push(KeyEntry {
                name: field(0),
                hash: field(1),
                expiry: parse_timestamp(&field(2))?,
                salt: field(3),
                old_hash: field(4),
                old_expiry: if old_expiry_text.is_empty() {
                    None
                } else {
                    Some(parse_timestamp(&old_expiry_text)?)
                },
                old_salt: field(6),
                description: field(7),
            });
        }
        Ok(entries)
    }

    /// Write the whole table. Column order is fixed: name, hash, expiry,
    /// salt, old_hash, old_expiry, old_salt, description.
    fn write_entries(&self, entries: &[KeyEntry]) -> Result<(), KeyError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        for entry in entries {
            writer.write_record([
                entry.name.as_str(),
                entry.hash.as_str(),
                &format_timestamp(&entry.expiry),
                entry.salt.as_str(),
                entry.old_hash.as_str(),
                &entry
                    .old_expiry
                    .map(|at| format_timestamp(&at))
                    .unwrap_or_default(),
                entry.old_salt.as_str(),
                entry.description.as_str(),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| KeyError::Io(err.into_error()))?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore").field("path", &self.path).finish()
    }
}

/// An expiry offset in weeks, rejecting values a timestamp cannot hold.
/// `chrono::Duration::weeks` panics out of range; week counts arrive
/// straight from `--expiry-weeks`, so they go through `try_weeks`.
fn weeks(count: i64) -> Result<chrono::Duration, KeyError> {
    chrono::Duration::try_weeks(count).ok_or(KeyError::InvalidExpiry(count))
}

/// Names are used as file-table keys and inside bearer strings, so the
/// charset is restricted to letters, digits, `_`, and `-`.
fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

/// PBKDF2-HMAC-SHA256 of the secret under the given salt, hex-encoded.
fn hash_secret(secret: &str, salt: &str) -> String {
    let mut derived = [0u8; 32];
    pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS, &mut derived);
    hex::encode(derived)
}

/// Constant-time hash comparison. A length mismatch still performs a
/// dummy comparison so timing does not reveal whether lengths matched.
fn hashes_match(computed: &str, stored: &str) -> bool {
    let computed = computed.as_bytes();
    let stored = stored.as_bytes();
    if computed.len() != stored.len() {
        let _ = computed.ct_eq(computed);
        return false;
    }
    computed.ct_eq(stored).into()
}
