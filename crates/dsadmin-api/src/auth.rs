//! # Authentication
//!
//! Every mutation route requires an `Authentication: Bearer name.secret`
//! header, verified against the key store before the catalog is touched.
//! (`Authentication`, not `Authorization` — the header name is part of
//! the wire contract inherited from the previous tooling.)
//!
//! Verification runs PBKDF2 at full round count, so it is bridged off
//! the async runtime with `spawn_blocking` like every other core call.

use axum::http::HeaderMap;
use tokio::task;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the bearer credential.
pub const AUTH_HEADER: &str = "Authentication";

/// Verify the request's credential and return the caller's key name.
///
/// A missing header, a non-UTF-8 value, or any verification failure all
/// produce the same 403 — nothing about which check failed is leaked.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<String, AppError> {
    let bearer = headers
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::Forbidden)?
        .to_string();

    let keys = state.keys.clone();
    task::spawn_blocking(move || keys.verify(&bearer))
        .await
        .map_err(|err| AppError::Internal(format!("verification task failed: {err}")))?
        .map_err(AppError::from)
}
