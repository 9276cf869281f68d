//! # dsadmin-api — HTTP Service for Catalog Administration
//!
//! Axum service exposing the dataset catalog mutations over four POST
//! endpoints, each authorized by an API key from the credential store:
//!
//! | Route                 | Body                          | Operation      |
//! |-----------------------|-------------------------------|----------------|
//! | `/create-dataset`     | `{id, type, xml, is_active?}` | add            |
//! | `/update-dataset`     | `{id, xml, is_active?}`       | update         |
//! | `/activate-dataset`   | `{id}`                        | set active     |
//! | `/deactivate-dataset` | `{id}`                        | clear active   |
//!
//! `GET /health` is mounted without authentication for liveness probes.
//!
//! Status mapping: 200 on success, 400 for user-correctable failures
//! (duplicate id, unknown id, malformed input, missing fields), 403 for
//! any credential failure, 500 for lock contention and I/O.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/create-dataset", post(routes::create_dataset))
        .route("/update-dataset", post(routes::update_dataset))
        .route("/activate-dataset", post(routes::activate_dataset))
        .route("/deactivate-dataset", post(routes::deactivate_dataset))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe.
async fn health() -> &'static str {
    "ok"
}
