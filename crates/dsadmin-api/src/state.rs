//! # Application State
//!
//! Shared state for the Axum application: the two core components,
//! constructed once from [`Settings`] and cloned into every handler.
//! The components themselves hold no cross-request state — each
//! operation re-reads its backing file under the lock — so sharing them
//! is only a matter of sharing their configuration.

use std::sync::Arc;

use dsadmin_core::{Catalog, KeyStore, Settings};

/// State handed to route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub keys: Arc<KeyStore>,
}

impl AppState {
    /// Build the components from loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            catalog: Arc::new(settings.catalog()),
            keys: Arc::new(settings.key_store()),
        }
    }
}
