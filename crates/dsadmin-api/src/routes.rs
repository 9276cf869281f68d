//! # Mutation Routes
//!
//! The four catalog mutation endpoints. Bodies are accepted as loose
//! JSON and fields checked one by one so a missing field produces a 400
//! naming it, matching the wire contract of the previous tooling rather
//! than a generic deserialization rejection.
//!
//! The core is synchronous and holds a file lock for each mutation, so
//! every call is bridged through `spawn_blocking`.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tokio::task;

use dsadmin_core::Catalog;

use crate::auth::authenticate;
use crate::error::AppError;
use crate::state::AppState;

/// Success response body.
#[derive(Debug, Serialize)]
pub struct Confirmation {
    pub message: String,
}

fn confirmation(message: &str) -> Json<Confirmation> {
    Json(Confirmation {
        message: message.to_string(),
    })
}

/// Pull a required string field out of the request body.
fn required_str<'a>(body: &'a Value, field: &str, label: &str) -> Result<&'a str, AppError> {
    body.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::BadRequest(format!("Missing {label}")))
}

/// Pull the optional `is_active` flag out of the request body.
fn optional_active(body: &Value) -> Result<Option<bool>, AppError> {
    match body.get("is_active") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(_) => Err(AppError::BadRequest(
            "is_active must be a boolean".to_string(),
        )),
    }
}

/// Run a synchronous catalog operation off the async runtime.
async fn run_catalog<F>(catalog: std::sync::Arc<Catalog>, operation: F) -> Result<(), AppError>
where
    F: FnOnce(&Catalog) -> Result<(), dsadmin_core::CatalogError> + Send + 'static,
{
    task::spawn_blocking(move || operation(&catalog))
        .await
        .map_err(|err| AppError::Internal(format!("catalog task failed: {err}")))?
        .map_err(AppError::from)
}

/// `POST /create-dataset` — body `{id, type, xml, is_active?}`.
pub async fn create_dataset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Confirmation>, AppError> {
    let actor = authenticate(&state, &headers).await?;
    let id = required_str(&body, "id", "ID")?.to_string();
    let kind = required_str(&body, "type", "dataset type")?.to_string();
    let xml = required_str(&body, "xml", "XML content")?.to_string();
    let active = optional_active(&body)?.unwrap_or(true);

    run_catalog(state.catalog.clone(), move |catalog| {
        catalog.add(&kind, &id, &xml, active, &actor)
    })
    .await?;
    Ok(confirmation("Dataset created"))
}

/// `POST /update-dataset` — body `{id, xml, is_active?}`. An absent
/// `is_active` preserves the record's current flag.
pub async fn update_dataset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Confirmation>, AppError> {
    let actor = authenticate(&state, &headers).await?;
    let id = required_str(&body, "id", "ID")?.to_string();
    let xml = required_str(&body, "xml", "XML content")?.to_string();
    let active = optional_active(&body)?;

    run_catalog(state.catalog.clone(), move |catalog| {
        catalog.update(&id, &xml, active, &actor)
    })
    .await?;
    Ok(confirmation("Dataset updated"))
}

/// `POST /activate-dataset` — body `{id}`.
pub async fn activate_dataset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Confirmation>, AppError> {
    let actor = authenticate(&state, &headers).await?;
    let id = required_str(&body, "id", "ID")?.to_string();

    run_catalog(state.catalog.clone(), move |catalog| {
        catalog.activate(&id, &actor)
    })
    .await?;
    Ok(confirmation("Dataset activated"))
}

/// `POST /deactivate-dataset` — body `{id}`.
pub async fn deactivate_dataset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Confirmation>, AppError> {
    let actor = authenticate(&state, &headers).await?;
    let id = required_str(&body, "id", "ID")?.to_string();

    run_catalog(state.catalog.clone(), move |catalog| {
        catalog.deactivate(&id, &actor)
    })
    .await?;
    Ok(confirmation("Dataset deactivated"))
}
