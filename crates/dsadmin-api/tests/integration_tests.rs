//! # Integration Tests for dsadmin-api
//!
//! Exercises the four mutation routes end to end against real temp-dir
//! backing files: authentication (missing, malformed, wrong, rotated),
//! field validation, status mapping, and that rejected requests leave
//! the catalog untouched.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use dsadmin_api::state::AppState;
use dsadmin_core::{Catalog, FileLock, KeyStore};

const SEED: &str = "<erddapDatasets>\n\
    <dataset active=\"true\" datasetID=\"d1\" type=\"glider\"><attr>x</attr></dataset>\n\
    </erddapDatasets>\n";

struct TestHarness {
    _dir: TempDir,
    app: axum::Router,
    catalog: Arc<Catalog>,
    /// A valid `name.secret` credential for the `ops` key.
    credential: String,
}

fn harness() -> TestHarness {
    let dir = TempDir::new().unwrap();
    let dataset_file = dir.path().join("datasets.xml");
    let key_file = dir.path().join("api-keys.csv");
    std::fs::write(&dataset_file, SEED).unwrap();

    let delay = Duration::from_millis(5);
    let catalog = Arc::new(Catalog::new(
        &dataset_file,
        FileLock::new(&dataset_file, 3, delay),
    ));
    let keys = Arc::new(KeyStore::new(&key_file, FileLock::new(&key_file, 3, delay)));
    let credential = keys.generate("ops", "test key", 12).unwrap();

    let state = AppState {
        catalog: catalog.clone(),
        keys,
    };
    TestHarness {
        _dir: dir,
        app: dsadmin_api::app(state),
        catalog,
        credential,
    }
}

fn post(uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(bearer) = auth {
        builder = builder.header("Authentication", bearer);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_needs_no_credentials() {
    let harness = harness();
    let response = harness
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_dataset_with_valid_key() {
    let harness = harness();
    let bearer = format!("Bearer {}", harness.credential);
    let response = harness
        .app
        .oneshot(post(
            "/create-dataset",
            Some(&bearer),
            serde_json::json!({"id": "d2", "type": "buoy", "xml": "<attr>y</attr>"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Dataset created"));

    let records = harness.catalog.records().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].id, "d2");
    assert_eq!(records[1].kind, "buoy");
    assert!(records[1].active);
}

#[tokio::test]
async fn missing_header_is_403_and_catalog_untouched() {
    let harness = harness();
    let response = harness
        .app
        .oneshot(post(
            "/create-dataset",
            None,
            serde_json::json!({"id": "d2", "type": "buoy", "xml": "<attr>y</attr>"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(harness.catalog.records().unwrap().len(), 1);
}

#[tokio::test]
async fn wrong_secret_is_403() {
    let harness = harness();
    let response = harness
        .app
        .oneshot(post(
            "/activate-dataset",
            Some("Bearer ops.not-the-secret"),
            serde_json::json!({"id": "d1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    // The body must not reveal which check failed.
    assert!(body_string(response).await.contains("invalid API key"));
}

#[tokio::test]
async fn missing_field_is_400_naming_the_field() {
    let harness = harness();
    let bearer = format!("Bearer {}", harness.credential);
    let response = harness
        .app
        .oneshot(post(
            "/create-dataset",
            Some(&bearer),
            serde_json::json!({"id": "d2", "xml": "<attr>y</attr>"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("Missing dataset type"));
}

#[tokio::test]
async fn duplicate_id_is_400() {
    let harness = harness();
    let bearer = format!("Bearer {}", harness.credential);
    let response = harness
        .app
        .oneshot(post(
            "/create-dataset",
            Some(&bearer),
            serde_json::json!({"id": "d1", "type": "buoy", "xml": "<attr>y</attr>"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("already exists"));
}

#[tokio::test]
async fn update_unknown_id_is_400() {
    let harness = harness();
    let bearer = format!("Bearer {}", harness.credential);
    let response = harness
        .app
        .oneshot(post(
            "/update-dataset",
            Some(&bearer),
            serde_json::json!({"id": "ghost", "xml": "<attr>y</attr>"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("no such dataset"));
}

#[tokio::test]
async fn update_without_is_active_preserves_flag() {
    let harness = harness();
    let bearer = format!("Bearer {}", harness.credential);
    let response = harness
        .app
        .oneshot(post(
            "/update-dataset",
            Some(&bearer),
            serde_json::json!({"id": "d1", "xml": "<attr>updated</attr>"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let records = harness.catalog.records().unwrap();
    assert_eq!(records[0].kind, "glider");
    assert!(records[0].active);
    assert_eq!(records[0].body, "<attr>updated</attr>");
}

#[tokio::test]
async fn deactivate_then_activate_round_trip() {
    let harness = harness();
    let bearer = format!("Bearer {}", harness.credential);

    let response = harness
        .app
        .clone()
        .oneshot(post(
            "/deactivate-dataset",
            Some(&bearer),
            serde_json::json!({"id": "d1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!harness.catalog.records().unwrap()[0].active);

    let response = harness
        .app
        .oneshot(post(
            "/activate-dataset",
            Some(&bearer),
            serde_json::json!({"id": "d1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(harness.catalog.records().unwrap()[0].active);
}

#[tokio::test]
async fn rotated_key_old_secret_still_works_in_grace_window() {
    let harness = harness();
    let old_bearer = format!("Bearer {}", harness.credential);

    let state_keys = {
        // Rotate directly through the store the app shares.
        let dir_key_file = harness.catalog.path().parent().unwrap().join("api-keys.csv");
        KeyStore::new(
            &dir_key_file,
            FileLock::new(&dir_key_file, 3, Duration::from_millis(5)),
        )
    };
    let new_credential = state_keys.rotate("ops", 12, 4).unwrap();

    let response = harness
        .app
        .clone()
        .oneshot(post(
            "/activate-dataset",
            Some(&old_bearer),
            serde_json::json!({"id": "d1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = harness
        .app
        .oneshot(post(
            "/activate-dataset",
            Some(&format!("Bearer {new_credential}")),
            serde_json::json!({"id": "d1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
