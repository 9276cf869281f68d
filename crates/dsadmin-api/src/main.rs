//! # dsadmin-api — Binary Entry Point
//!
//! Loads settings, builds the router, and serves on a configurable port
//! (default 8080, `PORT` env).

use dsadmin_api::state::AppState;
use dsadmin_core::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load(None).map_err(|err| {
        tracing::error!("configuration error: {err}");
        err
    })?;
    tracing::info!(
        dataset_file = %settings.dataset_file.display(),
        key_file = %settings.key_file.display(),
        "settings loaded"
    );

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080);

    let app = dsadmin_api::app(AppState::from_settings(&settings));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("dsadmin API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
