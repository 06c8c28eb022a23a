use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use livesfu::config;
use livesfu::http;
use livesfu::keyframe::run_keyframe_dispatcher;
use livesfu::lifecycle::run_inactivity_sweep;
use livesfu::logging;
use livesfu::metrics::register_metrics;
use livesfu::presence::{InMemoryPresenceStore, StaticUserProfileStore};
use livesfu::{AppState, RoomRegistry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::validate_env().unwrap_or_else(|e| {
        eprintln!("Environment validation failed: {}", e);
        std::process::exit(1);
    });

    logging::init(cfg.env, cfg.logger_enabled);
    register_metrics();

    // No real presence/user-profile backend is wired in this core; a
    // deployment replaces these with its own "live database" and user
    // store, per the external-interfaces contract.
    let presence = InMemoryPresenceStore::new();
    let registry = RoomRegistry::new(presence);
    let state = AppState {
        registry: registry.clone(),
        user_profiles: Arc::new(StaticUserProfileStore),
        base_link: cfg.base_link.clone().into(),
    };

    let cancel = CancellationToken::new();
    let keyframe_handle = tokio::spawn(run_keyframe_dispatcher(registry.clone(), cancel.clone()));
    let sweep_handle = tokio::spawn(run_inactivity_sweep(registry.clone(), cancel.clone()));

    let app = http::router(state).route(
        "/metrics",
        axum::routing::get(|| async {
            use prometheus::Encoder;
            let encoder = prometheus::TextEncoder::new();
            let mut buffer = vec![];
            let metric_families = prometheus::gather();
            encoder.encode(&metric_families, &mut buffer).unwrap();
            String::from_utf8(buffer).unwrap()
        }),
    );

    let addr = format!("0.0.0.0:{}", cfg.port);
    info!(app_name = %cfg.app_name, %addr, "starting {}", cfg.app_name);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let shutdown_signal = async {
        signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
        info!("received shutdown signal");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("shutting down background tasks");
    cancel.cancel();
    let _ = tokio::join!(keyframe_handle, sweep_handle);

    Ok(())
}
