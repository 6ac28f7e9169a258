//! Uplink - AgroSmart backend connectivity supervisor
//!
//! Probes the backend for reachability, keeps the process-wide
//! connectivity state, classifies failed API calls, and serves a status
//! dashboard with a manual retry.

pub mod api;
pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod io;
pub mod state;
pub mod supervisor;

pub use config::{load_config, Config};
pub use error::{Result, UplinkError};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::io::ReqwestHttpClient;
use crate::supervisor::Supervisor;

/// Run the uplink service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::new(config.backend.probe_timeout)?);
    let cancel = CancellationToken::new();
    let store = state::new_store_handle();

    let supervisor = Arc::new(Supervisor::new(
        Arc::clone(&store),
        Arc::clone(&http),
        &config.backend,
        cancel.clone(),
    ));

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl-c");
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    // Start dashboard if enabled
    if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let dashboard_store = Arc::clone(&store);
        let dashboard_supervisor = Arc::clone(&supervisor);
        let cancel_for_dashboard = cancel.clone();

        tokio::spawn(async move {
            let router = dashboard::build_router(dashboard_store, dashboard_supervisor);
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        dashboard_port,
                        e
                    );
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        });
    }

    tracing::info!(
        "Watching {} every {:?}",
        config.backend.health_url(),
        config.backend.poll_interval
    );

    // Run the supervisor (blocks until cancelled)
    supervisor.run().await;

    tracing::info!("Uplink supervisor stopped");
    Ok(())
}
