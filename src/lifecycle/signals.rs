//! OS signal handling.

use crate::lifecycle::shutdown::Shutdown;

/// Wait for Ctrl+C, then fire `shutdown`.
pub async fn shutdown_on_ctrl_c(shutdown: Shutdown) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Ctrl+C received, stopping"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C, stopping"),
    }
    shutdown.trigger();
}
