use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Resolve when SIGTERM or SIGINT arrives, returning the signal's name.
///
/// Falls back to `ctrl_c` alone if the Unix handlers cannot be registered.
pub async fn wait_for_signal() -> &'static str {
    let handlers = signal(SignalKind::terminate())
        .and_then(|term| signal(SignalKind::interrupt()).map(|int| (term, int)));

    match handlers {
        Ok((mut sigterm, mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Unix signal handlers unavailable, using ctrl-c only");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            "SIGINT"
        }
    }
}

/// Spawn a signal listener and return a token cancelled on the first signal.
///
/// The node uses the token to stop the dashboard, close the job queue, and
/// wait for workers to finish what is already buffered.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let name = wait_for_signal().await;
        tracing::info!(signal = name, "Shutdown requested, draining job queue");
        trigger.cancel();
    });

    token
}
