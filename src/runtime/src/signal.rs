//! User interrupt handling.

/// Resolve when the user interrupts the process (Ctrl-C / SIGINT).
///
/// If the signal handler cannot be installed this never resolves, so a
/// broken handler is never mistaken for an interrupt.
pub async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::debug!(error = %e, "Unable to listen for interrupts");
        std::future::pending::<()>().await;
    }
}
