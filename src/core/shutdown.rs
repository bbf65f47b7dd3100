//! # OS termination signals.
//!
//! [`wait_for_shutdown_signal`] completes on the first termination signal and
//! names it, so the `ShutdownRequested` event can say what stopped the session.
//!
//! - Unix: `SIGINT` (Ctrl-C), `SIGTERM`, `SIGQUIT`
//! - elsewhere: Ctrl-C via [`tokio::signal::ctrl_c`]

/// Waits for a termination signal and returns its name.
///
/// Fails only if a signal handler cannot be registered.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv()  => "sigint",
        _ = sigterm.recv() => "sigterm",
        _ = sigquit.recv() => "sigquit",
    };
    Ok(name)
}

/// Waits for Ctrl-C.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl_c")
}
