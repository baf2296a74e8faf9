//! # OS termination signals.
//!
//! [`shutdown_requested`] resolves with the name of the first termination signal
//! the process receives: `SIGINT`, `SIGTERM`, `SIGQUIT` or Ctrl-C on Unix, Ctrl-C
//! elsewhere. The supervisor turns it into a `ShutdownRequested` event.

use std::io;

/// Waits for a termination signal and returns its name.
///
/// With `enabled == false` it never completes, so a run is bounded by its
/// deadline alone (tests, embedding).
pub async fn shutdown_requested(enabled: bool) -> io::Result<&'static str> {
    if !enabled {
        return std::future::pending().await;
    }
    wait_for_signal().await
}

#[cfg(unix)]
async fn wait_for_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = tokio::signal::ctrl_c() => "ctrl-c",
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

#[cfg(not(unix))]
async fn wait_for_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn disabled_never_fires() {
        let res = tokio::time::timeout(Duration::from_secs(3600), shutdown_requested(false)).await;
        assert!(res.is_err());
    }
}
