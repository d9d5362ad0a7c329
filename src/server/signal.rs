// Signal handling module (nginx-style)
//
// Supported signals:
// - SIGHUP:  Reload the media catalog
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)
// - SIGUSR1: Reopen log files

use std::sync::Arc;

use crate::config::AppState;
use crate::logger;

/// Register signal handlers and spawn the task that services them.
///
/// | Signal  | Action              | Nginx Equivalent  |
/// |---------|---------------------|-------------------|
/// | SIGHUP  | Reload catalog      | `nginx -s reload` |
/// | SIGTERM | Graceful stop       | `nginx -s quit`   |
/// | SIGINT  | Graceful stop       | Ctrl+C            |
/// | SIGUSR1 | Reopen log files    | `nginx -s reopen` |
///
/// Must be called from within the Tokio runtime.
#[cfg(unix)]
pub fn start_signal_handler(state: Arc<AppState>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    logger::log_signal(&format!(
        "Handlers registered for pid {}: HUP reloads catalog, TERM/INT stop, USR1 reopens logs",
        std::process::id()
    ));

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    logger::log_signal("SIGHUP received, reloading media catalog");
                    match state.reload_catalog().await {
                        Ok(count) => logger::log_signal(&format!("Catalog reloaded: {count} items")),
                        Err(e) => logger::log_error(&format!(
                            "Catalog reload failed, keeping previous catalog: {e}"
                        )),
                    }
                }

                _ = sigterm.recv() => {
                    logger::log_signal("SIGTERM received, initiating graceful shutdown");
                    state.request_shutdown();
                    break;
                }

                _ = sigint.recv() => {
                    logger::log_signal("SIGINT received, initiating graceful shutdown");
                    state.request_shutdown();
                    break;
                }

                _ = sigusr1.recv() => {
                    match logger::reopen() {
                        Ok(()) => logger::log_signal("SIGUSR1 received, log files reopened"),
                        Err(e) => logger::log_error(&format!("Failed to reopen log files: {e}")),
                    }
                }
            }
        }
    });

    Ok(())
}

/// Non-Unix fallback: only Ctrl+C is supported
#[cfg(not(unix))]
pub fn start_signal_handler(state: Arc<AppState>) -> std::io::Result<()> {
    logger::log_signal("Only Ctrl+C is supported on this platform");

    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_signal("Ctrl+C received, initiating graceful shutdown");
            state.request_shutdown();
        }
    });

    Ok(())
}
