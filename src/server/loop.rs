// Server loop module
// Accepts connections until shutdown, then drains the active ones

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run the accept loop until `state.request_shutdown()` is called.
///
/// After shutdown the listener is closed and in-flight connections get up to
/// `performance.shutdown_timeout` seconds to finish.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = state.shutdown_requested() => {
                logger::log_shutdown("Shutdown requested, no longer accepting connections");
                break;
            }
        }
    }

    let local_addr = listener.local_addr()?;
    drop(listener);
    logger::log_shutdown(&format!("Listener on {local_addr} closed"));

    let timeout = Duration::from_secs(state.config.performance.shutdown_timeout);
    drain_connections(&active_connections, timeout).await;
    Ok(())
}

/// Wait for the connection counter to reach zero; `false` on timeout
async fn drain_connections(active: &AtomicUsize, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = active.load(Ordering::SeqCst);
        if remaining == 0 {
            logger::log_shutdown("All connections closed");
            return true;
        }
        if Instant::now() >= deadline {
            logger::log_shutdown(&format!(
                "{remaining} connection(s) still open after {}s, exiting anyway",
                timeout.as_secs()
            ));
            return false;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
