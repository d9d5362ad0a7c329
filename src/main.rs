use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use media_streamer::config::{AppState, Config};
use media_streamer::logger;
use media_streamer::media::Catalog;
use media_streamer::server::{create_reusable_listener, start_server_loop, start_signal_handler};

const DEFAULT_CONFIG_PATH: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;

    logger::init(&cfg)?;

    // Worker thread count from config, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let storage = cfg.storage.clone();
    let catalog = tokio::task::spawn_blocking(move || Catalog::load(&storage)).await??;

    let listener = create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg, catalog.len());

    let state = Arc::new(AppState::new(cfg, catalog));
    start_signal_handler(Arc::clone(&state))?;

    start_server_loop(listener, state, Arc::new(AtomicUsize::new(0))).await?;
    logger::log_shutdown("Server stopped");
    Ok(())
}
