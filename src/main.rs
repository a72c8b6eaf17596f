//! Egg Timer - A single countdown timer whose state survives restarts
//!
//! This is the main entry point for the egg-timer application.

use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::{info, warn};

use egg_timer::{
    config::Config,
    state::AppState,
    api::create_router,
    services::{FileValueStore, MemoryValueStore, TokioDriver},
    tasks::spawn_timer,
    utils::shutdown_signal,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("egg_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting egg-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, tick={}ms",
          config.host, config.port, config.tick_ms);

    // Start the timer state machine on top of the configured store
    let driver = TokioDriver::new(config.tick_interval());
    let timer = if config.ephemeral {
        info!("Running with an in-memory store, the timer will not survive restarts");
        spawn_timer(Arc::new(MemoryValueStore::new()), driver)
    } else {
        let store = FileValueStore::open(&config.data_file).await?;
        spawn_timer(Arc::new(store), driver)
    };
    let mut timer_states = timer.subscribe();

    // Create HTTP router with all endpoints
    let state = Arc::new(AppState::new(timer, config.port, config.host.clone()));
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/input             - Set pending duration text ({{\"text\": \"60\"}})");
    info!("  POST /timer/start             - Start, resume, or report empty input");
    info!("  POST /timer/pause             - Pause the countdown");
    info!("  POST /timer/unpause           - Continue the countdown");
    info!("  POST /timer/stop              - Stop and clear the timer");
    info!("  POST /timer/reset-input-error - Acknowledge the empty input error");
    info!("  POST /timer/tick              - Report remaining time ({{\"remaining_ms\": 1000}})");
    info!("  GET  /timer                   - Current timer state");
    info!("  GET  /health                  - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Once the last handle is gone the machine flushes its writes and exits.
    // Open connections may still hold a handle, so do not wait forever.
    let drained = async { while timer_states.changed().await.is_ok() {} };
    if tokio::time::timeout(SHUTDOWN_GRACE, drained).await.is_err() {
        warn!("Timer did not stop within {:?}, exiting anyway", SHUTDOWN_GRACE);
    }

    info!("Server shutdown complete");
    Ok(())
}
