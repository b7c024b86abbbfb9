//! Collaboration gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p collab-gateway
//! ```
//!
//! Configuration is loaded from environment variables; `JWT_SECRET` is
//! required.

use collab_common::{try_init_tracing, CollabConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match CollabConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let tracing_config = if config.env.is_production() {
        TracingConfig::production()
    } else {
        TracingConfig::development()
    };
    if let Err(e) = try_init_tracing(&tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.env,
        port = config.gateway.port,
        "Configuration loaded"
    );

    if let Err(e) = collab_gateway::run(config).await {
        error!(error = %e, "Gateway failed");
        std::process::exit(1);
    }
}
