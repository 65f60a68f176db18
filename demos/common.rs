//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization
//! - Graceful exit handling

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use tracing_subscriber::EnvFilter;
use ws_rpc_endpoint::Endpoint;

// ============================================================================
// Constants
// ============================================================================

/// Default server address used by the demos.
pub const SERVER_ADDRESS: &str = "ws://localhost:10087/ws";

/// Default server-side group.
pub const GROUP: &str = "test";

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub no_wait: bool,
    pub address: String,
}

impl Args {
    /// Parse command-line arguments.
    ///
    /// `--address <url>` overrides [`SERVER_ADDRESS`].
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let address = args
            .iter()
            .position(|a| a == "--address")
            .and_then(|i| args.get(i + 1))
            .cloned()
            .unwrap_or_else(|| SERVER_ADDRESS.to_owned());

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            no_wait: args.iter().any(|a| a == "--no-wait"),
            address,
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "ws_rpc_endpoint=debug"
    } else {
        "ws_rpc_endpoint=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Serve until Ctrl+C, or return at once if `--no-wait` flag is set.
///
/// Returns early if the endpoint ends on its own.
pub async fn wait_for_exit(endpoint: &Endpoint, no_wait: bool) -> ws_rpc_endpoint::Result<()> {
    if no_wait {
        println!("[--no-wait] Skipping wait");
        endpoint.stop();
        return endpoint.join().await;
    }

    println!("Serving, press Ctrl+C to exit...");
    tokio::select! {
        result = endpoint.join() => result,
        _ = tokio::signal::ctrl_c() => {
            endpoint.stop();
            endpoint.join().await
        }
    }
}

/// Print registered procedures.
pub fn print_procedures(endpoint: &Endpoint) {
    println!("[Procedures] Registered:");
    for name in endpoint.registry().list() {
        println!("        - {name}");
    }
}
