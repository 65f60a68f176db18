//! Basic endpoint demonstration.
//!
//! Demonstrates:
//! - Building an endpoint with a group query parameter
//! - Registering completion-style and plain procedures
//! - Watching connection state changes
//!
//! Run a server on `ws://localhost:10087/ws` that sends request envelopes,
//! for example `{"id":"r2","action":"base64","params":["hi"]}`.
//!
//! Usage:
//!   cargo run --example 001_basic_endpoint
//!   cargo run --example 001_basic_endpoint -- --no-wait
//!   cargo run --example 001_basic_endpoint -- --debug --address ws://host:port/ws

mod common;

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

use common::{Args, GROUP};
use ws_rpc_endpoint::{Completion, Endpoint, Params, ProcedureResult, Result};

// ============================================================================
// Procedures
// ============================================================================

/// Encodes the first argument as base64.
fn base64_encode(done: Completion, params: Params) -> ProcedureResult {
    let input = params.str(0)?;
    done.resolve(STANDARD.encode(input));
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== 001: Basic Endpoint ===\n");

    // ========================================================================
    // Setup
    // ========================================================================

    println!("[Setup] Building endpoint...");

    let endpoint = Endpoint::builder()
        .address(&args.address)
        .group(GROUP)
        .build()?;
    println!("        ✓ Address: {}\n", endpoint.address());

    // ========================================================================
    // Register procedures
    // ========================================================================

    println!("[1] Registering procedures...");
    endpoint
        .register("base64", base64_encode)
        .register_fn("add", |params| Ok(json!(params.i64(0)? + params.i64(1)?)))
        .register_fn("echo", |params| Ok(json!(params.into_inner())));
    common::print_procedures(&endpoint);
    println!();

    // ========================================================================
    // Watch state
    // ========================================================================

    println!("[2] Starting endpoint...");
    let mut status = endpoint.subscribe();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = *status.borrow_and_update();
            println!(
                "    state={} attempts={}",
                current.state, current.attempts
            );
        }
    });
    endpoint.start();

    // ========================================================================
    // Serve
    // ========================================================================

    common::wait_for_exit(&endpoint, args.no_wait).await?;

    println!("\n=== Endpoint stopped ===\n");

    Ok(())
}
