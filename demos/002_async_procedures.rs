//! Async procedures demonstration.
//!
//! Demonstrates:
//! - Futures registered with `register_async`
//! - Resolving a completion from a spawned task
//! - Failing a call with status 500
//! - Exponential reconnect backoff and the exhaustion hook
//!
//! Usage:
//!   cargo run --example 002_async_procedures
//!   cargo run --example 002_async_procedures -- --no-wait
//!   cargo run --example 002_async_procedures -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::sleep;

use common::{Args, GROUP};
use ws_rpc_endpoint::{
    Completion, Endpoint, Params, ProcedureError, ProcedureResult, ReconnectPolicy, Result,
};

// ============================================================================
// Constants
// ============================================================================

const MAX_DELAY: Duration = Duration::from_secs(30);

// ============================================================================
// Procedures
// ============================================================================

/// Resolves after the requested number of milliseconds.
fn delayed_echo(done: Completion, params: Params) -> ProcedureResult {
    let millis = params.i64(0)?;
    let millis = u64::try_from(millis)
        .map_err(|_| ProcedureError::invalid_argument(0, "a non-negative integer"))?;
    let value = params.arg(1).clone();

    tokio::spawn(async move {
        sleep(Duration::from_millis(millis)).await;
        done.resolve(value);
    });
    Ok(())
}

/// Sums a list of numbers after a short pause.
async fn sleep_then_sum(params: Params) -> std::result::Result<Value, ProcedureError> {
    let values: Vec<f64> = params.parse(0)?;
    sleep(Duration::from_millis(100)).await;
    Ok(json!(values.iter().sum::<f64>()))
}

async fn always_fails(_params: Params) -> std::result::Result<Value, ProcedureError> {
    Err(ProcedureError::failed("this procedure always fails"))
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
    println!("=== 002: Async Procedures ===\n");

    // ========================================================================
    // Setup
    // ========================================================================

    println!("[Setup] Building endpoint with exponential backoff...");

    let policy = ReconnectPolicy::new()
        .with_delay(Duration::from_secs(1))
        .with_exponential_backoff(2.0, MAX_DELAY)
        .with_max_attempts(5);

    let endpoint = Endpoint::builder()
        .address(&args.address)
        .group(GROUP)
        .policy(policy)
        .on_exhausted(|attempts| {
            eprintln!("    ✗ Gave up after {attempts} reconnect attempts");
        })
        .build()?;
    println!("        ✓ Address: {}\n", endpoint.address());

    // ========================================================================
    // Register procedures
    // ========================================================================

    println!("[1] Registering procedures...");
    endpoint
        .register("delayedEcho", delayed_echo)
        .register_async("sleepThenSum", sleep_then_sum)
        .register_async("alwaysFails", always_fails);
    common::print_procedures(&endpoint);
    println!();

    // ========================================================================
    // Serve
    // ========================================================================

    println!("[2] Starting endpoint...");
    endpoint.start();

    common::wait_for_exit(&endpoint, args.no_wait).await?;

    println!("\n=== Endpoint stopped ===\n");

    Ok(())
}
