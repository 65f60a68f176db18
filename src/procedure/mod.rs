//! Locally registered procedures.
//!
//! This module holds everything a host application needs to expose
//! functions to the server.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ProcedureRegistry`] | Ordered name → procedure table |
//! | [`Procedure`] | Uniform `(Completion, Params) -> ProcedureResult` signature |
//! | [`Completion`] | Single-use handle that sends the response |
//! | [`Params`] | Positional arguments |
//! | [`ProcedureError`] | Failure reported as status 500 |
//!
//! # Example
//!
//! ```ignore
//! use ws_rpc_endpoint::{Completion, Params, ProcedureRegistry};
//!
//! let registry = ProcedureRegistry::new();
//!
//! // Completion style: resolve now or later
//! registry.register("echo", |done: Completion, params: Params| {
//!     done.resolve(params.arg(0).clone());
//!     Ok(())
//! });
//!
//! // Async style: the future's output is the result
//! registry.register_async("sleepy", |params| async move {
//!     tokio::time::sleep(std::time::Duration::from_millis(10)).await;
//!     Ok(params.arg(0).clone())
//! });
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Single-use completion handle.
pub mod completion;

/// Procedure trait, adapters and error type.
pub mod handler;

/// Positional arguments.
pub mod params;

/// Procedure registry.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use completion::Completion;
pub use handler::{AsyncProcedure, FnProcedure, Procedure, ProcedureError, ProcedureResult};
pub use params::Params;
pub use registry::{ProcedureRef, ProcedureRegistry, REGISTERED_METHODS};
