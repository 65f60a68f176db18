//! Procedure trait and adapters.
//!
//! Every registered procedure has the same shape: it receives a
//! [`Completion`] and the call's [`Params`], and either returns `Ok(())`
//! after arranging for the completion to be resolved (now or later), or
//! returns a [`ProcedureError`] which is reported as status 500.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use serde_json::Value;
use thiserror::Error;

use super::{Completion, Params};

// ============================================================================
// ProcedureError
// ============================================================================

/// Result type for procedure invocations.
pub type ProcedureResult = Result<(), ProcedureError>;

/// Failure raised by a procedure.
///
/// The `Display` text becomes the `result` of the 500 response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcedureError {
    /// Procedure-defined failure.
    #[error("{0}")]
    Failed(String),

    /// A required positional argument was not sent.
    #[error("missing argument at position {index}")]
    MissingArgument {
        /// Zero-based argument position.
        index: usize,
    },

    /// A positional argument has the wrong shape.
    #[error("argument {index} must be {expected}")]
    InvalidArgument {
        /// Zero-based argument position.
        index: usize,
        /// What the procedure expected.
        expected: String,
    },
}

impl ProcedureError {
    /// Creates a procedure-defined failure.
    #[inline]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(index: usize, expected: impl Into<String>) -> Self {
        Self::InvalidArgument {
            index,
            expected: expected.into(),
        }
    }
}

impl From<String> for ProcedureError {
    fn from(message: String) -> Self {
        Self::Failed(message)
    }
}

impl From<&str> for ProcedureError {
    fn from(message: &str) -> Self {
        Self::Failed(message.to_owned())
    }
}

// ============================================================================
// Procedure
// ============================================================================

/// A callable exposed to the server.
///
/// Implemented for every `Fn(Completion, Params) -> ProcedureResult`, so
/// closures can be registered directly:
///
/// ```ignore
/// registry.register("echo", |done: Completion, params: Params| {
///     done.resolve(params.arg(0).clone());
///     Ok(())
/// });
/// ```
///
/// `call` runs on the supervisor task and must not block; slow work belongs
/// in a spawned task that resolves the completion when done.
pub trait Procedure: Send + Sync + 'static {
    /// Invokes the procedure.
    fn call(&self, completion: Completion, params: Params) -> ProcedureResult;
}

impl<F> Procedure for F
where
    F: Fn(Completion, Params) -> ProcedureResult + Send + Sync + 'static,
{
    fn call(&self, completion: Completion, params: Params) -> ProcedureResult {
        self(completion, params)
    }
}

// ============================================================================
// FnProcedure
// ============================================================================

/// Adapter for plain functions returning their result directly.
pub struct FnProcedure<F>(pub F);

impl<F> Procedure for FnProcedure<F>
where
    F: Fn(Params) -> Result<Value, ProcedureError> + Send + Sync + 'static,
{
    fn call(&self, completion: Completion, params: Params) -> ProcedureResult {
        let result = (self.0)(params)?;
        completion.resolve(result);
        Ok(())
    }
}

// ============================================================================
// AsyncProcedure
// ============================================================================

/// Adapter for async functions.
///
/// The future is spawned on the current tokio runtime; its output resolves
/// the completion with 200, or fails it with 500 on error or panic.
pub struct AsyncProcedure<F>(pub F);

impl<F, Fut> Procedure for AsyncProcedure<F>
where
    F: Fn(Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ProcedureError>> + Send + 'static,
{
    fn call(&self, completion: Completion, params: Params) -> ProcedureResult {
        let future = (self.0)(params);

        tokio::spawn(async move {
            match AssertUnwindSafe(future).catch_unwind().await {
                Ok(Ok(result)) => completion.resolve(result),
                Ok(Err(e)) => completion.fail(e.to_string()),
                Err(panic) => completion.fail(panic_message(panic.as_ref())),
            }
        });

        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Extracts the message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("procedure panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("procedure panicked: {message}")
    } else {
        "procedure panicked".to_owned()
    }
}

// ============================================================================
// Tests
// ============================================================================
