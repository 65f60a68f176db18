//! Procedure registry.
//!
//! Maps procedure names to implementations, in registration order. The
//! registry is shared between the endpoint handle and the dispatcher, so
//! procedures can be registered at any time, before or after the
//! connection starts.
//!
//! Every registry carries the built-in [`REGISTERED_METHODS`] procedure,
//! which lets the server discover what this endpoint exposes.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::debug;

use super::{
    AsyncProcedure, Completion, FnProcedure, Params, Procedure, ProcedureError, ProcedureResult,
};

// ============================================================================
// Constants
// ============================================================================

/// Name of the built-in discovery procedure.
///
/// Returns a comma-joined list of every other registered name, in
/// registration order.
pub const REGISTERED_METHODS: &str = "getRegisteredMethods";

// ============================================================================
// Types
// ============================================================================

/// Shared, type-erased procedure.
pub type ProcedureRef = Arc<dyn Procedure>;

/// Registry storage: ordered entries plus a name index.
#[derive(Default)]
struct RegistryInner {
    entries: Vec<(String, ProcedureRef)>,
    index: FxHashMap<String, usize>,
}

impl RegistryInner {
    fn insert(&mut self, name: String, procedure: ProcedureRef) -> bool {
        match self.index.get(&name) {
            Some(&position) => {
                self.entries[position].1 = procedure;
                true
            }
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, procedure));
                false
            }
        }
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

// ============================================================================
// ProcedureRegistry
// ============================================================================

/// Ordered name → procedure mapping.
///
/// Cloning is cheap; clones share the same table.
#[derive(Clone)]
pub struct ProcedureRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl fmt::Debug for ProcedureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureRegistry")
            .field("names", &self.list())
            .finish()
    }
}

impl Default for ProcedureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcedureRegistry {
    /// Creates a registry holding only the built-in discovery procedure.
    #[must_use]
    pub fn new() -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<RwLock<RegistryInner>>| {
            let mut inner = RegistryInner::default();
            inner.insert(
                REGISTERED_METHODS.to_owned(),
                Arc::new(RegisteredMethods {
                    registry: weak.clone(),
                }),
            );
            RwLock::new(inner)
        });

        Self { inner }
    }

    /// Registers a completion-style procedure.
    ///
    /// Re-registering a name replaces the implementation and keeps its
    /// original position. No arity validation is done.
    pub fn register(&self, name: impl Into<String>, procedure: impl Procedure) -> &Self {
        self.register_ref(name, Arc::new(procedure))
    }

    /// Registers a pre-wrapped procedure.
    pub fn register_ref(&self, name: impl Into<String>, procedure: ProcedureRef) -> &Self {
        let name = name.into();
        let replaced = self.inner.write().insert(name.clone(), procedure);
        debug!(procedure = %name, replaced, "Procedure registered");
        self
    }

    /// Registers a function whose return value is the result.
    ///
    /// ```ignore
    /// registry.register_fn("add", |params| {
    ///     Ok(json!(params.i64(0)? + params.i64(1)?))
    /// });
    /// ```
    pub fn register_fn<F>(&self, name: impl Into<String>, function: F) -> &Self
    where
        F: Fn(Params) -> Result<Value, ProcedureError> + Send + Sync + 'static,
    {
        self.register(name, FnProcedure(function))
    }

    /// Registers an async function; its output resolves the call.
    ///
    /// The future runs on a spawned tokio task, so it may await freely.
    pub fn register_async<F, Fut>(&self, name: impl Into<String>, function: F) -> &Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ProcedureError>> + Send + 'static,
    {
        self.register(name, AsyncProcedure(function))
    }

    /// Looks up a procedure by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ProcedureRef> {
        let inner = self.inner.read();
        inner
            .index
            .get(name)
            .map(|&position| Arc::clone(&inner.entries[position].1))
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().index.contains_key(name)
    }

    /// Returns all registered names in registration order.
    ///
    /// Includes the built-in discovery procedure.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.inner.read().names().map(str::to_owned).collect()
    }

    /// Returns the number of registered procedures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Always `false`: the built-in procedure is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }
}

// ============================================================================
// RegisteredMethods
// ============================================================================

/// Built-in procedure listing every other registered name.
struct RegisteredMethods {
    registry: Weak<RwLock<RegistryInner>>,
}

impl Procedure for RegisteredMethods {
    fn call(&self, completion: Completion, _params: Params) -> ProcedureResult {
        let registry = self
            .registry
            .upgrade()
            .ok_or_else(|| ProcedureError::failed("procedure registry dropped"))?;

        let names = registry
            .read()
            .names()
            .filter(|name| *name != REGISTERED_METHODS)
            .collect::<Vec<_>>()
            .join(",");

        completion.resolve(names);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
