//! Request dispatcher.
//!
//! Turns one inbound text frame into at most one response:
//!
//! | Situation | Response |
//! |-----------|----------|
//! | Frame too large or not a request envelope | none, logged |
//! | Action not registered | 404, `procedure '<action>' not registered` |
//! | Procedure returned an error or panicked | 500, failure message |
//! | Procedure accepted the call | 200 when its completion resolves |
//!
//! The dispatcher never waits for a completion; it returns as soon as the
//! procedure returns.

// ============================================================================
// Imports
// ============================================================================

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, error, trace, warn};

use crate::procedure::handler::panic_message;
use crate::procedure::{Completion, Params, ProcedureRegistry, completion::deliver};
use crate::protocol::{RequestEnvelope, ResponseEnvelope};
use crate::transport::Link;

// ============================================================================
// Constants
// ============================================================================

/// Default inbound frame size limit (10 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

// ============================================================================
// DispatchOutcome
// ============================================================================

/// What the dispatcher did with one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Frame was dropped without a response.
    Rejected,
    /// Action was unknown; a 404 was sent.
    NotFound,
    /// Procedure accepted the call; its completion owns the response.
    Invoked,
    /// Procedure failed synchronously; a 500 was sent.
    Failed,
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes request envelopes to registered procedures.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    /// Shared procedure table.
    registry: ProcedureRegistry,
    /// Frames larger than this are dropped.
    max_message_size: usize,
}

impl Dispatcher {
    /// Creates a dispatcher over a registry.
    #[must_use]
    pub fn new(registry: ProcedureRegistry) -> Self {
        Self {
            registry,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Sets the inbound frame size limit in bytes.
    #[inline]
    #[must_use]
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Returns the procedure registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ProcedureRegistry {
        &self.registry
    }

    /// Handles one inbound text frame received on `link`.
    ///
    /// Every response produced for this frame, now or later, is sent on
    /// `link` and nowhere else.
    pub fn dispatch(&self, text: &str, link: &Link) -> DispatchOutcome {
        if text.len() > self.max_message_size {
            warn!(
                connection = %link.id(),
                size = text.len(),
                max = self.max_message_size,
                "Inbound message exceeds size limit, dropping"
            );
            return DispatchOutcome::Rejected;
        }

        let request = match RequestEnvelope::decode(text) {
            Ok(request) => request,
            Err(e) => {
                warn!(connection = %link.id(), error = %e, "Failed to decode request envelope");
                return DispatchOutcome::Rejected;
            }
        };

        let RequestEnvelope { id, action, params } = request;

        trace!(
            connection = %link.id(),
            %id,
            %action,
            param_count = params.len(),
            "Request received"
        );

        let Some(procedure) = self.registry.get(&action) else {
            debug!(%id, %action, "Procedure not registered");
            deliver(link, &ResponseEnvelope::not_found(id, &action));
            return DispatchOutcome::NotFound;
        };

        let completion = Completion::new(id.clone(), link.clone());
        let params = Params::new(params);

        match catch_unwind(AssertUnwindSafe(|| procedure.call(completion, params))) {
            Ok(Ok(())) => DispatchOutcome::Invoked,

            Ok(Err(e)) => {
                warn!(%id, %action, error = %e, "Procedure failed");
                deliver(link, &ResponseEnvelope::failed(id, e.to_string()));
                DispatchOutcome::Failed
            }

            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(%id, %action, %message, "Procedure panicked");
                deliver(link, &ResponseEnvelope::failed(id, message));
                DispatchOutcome::Failed
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    use crate::identifiers::ConnectionId;
    use crate::procedure::{ProcedureError, ProcedureResult};
    use crate::protocol::Status;
    use crate::transport::OutboundFrame;

    fn open_link() -> (Link, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let link = Link::new(ConnectionId::next(), tx);
        link.mark_open();
        (link, rx)
    }

    fn response(rx: &mut mpsc::UnboundedReceiver<OutboundFrame>) -> Option<ResponseEnvelope> {
        match rx.try_recv().ok()? {
            OutboundFrame::Text(text) => ResponseEnvelope::decode(&text).ok(),
            _ => None,
        }
    }

    fn dispatcher() -> Dispatcher {
        let registry = ProcedureRegistry::new();
        registry.register_fn("echo", |params| Ok(params.arg(0).clone()));
        registry.register_fn("upper", |params| {
            Ok(Value::String(params.str(0)?.to_uppercase()))
        });
        registry.register("throws", |_: Completion, _: Params| -> ProcedureResult {
            Err(ProcedureError::failed("division by zero"))
        });
        registry.register("panics", |_: Completion, _: Params| -> ProcedureResult {
            panic!("bad state")
        });
        registry.register("silent", |_: Completion, _: Params| -> ProcedureResult { Ok(()) });
        Dispatcher::new(registry)
    }

    #[test]
    fn test_registered_action_returns_200_with_correlated_id() {
        let (link, mut rx) = open_link();
        let outcome = dispatcher().dispatch(
            r#"{"id":"abc","action":"echo","params":[{"k":[1,2]}]}"#,
            &link,
        );

        assert_eq!(outcome, DispatchOutcome::Invoked);
        let response = response(&mut rx).expect("response");
        assert_eq!(response.callback_id.as_str(), "abc");
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.result, json!({"k": [1, 2]}));
    }

    #[test]
    fn test_unknown_action_returns_404_and_leaves_registry_unchanged() {
        let dispatcher = dispatcher();
        let before = dispatcher.registry().list();
        let (link, mut rx) = open_link();

        let outcome = dispatcher.dispatch(r#"{"id":"r3","action":"missing","params":[]}"#, &link);

        assert_eq!(outcome, DispatchOutcome::NotFound);
        assert_eq!(
            response(&mut rx),
            Some(ResponseEnvelope::not_found("r3".into(), "missing"))
        );
        assert_eq!(dispatcher.registry().list(), before);
    }

    #[test]
    fn test_synchronous_error_returns_500_with_message() {
        let (link, mut rx) = open_link();
        let outcome = dispatcher().dispatch(r#"{"id":"e","action":"throws"}"#, &link);

        assert_eq!(outcome, DispatchOutcome::Failed);
        let response = response(&mut rx).expect("response");
        assert_eq!(response.status, Status::Failed);
        assert_eq!(response.result, json!("division by zero"));
    }

    #[test]
    fn test_argument_error_returns_500() {
        let (link, mut rx) = open_link();
        dispatcher().dispatch(r#"{"id":"u","action":"upper","params":[5]}"#, &link);

        let response = response(&mut rx).expect("response");
        assert_eq!(response.status, Status::Failed);
        assert_eq!(response.result, json!("argument 0 must be a string"));
    }

    #[test]
    fn test_panic_returns_500() {
        let (link, mut rx) = open_link();
        let outcome = dispatcher().dispatch(r#"{"id":"p","action":"panics"}"#, &link);

        assert_eq!(outcome, DispatchOutcome::Failed);
        let response = response(&mut rx).expect("response");
        assert_eq!(response.status, Status::Failed);
        assert!(response.result.as_str().unwrap_or_default().contains("bad state"));
    }

    #[test]
    fn test_malformed_frames_get_no_response() {
        let dispatcher = dispatcher();
        let (link, mut rx) = open_link();

        for frame in [
            "not json",
            r#"{"action":"echo","params":[]}"#,
            r#"{"id":7,"action":"echo","params":[]}"#,
            r#"[1,2,3]"#,
        ] {
            assert_eq!(dispatcher.dispatch(frame, &link), DispatchOutcome::Rejected);
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_oversized_frame_is_dropped() {
        let dispatcher = dispatcher().with_max_message_size(16);
        let (link, mut rx) = open_link();

        let outcome = dispatcher.dispatch(r#"{"id":"big","action":"echo","params":["xxxx"]}"#, &link);

        assert_eq!(outcome, DispatchOutcome::Rejected);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unresolved_completion_sends_nothing() {
        let (link, mut rx) = open_link();
        let outcome = dispatcher().dispatch(r#"{"id":"s","action":"silent"}"#, &link);

        assert_eq!(outcome, DispatchOutcome::Invoked);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_scenario_registered_methods() {
        let registry = ProcedureRegistry::new();
        registry.register_fn("base64", |_| Ok(Value::Null));
        let (link, mut rx) = open_link();

        Dispatcher::new(registry).dispatch(
            r#"{"id":"r1","action":"getRegisteredMethods","params":[]}"#,
            &link,
        );

        assert_eq!(
            rx.try_recv().ok(),
            Some(OutboundFrame::Text(
                r#"{"callbackId":"r1","status":200,"result":"base64"}"#.into()
            ))
        );
    }

    #[tokio::test]
    async fn test_async_procedures_complete_out_of_order() {
        let registry = ProcedureRegistry::new();
        registry.register_async("wait", |params| async move {
            let ms = params.i64(0)?;
            tokio::time::sleep(Duration::from_millis(ms as u64)).await;
            Ok::<_, ProcedureError>(json!(ms))
        });
        let dispatcher = Dispatcher::new(registry);
        let (link, mut rx) = open_link();

        dispatcher.dispatch(r#"{"id":"slow","action":"wait","params":[60]}"#, &link);
        dispatcher.dispatch(r#"{"id":"fast","action":"wait","params":[1]}"#, &link);

        let mut order = Vec::new();
        while order.len() < 2 {
            if let Some(OutboundFrame::Text(text)) = rx.recv().await {
                let response = ResponseEnvelope::decode(&text).expect("decode");
                order.push(response.callback_id.as_str().to_owned());
            }
        }
        assert_eq!(order, vec!["fast", "slow"]);
    }

    #[tokio::test]
    async fn test_async_error_returns_500() {
        let registry = ProcedureRegistry::new();
        registry.register_async("bad", |params| async move {
            params.str(0)?;
            Ok::<_, ProcedureError>(Value::Null)
        });
        let (link, mut rx) = open_link();

        Dispatcher::new(registry).dispatch(r#"{"id":"a","action":"bad","params":[]}"#, &link);

        match rx.recv().await {
            Some(OutboundFrame::Text(text)) => {
                let response = ResponseEnvelope::decode(&text).expect("decode");
                assert_eq!(response.status, Status::Failed);
                assert_eq!(response.result, json!("missing argument at position 0"));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
