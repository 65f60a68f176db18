//! Request and response envelopes.
//!
//! The server sends [`RequestEnvelope`]s naming a registered procedure;
//! the endpoint answers each one with exactly one [`ResponseEnvelope`]
//! whose `callbackId` echoes the request `id`.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::CorrelationId;

use super::Status;

// ============================================================================
// RequestEnvelope
// ============================================================================

/// A procedure call from the server.
///
/// # Format
///
/// ```json
/// {
///   "id": "r2",
///   "action": "base64",
///   "params": ["hi"]
/// }
/// ```
///
/// A missing or `null` `params` field decodes as an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Correlation id chosen by the server.
    pub id: CorrelationId,

    /// Name of the procedure to invoke.
    pub action: String,

    /// Positional arguments.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub params: Vec<Value>,
}

impl RequestEnvelope {
    /// Creates a request envelope.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<CorrelationId>, action: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            params,
        }
    }

    /// Decodes a request from a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the text is not a
    /// well-formed request envelope.
    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encodes the request as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// ResponseEnvelope
// ============================================================================

/// The endpoint's answer to one request.
///
/// # Format
///
/// ```json
/// {
///   "callbackId": "r2",
///   "status": 200,
///   "result": "aGk="
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Echo of the request `id`.
    #[serde(rename = "callbackId")]
    pub callback_id: CorrelationId,

    /// Outcome code.
    pub status: Status,

    /// Procedure result, or a human-readable failure message.
    #[serde(default)]
    pub result: Value,
}

impl ResponseEnvelope {
    /// Creates a response with an explicit status.
    #[inline]
    #[must_use]
    pub fn new(callback_id: CorrelationId, status: Status, result: Value) -> Self {
        Self {
            callback_id,
            status,
            result,
        }
    }

    /// Creates a 200 response carrying the procedure's result.
    #[inline]
    #[must_use]
    pub fn ok(callback_id: CorrelationId, result: Value) -> Self {
        Self::new(callback_id, Status::Ok, result)
    }

    /// Creates a 404 response for an unregistered action.
    #[must_use]
    pub fn not_found(callback_id: CorrelationId, action: &str) -> Self {
        Self::new(
            callback_id,
            Status::NotFound,
            Value::String(format!("procedure '{action}' not registered")),
        )
    }

    /// Creates a 500 response carrying a failure message.
    #[must_use]
    pub fn failed(callback_id: CorrelationId, message: impl Into<String>) -> Self {
        Self::new(callback_id, Status::Failed, Value::String(message.into()))
    }

    /// Encodes the response as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a response from a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the text is not a
    /// well-formed response envelope.
    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_request_decode() {
        let request =
            RequestEnvelope::decode(r#"{"id":"r2","action":"base64","params":["hi"]}"#)
                .expect("decode");
        assert_eq!(request.id.as_str(), "r2");
        assert_eq!(request.action, "base64");
        assert_eq!(request.params, vec![json!("hi")]);
    }

    #[test]
    fn test_request_missing_params_is_empty() {
        let request = RequestEnvelope::decode(r#"{"id":"r1","action":"getRegisteredMethods"}"#)
            .expect("decode");
        assert!(request.params.is_empty());

        let request =
            RequestEnvelope::decode(r#"{"id":"r1","action":"x","params":null}"#).expect("decode");
        assert!(request.params.is_empty());
    }

    #[test]
    fn test_request_decode_failures() {
        assert!(RequestEnvelope::decode("not json").is_err());
        assert!(RequestEnvelope::decode(r#"{"action":"x","params":[]}"#).is_err());
        assert!(RequestEnvelope::decode(r#"{"id":"r1","params":[]}"#).is_err());
        assert!(RequestEnvelope::decode(r#"{"id":"r1","action":"x","params":{}}"#).is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let response = ResponseEnvelope::ok(CorrelationId::new("r2"), json!("aGk="));
        assert_eq!(
            response.encode().expect("encode"),
            r#"{"callbackId":"r2","status":200,"result":"aGk="}"#
        );
    }

    #[test]
    fn test_not_found_message() {
        let response = ResponseEnvelope::not_found(CorrelationId::new("r3"), "missing");
        assert_eq!(
            response.encode().expect("encode"),
            r#"{"callbackId":"r3","status":404,"result":"procedure 'missing' not registered"}"#
        );
    }

    #[test]
    fn test_failed_carries_message() {
        let response = ResponseEnvelope::failed(CorrelationId::new("r4"), "division by zero");
        assert_eq!(response.status, Status::Failed);
        assert_eq!(response.result, json!("division by zero"));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 ,.=]{0,16}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_response_round_trip(id in "[a-z0-9]{1,10}", result in arb_value()) {
            let response = ResponseEnvelope::ok(CorrelationId::new(id), result);
            let decoded = ResponseEnvelope::decode(&response.encode().expect("encode"))
                .expect("decode");
            prop_assert_eq!(decoded, response);
        }
    }
}
