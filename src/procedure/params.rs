//! Positional procedure arguments.
//!
//! Procedures receive every positional argument the server sent. Missing
//! positions read as `null` through [`Params::arg`]; the typed accessors
//! return a [`ProcedureError`] instead, which the dispatcher reports as a
//! 500 response. Extra arguments are ignored unless a procedure reads them.

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ProcedureError;

/// Value returned for positions past the end.
static NULL: Value = Value::Null;

// ============================================================================
// Params
// ============================================================================

/// Ordered arguments of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<Value>);

impl Params {
    /// Wraps a list of arguments.
    #[inline]
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Returns the number of arguments sent.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no arguments were sent.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the argument at `index`, if sent.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Returns the argument at `index`, or `null` if it was not sent.
    #[inline]
    #[must_use]
    pub fn arg(&self, index: usize) -> &Value {
        self.0.get(index).unwrap_or(&NULL)
    }

    /// Returns the argument at `index` as a string.
    ///
    /// # Errors
    ///
    /// - [`ProcedureError::MissingArgument`] if not sent
    /// - [`ProcedureError::InvalidArgument`] if not a string
    pub fn str(&self, index: usize) -> Result<&str, ProcedureError> {
        self.required(index)?
            .as_str()
            .ok_or_else(|| ProcedureError::invalid_argument(index, "a string"))
    }

    /// Returns the argument at `index` as a signed integer.
    ///
    /// # Errors
    ///
    /// - [`ProcedureError::MissingArgument`] if not sent
    /// - [`ProcedureError::InvalidArgument`] if not an integer
    pub fn i64(&self, index: usize) -> Result<i64, ProcedureError> {
        self.required(index)?
            .as_i64()
            .ok_or_else(|| ProcedureError::invalid_argument(index, "an integer"))
    }

    /// Returns the argument at `index` as a float.
    ///
    /// # Errors
    ///
    /// - [`ProcedureError::MissingArgument`] if not sent
    /// - [`ProcedureError::InvalidArgument`] if not a number
    pub fn f64(&self, index: usize) -> Result<f64, ProcedureError> {
        self.required(index)?
            .as_f64()
            .ok_or_else(|| ProcedureError::invalid_argument(index, "a number"))
    }

    /// Returns the argument at `index` as a boolean.
    ///
    /// # Errors
    ///
    /// - [`ProcedureError::MissingArgument`] if not sent
    /// - [`ProcedureError::InvalidArgument`] if not a boolean
    pub fn bool(&self, index: usize) -> Result<bool, ProcedureError> {
        self.required(index)?
            .as_bool()
            .ok_or_else(|| ProcedureError::invalid_argument(index, "a boolean"))
    }

    /// Deserializes the argument at `index` into `T`.
    ///
    /// # Errors
    ///
    /// - [`ProcedureError::MissingArgument`] if not sent
    /// - [`ProcedureError::InvalidArgument`] if it does not match `T`
    pub fn parse<T: DeserializeOwned>(&self, index: usize) -> Result<T, ProcedureError> {
        let value = self.required(index)?.clone();
        serde_json::from_value(value)
            .map_err(|e| ProcedureError::invalid_argument(index, e.to_string()))
    }

    /// Returns an iterator over the arguments.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    /// Consumes the wrapper, returning the raw values.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<Value> {
        self.0
    }

    fn required(&self, index: usize) -> Result<&Value, ProcedureError> {
        self.0
            .get(index)
            .ok_or(ProcedureError::MissingArgument { index })
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_missing_position_reads_null() {
        let params = Params::new(vec![json!("a")]);
        assert_eq!(params.arg(0), &json!("a"));
        assert_eq!(params.arg(5), &Value::Null);
        assert!(params.get(5).is_none());
    }

    #[test]
    fn test_typed_accessors() {
        let params = Params::new(vec![json!("hi"), json!(7), json!(1.5), json!(true)]);
        assert_eq!(params.str(0), Ok("hi"));
        assert_eq!(params.i64(1), Ok(7));
        assert_eq!(params.f64(2), Ok(1.5));
        assert_eq!(params.bool(3), Ok(true));
    }

    #[test]
    fn test_typed_accessor_errors() {
        let params = Params::new(vec![json!(1)]);
        assert_eq!(
            params.str(0),
            Err(ProcedureError::invalid_argument(0, "a string"))
        );
        assert_eq!(params.i64(3), Err(ProcedureError::MissingArgument { index: 3 }));
    }

    #[test]
    fn test_parse_structured_argument() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Point {
            x: i32,
            y: i32,
        }

        let params = Params::new(vec![json!({"x": 1, "y": 2})]);
        assert_eq!(params.parse::<Point>(0), Ok(Point { x: 1, y: 2 }));
        assert!(params.parse::<String>(0).is_err());
    }
}
