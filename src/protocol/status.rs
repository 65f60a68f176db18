//! Response status codes.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ============================================================================
// Status
// ============================================================================

/// Outcome of one request, carried as an integer in the response envelope.
///
/// | Variant | Code |
/// |---------|------|
/// | [`Status::Ok`] | 200 |
/// | [`Status::NotFound`] | 404 |
/// | [`Status::Failed`] | 500 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Status {
    /// Procedure completed and produced a result.
    Ok,
    /// No procedure is registered under the requested action.
    NotFound,
    /// Procedure failed while executing.
    Failed,
}

impl Status {
    /// Returns the numeric wire code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NotFound => 404,
            Self::Failed => 500,
        }
    }

    /// Returns `true` for [`Status::Ok`].
    #[inline]
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<Status> for u16 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl TryFrom<u16> for Status {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            200 => Ok(Self::Ok),
            404 => Ok(Self::NotFound),
            500 => Ok(Self::Failed),
            other => Err(Error::protocol(format!("unknown status code {other}"))),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Tests
// ============================================================================
