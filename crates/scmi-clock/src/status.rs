//! Protocol status codes and backend result translation.

use crate::backend::{BackendError, BackendResult};
use serde::Serialize;
use std::fmt;

/// Status word carried at the start of every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum ProtocolStatus {
    /// Command completed.
    Success = 0,
    /// Command or feature not supported.
    NotSupported = -1,
    /// Malformed or invalid parameters.
    InvalidParameters = -2,
    /// Addressed entity does not exist.
    NotFound = -4,
    /// Requested value outside the supported range.
    OutOfRange = -5,
    /// Entity busy; the agent may retry.
    Busy = -6,
    /// Unspecified failure.
    GenericError = -8,
    /// Device fault.
    HardwareError = -9,
}

impl ProtocolStatus {
    /// Every status, in wire-code order.
    pub const ALL: [Self; 8] = [
        Self::Success,
        Self::NotSupported,
        Self::InvalidParameters,
        Self::NotFound,
        Self::OutOfRange,
        Self::Busy,
        Self::GenericError,
        Self::HardwareError,
    ];

    /// Wire representation.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Parse a status from its wire representation.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Returns true for [`ProtocolStatus::Success`].
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl fmt::Display for ProtocolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::NotSupported => write!(f, "NOT_SUPPORTED"),
            Self::InvalidParameters => write!(f, "INVALID_PARAMETERS"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::OutOfRange => write!(f, "OUT_OF_RANGE"),
            Self::Busy => write!(f, "BUSY"),
            Self::GenericError => write!(f, "GENERIC_ERROR"),
            Self::HardwareError => write!(f, "HARDWARE_ERROR"),
        }
    }
}

impl From<&BackendError> for ProtocolStatus {
    fn from(error: &BackendError) -> Self {
        match error {
            BackendError::Range => Self::OutOfRange,
            BackendError::Busy => Self::Busy,
            BackendError::Unsupported => Self::NotSupported,
            BackendError::Hardware(_) | BackendError::Other(_) => Self::GenericError,
        }
    }
}

/// Translate a backend result into the status reported to the agent.
///
/// Only `OutOfRange`, `Busy`, `NotSupported` and `GenericError` can come
/// out of a failed backend call.
pub fn translate<T>(result: &BackendResult<T>) -> ProtocolStatus {
    match result {
        Ok(_) => ProtocolStatus::Success,
        Err(error) => ProtocolStatus::from(error),
    }
}
