//! Clock-control backend boundary.
//!
//! The protocol handler never touches clock hardware itself. Every rate or
//! state change goes through a [`ClockBackend`], which owns the mutable
//! clock state and its locking.

use crate::registry::ResourceRef;
use scmi_common::{ClockState, RateConfig};
use thiserror::Error;

/// Failure kinds reported by a clock backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Requested rate outside what the clock can produce.
    #[error("rate out of range")]
    Range,

    /// Clock is busy (e.g. PLL still relocking).
    #[error("clock busy")]
    Busy,

    /// Operation not supported by this clock.
    #[error("operation not supported")]
    Unsupported,

    /// Clock driver reported a device fault.
    #[error("hardware fault: {0}")]
    Hardware(String),

    /// Any other failure.
    #[error("backend error: {0}")]
    Other(String),
}

/// Result of a backend operation.
pub type BackendResult<T> = Result<T, BackendError>;

/// How the backend picks a rate the clock cannot produce exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingMode {
    /// Only the exact rate is acceptable.
    Exact,
    /// Highest supported rate not above the request.
    Down,
    /// Lowest supported rate not below the request.
    Up,
    /// Closest supported rate; ties round up.
    #[default]
    Nearest,
}

/// Set of rates a clock supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateSpec {
    /// Linear range `min, min + step, ..., max`.
    Range {
        /// Lowest rate in Hz.
        min: u64,
        /// Highest rate in Hz.
        max: u64,
        /// Step in Hz.
        step: u64,
    },
    /// Explicit ascending list of rates in Hz.
    Discrete(Vec<u64>),
}

impl From<&RateConfig> for RateSpec {
    fn from(config: &RateConfig) -> Self {
        match config {
            RateConfig::Range { min, max, step } => Self::Range {
                min: *min,
                max: *max,
                step: *step,
            },
            RateConfig::Discrete { discrete } => {
                let mut rates = discrete.clone();
                rates.sort_unstable();
                rates.dedup();
                Self::Discrete(rates)
            }
        }
    }
}

/// Descriptive data about one clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockDescriptor {
    /// Human-readable clock name.
    pub name: String,
    /// Supported rates.
    pub rates: RateSpec,
    /// Current run state.
    pub state: ClockState,
    /// Whether the rate can be changed.
    pub supports_rate_change: bool,
}

/// Clock-control backend abstraction.
///
/// Calls are synchronous: each returns once the backend has applied (or
/// refused) the operation. Implementations are shared between agents and
/// must serialize access to their own state.
pub trait ClockBackend: Send + Sync {
    /// Change the rate of a clock, rounding per `rounding`.
    fn set_rate(&self, clock: ResourceRef, rate: u64, rounding: RoundingMode)
        -> BackendResult<()>;

    /// Read the current rate of a clock in Hz.
    fn get_rate(&self, clock: ResourceRef) -> BackendResult<u64>;

    /// Start or stop a clock.
    fn set_state(&self, clock: ResourceRef, state: ClockState) -> BackendResult<()>;

    /// Describe a clock's name, capabilities and current state.
    fn describe(&self, clock: ResourceRef) -> BackendResult<ClockDescriptor>;
}
