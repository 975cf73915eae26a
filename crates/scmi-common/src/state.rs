//! Clock run state.
//!
//! A clock is either `RUNNING` (gated on) or `STOPPED` (gated off). The
//! protocol's config-set command carries the requested state in bit 0 of
//! its attributes word.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Run state of a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClockState {
    /// Clock output is gated off.
    #[default]
    Stopped,
    /// Clock output is running.
    Running,
}

impl fmt::Display for ClockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "STOPPED"),
            Self::Running => write!(f, "RUNNING"),
        }
    }
}

impl ClockState {
    /// Map an enable flag onto a run state.
    #[must_use]
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Running
        } else {
            Self::Stopped
        }
    }

    /// Returns true if the clock is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}
