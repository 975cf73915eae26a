use thiserror::Error;

/// Errors raised while building the clock tables and resolving agents.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScmiError {
    /// Configuration or initialization error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The same protocol clock index was supplied twice.
    #[error("duplicate clock index {index}")]
    DuplicateClockIndex {
        /// Offending protocol clock index.
        index: u32,
    },

    /// A protocol clock index does not fit in the declared clock count.
    #[error("clock index {index} out of bounds (count: {count})")]
    ClockIndexOutOfBounds {
        /// Offending protocol clock index.
        index: u32,
        /// Declared number of protocol clocks.
        count: u32,
    },

    /// A device table references a clock missing from the platform table.
    #[error("unknown clock: {0}")]
    UnknownClock(String),

    /// No agent with the given name is configured.
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
}

/// Convenience type alias for clock table operations.
pub type ScmiResult<T> = Result<T, ScmiError>;
