//! Message replay scripts.
//!
//! A script holds one message per line: `agent message_id [words...]`.
//! Numbers are decimal or `0x`-prefixed hex. Blank lines and anything after
//! `#` are ignored.

use std::num::ParseIntError;
use std::path::Path;
use thiserror::Error;

/// One scripted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayStep {
    /// 1-based line number in the script.
    pub line: usize,
    /// Sending agent.
    pub agent: String,
    /// Message id.
    pub message_id: u32,
    /// Payload words.
    pub words: Vec<u32>,
}

impl ReplayStep {
    /// Payload bytes (little-endian words).
    pub fn payload(&self) -> Vec<u8> {
        self.words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }
}

/// Script parsing errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Script file could not be read.
    #[error("failed to read replay script: {0}")]
    Io(#[from] std::io::Error),

    /// Line has an agent but no message id.
    #[error("line {line}: missing message id")]
    MissingMessageId {
        /// Line number.
        line: usize,
    },

    /// A number could not be parsed.
    #[error("line {line}: invalid number '{token}': {source}")]
    InvalidNumber {
        /// Line number.
        line: usize,
        /// Offending token.
        token: String,
        /// Parse failure.
        #[source]
        source: ParseIntError,
    },
}

/// Parse a decimal or `0x`-prefixed hex word.
pub fn parse_word(token: &str) -> Result<u32, ParseIntError> {
    match token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => token.parse(),
    }
}

/// Parse a replay script.
///
/// # Errors
///
/// Returns the first malformed line.
pub fn parse_script(content: &str) -> Result<Vec<ReplayStep>, ReplayError> {
    let mut steps = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let text = raw.split('#').next().unwrap_or_default();
        let mut tokens = text.split_whitespace();

        let Some(agent) = tokens.next() else {
            continue;
        };
        let number = |token: &str| {
            parse_word(token).map_err(|source| ReplayError::InvalidNumber {
                line,
                token: token.to_string(),
                source,
            })
        };

        let message_id = number(tokens.next().ok_or(ReplayError::MissingMessageId { line })?)?;
        let words = tokens.map(number).collect::<Result<Vec<_>, _>>()?;

        steps.push(ReplayStep {
            line,
            agent: agent.to_string(),
            message_id,
            words,
        });
    }

    Ok(steps)
}

/// Read and parse a replay script file.
///
/// # Errors
///
/// Fails if the file cannot be read or a line is malformed.
pub fn load_script(path: &Path) -> Result<Vec<ReplayStep>, ReplayError> {
    parse_script(&std::fs::read_to_string(path)?)
}
