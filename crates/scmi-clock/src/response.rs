//! Encoded responses.

use crate::codec::{WordWriter, CLOCK_NAME_LEN, WORD_SIZE};
use crate::status::ProtocolStatus;

/// Response to one message. Every variant encodes as a status word followed
/// by its trailing fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockResponse {
    /// Status only (rate set, config set, and every failure except rate get).
    Status(ProtocolStatus),
    /// Successful protocol version query.
    ProtocolVersion {
        /// Version word (major in bits 31..16, minor in 15..0).
        version: u32,
    },
    /// Successful protocol or message attributes query.
    Attributes {
        /// Attributes word.
        attributes: u32,
    },
    /// Successful clock attributes query.
    ClockAttributes {
        /// Bit 0 set when the clock is running.
        attributes: u32,
        /// NUL-padded clock name.
        name: [u8; CLOCK_NAME_LEN],
    },
    /// Successful describe rates query.
    DescribeRates {
        /// Returned count, format flag and remaining count.
        num_rates_flags: u32,
        /// Rates in Hz, each encoded as two words.
        rates: Vec<u64>,
    },
    /// Rate get answer; the rate is zero unless the status is success.
    RateGet {
        /// Outcome.
        status: ProtocolStatus,
        /// Current rate in Hz.
        rate: u64,
    },
}

impl ClockResponse {
    /// Status word of this response.
    #[must_use]
    pub fn status(&self) -> ProtocolStatus {
        match self {
            Self::Status(status) | Self::RateGet { status, .. } => *status,
            Self::ProtocolVersion { .. }
            | Self::Attributes { .. }
            | Self::ClockAttributes { .. }
            | Self::DescribeRates { .. } => ProtocolStatus::Success,
        }
    }

    /// Encode into wire bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = WordWriter::with_capacity(self.encoded_len());
        writer.put_i32(self.status().code());

        match self {
            Self::Status(_) => {}
            Self::ProtocolVersion { version } => {
                writer.put_u32(*version);
            }
            Self::Attributes { attributes } => {
                writer.put_u32(*attributes);
            }
            Self::ClockAttributes { attributes, name } => {
                writer.put_u32(*attributes).put_bytes(name);
            }
            Self::DescribeRates {
                num_rates_flags,
                rates,
            } => {
                writer.put_u32(*num_rates_flags);
                for rate in rates {
                    writer.put_rate(*rate);
                }
            }
            Self::RateGet { rate, .. } => {
                writer.put_rate(*rate);
            }
        }

        writer.finish()
    }

    fn encoded_len(&self) -> usize {
        WORD_SIZE
            + match self {
                Self::Status(_) => 0,
                Self::ProtocolVersion { .. } | Self::Attributes { .. } => WORD_SIZE,
                Self::ClockAttributes { .. } => WORD_SIZE + CLOCK_NAME_LEN,
                Self::DescribeRates { rates, .. } => WORD_SIZE + rates.len() * 2 * WORD_SIZE,
                Self::RateGet { .. } => 2 * WORD_SIZE,
            }
    }
}

impl From<ProtocolStatus> for ClockResponse {
    fn from(status: ProtocolStatus) -> Self {
        Self::Status(status)
    }
}
