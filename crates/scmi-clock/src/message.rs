//! Clock protocol message identifiers.

use std::fmt;

/// Commands of the clock management protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageId {
    /// Protocol Version (0x0).
    ProtocolVersion = 0x0,
    /// Protocol Attributes (0x1).
    ProtocolAttributes = 0x1,
    /// Protocol Message Attributes (0x2).
    ProtocolMessageAttributes = 0x2,
    /// Clock Attributes (0x3).
    ClockAttributes = 0x3,
    /// Clock Describe Rates (0x4).
    DescribeRates = 0x4,
    /// Clock Rate Set (0x5).
    RateSet = 0x5,
    /// Clock Rate Get (0x6).
    RateGet = 0x6,
    /// Clock Config Set (0x7).
    ConfigSet = 0x7,
}

impl MessageId {
    /// Every implemented message.
    pub const ALL: [Self; 8] = [
        Self::ProtocolVersion,
        Self::ProtocolAttributes,
        Self::ProtocolMessageAttributes,
        Self::ClockAttributes,
        Self::DescribeRates,
        Self::RateSet,
        Self::RateGet,
        Self::ConfigSet,
    ];

    /// Parse a message id from its wire value.
    #[must_use]
    pub fn from_u32(id: u32) -> Option<Self> {
        match id {
            0x0 => Some(Self::ProtocolVersion),
            0x1 => Some(Self::ProtocolAttributes),
            0x2 => Some(Self::ProtocolMessageAttributes),
            0x3 => Some(Self::ClockAttributes),
            0x4 => Some(Self::DescribeRates),
            0x5 => Some(Self::RateSet),
            0x6 => Some(Self::RateGet),
            0x7 => Some(Self::ConfigSet),
            _ => None,
        }
    }

    /// Wire value.
    #[must_use]
    pub const fn id(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtocolVersion => write!(f, "PROTOCOL_VERSION"),
            Self::ProtocolAttributes => write!(f, "PROTOCOL_ATTRIBUTES"),
            Self::ProtocolMessageAttributes => write!(f, "PROTOCOL_MESSAGE_ATTRIBUTES"),
            Self::ClockAttributes => write!(f, "CLOCK_ATTRIBUTES"),
            Self::DescribeRates => write!(f, "CLOCK_DESCRIBE_RATES"),
            Self::RateSet => write!(f, "CLOCK_RATE_SET"),
            Self::RateGet => write!(f, "CLOCK_RATE_GET"),
            Self::ConfigSet => write!(f, "CLOCK_CONFIG_SET"),
        }
    }
}
