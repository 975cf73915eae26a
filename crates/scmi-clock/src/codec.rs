//! Fixed-layout payload codec.
//!
//! Every request is a sequence of little-endian 32-bit words with a fixed
//! length per message. A payload whose length differs from the expected
//! shape is rejected as a whole; fields are never defaulted. 64-bit rates
//! travel as two words, low word first.

use static_assertions::const_assert_eq;
use thiserror::Error;

/// Size of one wire word in bytes.
pub const WORD_SIZE: usize = 4;

/// Size of the clock name field in a clock attributes response.
pub const CLOCK_NAME_LEN: usize = 16;

/// Payload decoding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Payload length does not match the message's fixed shape.
    #[error("payload is {actual} bytes, expected {expected}")]
    WrongLength {
        /// Length of the fixed shape.
        expected: usize,
        /// Length received.
        actual: usize,
    },
}

/// Split a rate into `(low, high)` wire words.
#[must_use]
pub fn split_rate(rate: u64) -> (u32, u32) {
    // Low word keeps bits 0..32, high word bits 32..64.
    #[allow(clippy::cast_possible_truncation)]
    let low = rate as u32;
    #[allow(clippy::cast_possible_truncation)]
    let high = (rate >> 32) as u32;
    (low, high)
}

/// Join `(low, high)` wire words into a rate.
#[must_use]
pub fn join_rate(low: u32, high: u32) -> u64 {
    u64::from(low) | (u64::from(high) << 32)
}

/// Sequential little-endian word reader over a length-checked payload.
#[derive(Debug)]
pub struct WordReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WordReader<'a> {
    /// Wrap a payload.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Read the next word. Reads past the end yield zero.
    pub fn read_u32(&mut self) -> u32 {
        let mut word = [0u8; WORD_SIZE];
        if let Some(chunk) = self.bytes.get(self.pos..self.pos + WORD_SIZE) {
            word.copy_from_slice(chunk);
        }
        self.pos += WORD_SIZE;
        u32::from_le_bytes(word)
    }

    /// Read a rate stored as `(low, high)`.
    pub fn read_rate(&mut self) -> u64 {
        let low = self.read_u32();
        let high = self.read_u32();
        join_rate(low, high)
    }
}

/// Little-endian word writer.
#[derive(Debug, Default)]
pub struct WordWriter {
    bytes: Vec<u8>,
}

impl WordWriter {
    /// Create a writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Append an unsigned word.
    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Append a signed word.
    pub fn put_i32(&mut self, value: i32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Append a rate as `(low, high)`.
    pub fn put_rate(&mut self, rate: u64) -> &mut Self {
        let (low, high) = split_rate(rate);
        self.put_u32(low).put_u32(high)
    }

    /// Append raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Finish and return the encoded bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// A fixed-size request shape.
pub trait WireFormat: Sized {
    /// Exact payload size in bytes.
    const SIZE: usize;

    /// Read the fields from a payload already checked to be `SIZE` bytes.
    fn read(reader: &mut WordReader<'_>) -> Self;

    /// Write the fields.
    fn write(&self, writer: &mut WordWriter);
}

/// Decode a payload into its fixed shape.
///
/// # Errors
///
/// Returns [`DecodeError::WrongLength`] unless `bytes.len() == T::SIZE`.
pub fn decode<T: WireFormat>(bytes: &[u8]) -> Result<T, DecodeError> {
    if bytes.len() != T::SIZE {
        return Err(DecodeError::WrongLength {
            expected: T::SIZE,
            actual: bytes.len(),
        });
    }
    Ok(T::read(&mut WordReader::new(bytes)))
}

/// Encode a value into its fixed shape.
#[must_use]
pub fn encode<T: WireFormat>(value: &T) -> Vec<u8> {
    let mut writer = WordWriter::with_capacity(T::SIZE);
    value.write(&mut writer);
    writer.finish()
}

/// Request without parameters (protocol version and attributes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmptyRequest;

impl WireFormat for EmptyRequest {
    const SIZE: usize = 0;

    fn read(_reader: &mut WordReader<'_>) -> Self {
        Self
    }

    fn write(&self, _writer: &mut WordWriter) {}
}

/// Protocol message attributes request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageAttributesRequest {
    /// Message id being queried.
    pub message_id: u32,
}

impl WireFormat for MessageAttributesRequest {
    const SIZE: usize = WORD_SIZE;

    fn read(reader: &mut WordReader<'_>) -> Self {
        Self {
            message_id: reader.read_u32(),
        }
    }

    fn write(&self, writer: &mut WordWriter) {
        writer.put_u32(self.message_id);
    }
}

/// Clock attributes request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockAttributesRequest {
    /// Protocol clock index.
    pub clock_id: u32,
}

impl WireFormat for ClockAttributesRequest {
    const SIZE: usize = WORD_SIZE;

    fn read(reader: &mut WordReader<'_>) -> Self {
        Self {
            clock_id: reader.read_u32(),
        }
    }

    fn write(&self, writer: &mut WordWriter) {
        writer.put_u32(self.clock_id);
    }
}

/// Describe rates request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescribeRatesRequest {
    /// Protocol clock index.
    pub clock_id: u32,
    /// First discrete rate to return.
    pub rate_index: u32,
}

impl WireFormat for DescribeRatesRequest {
    const SIZE: usize = 2 * WORD_SIZE;

    fn read(reader: &mut WordReader<'_>) -> Self {
        Self {
            clock_id: reader.read_u32(),
            rate_index: reader.read_u32(),
        }
    }

    fn write(&self, writer: &mut WordWriter) {
        writer.put_u32(self.clock_id).put_u32(self.rate_index);
    }
}

/// Rate set request: `flags, clock_id, rate_low, rate_high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSetRequest {
    /// Request flags (reserved at this layer).
    pub flags: u32,
    /// Protocol clock index.
    pub clock_id: u32,
    /// Requested rate in Hz.
    pub rate: u64,
}

impl WireFormat for RateSetRequest {
    const SIZE: usize = 4 * WORD_SIZE;

    fn read(reader: &mut WordReader<'_>) -> Self {
        Self {
            flags: reader.read_u32(),
            clock_id: reader.read_u32(),
            rate: reader.read_rate(),
        }
    }

    fn write(&self, writer: &mut WordWriter) {
        writer
            .put_u32(self.flags)
            .put_u32(self.clock_id)
            .put_rate(self.rate);
    }
}

/// Rate get request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateGetRequest {
    /// Protocol clock index.
    pub clock_id: u32,
}

impl WireFormat for RateGetRequest {
    const SIZE: usize = WORD_SIZE;

    fn read(reader: &mut WordReader<'_>) -> Self {
        Self {
            clock_id: reader.read_u32(),
        }
    }

    fn write(&self, writer: &mut WordWriter) {
        writer.put_u32(self.clock_id);
    }
}

/// Config set request: `clock_id, attributes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigSetRequest {
    /// Protocol clock index.
    pub clock_id: u32,
    /// Bit 0 enables the clock; other bits are reserved.
    pub attributes: u32,
}

impl ConfigSetRequest {
    /// Enable flag (bit 0 of the attributes).
    pub const ENABLE: u32 = 1 << 0;

    /// Returns true if the request enables the clock.
    #[must_use]
    pub fn enable(&self) -> bool {
        self.attributes & Self::ENABLE != 0
    }
}

impl WireFormat for ConfigSetRequest {
    const SIZE: usize = 2 * WORD_SIZE;

    fn read(reader: &mut WordReader<'_>) -> Self {
        Self {
            clock_id: reader.read_u32(),
            attributes: reader.read_u32(),
        }
    }

    fn write(&self, writer: &mut WordWriter) {
        writer.put_u32(self.clock_id).put_u32(self.attributes);
    }
}

const_assert_eq!(<RateSetRequest as WireFormat>::SIZE, 16);
const_assert_eq!(<RateGetRequest as WireFormat>::SIZE, 4);
const_assert_eq!(<ConfigSetRequest as WireFormat>::SIZE, 8);
const_assert_eq!(<DescribeRatesRequest as WireFormat>::SIZE, 8);

/// Encode a clock name into the fixed, NUL-terminated name field.
#[must_use]
pub fn encode_clock_name(name: &str) -> [u8; CLOCK_NAME_LEN] {
    let mut field = [0u8; CLOCK_NAME_LEN];
    let bytes = name.as_bytes();
    let len = bytes.len().min(CLOCK_NAME_LEN - 1);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}
