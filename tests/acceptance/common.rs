//! Common utilities for acceptance tests.
//!
//! Provides helpers for:
//! - Loading the reference platform configuration
//! - Building a clock service over the simulated backend
//! - Sending word payloads and decoding responses

#![allow(dead_code)] // Not every helper is used by every scenario file

use scmi_clock::{MessageId, ScmiClockService, SimulatedClockBackend};
use scmi_common::PlatformConfig;
use std::path::PathBuf;
use std::sync::Arc;

/// Path of the reference platform shipped with the workspace.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/default.toml")
}

/// Load the reference platform.
pub fn default_config() -> PlatformConfig {
    PlatformConfig::from_file(&default_config_path()).expect("reference platform should load")
}

/// Clock service over a fresh simulated backend for `config`.
pub fn service_for(config: &PlatformConfig) -> ScmiClockService<SimulatedClockBackend> {
    let backend = Arc::new(SimulatedClockBackend::from_config(config));
    ScmiClockService::new(config, backend).expect("service should build")
}

/// Clock service for the reference platform.
pub fn default_service() -> ScmiClockService<SimulatedClockBackend> {
    service_for(&default_config())
}

/// Response decoded into its status code and trailing words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Wire status code.
    pub status: i32,
    /// Words after the status.
    pub words: Vec<u32>,
    /// Raw length in bytes.
    pub len: usize,
}

/// Send `words` as message `id` from `agent` and decode the single reply.
pub fn send(
    service: &ScmiClockService<SimulatedClockBackend>,
    agent: &str,
    id: MessageId,
    words: &[u32],
) -> Reply {
    send_raw(service, agent, id.id(), &encode_words(words))
}

/// Send a raw payload and decode the single reply.
pub fn send_raw(
    service: &ScmiClockService<SimulatedClockBackend>,
    agent: &str,
    message_id: u32,
    payload: &[u8],
) -> Reply {
    let mut replies = Vec::new();
    service.handle_message(agent, message_id, payload, |bytes| {
        replies.push(bytes.to_vec());
    });
    assert_eq!(replies.len(), 1, "exactly one reply per message");

    let bytes = &replies[0];
    let mut iter = bytes
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]]);
    let status = i32::from_le_bytes(iter.next().expect("status word"));
    Reply {
        status,
        words: iter.map(u32::from_le_bytes).collect(),
        len: bytes.len(),
    }
}

/// Encode words as a little-endian payload.
pub fn encode_words(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Split a rate into `(low, high)` words.
pub fn rate_words(rate: u64) -> [u32; 2] {
    let (low, high) = scmi_clock::split_rate(rate);
    [low, high]
}

/// Decode a NUL-padded clock name field from four words.
pub fn name_from_words(words: &[u32]) -> String {
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
