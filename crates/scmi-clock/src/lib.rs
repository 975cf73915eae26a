//! SCMI clock management protocol handler.
//!
//! This crate provides:
//! - [`ClockBackend`] trait for abstracting the clock-control hardware
//! - [`codec`] module with the fixed-layout little-endian payload codec
//! - [`registry`] module mapping protocol clock indices to backend clocks
//! - [`ClockProtocol`] with one handler per command and the message dispatcher
//! - [`ScmiClockService`] serving several agents over one backend
//! - [`SimulatedClockBackend`] built from the platform configuration

pub mod backend;
pub mod codec;
mod dispatch;
pub mod handlers;
pub mod message;
pub mod registry;
pub mod response;
pub mod service;
#[cfg(feature = "simulated")]
pub mod simulated;
pub mod status;

pub use backend::*;
pub use codec::{decode, encode, join_rate, split_rate, DecodeError, WireFormat};
pub use handlers::ClockProtocol;
pub use message::MessageId;
pub use registry::{ClockRegistry, ClockRegistryEntry, ResourceRef};
pub use response::ClockResponse;
pub use service::{MessageStats, ScmiClockService, StatsSnapshot};
#[cfg(feature = "simulated")]
pub use simulated::SimulatedClockBackend;
pub use status::{translate, ProtocolStatus};

/// SCMI protocol identifier of the clock management protocol.
pub const PROTOCOL_ID: u8 = 0x14;

/// Implemented protocol version (major 1, minor 0).
pub const PROTOCOL_VERSION: u32 = 0x0001_0000;
