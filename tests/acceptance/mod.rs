//! End-to-end acceptance tests for the SCMI clock firmware.
//!
//! These tests drive the clock service the way a transport would, with raw
//! message ids and word payloads, over the reference platform in
//! `config/default.toml` and a simulated backend:
//! - Rate and state control scenarios
//! - Protocol discovery
//! - Agent isolation and error reporting
//! - Platform configuration loading

mod common;
mod discovery_test;
mod error_test;
mod rate_control_test;
