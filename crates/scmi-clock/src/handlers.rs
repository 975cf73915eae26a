//! Command handlers.
//!
//! Every clock command follows the same contract:
//! 1. decode the payload (wrong length: `InvalidParameters`, nothing else runs)
//! 2. resolve the clock index (absent: `NotFound`, the backend is not called)
//! 3. make exactly one synchronous backend call
//! 4. translate the backend result into the reported status
//!
//! Handlers never panic on request input and never retry.

use crate::backend::{BackendResult, ClockBackend, RateSpec, RoundingMode};
use crate::codec::{
    self, encode_clock_name, ClockAttributesRequest, ConfigSetRequest, DescribeRatesRequest,
    EmptyRequest, MessageAttributesRequest, RateGetRequest, RateSetRequest, WireFormat,
};
use crate::message::MessageId;
use crate::registry::{ClockRegistry, ResourceRef};
use crate::response::ClockResponse;
use crate::status::{translate, ProtocolStatus};
use crate::PROTOCOL_VERSION;
use scmi_common::{ClockState, MAX_AGENT_CLOCKS};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of discrete rates returned by one describe rates reply.
pub const MAX_RATES_PER_RESPONSE: usize = 8;

/// Bit 12 of `num_rates_flags`: the rates are a `(min, max, step)` triplet.
pub const RATE_FORMAT_RANGE: u32 = 1 << 12;

/// Clock attributes bit 0: clock is running.
pub const CLOCK_ATTR_RUNNING: u32 = 1 << 0;

type HandlerResult = Result<ClockResponse, ProtocolStatus>;

/// Clock protocol instance serving one agent.
///
/// Holds the agent's read-only clock registry and a shared handle to the
/// clock backend. Handlers take `&self` and may run concurrently.
#[derive(Debug)]
pub struct ClockProtocol<B> {
    registry: Arc<ClockRegistry>,
    backend: Arc<B>,
    max_pending_transactions: u8,
}

impl<B> Clone for ClockProtocol<B> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            backend: Arc::clone(&self.backend),
            max_pending_transactions: self.max_pending_transactions,
        }
    }
}

impl<B: ClockBackend> ClockProtocol<B> {
    /// Create a protocol instance over a registry and a backend.
    pub fn new(registry: Arc<ClockRegistry>, backend: Arc<B>) -> Self {
        Self {
            registry,
            backend,
            max_pending_transactions: 0,
        }
    }

    /// Set the max pending transactions reported by protocol attributes.
    #[must_use]
    pub fn with_max_pending_transactions(mut self, max_pending_transactions: u8) -> Self {
        self.max_pending_transactions = max_pending_transactions;
        self
    }

    /// Clock registry of this agent.
    pub fn registry(&self) -> &ClockRegistry {
        &self.registry
    }

    /// Shared backend.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    // ========================================================================
    // Protocol discovery
    // ========================================================================

    /// PROTOCOL_VERSION: report the implemented version.
    pub fn protocol_version(&self, payload: &[u8]) -> ClockResponse {
        Self::decode_request::<EmptyRequest>(MessageId::ProtocolVersion, payload)
            .map(|_| ClockResponse::ProtocolVersion {
                version: PROTOCOL_VERSION,
            })
            .unwrap_or_else(ClockResponse::Status)
    }

    /// PROTOCOL_ATTRIBUTES: clock count in bits 15..0, max pending
    /// transactions in bits 23..16.
    pub fn protocol_attributes(&self, payload: &[u8]) -> ClockResponse {
        self.try_protocol_attributes(payload)
            .unwrap_or_else(ClockResponse::Status)
    }

    fn try_protocol_attributes(&self, payload: &[u8]) -> HandlerResult {
        Self::decode_request::<EmptyRequest>(MessageId::ProtocolAttributes, payload)?;

        let max_clocks = u32::try_from(MAX_AGENT_CLOCKS).unwrap_or(u32::MAX);
        let count = self.registry.count().min(max_clocks);
        let attributes = (u32::from(self.max_pending_transactions) << 16) | count;

        debug!(count, max_pending = self.max_pending_transactions, "Protocol attributes");
        Ok(ClockResponse::Attributes { attributes })
    }

    /// PROTOCOL_MESSAGE_ATTRIBUTES: success for implemented messages,
    /// `NotFound` otherwise.
    pub fn protocol_message_attributes(&self, payload: &[u8]) -> ClockResponse {
        Self::decode_request::<MessageAttributesRequest>(
            MessageId::ProtocolMessageAttributes,
            payload,
        )
        .and_then(|request| match MessageId::from_u32(request.message_id) {
            Some(_) => Ok(ClockResponse::Attributes { attributes: 0 }),
            None => {
                debug!(message_id = request.message_id, "Queried unimplemented message");
                Err(ProtocolStatus::NotFound)
            }
        })
        .unwrap_or_else(ClockResponse::Status)
    }

    // ========================================================================
    // Clock queries
    // ========================================================================

    /// CLOCK_ATTRIBUTES: run state and name of a clock.
    pub fn clock_attributes(&self, payload: &[u8]) -> ClockResponse {
        self.try_clock_attributes(payload)
            .unwrap_or_else(ClockResponse::Status)
    }

    fn try_clock_attributes(&self, payload: &[u8]) -> HandlerResult {
        let request =
            Self::decode_request::<ClockAttributesRequest>(MessageId::ClockAttributes, payload)?;
        let clock = self.resolve(MessageId::ClockAttributes, request.clock_id)?;
        let descriptor =
            Self::complete(MessageId::ClockAttributes, clock, self.backend.describe(clock))?;

        debug!(
            clock_id = request.clock_id,
            name = %descriptor.name,
            state = %descriptor.state,
            "Clock attributes"
        );
        let attributes = if descriptor.state.is_running() {
            CLOCK_ATTR_RUNNING
        } else {
            0
        };
        Ok(ClockResponse::ClockAttributes {
            attributes,
            name: encode_clock_name(&descriptor.name),
        })
    }

    /// CLOCK_DESCRIBE_RATES: supported rates of a clock.
    ///
    /// Range clocks answer with a `(min, max, step)` triplet. Discrete
    /// clocks return up to [`MAX_RATES_PER_RESPONSE`] rates starting at
    /// `rate_index`, with the remaining count in bits 31..16.
    pub fn describe_rates(&self, payload: &[u8]) -> ClockResponse {
        self.try_describe_rates(payload)
            .unwrap_or_else(ClockResponse::Status)
    }

    fn try_describe_rates(&self, payload: &[u8]) -> HandlerResult {
        let request =
            Self::decode_request::<DescribeRatesRequest>(MessageId::DescribeRates, payload)?;
        let clock = self.resolve(MessageId::DescribeRates, request.clock_id)?;
        let descriptor =
            Self::complete(MessageId::DescribeRates, clock, self.backend.describe(clock))?;

        match descriptor.rates {
            RateSpec::Range { min, max, step } => Ok(ClockResponse::DescribeRates {
                num_rates_flags: RATE_FORMAT_RANGE | 3,
                rates: vec![min, max, step],
            }),
            RateSpec::Discrete(rates) => {
                let start = usize::try_from(request.rate_index).unwrap_or(usize::MAX);
                if start >= rates.len() {
                    warn!(
                        clock_id = request.clock_id,
                        rate_index = request.rate_index,
                        available = rates.len(),
                        "Rate index past end of rate list"
                    );
                    return Err(ProtocolStatus::OutOfRange);
                }

                let page: Vec<u64> = rates
                    .iter()
                    .skip(start)
                    .take(MAX_RATES_PER_RESPONSE)
                    .copied()
                    .collect();
                let remaining = rates.len() - start - page.len();
                let to_word = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);

                Ok(ClockResponse::DescribeRates {
                    num_rates_flags: (to_word(remaining) << 16) | to_word(page.len()),
                    rates: page,
                })
            }
        }
    }

    // ========================================================================
    // Clock control
    // ========================================================================

    /// CLOCK_RATE_SET: request a new rate, rounded to the nearest supported
    /// rate. The flags word is accepted and ignored.
    pub fn rate_set(&self, payload: &[u8]) -> ClockResponse {
        ClockResponse::Status(match self.try_rate_set(payload) {
            Ok(()) => ProtocolStatus::Success,
            Err(status) => status,
        })
    }

    fn try_rate_set(&self, payload: &[u8]) -> Result<(), ProtocolStatus> {
        let request = Self::decode_request::<RateSetRequest>(MessageId::RateSet, payload)?;
        let clock = self.resolve(MessageId::RateSet, request.clock_id)?;
        let result = self
            .backend
            .set_rate(clock, request.rate, RoundingMode::Nearest);
        Self::complete(MessageId::RateSet, clock, result)?;

        info!(
            clock_id = request.clock_id,
            %clock,
            requested = request.rate,
            "Clock rate set"
        );
        Ok(())
    }

    /// CLOCK_RATE_GET: current rate. Always answers with status and rate;
    /// the rate is zero unless the status is success.
    pub fn rate_get(&self, payload: &[u8]) -> ClockResponse {
        match self.try_rate_get(payload) {
            Ok(rate) => ClockResponse::RateGet {
                status: ProtocolStatus::Success,
                rate,
            },
            Err(status) => ClockResponse::RateGet { status, rate: 0 },
        }
    }

    fn try_rate_get(&self, payload: &[u8]) -> Result<u64, ProtocolStatus> {
        let request = Self::decode_request::<RateGetRequest>(MessageId::RateGet, payload)?;
        let clock = self.resolve(MessageId::RateGet, request.clock_id)?;
        let rate = Self::complete(MessageId::RateGet, clock, self.backend.get_rate(clock))?;

        debug!(clock_id = request.clock_id, rate, "Clock rate read");
        Ok(rate)
    }

    /// CLOCK_CONFIG_SET: start (attributes bit 0 set) or stop a clock.
    pub fn config_set(&self, payload: &[u8]) -> ClockResponse {
        ClockResponse::Status(match self.try_config_set(payload) {
            Ok(()) => ProtocolStatus::Success,
            Err(status) => status,
        })
    }

    fn try_config_set(&self, payload: &[u8]) -> Result<(), ProtocolStatus> {
        let request = Self::decode_request::<ConfigSetRequest>(MessageId::ConfigSet, payload)?;
        let clock = self.resolve(MessageId::ConfigSet, request.clock_id)?;
        let state = ClockState::from_enabled(request.enable());
        Self::complete(MessageId::ConfigSet, clock, self.backend.set_state(clock, state))?;

        info!(clock_id = request.clock_id, %clock, %state, "Clock state set");
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn decode_request<T: WireFormat>(
        message: MessageId,
        payload: &[u8],
    ) -> Result<T, ProtocolStatus> {
        codec::decode::<T>(payload).map_err(|e| {
            warn!(%message, error = %e, "Malformed payload");
            ProtocolStatus::InvalidParameters
        })
    }

    fn resolve(&self, message: MessageId, clock_id: u32) -> Result<ResourceRef, ProtocolStatus> {
        self.registry.lookup(clock_id).ok_or_else(|| {
            warn!(%message, clock_id, count = self.registry.count(), "Unknown clock");
            ProtocolStatus::NotFound
        })
    }

    /// Translate a backend result, logging failures.
    fn complete<T>(
        message: MessageId,
        clock: ResourceRef,
        result: BackendResult<T>,
    ) -> Result<T, ProtocolStatus> {
        let status = translate(&result);
        result.map_err(|e| {
            warn!(%message, %clock, error = %e, %status, "Backend rejected request");
            status
        })
    }
}
