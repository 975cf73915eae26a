//! Message dispatch.

use crate::backend::ClockBackend;
use crate::handlers::ClockProtocol;
use crate::message::MessageId;
use crate::response::ClockResponse;
use crate::status::ProtocolStatus;
use tracing::{debug, warn};

impl<B: ClockBackend> ClockProtocol<B> {
    /// Route one message to its handler.
    ///
    /// Unknown message ids produce a status-only `NotSupported` response
    /// without touching the registry or the backend.
    pub fn dispatch(&self, message_id: u32, payload: &[u8]) -> ClockResponse {
        let Some(message) = MessageId::from_u32(message_id) else {
            warn!(message_id, len = payload.len(), "Unsupported message id");
            return ClockResponse::Status(ProtocolStatus::NotSupported);
        };

        debug!(%message, len = payload.len(), "Dispatching");
        match message {
            MessageId::ProtocolVersion => self.protocol_version(payload),
            MessageId::ProtocolAttributes => self.protocol_attributes(payload),
            MessageId::ProtocolMessageAttributes => self.protocol_message_attributes(payload),
            MessageId::ClockAttributes => self.clock_attributes(payload),
            MessageId::DescribeRates => self.describe_rates(payload),
            MessageId::RateSet => self.rate_set(payload),
            MessageId::RateGet => self.rate_get(payload),
            MessageId::ConfigSet => self.config_set(payload),
        }
    }
}
