//! Transport-facing clock service.
//!
//! Owns one [`ClockProtocol`] per configured agent, all sharing a single
//! backend. The transport hands each message over together with a one-shot
//! reply callback; the service dispatches it, encodes the response and
//! invokes the callback exactly once.

use crate::backend::ClockBackend;
use crate::handlers::ClockProtocol;
use crate::registry::ClockRegistry;
use crate::status::ProtocolStatus;
use scmi_common::{ClockState, PlatformConfig, ScmiResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Message counters, updated lock-free from any dispatch thread.
#[derive(Debug, Default)]
pub struct MessageStats {
    total: AtomicU64,
    by_status: [AtomicU64; ProtocolStatus::ALL.len()],
}

impl MessageStats {
    /// Count one handled message.
    pub fn record(&self, status: ProtocolStatus) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if let Some(slot) = ProtocolStatus::ALL
            .iter()
            .position(|s| *s == status)
            .and_then(|i| self.by_status.get(i))
        {
            slot.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Total messages handled.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Messages answered with `status`.
    pub fn count(&self, status: ProtocolStatus) -> u64 {
        ProtocolStatus::ALL
            .iter()
            .position(|s| *s == status)
            .and_then(|i| self.by_status.get(i))
            .map_or(0, |slot| slot.load(Ordering::Relaxed))
    }

    /// Point-in-time copy of the counters. Statuses never reported are
    /// omitted.
    pub fn snapshot(&self) -> StatsSnapshot {
        let by_status = ProtocolStatus::ALL
            .iter()
            .map(|status| (status.to_string(), self.count(*status)))
            .filter(|(_, count)| *count > 0)
            .collect();
        StatsSnapshot {
            total: self.total(),
            by_status,
        }
    }
}

/// Serializable copy of [`MessageStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Total messages handled.
    pub total: u64,
    /// Messages per reported status name.
    pub by_status: BTreeMap<String, u64>,
}

/// Clock protocol service for all agents of a platform.
#[derive(Debug)]
pub struct ScmiClockService<B> {
    agents: Vec<(String, ClockProtocol<B>)>,
    /// Serves agents missing from the configuration; every clock is absent.
    fallback: ClockProtocol<B>,
    backend: Arc<B>,
    stats: MessageStats,
}

impl<B: ClockBackend> ScmiClockService<B> {
    /// Build per-agent protocols from the platform configuration and enable
    /// every device flagged `starts_enabled`.
    ///
    /// # Errors
    ///
    /// Fails if an agent's device table cannot be turned into a registry.
    pub fn new(config: &PlatformConfig, backend: Arc<B>) -> ScmiResult<Self> {
        let max_pending = config.scmi.max_pending_transactions;

        let mut agents = Vec::with_capacity(config.agents.len());
        for agent in &config.agents {
            let registry = Arc::new(ClockRegistry::from_agent(config, agent)?);
            let protocol = ClockProtocol::new(registry, Arc::clone(&backend))
                .with_max_pending_transactions(max_pending);
            info!(
                agent = %agent.name,
                clocks = protocol.registry().count(),
                "Registered SCMI agent"
            );
            agents.push((agent.name.clone(), protocol));
        }

        let fallback = ClockProtocol::new(Arc::new(ClockRegistry::empty()), Arc::clone(&backend))
            .with_max_pending_transactions(max_pending);

        let service = Self {
            agents,
            fallback,
            backend,
            stats: MessageStats::default(),
        };
        service.enable_startup_clocks();
        Ok(service)
    }

    fn enable_startup_clocks(&self) {
        for (agent, protocol) in &self.agents {
            for (index, entry) in protocol.registry().iter() {
                let Some(resource) = entry.resource.filter(|_| entry.starts_enabled) else {
                    continue;
                };
                match self.backend.set_state(resource, ClockState::Running) {
                    Ok(()) => debug!(%agent, clock_id = index, %resource, "Clock enabled at startup"),
                    Err(e) => warn!(
                        %agent,
                        clock_id = index,
                        %resource,
                        error = %e,
                        "Failed to enable clock at startup"
                    ),
                }
            }
        }
    }

    /// Protocol instance serving `agent`; unknown agents get one with an
    /// empty registry.
    pub fn protocol(&self, agent: &str) -> &ClockProtocol<B> {
        self.agents
            .iter()
            .find(|(name, _)| name == agent)
            .map_or(&self.fallback, |(_, protocol)| protocol)
    }

    /// Names of the configured agents.
    pub fn agents(&self) -> impl Iterator<Item = &str> {
        self.agents.iter().map(|(name, _)| name.as_str())
    }

    /// Handle one message from `agent` and pass the encoded response to
    /// `reply`. Returns the reported status.
    pub fn handle_message<R>(
        &self,
        agent: &str,
        message_id: u32,
        payload: &[u8],
        reply: R,
    ) -> ProtocolStatus
    where
        R: FnOnce(&[u8]),
    {
        let response = self.protocol(agent).dispatch(message_id, payload);
        let status = response.status();
        self.stats.record(status);

        debug!(%agent, message_id, %status, "Replying");
        reply(&response.encode());
        status
    }

    /// Message counters.
    pub fn stats(&self) -> &MessageStats {
        &self.stats
    }

    /// Shared backend.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }
}
