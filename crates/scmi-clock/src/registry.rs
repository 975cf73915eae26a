//! Per-agent clock registry.
//!
//! Maps the protocol-visible clock index an agent uses to the backend clock
//! it designates. Built once from configuration and never mutated, so it can
//! be shared between any number of concurrent dispatches without locking.
//!
//! Indices that were never configured and indices past the end both resolve
//! to "absent"; callers cannot and need not tell them apart.

use scmi_common::{AgentConfig, PlatformConfig, ScmiError, ScmiResult};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Opaque handle naming one clock of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceRef(pub u32);

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clock#{}", self.0)
    }
}

/// One slot of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ClockRegistryEntry {
    /// Backend clock, `None` for a reserved slot.
    pub resource: Option<ResourceRef>,
    /// Enable the clock when the protocol starts.
    pub starts_enabled: bool,
}

impl ClockRegistryEntry {
    /// Entry for a configured clock.
    #[must_use]
    pub fn new(resource: ResourceRef) -> Self {
        Self {
            resource: Some(resource),
            starts_enabled: false,
        }
    }
}

/// Read-only map from protocol clock index to backend clock.
#[derive(Debug, Clone, Default)]
pub struct ClockRegistry {
    entries: Box<[ClockRegistryEntry]>,
}

impl ClockRegistry {
    /// Build a registry of `count` slots from `(index, resource)` pairs.
    /// Slots not named default to absent.
    ///
    /// # Errors
    ///
    /// Fails on an index `>= count` or an index given twice.
    pub fn new(
        count: u32,
        resources: impl IntoIterator<Item = (u32, ResourceRef)>,
    ) -> ScmiResult<Self> {
        Self::with_entries(
            count,
            resources
                .into_iter()
                .map(|(index, resource)| (index, ClockRegistryEntry::new(resource))),
        )
    }

    /// Build a registry of `count` slots from full entries.
    ///
    /// # Errors
    ///
    /// Fails on an index `>= count` or an index given twice.
    pub fn with_entries(
        count: u32,
        entries: impl IntoIterator<Item = (u32, ClockRegistryEntry)>,
    ) -> ScmiResult<Self> {
        let mut slots: Vec<Option<ClockRegistryEntry>> = vec![None; count as usize];

        for (index, entry) in entries {
            let slot = slots
                .get_mut(index as usize)
                .ok_or(ScmiError::ClockIndexOutOfBounds { index, count })?;
            if slot.is_some() {
                return Err(ScmiError::DuplicateClockIndex { index });
            }
            *slot = Some(entry);
        }

        Ok(Self {
            entries: slots.into_iter().map(Option::unwrap_or_default).collect(),
        })
    }

    /// Build the registry for one agent of the platform configuration. The
    /// position in the agent's device table is the protocol clock index;
    /// the position of the clock in the platform table is its resource.
    ///
    /// # Errors
    ///
    /// Fails if a device names a clock missing from the platform table.
    pub fn from_agent(config: &PlatformConfig, agent: &AgentConfig) -> ScmiResult<Self> {
        let count = u32::try_from(agent.devices.len()).map_err(|_| {
            ScmiError::Config(format!("agent '{}' has too many devices", agent.name))
        })?;

        let mut entries = Vec::with_capacity(agent.devices.len());
        for (index, device) in (0u32..).zip(&agent.devices) {
            let resource = match device.clock.as_deref() {
                Some(name) => {
                    let position = config
                        .clock_index(name)
                        .ok_or_else(|| ScmiError::UnknownClock(name.to_string()))?;
                    let position = u32::try_from(position)
                        .map_err(|_| ScmiError::UnknownClock(name.to_string()))?;
                    Some(ResourceRef(position))
                }
                None => None,
            };
            entries.push((
                index,
                ClockRegistryEntry {
                    resource,
                    starts_enabled: device.starts_enabled,
                },
            ));
        }

        debug!(agent = %agent.name, count, "Built clock registry");
        Self::with_entries(count, entries)
    }

    /// Build the registry for the named agent.
    ///
    /// # Errors
    ///
    /// Fails if the agent is not configured or its device table is invalid.
    pub fn for_agent(config: &PlatformConfig, agent: &str) -> ScmiResult<Self> {
        let agent_config = config
            .agent(agent)
            .ok_or_else(|| ScmiError::UnknownAgent(agent.to_string()))?;
        Self::from_agent(config, agent_config)
    }

    /// Registry with no clocks.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve a protocol clock index; `None` if absent or out of range.
    #[must_use]
    pub fn lookup(&self, index: u32) -> Option<ResourceRef> {
        self.entry(index).and_then(|entry| entry.resource)
    }

    /// Slot for a protocol clock index.
    #[must_use]
    pub fn entry(&self, index: u32) -> Option<&ClockRegistryEntry> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.entries.get(index))
    }

    /// Number of protocol clock indices (configured or reserved).
    #[must_use]
    pub fn count(&self) -> u32 {
        u32::try_from(self.entries.len()).unwrap_or(u32::MAX)
    }

    /// Iterate over `(index, entry)` for every slot.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &ClockRegistryEntry)> {
        (0u32..).zip(self.entries.iter())
    }
}
