//! Platform configuration for the SCMI clock firmware.
//!
//! Describes the physical clocks of the platform (rate ranges, PLL
//! defaults, lock times) and, per SCMI agent, which of those clocks are
//! visible and under which protocol clock index. Loaded once from TOML at
//! startup; nothing in it is mutated afterwards.

use crate::state::ClockState;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Largest number of clocks an agent can address (16-bit count field).
pub const MAX_AGENT_CLOCKS: usize = 0xFFFF;

/// Top-level platform configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Protocol-level settings.
    pub scmi: ScmiConfig,

    /// Physical clock table, in backend element order.
    pub clocks: Vec<ClockConfig>,

    /// Agents and their clock device tables.
    pub agents: Vec<AgentConfig>,
}

/// Protocol-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScmiConfig {
    /// Maximum number of pending asynchronous rate changes (0 = none).
    pub max_pending_transactions: u8,
}

/// One physical clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Clock name, reported to agents (truncated to 15 bytes on the wire).
    pub name: String,

    /// Supported rates.
    pub rates: RateConfig,

    /// Whether agents may change the rate of this clock.
    #[serde(default = "default_true")]
    pub supports_rate_change: bool,

    /// Rate at boot. Derived from `pll` or the minimum rate when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_rate: Option<u64>,

    /// Run state at boot.
    #[serde(default)]
    pub initial_state: ClockState,

    /// Default PLL parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pll: Option<PllConfig>,

    /// Time the PLL needs to relock after a rate change.
    #[serde(default, with = "humantime_serde")]
    pub lock_time: Duration,
}

fn default_true() -> bool {
    true
}

/// Supported rates of a clock.
///
/// In TOML either `{ min = .., max = .., step = .. }` or
/// `{ discrete = [..] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RateConfig {
    /// Linear range `min, min + step, ..., max`.
    Range {
        /// Lowest rate in Hz.
        min: u64,
        /// Highest rate in Hz.
        max: u64,
        /// Step between rates in Hz.
        step: u64,
    },
    /// Explicit list of rates in Hz, ascending.
    Discrete {
        /// Supported rates.
        discrete: Vec<u64>,
    },
}

impl RateConfig {
    /// Lowest supported rate.
    #[must_use]
    pub fn min(&self) -> u64 {
        match self {
            Self::Range { min, .. } => *min,
            Self::Discrete { discrete } => discrete.iter().min().copied().unwrap_or(0),
        }
    }

    /// Highest supported rate.
    #[must_use]
    pub fn max(&self) -> u64 {
        match self {
            Self::Range { max, .. } => *max,
            Self::Discrete { discrete } => discrete.iter().max().copied().unwrap_or(0),
        }
    }

    /// Returns true if `rate` lies inside the supported set.
    #[must_use]
    pub fn contains(&self, rate: u64) -> bool {
        match self {
            Self::Range { min, max, .. } => (*min..=*max).contains(&rate),
            Self::Discrete { discrete } => discrete.contains(&rate),
        }
    }
}

/// PLL parameters: `rate = ref_freq * multiplier / (divider * post_div)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PllConfig {
    /// Reference input frequency in Hz.
    pub ref_freq: u64,
    /// Feedback multiplier.
    pub multiplier: u32,
    /// Input divider.
    pub divider: u32,
    /// Output divider.
    pub post_div: u32,
}

impl PllConfig {
    /// Output rate produced by these parameters, `None` on a zero divisor
    /// or overflow.
    #[must_use]
    pub fn output_rate(&self) -> Option<u64> {
        let divisor = u64::from(self.divider).checked_mul(u64::from(self.post_div))?;
        if divisor == 0 {
            return None;
        }
        self.ref_freq
            .checked_mul(u64::from(self.multiplier))
            .map(|rate| rate / divisor)
    }
}

impl ClockConfig {
    /// Rate the clock runs at after boot.
    #[must_use]
    pub fn effective_initial_rate(&self) -> u64 {
        self.initial_rate
            .or_else(|| self.pll.and_then(|pll| pll.output_rate()))
            .unwrap_or_else(|| self.rates.min())
    }
}

/// One SCMI agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent name (e.g. "ospm").
    pub name: String,

    /// Device table; position is the protocol clock index.
    #[serde(default)]
    pub devices: Vec<AgentDeviceConfig>,
}

/// One entry of an agent's device table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentDeviceConfig {
    /// Name of the platform clock, or `None` for a reserved slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock: Option<String>,

    /// Enable the clock when the protocol starts.
    #[serde(default)]
    pub starts_enabled: bool,
}

impl PlatformConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or the tables are inconsistent.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Position of the named clock in the platform table.
    #[must_use]
    pub fn clock_index(&self, name: &str) -> Option<usize> {
        self.clocks.iter().position(|c| c.name == name)
    }

    /// Look up an agent by name.
    #[must_use]
    pub fn agent(&self, name: &str) -> Option<&AgentConfig> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Check the clock and agent tables for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for clock in &self.clocks {
            if clock.name.is_empty() {
                return Err(ConfigError::Invalid("clock with empty name".into()));
            }
            if !names.insert(clock.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate clock name '{}'",
                    clock.name
                )));
            }
            validate_clock(clock)?;
        }

        let mut referenced = HashSet::new();
        let mut agent_names = HashSet::new();
        for agent in &self.agents {
            if !agent_names.insert(agent.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate agent name '{}'",
                    agent.name
                )));
            }
            if agent.devices.len() > MAX_AGENT_CLOCKS {
                return Err(ConfigError::Invalid(format!(
                    "agent '{}' has {} devices (max {MAX_AGENT_CLOCKS})",
                    agent.name,
                    agent.devices.len()
                )));
            }
            for device in &agent.devices {
                let Some(clock) = device.clock.as_deref() else {
                    continue;
                };
                if !names.contains(clock) {
                    return Err(ConfigError::Invalid(format!(
                        "agent '{}' references unknown clock '{clock}'",
                        agent.name
                    )));
                }
                referenced.insert(clock);
            }
        }

        for clock in &self.clocks {
            if !referenced.contains(clock.name.as_str()) {
                warn!(clock = %clock.name, "Clock is not visible to any agent");
            }
        }

        Ok(())
    }
}

fn validate_clock(clock: &ClockConfig) -> Result<(), ConfigError> {
    let invalid = |msg: String| ConfigError::Invalid(format!("clock '{}': {msg}", clock.name));

    match &clock.rates {
        RateConfig::Range { min, max, step } => {
            if min > max {
                return Err(invalid(format!("min rate {min} exceeds max rate {max}")));
            }
            if *step == 0 && min != max {
                return Err(invalid("step must be non-zero".into()));
            }
        }
        RateConfig::Discrete { discrete } => {
            if discrete.is_empty() {
                return Err(invalid("discrete rate list is empty".into()));
            }
            if discrete.windows(2).any(|w| w[0] >= w[1]) {
                return Err(invalid("discrete rates must be strictly ascending".into()));
            }
        }
    }

    if let Some(pll) = &clock.pll {
        if pll.output_rate().is_none() {
            return Err(invalid("PLL parameters produce no valid rate".into()));
        }
    }

    let initial = clock.effective_initial_rate();
    if !clock.rates.contains(initial) {
        return Err(invalid(format!(
            "initial rate {initial} outside supported rates"
        )));
    }

    Ok(())
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Tables are inconsistent.
    #[error("invalid platform configuration: {0}")]
    Invalid(String),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
