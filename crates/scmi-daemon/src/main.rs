//! SCMI clock daemon entry point.
//!
//! Loads the platform configuration, builds the clock service over the
//! simulated backend, and exercises it from the command line: validate a
//! configuration, send a single message, or replay a script of messages.

mod replay;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scmi_clock::{
    MessageId, ProtocolStatus, ScmiClockService, SimulatedClockBackend, StatsSnapshot,
};
use scmi_common::PlatformConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::replay::{load_script, parse_word, ReplayStep};

/// SCMI clock daemon command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "scmi-clockd",
    about = "SCMI clock protocol daemon - drives the clock message handler against a simulated backend",
    version,
    long_about = None
)]
struct Args {
    /// Path to a platform configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and print clocks and agent registries.
    Check,

    /// Send one message and print the response.
    Send {
        /// Sending agent.
        #[arg(long, short = 'a', default_value = "ospm")]
        agent: String,

        /// Message id (decimal or 0x hex).
        #[arg(value_parser = parse_word)]
        message_id: u32,

        /// Payload words (decimal or 0x hex).
        #[arg(value_parser = parse_word)]
        words: Vec<u32>,

        /// Print the response as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run every message of a script in order, then print statistics.
    Replay {
        /// Script file, one `agent message_id [words...]` per line.
        #[arg(value_name = "FILE")]
        script: PathBuf,

        /// Print responses and statistics as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Decoded response to one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ResponseReport {
    agent: String,
    message_id: u32,
    /// Message name, `None` for unimplemented ids.
    message: Option<String>,
    status: ProtocolStatus,
    code: i32,
    /// Words following the status.
    words: Vec<u32>,
}

/// JSON output of a replay run.
#[derive(Debug, Serialize)]
struct ReplayOutput<'a> {
    responses: &'a [ResponseReport],
    stats: &'a StatsSnapshot,
}

impl std::fmt::Display for ResponseReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = self
            .message
            .clone()
            .unwrap_or_else(|| format!("0x{:x}", self.message_id));
        write!(f, "{} {message} -> {} ({})", self.agent, self.status, self.code)?;
        for word in &self.words {
            write!(f, " 0x{word:08x}")?;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting SCMI clock daemon");

    let config = load_config(&args)?;
    info!(
        clocks = config.clocks.len(),
        agents = config.agents.len(),
        "Configuration loaded"
    );

    let backend = Arc::new(SimulatedClockBackend::from_config(&config));
    let service = ScmiClockService::new(&config, backend)
        .context("Failed to build clock service from configuration")?;

    match args.command {
        Command::Check => {
            print_platform(&config, &service);
            Ok(())
        }
        Command::Send {
            agent,
            message_id,
            words,
            json,
        } => {
            let step = ReplayStep {
                line: 0,
                agent,
                message_id,
                words,
            };
            let report = execute(&service, &step)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
            Ok(())
        }
        Command::Replay { script, json } => run_replay(&service, &script, json),
    }
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!("scmi_clockd={level},scmi_clock={level},scmi_common={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `SCMI_CONFIG_PATH` environment variable
/// 3. `/etc/scmi/platform.toml` (system path)
/// 4. `config/default.toml` (local development)
/// 5. Built-in defaults (no clocks, no agents)
fn load_config(args: &Args) -> Result<PlatformConfig> {
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return PlatformConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    if let Ok(env_path) = std::env::var("SCMI_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from SCMI_CONFIG_PATH");
            return PlatformConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from SCMI_CONFIG_PATH={env_path}")
            });
        }
        warn!(
            path = %env_path,
            "SCMI_CONFIG_PATH set but file does not exist, checking other locations"
        );
    }

    for path in ["/etc/scmi/platform.toml", "config/default.toml"] {
        let config_path = Path::new(path);
        if config_path.exists() {
            info!(?config_path, "Loading config");
            return PlatformConfig::from_file(config_path)
                .with_context(|| format!("Failed to load config from {path}"));
        }
    }

    info!("No config file found, using built-in defaults");
    Ok(PlatformConfig::default())
}

/// Send one message through the service and decode the reply.
fn execute(
    service: &ScmiClockService<SimulatedClockBackend>,
    step: &ReplayStep,
) -> Result<ResponseReport> {
    let mut reply = Vec::new();
    let status = service.handle_message(&step.agent, step.message_id, &step.payload(), |bytes| {
        reply.extend_from_slice(bytes);
    });

    let mut words = reply
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]));
    let code = words
        .next()
        .map(|w| i32::from_le_bytes(w.to_le_bytes()))
        .context("Empty response")?;

    Ok(ResponseReport {
        agent: step.agent.clone(),
        message_id: step.message_id,
        message: MessageId::from_u32(step.message_id).map(|m| m.to_string()),
        status,
        code,
        words: words.collect(),
    })
}

fn run_replay(
    service: &ScmiClockService<SimulatedClockBackend>,
    script: &Path,
    json: bool,
) -> Result<()> {
    let steps = load_script(script)
        .with_context(|| format!("Failed to load replay script {}", script.display()))?;
    info!(messages = steps.len(), "Replaying script");

    let mut reports = Vec::with_capacity(steps.len());
    for step in &steps {
        let report = execute(service, step)
            .with_context(|| format!("Line {} produced no response", step.line))?;
        if !json {
            println!("{report}");
        }
        reports.push(report);
    }

    let stats = service.stats().snapshot();
    if json {
        let output = ReplayOutput {
            responses: &reports,
            stats: &stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} messages", stats.total);
        for (status, count) in &stats.by_status {
            println!("  {status}: {count}");
        }
    }

    Ok(())
}

fn print_platform(config: &PlatformConfig, service: &ScmiClockService<SimulatedClockBackend>) {
    println!(
        "{} clocks, {} agents, max pending transactions {}",
        config.clocks.len(),
        config.agents.len(),
        config.scmi.max_pending_transactions
    );
    for (index, clock) in config.clocks.iter().enumerate() {
        println!(
            "  [{index}] {:<20} {}..={} Hz, boot {} Hz {}{}",
            clock.name,
            clock.rates.min(),
            clock.rates.max(),
            clock.effective_initial_rate(),
            clock.initial_state,
            if clock.supports_rate_change { "" } else { " (fixed)" },
        );
    }

    for agent in service.agents() {
        let registry = service.protocol(agent).registry();
        println!("agent {agent}: {} clocks", registry.count());
        for (index, entry) in registry.iter() {
            let name = entry
                .resource
                .and_then(|r| usize::try_from(r.0).ok())
                .and_then(|i| config.clocks.get(i))
                .map_or("(reserved)", |c| c.name.as_str());
            let enabled = if entry.starts_enabled { " *" } else { "" };
            println!("  {index:>3} -> {name}{enabled}");
        }
    }
}
