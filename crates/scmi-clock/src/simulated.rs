//! Simulated clock backend.
//!
//! Keeps per-clock rate and run state in memory, initialised from the
//! platform configuration. Rates snap to the configured step grid or
//! discrete list, a clock whose PLL is still inside its lock window reports
//! busy, and faults can be injected for testing.

use crate::backend::{
    BackendError, BackendResult, ClockBackend, ClockDescriptor, RateSpec, RoundingMode,
};
use crate::registry::ResourceRef;
use scmi_common::{ClockConfig, ClockState, PlatformConfig};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Mutable state of one simulated clock.
#[derive(Debug)]
struct ClockRuntime {
    rate: u64,
    state: ClockState,
    /// End of the current PLL lock window.
    locked_until: Option<Instant>,
    /// Error returned by the next operation on this clock.
    fault: Option<BackendError>,
}

#[derive(Debug)]
struct SimulatedClock {
    name: String,
    rates: RateSpec,
    supports_rate_change: bool,
    lock_time: Duration,
    runtime: Mutex<ClockRuntime>,
}

impl SimulatedClock {
    fn from_config(config: &ClockConfig) -> Self {
        Self {
            name: config.name.clone(),
            rates: RateSpec::from(&config.rates),
            supports_rate_change: config.supports_rate_change,
            lock_time: config.lock_time,
            runtime: Mutex::new(ClockRuntime {
                rate: config.effective_initial_rate(),
                state: config.initial_state,
                locked_until: None,
                fault: None,
            }),
        }
    }

    fn lock(&self) -> BackendResult<MutexGuard<'_, ClockRuntime>> {
        self.runtime
            .lock()
            .map_err(|_| BackendError::Other(format!("{}: state lock poisoned", self.name)))
    }

    /// Lock the runtime state and consume a pending injected fault.
    fn begin(&self) -> BackendResult<MutexGuard<'_, ClockRuntime>> {
        let mut runtime = self.lock()?;
        if let Some(fault) = runtime.fault.take() {
            return Err(fault);
        }
        Ok(runtime)
    }
}

/// In-memory clock backend for testing and the daemon.
#[derive(Debug, Default)]
pub struct SimulatedClockBackend {
    clocks: Vec<SimulatedClock>,
}

impl SimulatedClockBackend {
    /// Create a backend with one clock per platform clock, in table order.
    #[must_use]
    pub fn from_config(config: &PlatformConfig) -> Self {
        Self::from_clocks(&config.clocks)
    }

    /// Create a backend from a clock table.
    ///
    /// The table is not validated; discrete rate lists are sorted and
    /// deduplicated on the way in.
    #[must_use]
    pub fn from_clocks(clocks: &[ClockConfig]) -> Self {
        info!(clocks = clocks.len(), "Creating simulated clock backend");
        Self {
            clocks: clocks.iter().map(SimulatedClock::from_config).collect(),
        }
    }

    /// Number of clocks.
    #[must_use]
    pub fn clock_count(&self) -> usize {
        self.clocks.len()
    }

    /// Make the next operation on `clock` fail with `fault`. Returns false
    /// for an unknown clock.
    pub fn inject_fault(&self, clock: ResourceRef, fault: BackendError) -> bool {
        match self.clock(clock).and_then(SimulatedClock::lock) {
            Ok(mut runtime) => {
                runtime.fault = Some(fault);
                true
            }
            Err(_) => false,
        }
    }

    /// Current rate and state of a clock, without consuming faults.
    #[must_use]
    pub fn snapshot(&self, clock: ResourceRef) -> Option<(u64, ClockState)> {
        let runtime = self.clock(clock).and_then(SimulatedClock::lock).ok()?;
        Some((runtime.rate, runtime.state))
    }

    fn clock(&self, clock: ResourceRef) -> BackendResult<&SimulatedClock> {
        usize::try_from(clock.0)
            .ok()
            .and_then(|index| self.clocks.get(index))
            .ok_or_else(|| BackendError::Other(format!("no such clock: {clock}")))
    }
}

impl ClockBackend for SimulatedClockBackend {
    fn set_rate(
        &self,
        clock: ResourceRef,
        rate: u64,
        rounding: RoundingMode,
    ) -> BackendResult<()> {
        let sim = self.clock(clock)?;
        let mut runtime = sim.begin()?;

        if !sim.supports_rate_change {
            return Err(BackendError::Unsupported);
        }

        let now = Instant::now();
        if runtime.locked_until.is_some_and(|until| now < until) {
            return Err(BackendError::Busy);
        }

        let actual = snap_rate(&sim.rates, rate, rounding).ok_or(BackendError::Range)?;
        let locked_until = if sim.lock_time.is_zero() {
            None
        } else {
            let until = now.checked_add(sim.lock_time).ok_or_else(|| {
                BackendError::Other(format!(
                    "{}: lock time {:?} overflows",
                    sim.name, sim.lock_time
                ))
            })?;
            Some(until)
        };
        runtime.rate = actual;
        runtime.locked_until = locked_until;

        debug!(clock = %sim.name, requested = rate, actual, "Simulated rate change");
        Ok(())
    }

    fn get_rate(&self, clock: ResourceRef) -> BackendResult<u64> {
        let sim = self.clock(clock)?;
        let runtime = sim.begin()?;
        Ok(runtime.rate)
    }

    fn set_state(&self, clock: ResourceRef, state: ClockState) -> BackendResult<()> {
        let sim = self.clock(clock)?;
        let mut runtime = sim.begin()?;
        runtime.state = state;
        debug!(clock = %sim.name, %state, "Simulated state change");
        Ok(())
    }

    fn describe(&self, clock: ResourceRef) -> BackendResult<ClockDescriptor> {
        let sim = self.clock(clock)?;
        let runtime = sim.begin()?;
        Ok(ClockDescriptor {
            name: sim.name.clone(),
            rates: sim.rates.clone(),
            state: runtime.state,
            supports_rate_change: sim.supports_rate_change,
        })
    }
}

/// Pick the supported rate for a request, `None` if no rate qualifies.
fn snap_rate(rates: &RateSpec, rate: u64, rounding: RoundingMode) -> Option<u64> {
    let (down, up) = match rates {
        RateSpec::Range { min, max, step } => {
            if rate < *min || rate > *max {
                return None;
            }
            if *step == 0 {
                return Some(*min);
            }
            let down = min + (rate - min) / step * step;
            if down == rate {
                return Some(rate);
            }
            (down, down.checked_add(*step).filter(|up| up <= max))
        }
        RateSpec::Discrete(list) => {
            let (first, last) = (*list.first()?, *list.last()?);
            if rate < first || rate > last {
                return None;
            }
            match list.binary_search(&rate) {
                Ok(_) => return Some(rate),
                // rate lies strictly between list[i - 1] and list[i]
                Err(i) => (list[i - 1], Some(list[i])),
            }
        }
    };

    match rounding {
        RoundingMode::Exact => None,
        RoundingMode::Down => Some(down),
        RoundingMode::Up => up,
        RoundingMode::Nearest => match up {
            Some(up) if up - rate <= rate - down => Some(up),
            _ => Some(down),
        },
    }
}
