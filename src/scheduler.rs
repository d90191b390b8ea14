//! Round scheduling: which subsystems run on this invocation.
//!
//! Three independent cadences:
//!
//! 1. **Main cycle** - time based. Gates everything else; when it has not
//!    elapsed the call is a no-op.
//! 2. **Battery cycle** - time based, but only checked when the main cycle
//!    fires.
//! 3. **Measurement cycle** - counted in main-cycle firings, so display and
//!    notification refresh can run more often than the sensor is touched.

use crate::clock::Cadence;
use crate::config::PipelineConfig;

/// Counts main-cycle firings and fires every `every` of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IterationCounter {
    count: u16,
    every: u16,
}

impl IterationCounter {
    /// Starts saturated so the first firing measures immediately.
    pub const fn new(every: u16) -> Self {
        Self {
            count: every,
            every,
        }
    }

    /// Register one main-cycle firing. Returns `true` when a measurement is due.
    pub fn tick(&mut self) -> bool {
        let fire = self.count >= self.every;
        if fire {
            self.count = 0;
        }
        self.count = self.count.saturating_add(1);
        fire
    }

    pub const fn count(&self) -> u16 {
        self.count
    }
}

/// Which sub-steps are due in a round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Round {
    pub refresh_battery: bool,
    pub resample: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScheduleState {
    main: Cadence,
    battery: Cadence,
    measurement: IterationCounter,
}

impl ScheduleState {
    pub const fn new(config: &PipelineConfig) -> Self {
        Self {
            main: Cadence::new(config.main_period_ticks),
            battery: Cadence::new(config.battery_period_ticks),
            measurement: IterationCounter::new(config.measurement_iterations),
        }
    }

    /// Decide this invocation. `None` when the main cycle has not elapsed.
    pub fn poll(&mut self, now: u32) -> Option<Round> {
        if !self.main.poll(now) {
            return None;
        }
        let refresh_battery = self.battery.poll(now);
        let resample = self.measurement.tick();
        Some(Round {
            refresh_battery,
            resample,
        })
    }
}
