//! Host-testable core of the envbeacon firmware.
//!
//! Everything here is pure logic: the wrap-safe tick scheduler, the three
//! advertising payload encoders, notification buffers and the display
//! frame. The embedded binary (`src/main.rs`, `embedded` feature) drives it
//! from the SoftDevice and embassy tasks.
//!
//! Usage: `cargo test` (no hardware required).
//!
//! On target the library is `no_std`; enable the `defmt` feature to route
//! its log output through `defmt`.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

pub mod battery;
pub mod clock;
pub mod config;
pub mod error;
pub mod frame;
pub mod interfaces;
pub mod notify;
pub mod payload;
pub mod pipeline;
pub mod reading;
pub mod scheduler;
pub mod units;

pub use clock::{elapsed, Cadence, Tick, TickSource};
pub use error::{Error, SensorError};
pub use payload::{encode, AdvFormat, AdvFormatKind, AdvPayload, EncoderState, MacAddress};
pub use pipeline::{Pipeline, RoundReport};
pub use reading::{BatteryState, Calibration, RawSample, Reading};
pub use scheduler::{Round, ScheduleState};

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════
