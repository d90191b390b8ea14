//! Collaborator traits at the hardware boundary.
//!
//! The pipeline only ever talks to the outside world through these. The
//! firmware implements them over the SoftDevice, the SAADC and I²C; tests
//! implement them with plain structs.

use crate::error::Error;
use crate::frame::DisplayFrame;
use crate::notify::Characteristic;
use crate::reading::RawSample;

/// Temperature/humidity sensor. Called at most once per measurement cycle.
pub trait EnvironmentSensor {
    fn sample(&mut self) -> Result<RawSample, Error>;
}

/// Supply voltage measurement. Called at most once per battery cycle.
pub trait BatteryMonitor {
    fn millivolts(&mut self) -> Result<u16, Error>;
}

/// Broadcast transport.
pub trait Advertiser {
    /// Replace the advertised data field.
    fn set_payload(&mut self, payload: &[u8]) -> Result<(), Error>;
}

/// Connection transport.
pub trait Notifier {
    fn is_connected(&self) -> bool;

    /// Push one characteristic value. Must be a silent no-op (`Ok`) when no
    /// client is subscribed to `characteristic`.
    fn notify(&mut self, characteristic: Characteristic, value: &[u8]) -> Result<(), Error>;
}

/// Presentation surface.
pub trait Display {
    fn show(&mut self, frame: &DisplayFrame) -> Result<(), Error>;
}
