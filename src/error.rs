//! Unified error type for envbeacon.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.
//!
//! Only the collaborator boundary returns these. The encoder and the
//! scheduler are total and never fail.

/// Top-level error type returned by the hardware collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Acquisition
    /// The temperature/humidity sensor did not produce a sample.
    Sensor(SensorError),

    /// The supply voltage could not be measured.
    Battery,

    // Radio
    /// The advertising payload could not be handed to the radio stack.
    Advertise,

    /// A GATT notification could not be queued.
    Notify,

    // UI / Display
    /// I²C transaction to the display failed.
    Display,
}

/// Sensor failure detail (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// I²C transaction failed (NACK, bus error).
    Bus,
    /// The sensor's CRC over the measurement did not match.
    Crc,
    /// Value outside what the sensor can physically report.
    OutOfRange,
}

// Convenience conversions

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Error::Sensor(e)
    }
}
