//! Sensor and battery values as the pipeline sees them.

use crate::battery::percent_from_millivolts;

/// Raw sensor output before calibration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    /// 0.1 °C units.
    pub temperature: i16,
    /// 0.1 % RH units.
    pub humidity: u16,
}

/// A calibrated environment reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// 0.1 °C units.
    pub temperature: i16,
    /// 0.1 % RH units.
    pub humidity: u16,
}

impl Reading {
    pub const fn new(temperature: i16, humidity: u16) -> Self {
        Self {
            temperature,
            humidity,
        }
    }
}

/// Last known battery state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryState {
    /// 0..=100.
    pub percent: u8,
    pub millivolts: u16,
}

impl BatteryState {
    pub const fn new(percent: u8, millivolts: u16) -> Self {
        Self {
            percent: if percent > 100 { 100 } else { percent },
            millivolts,
        }
    }

    /// Derive the percentage from a supply voltage measurement.
    pub fn from_millivolts(millivolts: u16) -> Self {
        Self {
            percent: percent_from_millivolts(millivolts),
            millivolts,
        }
    }
}

/// Static offsets added to every raw sample.
///
/// Units match the reading: 0.1 °C and 0.1 % RH.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub temperature_offset: i16,
    pub humidity_offset: i16,
}

impl Calibration {
    pub const NONE: Self = Self {
        temperature_offset: 0,
        humidity_offset: 0,
    };

    /// Apply the offsets. Both additions saturate at the field limits.
    pub fn apply(&self, raw: RawSample) -> Reading {
        Reading {
            temperature: raw.temperature.saturating_add(self.temperature_offset),
            humidity: raw.humidity.saturating_add_signed(self.humidity_offset),
        }
    }
}
