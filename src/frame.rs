//! What the display shows for one round. Rendering is the display
//! collaborator's job; this only decides the values.

use crate::reading::{BatteryState, Reading};
use crate::units::TemperatureUnit;

/// The small secondary number on the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Secondary {
    /// 0.1 % RH.
    Humidity(u16),
    /// Battery level, capped at 99 so it fits two digits.
    Battery(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayFrame {
    /// Tenths of `unit`.
    pub temperature: i16,
    pub unit: TemperatureUnit,
    pub secondary: Secondary,
    pub connected: bool,
}

impl DisplayFrame {
    /// The same frame with the connection marker switched.
    pub const fn with_connected(self, connected: bool) -> Self {
        Self { connected, ..self }
    }
}

/// Alternation between humidity and battery on the secondary number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameToggle {
    show_humidity: bool,
}

impl FrameToggle {
    pub const fn new() -> Self {
        Self {
            show_humidity: false,
        }
    }

    /// Build this round's frame and advance the toggle.
    ///
    /// With `battery_indicator` off the secondary number is always humidity.
    pub fn next(
        &mut self,
        reading: &Reading,
        battery: &BatteryState,
        unit: TemperatureUnit,
        battery_indicator: bool,
        connected: bool,
    ) -> DisplayFrame {
        if !battery_indicator {
            self.show_humidity = true;
        }
        let secondary = if self.show_humidity {
            Secondary::Humidity(reading.humidity)
        } else {
            Secondary::Battery(battery.percent.min(99))
        };
        self.show_humidity = !self.show_humidity;

        DisplayFrame {
            temperature: unit.from_celsius_tenths(reading.temperature),
            unit,
            secondary,
            connected,
        }
    }
}
