//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters, calibration offsets, payload format selection
//! and hardware pin assignments live here so they can be tuned in one place.

use crate::payload::AdvFormatKind;
use crate::reading::Calibration;
use crate::units::TemperatureUnit;

// Clock

/// Hardware tick rate. The nRF RTC1 time driver runs at 32.768 kHz.
pub const TICK_HZ: u32 = 32_768;

/// Convert milliseconds to hardware ticks (truncating).
pub const fn ms_to_ticks(ms: u32) -> u32 {
    ((ms as u64 * TICK_HZ as u64) / 1000) as u32
}

// Scheduling

/// Main cycle: how often a round runs (display refresh, notifications).
pub const MAIN_CYCLE_MS: u32 = 5_000;

/// Battery refresh cycle. Only checked when the main cycle fires.
pub const BATTERY_CYCLE_MS: u32 = 5 * 60_000;

/// Number of main-cycle firings between sensor measurements.
pub const MEASUREMENT_ITERATIONS: u16 = 10;

// Advertising

/// Broadcast payload format for this build.
pub const ADV_FORMAT: AdvFormatKind = AdvFormatKind::BtHome;

/// Advertising interval (in 0.625 ms units). 3000 = 1.875 s.
pub const ADV_INTERVAL: u32 = 3000;

// Presentation

/// Unit used on the display. The broadcast payloads always carry Celsius.
pub const DISPLAY_UNIT: TemperatureUnit = TemperatureUnit::Celsius;

/// Alternate humidity and battery level on the display's small number.
/// When disabled the small number always shows humidity.
pub const DISPLAY_BATTERY_INDICATOR: bool = false;

// Calibration

/// Added to every temperature sample (0.1 °C).
pub const TEMPERATURE_OFFSET: i16 = 0;

/// Added to every humidity sample (0.1 % RH).
pub const HUMIDITY_OFFSET: i16 = 0;

// Battery

/// Supply voltage reported as 0 %.
pub const BATTERY_EMPTY_MV: u16 = 2200;

/// Supply voltage reported as 100 %.
pub const BATTERY_FULL_MV: u16 = 3000;

// GPIO pin assignments (nRF52840-DK defaults)
//
// Logical names only; the concrete `embassy_nrf::peripherals::*` are
// picked in `main.rs`.  Adjust for your custom PCB.
//
//   Sensor I²C SDA   → P0.26   (TWISPI0, SHT4x)
//   Sensor I²C SCL   → P0.27
//   Display I²C SDA  → P0.30   (TWISPI1, SSD1306)
//   Display I²C SCL  → P0.31

/// Runtime view of the compile-time settings above.
///
/// The firmware uses [`PipelineConfig::DEFAULT`]; tests build their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineConfig {
    pub main_period_ticks: u32,
    pub battery_period_ticks: u32,
    pub measurement_iterations: u16,
    pub display_unit: TemperatureUnit,
    pub display_battery_indicator: bool,
    pub calibration: Calibration,
}

impl PipelineConfig {
    pub const DEFAULT: Self = Self {
        main_period_ticks: ms_to_ticks(MAIN_CYCLE_MS),
        battery_period_ticks: ms_to_ticks(BATTERY_CYCLE_MS),
        measurement_iterations: MEASUREMENT_ITERATIONS,
        display_unit: DISPLAY_UNIT,
        display_battery_indicator: DISPLAY_BATTERY_INDICATOR,
        calibration: Calibration {
            temperature_offset: TEMPERATURE_OFFSET,
            humidity_offset: HUMIDITY_OFFSET,
        },
    };
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
