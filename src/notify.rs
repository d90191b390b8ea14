//! Notification buffers for a connected client.
//!
//! Each characteristic gets its own little-endian buffer, rebuilt from the
//! current reading on every push. The three pushes are independent: if one
//! is dropped the next round corrects it.

use crate::reading::{BatteryState, Reading};

/// Characteristics this device notifies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Characteristic {
    /// Temperature Celsius (0x2A1F), i16, 0.1 °C.
    Temperature,
    /// Humidity (0x2A6F), u16, 0.01 %.
    Humidity,
    /// Battery Level (0x2A19), u8, %.
    BatteryLevel,
}

impl Characteristic {
    /// 16-bit SIG-assigned UUID.
    pub const fn uuid(self) -> u16 {
        match self {
            Characteristic::Temperature => 0x2A1F,
            Characteristic::Humidity => 0x2A6F,
            Characteristic::BatteryLevel => 0x2A19,
        }
    }
}

/// One notification value, at most two bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Notification {
    pub characteristic: Characteristic,
    bytes: [u8; 2],
    len: usize,
}

impl Notification {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Temperature passed through in 0.1 °C.
pub fn temperature_value(reading: &Reading) -> [u8; 2] {
    reading.temperature.to_le_bytes()
}

/// Humidity rescaled from 0.1 % to 0.01 %, wrapping at 16 bits.
pub fn humidity_value(reading: &Reading) -> [u8; 2] {
    reading.humidity.wrapping_mul(100).to_le_bytes()
}

pub fn battery_value(battery: &BatteryState) -> [u8; 1] {
    [battery.percent]
}

/// All three notifications in push order: temperature, humidity, battery.
pub fn notifications(reading: &Reading, battery: &BatteryState) -> [Notification; 3] {
    let [b] = battery_value(battery);
    [
        Notification {
            characteristic: Characteristic::Temperature,
            bytes: temperature_value(reading),
            len: 2,
        },
        Notification {
            characteristic: Characteristic::Humidity,
            bytes: humidity_value(reading),
            len: 2,
        },
        Notification {
            characteristic: Characteristic::BatteryLevel,
            bytes: [b, 0],
            len: 1,
        },
    ]
}
