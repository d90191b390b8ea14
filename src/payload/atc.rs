//! ATC custom advertising format.
//!
//! Layout (17 bytes):
//! ```text
//! Byte 0:      AD length (16)
//! Byte 1:      AD type 0x16 (Service Data - 16-bit UUID)
//! Byte 2-3:    UUID 0x181A (Environmental Sensing), little-endian
//! Byte 4-9:    MAC address, most significant byte first
//! Byte 10-11:  Temperature, i16 big-endian, 0.1 °C
//! Byte 12:     Humidity, whole percent
//! Byte 13:     Battery level (%)
//! Byte 14-15:  Battery voltage, u16 big-endian, mV
//! Byte 16:     Rolling packet counter
//! ```

use super::MacAddress;
use crate::reading::{BatteryState, Reading};

/// Encoded length in bytes.
pub const LEN: usize = 17;

pub const TEMPERATURE_OFFSET: usize = 10;
pub const HUMIDITY_OFFSET: usize = 12;
pub const BATTERY_PERCENT_OFFSET: usize = 13;
pub const BATTERY_MV_OFFSET: usize = 14;
pub const COUNTER_OFFSET: usize = 16;

const HEADER: [u8; 4] = [16, 0x16, 0x1A, 0x18];

/// Humidity in whole percent. Tenths are truncated; the byte saturates at 255.
pub fn humidity_percent(humidity_tenths: u16) -> u8 {
    (humidity_tenths / 10).min(u16::from(u8::MAX)) as u8
}

pub(crate) fn encode(
    mac: &MacAddress,
    reading: &Reading,
    battery: &BatteryState,
    counter: u8,
) -> [u8; LEN] {
    let mut buf = [0u8; LEN];
    buf[..4].copy_from_slice(&HEADER);
    for (dst, src) in buf[4..10].iter_mut().zip(mac.iter().rev()) {
        *dst = *src;
    }
    buf[TEMPERATURE_OFFSET..TEMPERATURE_OFFSET + 2]
        .copy_from_slice(&reading.temperature.to_be_bytes());
    buf[HUMIDITY_OFFSET] = humidity_percent(reading.humidity);
    buf[BATTERY_PERCENT_OFFSET] = battery.percent;
    buf[BATTERY_MV_OFFSET..BATTERY_MV_OFFSET + 2]
        .copy_from_slice(&battery.millivolts.to_be_bytes());
    buf[COUNTER_OFFSET] = counter;
    buf
}
