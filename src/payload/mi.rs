//! Xiaomi-compatible (MiBeacon) advertising format.
//!
//! Layout (22 bytes):
//! ```text
//! Byte 0:      AD length (21)
//! Byte 1:      AD type 0x16 (Service Data - 16-bit UUID)
//! Byte 2-3:    UUID 0xFE95, little-endian
//! Byte 4-5:    Frame control 0x3050
//! Byte 6-7:    Product ID 0x055B
//! Byte 8:      Frame counter
//! Byte 9-14:   MAC address, least significant byte first
//! Byte 15-16:  Object type (0x100D climate / 0x100A battery), little-endian
//! Byte 17:     Object length (4 / 1)
//! Byte 18-21:  Object body
//!                climate: temperature i16 LE (0.1 °C), humidity u16 LE (0.1 %)
//!                battery: level (%), 3 zero bytes
//! ```
//!
//! Each frame carries only one object. A receiver needs two consecutive
//! frames to see the full device state.

use super::{MacAddress, MiPhase};
use crate::reading::{BatteryState, Reading};

/// Encoded length in bytes.
pub const LEN: usize = 22;

pub const COUNTER_OFFSET: usize = 8;
pub const OBJECT_TYPE_OFFSET: usize = 15;
pub const OBJECT_LEN_OFFSET: usize = 17;
pub const BODY_OFFSET: usize = 18;

/// Object type low byte for temperature + humidity.
pub const OBJECT_CLIMATE: u8 = 0x0D;
/// Object type low byte for battery level.
pub const OBJECT_BATTERY: u8 = 0x0A;

const HEADER: [u8; 8] = [21, 0x16, 0x95, 0xFE, 0x50, 0x30, 0x5B, 0x05];

/// Humidity field in 0.1 % after the ×10 rescale, wrapping at 16 bits.
pub fn humidity_field(humidity_tenths: u16) -> u16 {
    humidity_tenths.wrapping_mul(10)
}

pub(crate) fn encode(
    mac: &MacAddress,
    phase: MiPhase,
    reading: &Reading,
    battery: &BatteryState,
    counter: u8,
) -> [u8; LEN] {
    let mut buf = [0u8; LEN];
    buf[..8].copy_from_slice(&HEADER);
    buf[COUNTER_OFFSET] = counter;
    buf[9..15].copy_from_slice(mac);
    buf[OBJECT_TYPE_OFFSET + 1] = 0x10;

    match phase {
        MiPhase::Climate => {
            buf[OBJECT_TYPE_OFFSET] = OBJECT_CLIMATE;
            buf[OBJECT_LEN_OFFSET] = 4;
            buf[BODY_OFFSET..BODY_OFFSET + 2].copy_from_slice(&reading.temperature.to_le_bytes());
            buf[BODY_OFFSET + 2..BODY_OFFSET + 4]
                .copy_from_slice(&humidity_field(reading.humidity).to_le_bytes());
        }
        MiPhase::Battery => {
            buf[OBJECT_TYPE_OFFSET] = OBJECT_BATTERY;
            buf[OBJECT_LEN_OFFSET] = 1;
            buf[BODY_OFFSET] = battery.percent;
        }
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: MacAddress = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];

    #[test]
    fn climate_object() {
        let buf = encode(
            &MAC,
            MiPhase::Climate,
            &Reading::new(215, 553),
            &BatteryState::new(87, 2980),
            9,
        );
        assert_eq!(&buf[..8], &HEADER);
        assert_eq!(buf[8], 9);
        assert_eq!(&buf[9..15], &MAC);
        assert_eq!(&buf[15..18], &[0x0D, 0x10, 0x04]);
        assert_eq!(&buf[18..20], &215i16.to_le_bytes());
        assert_eq!(&buf[20..22], &5530u16.to_le_bytes());
    }

    #[test]
    fn battery_object_pads_with_zeros() {
        let buf = encode(
            &MAC,
            MiPhase::Battery,
            &Reading::new(215, 553),
            &BatteryState::new(87, 2980),
            10,
        );
        assert_eq!(&buf[15..18], &[0x0A, 0x10, 0x01]);
        assert_eq!(&buf[18..22], &[87, 0, 0, 0]);
    }

    #[test]
    fn humidity_rescale_wraps() {
        assert_eq!(humidity_field(553), 5530);
        assert_eq!(humidity_field(7000), 4464);
    }
}
