//! BTHome v2 advertising format (unencrypted).
//!
//! Layout (21 bytes):
//! ```text
//! Byte 0-2:    Flags AD structure (02 01 06)
//! Byte 3:      Service data length (0x11)
//! Byte 4:      AD type 0x16 (Service Data - 16-bit UUID)
//! Byte 5-6:    UUID 0xFCD2, little-endian
//! Byte 7:      Device info 0x40 (v2, unencrypted, regular interval)
//! Byte 8-9:    0x00 packet id        u8
//! Byte 10-11:  0x01 battery          u8,  1 %
//! Byte 12-14:  0x02 temperature      i16, 0.01 °C
//! Byte 15-17:  0x03 humidity         u16, 0.01 %
//! Byte 18-20:  0x0C voltage          u16, 0.001 V
//! ```
//!
//! Objects must appear in ascending object-id order.

use crate::reading::{BatteryState, Reading};

/// Encoded length in bytes.
pub const LEN: usize = 21;

pub const OBJ_PACKET_ID: u8 = 0x00;
pub const OBJ_BATTERY: u8 = 0x01;
pub const OBJ_TEMPERATURE: u8 = 0x02;
pub const OBJ_HUMIDITY: u8 = 0x03;
pub const OBJ_VOLTAGE: u8 = 0x0C;

pub const PACKET_ID_OFFSET: usize = 9;
pub const BATTERY_OFFSET: usize = 11;
pub const TEMPERATURE_OFFSET: usize = 13;
pub const HUMIDITY_OFFSET: usize = 16;
pub const VOLTAGE_OFFSET: usize = 19;

const HEADER: [u8; 8] = [0x02, 0x01, 0x06, 0x11, 0x16, 0xD2, 0xFC, 0x40];

/// 0.1 °C to the 0.01 °C wire unit, wrapping at 16 bits.
pub fn temperature_field(temperature_tenths: i16) -> i16 {
    temperature_tenths.wrapping_mul(10)
}

/// 0.1 % to the 0.01 % wire unit, wrapping at 16 bits.
pub fn humidity_field(humidity_tenths: u16) -> u16 {
    humidity_tenths.wrapping_mul(100)
}

pub(crate) fn encode(reading: &Reading, battery: &BatteryState, packet_id: u8) -> [u8; LEN] {
    let mut buf = [0u8; LEN];
    buf[..8].copy_from_slice(&HEADER);

    buf[PACKET_ID_OFFSET - 1] = OBJ_PACKET_ID;
    buf[PACKET_ID_OFFSET] = packet_id;

    buf[BATTERY_OFFSET - 1] = OBJ_BATTERY;
    buf[BATTERY_OFFSET] = battery.percent;

    buf[TEMPERATURE_OFFSET - 1] = OBJ_TEMPERATURE;
    buf[TEMPERATURE_OFFSET..TEMPERATURE_OFFSET + 2]
        .copy_from_slice(&temperature_field(reading.temperature).to_le_bytes());

    buf[HUMIDITY_OFFSET - 1] = OBJ_HUMIDITY;
    buf[HUMIDITY_OFFSET..HUMIDITY_OFFSET + 2]
        .copy_from_slice(&humidity_field(reading.humidity).to_le_bytes());

    buf[VOLTAGE_OFFSET - 1] = OBJ_VOLTAGE;
    buf[VOLTAGE_OFFSET..VOLTAGE_OFFSET + 2].copy_from_slice(&battery.millivolts.to_le_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_data_length_covers_frame() {
        let buf = encode(&Reading::default(), &BatteryState::default(), 0);
        assert_eq!(usize::from(buf[3]) + 4, LEN);
        assert_eq!(&buf[..3], &[0x02, 0x01, 0x06]);
    }

    #[test]
    fn object_ids_ascend() {
        let buf = encode(&Reading::new(215, 553), &BatteryState::new(87, 2980), 1);
        let ids = [buf[8], buf[10], buf[12], buf[15], buf[18]];
        assert_eq!(ids, [0x00, 0x01, 0x02, 0x03, 0x0C]);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn negative_temperature() {
        let buf = encode(&Reading::new(-55, 0), &BatteryState::default(), 0);
        // -5.5 °C -> -550 = 0xFDDA
        assert_eq!(&buf[13..15], &[0xDA, 0xFD]);
    }

    #[test]
    fn field_rescales_wrap() {
        assert_eq!(temperature_field(215), 2150);
        assert_eq!(humidity_field(553), 55300);
        // 100.0 % -> 100000 mod 65536
        assert_eq!(humidity_field(1000), 34464);
    }
}
