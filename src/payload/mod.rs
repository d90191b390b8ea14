//! Broadcast payload encoding.
//!
//! Three mutually exclusive advertising formats, picked once per build:
//!
//! - **ATC** ([`atc`]) - 17-byte custom service data on UUID 0x181A.
//! - **Mi** ([`mi`]) - 22-byte Xiaomi-compatible frame on UUID 0xFE95 that
//!   alternates climate and battery objects between encodes.
//! - **BTHome v2** ([`bthome`]) - 21-byte unencrypted BTHome frame on
//!   UUID 0xFCD2.
//!
//! Every format reads the same [`Reading`] / [`BatteryState`] and shares
//! one [`EncoderState`]. That state is the only thing that survives
//! between calls.

pub mod atc;
pub mod bthome;
pub mod mi;

use crate::reading::{BatteryState, Reading};
use heapless::String;

/// Largest legacy advertising data field.
pub const ADV_DATA_MAX: usize = 31;

/// BLE public address, least significant byte first (as the radio stack
/// reports it).
pub type MacAddress = [u8; 6];

/// Build-time format selector, before the MAC is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvFormatKind {
    Atc,
    Mi,
    BtHome,
}

impl AdvFormatKind {
    /// Bind the boot-time MAC address to the selected format.
    pub const fn with_mac(self, mac: MacAddress) -> AdvFormat {
        match self {
            AdvFormatKind::Atc => AdvFormat::Atc { mac },
            AdvFormatKind::Mi => AdvFormat::Mi { mac },
            AdvFormatKind::BtHome => AdvFormat::BtHome,
        }
    }
}

/// Fully resolved format descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvFormat {
    Atc { mac: MacAddress },
    Mi { mac: MacAddress },
    BtHome,
}

impl AdvFormat {
    pub const fn kind(&self) -> AdvFormatKind {
        match self {
            AdvFormat::Atc { .. } => AdvFormatKind::Atc,
            AdvFormat::Mi { .. } => AdvFormatKind::Mi,
            AdvFormat::BtHome => AdvFormatKind::BtHome,
        }
    }

    /// Encoded payload length for this format.
    pub const fn len(&self) -> usize {
        match self {
            AdvFormat::Atc { .. } => atc::LEN,
            AdvFormat::Mi { .. } => mi::LEN,
            AdvFormat::BtHome => bthome::LEN,
        }
    }
}

/// Which object the next Mi frame carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MiPhase {
    #[default]
    Climate,
    Battery,
}

impl MiPhase {
    pub const fn flipped(self) -> Self {
        match self {
            MiPhase::Climate => MiPhase::Battery,
            MiPhase::Battery => MiPhase::Climate,
        }
    }
}

/// State carried between encodes. Reset only at boot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderState {
    /// Rolling packet counter, incremented on every encode.
    pub packet_counter: u8,
    /// Next Mi object. Only advanced by the Mi format.
    pub mi_phase: MiPhase,
}

impl EncoderState {
    pub const fn new() -> Self {
        Self {
            packet_counter: 0,
            mi_phase: MiPhase::Climate,
        }
    }

    /// Two-byte image for retention across power loss.
    pub const fn snapshot(&self) -> [u8; 2] {
        let phase = match self.mi_phase {
            MiPhase::Climate => 0,
            MiPhase::Battery => 1,
        };
        [self.packet_counter, phase]
    }

    /// Inverse of [`snapshot`](Self::snapshot). Unknown phase bytes fall
    /// back to the boot phase.
    pub const fn restore(bytes: [u8; 2]) -> Self {
        let mi_phase = match bytes[1] {
            1 => MiPhase::Battery,
            _ => MiPhase::Climate,
        };
        Self {
            packet_counter: bytes[0],
            mi_phase,
        }
    }

    /// Advance the rolling counter and return the value to put on the wire.
    fn next_counter(&mut self) -> u8 {
        self.packet_counter = self.packet_counter.wrapping_add(1);
        self.packet_counter
    }
}

/// An encoded advertising data field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvPayload {
    bytes: [u8; ADV_DATA_MAX],
    len: usize,
}

impl AdvPayload {
    pub fn from_slice(data: &[u8]) -> Self {
        let mut bytes = [0u8; ADV_DATA_MAX];
        let len = data.len().min(ADV_DATA_MAX);
        bytes[..len].copy_from_slice(&data[..len]);
        Self { bytes, len }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl core::ops::Deref for AdvPayload {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Encode one advertising payload.
///
/// Always succeeds: values that do not fit their field are clamped or
/// truncated. Increments the packet counter, and for the Mi format flips
/// the alternation phase.
pub fn encode(
    format: &AdvFormat,
    reading: &Reading,
    battery: &BatteryState,
    state: &mut EncoderState,
) -> AdvPayload {
    let counter = state.next_counter();
    match format {
        AdvFormat::Atc { mac } => {
            AdvPayload::from_slice(&atc::encode(mac, reading, battery, counter))
        }
        AdvFormat::Mi { mac } => {
            let phase = state.mi_phase;
            state.mi_phase = phase.flipped();
            AdvPayload::from_slice(&mi::encode(mac, phase, reading, battery, counter))
        }
        AdvFormat::BtHome => AdvPayload::from_slice(&bthome::encode(reading, battery, counter)),
    }
}

/// GAP device name: `MrM_` plus the low three MAC bytes in hex.
pub fn device_name(mac: &MacAddress) -> String<10> {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut name = String::new();
    let _ = name.push_str("MrM_");
    for &b in [mac[2], mac[1], mac[0]].iter() {
        let _ = name.push(HEX[usize::from(b >> 4)] as char);
        let _ = name.push(HEX[usize::from(b & 0x0F)] as char);
    }
    name
}

/// The MAC as `11:22:33:44:55:66`, most significant byte first.
pub fn mac_string(mac: &MacAddress) -> String<17> {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::new();
    for (i, &b) in mac.iter().rev().enumerate() {
        if i > 0 {
            let _ = out.push(':');
        }
        let _ = out.push(HEX[usize::from(b >> 4)] as char);
        let _ = out.push(HEX[usize::from(b & 0x0F)] as char);
    }
    out
}

/// Scan response data: a single Complete Local Name AD structure.
pub fn scan_response(mac: &MacAddress) -> [u8; 12] {
    let name = device_name(mac);
    let mut out = [0u8; 12];
    out[0] = 11;
    out[1] = 0x09;
    out[2..].copy_from_slice(name.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: MacAddress = [0x66, 0x55, 0x44, 0x33, 0x22, 0x11];

    #[test]
    fn counter_wraps_at_256() {
        let mut state = EncoderState {
            packet_counter: 254,
            ..EncoderState::new()
        };
        assert_eq!(state.next_counter(), 255);
        assert_eq!(state.next_counter(), 0);
        assert_eq!(state.next_counter(), 1);
    }

    #[test]
    fn snapshot_restore() {
        let state = EncoderState {
            packet_counter: 0xA7,
            mi_phase: MiPhase::Battery,
        };
        assert_eq!(state.snapshot(), [0xA7, 1]);
        assert_eq!(EncoderState::restore(state.snapshot()), state);
        assert_eq!(EncoderState::restore([3, 0xFF]).mi_phase, MiPhase::Climate);
    }

    #[test]
    fn kind_binds_mac() {
        assert_eq!(
            AdvFormatKind::Atc.with_mac(MAC),
            AdvFormat::Atc { mac: MAC }
        );
        assert_eq!(AdvFormatKind::Mi.with_mac(MAC).kind(), AdvFormatKind::Mi);
        assert_eq!(AdvFormatKind::BtHome.with_mac(MAC), AdvFormat::BtHome);
    }

    #[test]
    fn payload_length_matches_format() {
        let reading = Reading::new(215, 553);
        let battery = BatteryState::new(87, 2980);
        for format in [
            AdvFormat::Atc { mac: MAC },
            AdvFormat::Mi { mac: MAC },
            AdvFormat::BtHome,
        ] {
            let mut state = EncoderState::new();
            let p = encode(&format, &reading, &battery, &mut state);
            assert_eq!(p.len(), format.len());
            // AD length byte covers the rest of its structure.
            if format.kind() != AdvFormatKind::BtHome {
                assert_eq!(usize::from(p[0]) + 1, p.len());
            }
        }
    }

    #[test]
    fn non_mi_formats_leave_phase_alone() {
        let mut state = EncoderState::new();
        let reading = Reading::new(0, 0);
        let battery = BatteryState::default();
        encode(&AdvFormat::BtHome, &reading, &battery, &mut state);
        encode(&AdvFormat::Atc { mac: MAC }, &reading, &battery, &mut state);
        assert_eq!(state.mi_phase, MiPhase::Climate);
        assert_eq!(state.packet_counter, 2);
    }

    #[test]
    fn mac_string_is_msb_first() {
        assert_eq!(mac_string(&MAC).as_str(), "11:22:33:44:55:66");
        let mac = [0xAB, 0, 0, 0, 0, 0x0C];
        assert_eq!(mac_string(&mac).as_str(), "0C:00:00:00:00:AB");
    }

    #[test]
    fn device_name_uses_low_mac_bytes() {
        assert_eq!(device_name(&MAC).as_str(), "MrM_445566");
        let mac = [0x0F, 0xA0, 0x3C, 0, 0, 0];
        assert_eq!(device_name(&mac).as_str(), "MrM_3CA00F");
    }

    #[test]
    fn scan_response_is_complete_local_name() {
        let sr = scan_response(&MAC);
        assert_eq!(sr[0], 11);
        assert_eq!(sr[1], 0x09);
        assert_eq!(&sr[2..], b"MrM_445566");
    }
}
