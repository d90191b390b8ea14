//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **Advertiser** - broadcasts the current payload as connectable,
//!    scannable undirected advertising and restarts whenever the pipeline
//!    hands over a new payload.
//! 2. **GATT server** - Environmental Sensing (temperature, humidity) and
//!    Battery services with notify, fed from the pipeline's notification
//!    buffers.
//!
//! The measurement loop and the advertising task share state through the
//! statics below.

pub mod advertiser;
pub mod gatt;

use core::cell::RefCell;
use core::mem;

use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use envbeacon::payload::{AdvPayload, MacAddress};
use nrf_softdevice::ble::Connection;
use nrf_softdevice::{raw, Softdevice};

/// Payload currently on air. Empty until the first encode.
pub static PAYLOAD: Mutex<CriticalSectionRawMutex, RefCell<Option<AdvPayload>>> =
    Mutex::new(RefCell::new(None));

/// Raised by the advertiser collaborator after [`PAYLOAD`] changed.
pub static PAYLOAD_CHANGED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// The active central, if any.
pub static CONNECTION: Mutex<CriticalSectionRawMutex, RefCell<Option<Connection>>> =
    Mutex::new(RefCell::new(None));

/// Raised by the advertising task on connect (`true`) and disconnect
/// (`false`) so the display marker can be redrawn without waiting a round.
pub static CONNECTION_CHANGED: Signal<CriticalSectionRawMutex, bool> = Signal::new();

pub fn current_connection() -> Option<Connection> {
    CONNECTION.lock(|c| c.borrow().clone())
}

/// SoftDevice configuration: one peripheral link, no central role.
pub fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: core::ptr::null_mut(),
            current_len: 0,
            max_len: 16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

/// Public address as reported by the stack, least significant byte first.
pub fn mac_address(sd: &Softdevice) -> MacAddress {
    nrf_softdevice::ble::get_address(sd).bytes()
}

/// Set the GAP device name (read-only to peers).
pub fn set_device_name(name: &str) {
    // Open read, no write access.
    let mut perm: raw::ble_gap_conn_sec_mode_t = unsafe { mem::zeroed() };
    perm.set_sm(0);
    perm.set_lv(0);
    let ret = unsafe {
        raw::sd_ble_gap_device_name_set(&perm, name.as_ptr(), name.len() as u16)
    };
    if ret != raw::NRF_SUCCESS {
        defmt::warn!("device name rejected: {}", ret);
    } else {
        info!("device name: {}", name);
    }
}
