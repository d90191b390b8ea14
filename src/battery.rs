//! Battery voltage to charge-percentage mapping.
//!
//! A CR2032 coin cell sits close to 3.0 V for most of its life and falls
//! off quickly below 2.4 V. A linear map between the two configured end
//! points is enough for the broadcast percentage.

use crate::config::{BATTERY_EMPTY_MV, BATTERY_FULL_MV};

/// Map a supply voltage to 0..=100 %, clamped outside the configured range.
pub fn percent_from_millivolts(millivolts: u16) -> u8 {
    percent_in_range(millivolts, BATTERY_EMPTY_MV, BATTERY_FULL_MV)
}

fn percent_in_range(millivolts: u16, empty_mv: u16, full_mv: u16) -> u8 {
    if millivolts <= empty_mv {
        return 0;
    }
    if millivolts >= full_mv {
        return 100;
    }
    let span = u32::from(full_mv - empty_mv);
    let above = u32::from(millivolts - empty_mv);
    (above * 100 / span) as u8
}
