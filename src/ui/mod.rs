//! User interface subsystem - OLED display.
//!
//! The measurement loop renders one [`envbeacon::frame::DisplayFrame`] per
//! round on an SSD1306 128×64 OLED via I²C:
//!
//! - temperature in the configured unit, large
//! - humidity or battery level, small
//! - a connection marker while a central is attached, redrawn as soon as
//!   the link changes
//!
//! At boot a splash shows the device name, MAC and firmware version.

pub mod display;

pub use display::OledDisplay;
