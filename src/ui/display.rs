//! SSD1306 OLED display wrapper.

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;
use envbeacon::frame::{DisplayFrame, Secondary};
use envbeacon::Error;
use heapless::String;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

/// Type alias for the concrete display driver.
pub type Driver<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// Initialise the SSD1306 display and clear the screen.
pub fn init<I2C>(i2c: I2C) -> Driver<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    let interface = I2CDisplayInterface::new(i2c);
    let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    let _ = display.init();
    display.clear_buffer();
    let _ = display.flush();
    display
}

fn large_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_10X20)
        .text_color(BinaryColor::On)
        .build()
}

fn small_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

/// Format a tenths value as `-12.3`.
fn push_tenths<const N: usize>(out: &mut String<N>, tenths: i32) {
    let sign = if tenths < 0 { "-" } else { "" };
    let abs = tenths.unsigned_abs();
    let _ = write!(out, "{}{}.{}", sign, abs / 10, abs % 10);
}

fn temperature_line(frame: &DisplayFrame) -> String<12> {
    let mut line = String::new();
    push_tenths(&mut line, i32::from(frame.temperature));
    let _ = line.push(frame.unit.symbol());
    line
}

fn secondary_line(frame: &DisplayFrame) -> String<12> {
    let mut line = String::new();
    match frame.secondary {
        Secondary::Humidity(h) => {
            push_tenths(&mut line, i32::from(h));
            let _ = line.push('%');
        }
        Secondary::Battery(b) => {
            let _ = write!(line, "BAT {}%", b);
        }
    }
    line
}

/// [`envbeacon::interfaces::Display`] over an SSD1306.
pub struct OledDisplay<I2C> {
    driver: Driver<I2C>,
}

impl<I2C> OledDisplay<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    pub fn new(i2c: I2C) -> Self {
        Self { driver: init(i2c) }
    }

    /// Boot splash: device name, MAC and firmware version.
    pub fn show_boot(&mut self, name: &str, mac: &str, version: &str) -> Result<(), Error> {
        let display = &mut self.driver;
        display.clear_buffer();

        let mut line: String<16> = String::new();
        let _ = write!(line, "v{}", version);
        let _ = Text::new(name, Point::new(0, 16), large_style()).draw(display);
        let _ = Text::new(mac, Point::new(0, 36), small_style()).draw(display);
        let _ = Text::new(&line, Point::new(0, 52), small_style()).draw(display);

        display.flush().map_err(|_| Error::Display)
    }
}

impl<I2C> envbeacon::interfaces::Display for OledDisplay<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn show(&mut self, frame: &DisplayFrame) -> Result<(), Error> {
        let display = &mut self.driver;
        display.clear_buffer();

        let temperature = temperature_line(frame);
        let secondary = secondary_line(frame);
        let _ = Text::new(&temperature, Point::new(0, 24), large_style()).draw(display);
        let _ = Text::new(&secondary, Point::new(0, 46), small_style()).draw(display);
        if frame.connected {
            let _ = Text::new("BLE", Point::new(110, 10), small_style()).draw(display);
        }

        display.flush().map_err(|_| Error::Display)
    }
}
