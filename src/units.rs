//! Temperature unit handling shared by every presentation path.
//!
//! Readings are always kept in 0.1 °C. Conversion happens only at the
//! edge, here, so the display and any other surface round the same way.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Express a 0.1 °C value in this unit (still in tenths).
    pub fn from_celsius_tenths(self, celsius_tenths: i16) -> i16 {
        match self {
            TemperatureUnit::Celsius => celsius_tenths,
            TemperatureUnit::Fahrenheit => celsius_tenths_to_fahrenheit_tenths(celsius_tenths),
        }
    }

    /// Unit glyph for the display.
    pub const fn symbol(self) -> char {
        match self {
            TemperatureUnit::Celsius => 'C',
            TemperatureUnit::Fahrenheit => 'F',
        }
    }
}

/// 0.1 °C to 0.1 °F, truncating toward zero at each step.
pub fn celsius_tenths_to_fahrenheit_tenths(celsius_tenths: i16) -> i16 {
    let t = i32::from(celsius_tenths);
    let f = ((((t * 10) / 5) * 9) + 3200) / 10;
    f.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freezing_and_boiling_points() {
        assert_eq!(celsius_tenths_to_fahrenheit_tenths(0), 320);
        assert_eq!(celsius_tenths_to_fahrenheit_tenths(1000), 2120);
        assert_eq!(celsius_tenths_to_fahrenheit_tenths(-400), -400);
    }

    #[test]
    fn room_temperature() {
        // 21.5 °C = 70.7 °F
        assert_eq!(celsius_tenths_to_fahrenheit_tenths(215), 707);
    }

    #[test]
    fn extreme_input_clamps() {
        assert_eq!(celsius_tenths_to_fahrenheit_tenths(i16::MAX), i16::MAX);
        assert_eq!(celsius_tenths_to_fahrenheit_tenths(i16::MIN), i16::MIN);
    }

    #[test]
    fn unit_dispatch() {
        assert_eq!(TemperatureUnit::Celsius.from_celsius_tenths(215), 215);
        assert_eq!(TemperatureUnit::Fahrenheit.from_celsius_tenths(215), 707);
        assert_eq!(TemperatureUnit::Fahrenheit.symbol(), 'F');
    }
}
