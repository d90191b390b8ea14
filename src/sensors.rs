//! Acquisition collaborators: SHT4x over I²C and supply voltage over the
//! SAADC.
//!
//! Both are async, so the measurement loop awaits them and feeds the
//! results into the pipeline's `apply_*` steps.

use defmt::warn;
use embassy_nrf::peripherals;
use embassy_nrf::saadc::Saadc;
use embassy_nrf::twim::Twim;
use envbeacon::error::SensorError;
use envbeacon::{Error, RawSample};
use sht4x::Sht4xAsync;

/// SHT4x temperature / humidity sensor.
pub struct Sht4xSensor {
    sensor: Sht4xAsync<Twim<'static, peripherals::TWISPI0>, embassy_time::Delay>,
}

impl Sht4xSensor {
    pub fn new(i2c: Twim<'static, peripherals::TWISPI0>) -> Self {
        Self {
            sensor: Sht4xAsync::<_, embassy_time::Delay>::new(i2c),
        }
    }

    /// One high-precision measurement, in 0.1 °C / 0.1 % RH.
    pub async fn sample(&mut self) -> Result<RawSample, Error> {
        let m = self
            .sensor
            .measure(sht4x::Precision::High, &mut embassy_time::Delay)
            .await
            .map_err(|e| {
                warn!("SHT4x measurement failed: {:?}", defmt::Debug2Format(&e));
                SensorError::Bus
            })?;

        sample_from_milli(m.temperature_milli_celsius(), m.humidity_milli_percent())
    }
}

/// Scale SHT4x milli-units to tenths. Humidity outside 0..=100 % (the
/// sensor can overshoot slightly) is clipped.
fn sample_from_milli(milli_celsius: i32, milli_percent: i32) -> Result<RawSample, Error> {
    let temperature =
        i16::try_from(milli_celsius / 100).map_err(|_| Error::from(SensorError::OutOfRange))?;
    let humidity = (milli_percent / 100).clamp(0, 1000) as u16;
    Ok(RawSample {
        temperature,
        humidity,
    })
}

/// Supply voltage via the SAADC VDD input (gain 1/6, 0.6 V reference,
/// so full scale is 3.6 V over 12 bits).
pub struct VddMonitor {
    saadc: Saadc<'static, 1>,
}

const FULL_SCALE_MV: i32 = 3600;
const RESOLUTION: i32 = 4096;

impl VddMonitor {
    pub async fn new(saadc: Saadc<'static, 1>) -> Self {
        saadc.calibrate().await;
        Self { saadc }
    }

    pub async fn millivolts(&mut self) -> Result<u16, Error> {
        let mut buf = [0i16; 1];
        self.saadc.sample(&mut buf).await;
        let raw = i32::from(buf[0]);
        if raw < 0 {
            return Err(Error::Battery);
        }
        Ok((raw * FULL_SCALE_MV / RESOLUTION) as u16)
    }
}
