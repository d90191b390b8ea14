//! envbeacon firmware entry point (nRF52840 + S140).
//!
//! Task layout:
//!
//! - `softdevice_task` - runs the SoftDevice event loop
//! - `ble::advertiser::advertise_task` - advertising + GATT connection
//! - `main` - the measurement loop: polls the pipeline every main cycle,
//!   awaits the sensor / SAADC when due and hands results to the radio,
//!   the GATT server and the display. Between rounds it redraws the last
//!   frame when a central connects or disconnects.

#![no_std]
#![no_main]

mod ble;
mod sensors;
mod ui;

use defmt::{info, unwrap};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::{bind_interrupts, peripherals, saadc, twim};
use embassy_time::{Duration, Instant, Timer};
use envbeacon::clock::TickSource;
use envbeacon::config::{self, PipelineConfig};
use envbeacon::frame::DisplayFrame;
use envbeacon::interfaces::{Advertiser, Display, Notifier};
use envbeacon::payload;
use envbeacon::Pipeline;
use nrf_softdevice::Softdevice;
use panic_probe as _;
use static_cell::StaticCell;

use crate::ble::advertiser::RadioAdvertiser;
use crate::ble::gatt::{GattNotifier, Server};
use crate::sensors::{Sht4xSensor, VddMonitor};
use crate::ui::OledDisplay;

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
    SPIM1_SPIS1_TWIM1_TWIS1_SPI1_TWI1 => twim::InterruptHandler<peripherals::TWISPI1>;
    SAADC => saadc::InterruptHandler;
});

static SERVER: StaticCell<Server> = StaticCell::new();

/// How long the boot splash stays up before the first round.
const BOOT_SCREEN_MS: u64 = 2000;

/// The embassy RTC1 time driver, truncated to the 32-bit tick width the
/// scheduler works in.
struct RtcClock;

impl TickSource for RtcClock {
    fn now(&self) -> u32 {
        Instant::now().as_ticks() as u32
    }
}

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("envbeacon starting");

    // The SoftDevice reserves priorities 0, 1 and 4.
    let mut hal_config = embassy_nrf::config::Config::default();
    hal_config.gpiote_interrupt_priority = Priority::P2;
    hal_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(hal_config);
    interrupt::SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0.set_priority(Priority::P3);
    interrupt::SPIM1_SPIS1_TWIM1_TWIS1_SPI1_TWI1.set_priority(Priority::P3);
    interrupt::SAADC.set_priority(Priority::P3);

    // Sensor bus (TWISPI0) and display bus (TWISPI1), see config.rs.
    let sensor_bus = twim::Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    let display_bus = twim::Twim::new(p.TWISPI1, Irqs, p.P0_30, p.P0_31, twim::Config::default());

    let vdd = saadc::ChannelConfig::single_ended(saadc::VddInput);
    let adc = saadc::Saadc::new(p.SAADC, Irqs, saadc::Config::default(), [vdd]);

    let sd = Softdevice::enable(&ble::softdevice_config());
    let server = SERVER.init(unwrap!(Server::new(sd)));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));

    let mac = ble::mac_address(sd);
    let name = payload::device_name(&mac);
    ble::set_device_name(name.as_str());

    let server: &'static Server = server;
    unwrap!(spawner.spawn(ble::advertiser::advertise_task(
        sd,
        server,
        payload::scan_response(&mac)
    )));

    let format = config::ADV_FORMAT.with_mac(mac);
    let mut pipeline = Pipeline::new(PipelineConfig::DEFAULT, format);
    info!("advertising format: {:?}", format.kind());

    let clock = RtcClock;
    let mut sensor = Sht4xSensor::new(sensor_bus);
    let mut battery = VddMonitor::new(adc).await;
    let mut radio = RadioAdvertiser;
    let mut notifier = GattNotifier::new(server);
    let mut display = OledDisplay::new(display_bus);

    let mac_line = payload::mac_string(&mac);
    let version = env!("CARGO_PKG_VERSION");
    if let Err(e) = display.show_boot(&name, &mac_line, version) {
        defmt::warn!("boot screen failed: {:?}", e);
    }
    Timer::after(Duration::from_millis(BOOT_SCREEN_MS)).await;

    let period = Duration::from_millis(u64::from(config::MAIN_CYCLE_MS));
    let mut next = Instant::now();
    let mut last_frame: Option<DisplayFrame> = None;

    loop {
        match select(Timer::at(next), ble::CONNECTION_CHANGED.wait()).await {
            Either::First(()) => next += period,
            Either::Second(connected) => {
                if let Some(frame) = last_frame {
                    if let Err(e) = display.show(&frame.with_connected(connected)) {
                        defmt::warn!("display update failed: {:?}", e);
                    }
                }
                continue;
            }
        }

        if let Some(round) = pipeline.poll(clock.now()) {
            if round.refresh_battery {
                pipeline.apply_battery(battery.millivolts().await);
            }
            if round.resample {
                if let Some(payload) = pipeline.apply_sample(sensor.sample().await) {
                    if let Err(e) = radio.set_payload(&payload) {
                        defmt::warn!("advertising update failed: {:?}", e);
                    }
                }
            }

            let connected = notifier.is_connected();
            if connected {
                pipeline.push_notifications(&mut notifier);
            }

            let frame = pipeline.display_frame(connected);
            if let Err(e) = display.show(&frame) {
                defmt::warn!("display update failed: {:?}", e);
            }
            last_frame = Some(frame);
        }
    }
}
