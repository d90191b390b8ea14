//! GATT services and the notification collaborator.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{debug, info};
use envbeacon::interfaces::Notifier;
use envbeacon::notify::Characteristic;
use envbeacon::Error;

use super::current_connection;

/// Environmental Sensing Service.
#[nrf_softdevice::gatt_service(uuid = "181a")]
pub struct EnvironmentService {
    /// 0.1 °C, little-endian.
    #[characteristic(uuid = "2a1f", read, notify)]
    pub temperature: i16,

    /// 0.01 %, little-endian.
    #[characteristic(uuid = "2a6f", read, notify)]
    pub humidity: u16,
}

/// Battery Service.
#[nrf_softdevice::gatt_service(uuid = "180f")]
pub struct BatteryService {
    #[characteristic(uuid = "2a19", read, notify)]
    pub battery_level: u8,
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub env: EnvironmentService,
    pub bas: BatteryService,
}

/// CCCD state per characteristic, updated from GATT events.
struct Subscriptions {
    temperature: AtomicBool,
    humidity: AtomicBool,
    battery_level: AtomicBool,
}

static SUBSCRIBED: Subscriptions = Subscriptions {
    temperature: AtomicBool::new(false),
    humidity: AtomicBool::new(false),
    battery_level: AtomicBool::new(false),
};

impl Subscriptions {
    fn flag(&self, characteristic: Characteristic) -> &AtomicBool {
        match characteristic {
            Characteristic::Temperature => &self.temperature,
            Characteristic::Humidity => &self.humidity,
            Characteristic::BatteryLevel => &self.battery_level,
        }
    }

    fn clear(&self) {
        self.temperature.store(false, Ordering::Relaxed);
        self.humidity.store(false, Ordering::Relaxed);
        self.battery_level.store(false, Ordering::Relaxed);
    }
}

/// Route a GATT server event. Called from the advertising task while a
/// connection is open.
pub fn on_event(event: ServerEvent) {
    let (characteristic, enabled) = match event {
        ServerEvent::Env(EnvironmentServiceEvent::TemperatureCccdWrite { notifications }) => {
            (Characteristic::Temperature, notifications)
        }
        ServerEvent::Env(EnvironmentServiceEvent::HumidityCccdWrite { notifications }) => {
            (Characteristic::Humidity, notifications)
        }
        ServerEvent::Bas(BatteryServiceEvent::BatteryLevelCccdWrite { notifications }) => {
            (Characteristic::BatteryLevel, notifications)
        }
    };
    info!("notifications {:?}: {}", characteristic, enabled);
    SUBSCRIBED.flag(characteristic).store(enabled, Ordering::Relaxed);
}

/// Forget all subscriptions (on disconnect).
pub fn reset_subscriptions() {
    SUBSCRIBED.clear();
}

/// [`Notifier`] over the SoftDevice GATT server.
///
/// Every push also updates the stored value so reads see it.
pub struct GattNotifier {
    server: &'static Server,
}

impl GattNotifier {
    pub fn new(server: &'static Server) -> Self {
        Self { server }
    }

    fn store(&self, characteristic: Characteristic, value: &[u8]) -> Result<(), Error> {
        let s = self.server;
        let res = match characteristic {
            Characteristic::Temperature => {
                s.env.temperature_set(&i16::from_le_bytes(pair(value)?))
            }
            Characteristic::Humidity => s.env.humidity_set(&u16::from_le_bytes(pair(value)?)),
            Characteristic::BatteryLevel => {
                s.bas.battery_level_set(value.first().ok_or(Error::Notify)?)
            }
        };
        res.map_err(|_| Error::Notify)
    }
}

fn pair(value: &[u8]) -> Result<[u8; 2], Error> {
    value.try_into().map_err(|_| Error::Notify)
}

impl Notifier for GattNotifier {
    fn is_connected(&self) -> bool {
        current_connection().is_some()
    }

    fn notify(&mut self, characteristic: Characteristic, value: &[u8]) -> Result<(), Error> {
        self.store(characteristic, value)?;

        let Some(conn) = current_connection() else {
            return Ok(());
        };
        if !SUBSCRIBED.flag(characteristic).load(Ordering::Relaxed) {
            return Ok(());
        }

        let s = self.server;
        let res = match characteristic {
            Characteristic::Temperature => {
                s.env.temperature_notify(&conn, &i16::from_le_bytes(pair(value)?))
            }
            Characteristic::Humidity => {
                s.env.humidity_notify(&conn, &u16::from_le_bytes(pair(value)?))
            }
            Characteristic::BatteryLevel => {
                let level = value.first().ok_or(Error::Notify)?;
                s.bas.battery_level_notify(&conn, level)
            }
        };
        debug!("notify {:?} ({} bytes)", characteristic, value.len());
        res.map_err(|_| Error::Notify)
    }
}
