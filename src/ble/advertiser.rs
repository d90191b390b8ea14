//! Advertising task and the broadcast collaborator.

use defmt::{info, warn};
use embassy_futures::select::{select, Either};
use envbeacon::config;
use envbeacon::interfaces::Advertiser;
use envbeacon::payload::AdvPayload;
use envbeacon::Error;
use nrf_softdevice::ble::{gatt_server, peripheral};
use nrf_softdevice::Softdevice;

use super::gatt::{self, Server};
use super::{CONNECTION, CONNECTION_CHANGED, PAYLOAD, PAYLOAD_CHANGED};

/// [`Advertiser`] that hands the payload to [`advertise_task`].
pub struct RadioAdvertiser;

impl Advertiser for RadioAdvertiser {
    fn set_payload(&mut self, payload: &[u8]) -> Result<(), Error> {
        if payload.len() > envbeacon::payload::ADV_DATA_MAX {
            return Err(Error::Advertise);
        }
        let payload = AdvPayload::from_slice(payload);
        PAYLOAD.lock(|p| *p.borrow_mut() = Some(payload));
        PAYLOAD_CHANGED.signal(());
        Ok(())
    }
}

/// Advertise the current payload, serve one connection at a time, and
/// restart advertising on every payload change or disconnect.
#[embassy_executor::task]
pub async fn advertise_task(sd: &'static Softdevice, server: &'static Server, scan_data: [u8; 12]) {
    let adv_config = peripheral::Config {
        interval: config::ADV_INTERVAL,
        ..Default::default()
    };

    loop {
        let Some(payload) = PAYLOAD.lock(|p| *p.borrow()) else {
            // Nothing to broadcast before the first measurement.
            PAYLOAD_CHANGED.wait().await;
            continue;
        };

        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: payload.as_bytes(),
            scan_data: &scan_data,
        };

        let conn = match select(
            peripheral::advertise_connectable(sd, adv, &adv_config),
            PAYLOAD_CHANGED.wait(),
        )
        .await
        {
            Either::First(Ok(conn)) => conn,
            Either::First(Err(e)) => {
                warn!("advertising failed: {:?}", e);
                continue;
            }
            // Dropping the advertise future stops advertising; go again
            // with the new payload.
            Either::Second(()) => continue,
        };

        info!("central connected");
        CONNECTION.lock(|c| *c.borrow_mut() = Some(conn.clone()));
        CONNECTION_CHANGED.signal(true);

        let reason = gatt_server::run(&conn, server, gatt::on_event).await;

        CONNECTION.lock(|c| *c.borrow_mut() = None);
        gatt::reset_subscriptions();
        CONNECTION_CHANGED.signal(false);
        info!("central disconnected: {:?}", reason);
    }
}
