//! btleplug side: adapter lookup, discovery and the advertisement watch loop

use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use esp32sk_proto::Reading;
use esp32sk_sensor::{Esp32Sk, Monitor, Outcome, SensorHost};
use futures::{Stream, StreamExt, future};
use log::*;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::time::Duration;

/// A peripheral seen during a scan
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub name: String,
    pub address: String,
    pub rssi: Option<i16>,
    /// Decoded payload, set when the device advertises our company id
    pub reading: Option<Reading>,
}

impl DiscoveredDevice {
    pub fn is_esp32sk(&self) -> bool {
        self.reading.is_some()
    }
}

/// Get the default Bluetooth adapter
pub async fn get_adapter() -> Result<Adapter, Box<dyn std::error::Error>> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters
        .into_iter()
        .next()
        .ok_or_else(|| "No Bluetooth adapter found".into())
}

/// Scan for `duration_secs` and list every peripheral seen
pub async fn scan(
    adapter: &Adapter,
    sensor: &Esp32Sk,
    duration_secs: u64,
) -> Result<Vec<DiscoveredDevice>, Box<dyn std::error::Error>> {
    adapter.start_scan(ScanFilter::default()).await?;
    tokio::time::sleep(Duration::from_secs(duration_secs)).await;

    let peripherals = adapter.peripherals().await?;
    let mut devices = Vec::new();

    for peripheral in peripherals {
        if let Some(props) = peripheral.properties().await? {
            let reading = props
                .manufacturer_data
                .iter()
                .find(|(id, _)| sensor.identify(**id))
                .map(|(_, data)| Reading::decode(Some(data.as_slice())));

            devices.push(DiscoveredDevice {
                name: props.local_name.unwrap_or_else(|| "Unknown".to_string()),
                address: peripheral.address().to_string(),
                rssi: props.rssi,
                reading,
            });
        }
    }

    adapter.stop_scan().await?;
    Ok(devices)
}

/// Feed manufacturer data advertisements into `monitor` until Ctrl-C
///
/// `target` restricts the loop to devices whose name or address contains it.
pub async fn watch<H: SensorHost>(
    adapter: &Adapter,
    monitor: &mut Monitor<String, H>,
    target: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let events = adapter.events().await?;
    adapter.start_scan(ScanFilter::default()).await?;
    info!("watching advertisements, Ctrl-C to stop");

    let adverts = events.filter_map(|event| {
        future::ready(match event {
            CentralEvent::ManufacturerDataAdvertisement {
                id,
                manufacturer_data,
            } => Some((id, manufacturer_data)),
            _ => None,
        })
    });
    route(adverts, tokio::signal::ctrl_c(), monitor, |id| {
        device_label(adapter, id, target)
    })
    .await;

    adapter.stop_scan().await?;
    Ok(())
}

/// Hand each advertisement to `monitor` until `adverts` ends or `shutdown` fires
///
/// `label` names the device, or skips it with `Ok(None)`. A lookup error skips
/// that one advertisement.
async fn route<I, E, S, F, L, Fut, H>(
    adverts: S,
    shutdown: F,
    monitor: &mut Monitor<String, H>,
    mut label: L,
) where
    I: Clone + Debug,
    E: Display,
    S: Stream<Item = (I, HashMap<u16, Vec<u8>>)>,
    F: Future,
    L: FnMut(I) -> Fut,
    Fut: Future<Output = Result<Option<String>, E>>,
    H: SensorHost,
{
    tokio::pin!(adverts);
    tokio::pin!(shutdown);

    loop {
        let advert = tokio::select! {
            advert = adverts.next() => advert,
            _ = &mut shutdown => None,
        };
        let Some((id, manufacturer_data)) = advert else {
            break;
        };

        let address = match label(id.clone()).await {
            Ok(Some(address)) => address,
            Ok(None) => continue,
            Err(e) => {
                warn!("{id:?}: lookup failed: {e}");
                continue;
            }
        };

        match monitor.handle(&address, &manufacturer_data) {
            Outcome::Failed(e) => println!("{address}: {e}"),
            outcome => trace!("{address}: {outcome:?}"),
        }
    }
}

/// Address of the peripheral, or `None` when it does not match `target`
async fn device_label(
    adapter: &Adapter,
    id: PeripheralId,
    target: Option<&str>,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let peripheral = adapter.peripheral(&id).await?;
    let address = peripheral.address().to_string();

    let Some(t) = target else {
        return Ok(Some(address));
    };

    let name = peripheral
        .properties()
        .await?
        .and_then(|props| props.local_name)
        .unwrap_or_default();

    if name.contains(t) || address.contains(t) {
        Ok(Some(address))
    } else {
        Ok(None)
    }
}
