//! BLE peripheral transport.
//!
//! Advertises the shutter service and maps GATT writes onto sequencer
//! commands. The advertising payload builders are plain byte-slab code kept
//! target-independent so host tests can pin the exact over-the-air layout.

use shutter_core::codec;

#[cfg(target_os = "none")]
use embassy_futures::select::{Either, select};
#[cfg(target_os = "none")]
use nrf_softdevice::Softdevice;
#[cfg(target_os = "none")]
use nrf_softdevice::ble::{gatt_server, peripheral};
#[cfg(target_os = "none")]
use shutter_core::codec::Characteristic;

#[cfg(target_os = "none")]
use crate::shutter::{CommandSender, ProgressSignal};

/// GAP device name, also carried as the complete local name in the scan
/// response.
pub const DEVICE_NAME: &str = "DSLR BLE Shutter";

/// Advertising interval in 0.625 ms units (100 ms).
pub const ADV_INTERVAL_UNITS: u32 = 160;

/// Builds the connectable advertising payload: flags plus an incomplete list
/// of 16-bit service UUIDs carrying the shutter service.
#[must_use]
pub fn advertising_data() -> heapless::Vec<u8, 31> {
    let mut data = heapless::Vec::new();
    // Flags: LE general discoverable, BR/EDR unsupported.
    let _ = data.extend_from_slice(&[0x02, 0x01, 0x06]);
    let _ = data.extend_from_slice(&[0x03, 0x02]);
    let _ = data.extend_from_slice(&codec::SERVICE_UUID.to_le_bytes());
    data
}

/// Builds the scan response payload carrying the complete local name.
#[must_use]
pub fn scan_response_data() -> heapless::Vec<u8, 31> {
    let mut data = heapless::Vec::new();
    let _ = data.push((DEVICE_NAME.len() + 1) as u8);
    let _ = data.push(0x09);
    let _ = data.extend_from_slice(DEVICE_NAME.as_bytes());
    data
}

#[cfg(target_os = "none")]
#[nrf_softdevice::gatt_service(uuid = "fff0")]
pub struct ShutterService {
    #[characteristic(uuid = "fff1", write)]
    focus: u8,
    #[characteristic(uuid = "fff2", write)]
    shooting: heapless::Vec<u8, 14>,
    #[characteristic(uuid = "fff3", write)]
    stop: u8,
    #[characteristic(uuid = "fff4", notify)]
    progress: heapless::Vec<u8, 2>,
}

#[cfg(target_os = "none")]
#[nrf_softdevice::gatt_server]
pub struct Server {
    pub shutter: ShutterService,
}

/// Routes one service write into the command queue.
///
/// The event handler runs synchronously inside the SoftDevice dispatch, so a
/// full queue drops the write instead of blocking.
#[cfg(target_os = "none")]
fn on_write(event: &ShutterServiceEvent, commands: &CommandSender<'static>) {
    let decoded = match event {
        ShutterServiceEvent::FocusWrite(value) => {
            codec::decode_write(Characteristic::Focus, &[*value])
        }
        ShutterServiceEvent::ShootingWrite(payload) => {
            codec::decode_write(Characteristic::Shooting, payload)
        }
        ShutterServiceEvent::StopWrite(value) => {
            codec::decode_write(Characteristic::Stop, &[*value])
        }
        ShutterServiceEvent::ProgressCccdWrite { notifications } => {
            defmt::info!("ble: progress notifications enabled={}", notifications);
            return;
        }
    };

    match decoded {
        Ok(command) => {
            if commands.try_send(command).is_err() {
                defmt::warn!("ble: command queue full, write dropped");
            }
        }
        Err(_) => defmt::warn!("ble: rejected malformed write"),
    }
}

/// Advertises forever, servicing one central at a time.
#[cfg(target_os = "none")]
pub async fn run(
    sd: &'static Softdevice,
    server: &'static Server,
    commands: CommandSender<'static>,
    progress: &'static ProgressSignal,
) -> ! {
    let adv_data = advertising_data();
    let scan_data = scan_response_data();
    let config = peripheral::Config {
        interval: ADV_INTERVAL_UNITS,
        ..Default::default()
    };

    loop {
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &adv_data,
            scan_data: &scan_data,
        };
        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(err) => {
                defmt::warn!("ble: advertise failed: {:?}", err);
                continue;
            }
        };
        defmt::info!("ble: central connected");

        // Discard any total left over from a previous connection.
        progress.reset();

        let gatt = gatt_server::run(&conn, server, |event| match event {
            ServerEvent::Shutter(event) => on_write(&event, &commands),
        });
        let notifier = async {
            loop {
                let payload = codec::encode_progress(progress.wait().await);
                let mut value = heapless::Vec::<u8, 2>::new();
                let _ = value.extend_from_slice(&payload);
                if server.shutter.progress_notify(&conn, &value).is_err() {
                    defmt::warn!("ble: progress notification dropped");
                }
            }
        };

        match select(gatt, notifier).await {
            Either::First(err) => defmt::info!("ble: disconnected: {:?}", err),
            Either::Second(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertising_payload_carries_flags_and_service_uuid() {
        let data = advertising_data();
        assert_eq!(&data[..], &[0x02, 0x01, 0x06, 0x03, 0x02, 0xF0, 0xFF]);
    }

    #[test]
    fn scan_response_carries_the_complete_local_name() {
        let data = scan_response_data();
        assert_eq!(data[0] as usize, DEVICE_NAME.len() + 1);
        assert_eq!(data[1], 0x09);
        assert_eq!(&data[2..], DEVICE_NAME.as_bytes());
        assert!(data.len() <= 31);
    }
}
