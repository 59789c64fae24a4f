//! Embedded entry point: SoftDevice bring-up, peripheral init, task wiring.

use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::interrupt::Priority;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use nrf_softdevice::{Softdevice, raw};
use static_cell::StaticCell;

use crate::ble;
use crate::shutter;
use crate::shutter::task::ReleaseCableDriver;

mod ble_task;
mod shutter_task;

pub(super) static COMMAND_QUEUE: shutter::CommandQueue = Channel::new();
pub(super) static PROGRESS: shutter::ProgressSignal = Signal::new();
static SERVER: StaticCell<ble::Server> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: ble::DEVICE_NAME.as_ptr().cast_mut(),
            current_len: ble::DEVICE_NAME.len() as u16,
            max_len: ble::DEVICE_NAME.len() as u16,
            write_perm: unsafe { core::mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let mut config = embassy_nrf::config::Config::default();
    // The SoftDevice owns the highest interrupt priorities.
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);

    let sd = Softdevice::enable(&softdevice_config());
    let server = SERVER.init(ble::Server::new(sd).expect("GATT server registration"));

    // Release-cable lines are active-low; idle high keeps both contacts open.
    let outputs = ReleaseCableDriver::new(
        Output::new(p.P0_03, Level::High, OutputDrive::Standard),
        Output::new(p.P0_04, Level::High, OutputDrive::Standard),
    );

    spawner
        .spawn(softdevice_task(sd))
        .expect("failed to spawn SoftDevice task");
    spawner
        .spawn(shutter_task::run(
            COMMAND_QUEUE.receiver(),
            outputs,
            &PROGRESS,
        ))
        .expect("failed to spawn shutter task");
    spawner
        .spawn(ble_task::run(
            sd,
            server,
            COMMAND_QUEUE.sender(),
            &PROGRESS,
        ))
        .expect("failed to spawn BLE task");
}
