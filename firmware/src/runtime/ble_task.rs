use nrf_softdevice::Softdevice;

use crate::ble;
use crate::shutter::{CommandSender, ProgressSignal};

#[embassy_executor::task]
pub async fn run(
    sd: &'static Softdevice,
    server: &'static ble::Server,
    commands: CommandSender<'static>,
    progress: &'static ProgressSignal,
) -> ! {
    ble::run(sd, server, commands, progress).await
}
