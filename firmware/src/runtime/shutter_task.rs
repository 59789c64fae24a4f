use crate::shutter::task::{self, ReleaseCableDriver};
use crate::shutter::{CommandReceiver, ProgressSignal};

#[embassy_executor::task]
pub async fn run(
    commands: CommandReceiver<'static>,
    outputs: ReleaseCableDriver,
    progress: &'static ProgressSignal,
) -> ! {
    task::run(commands, outputs, progress).await
}
