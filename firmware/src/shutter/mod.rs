//! Shutter control surface bridging firmware tasks with `shutter-core`.

pub mod task;

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::signal::Signal;

pub use shutter_core::sequencer::Command;

/// Depth of the command queue shared between the transport and the sequencer.
pub const COMMAND_QUEUE_DEPTH: usize = 4;

#[cfg(target_os = "none")]
type ShutterMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type ShutterMutex = NoopRawMutex;

/// Queue carrying decoded transport writes to the sequencer task.
pub type CommandQueue = Channel<ShutterMutex, Command, COMMAND_QUEUE_DEPTH>;

/// Convenience sender type alias for the command queue.
pub type CommandSender<'a> = Sender<'a, ShutterMutex, Command, COMMAND_QUEUE_DEPTH>;

/// Convenience receiver type alias for the command queue.
pub type CommandReceiver<'a> = Receiver<'a, ShutterMutex, Command, COMMAND_QUEUE_DEPTH>;

/// Latest-value signal carrying the per-shot progress counter to the
/// notification path. Overwrites are fine: only the newest total matters.
pub type ProgressSignal = Signal<ShutterMutex, u16>;
