//! Sequencer task: drives `shutter-core` from the command queue and the
//! Embassy time driver.
//!
//! The controller's timer collaborator is implemented here as a single armed
//! deadline. The run loop waits on whichever comes first, the next queued
//! command or the armed deadline, so one task owns every controller entry
//! point and no locking is needed around the state machine.

use core::time::Duration as CoreDuration;

use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Instant, Timer};
use shutter_core::progress::ProgressSink;
use shutter_core::sequencer::{OutputDriver, SequenceController, TimerEvent, TimerService};

use crate::shutter::{Command, CommandReceiver, ProgressSignal};

#[cfg(target_os = "none")]
use embassy_nrf::gpio::Output;
#[cfg(target_os = "none")]
use shutter_core::shooting::LineId;

/// Converts the portable core duration into an Embassy tick duration.
fn to_embassy(duration: CoreDuration) -> Duration {
    Duration::from_micros(duration.as_micros() as u64)
}

/// Deadline armed by the sequencer, waiting for the time driver.
#[derive(Copy, Clone, Debug)]
pub struct ArmedTimer {
    pub id: u32,
    pub deadline: Instant,
    pub event: TimerEvent,
}

/// Timer service with a single armed slot backed by the Embassy clock.
///
/// The sequencer keeps at most one timer outstanding, so one slot suffices.
/// Handles are generation counters: a cancel or expiry for an id that no
/// longer matches the slot is a no-op.
#[derive(Debug, Default)]
pub struct DeadlineTimers {
    next_id: u32,
    armed: Option<ArmedTimer>,
}

impl DeadlineTimers {
    /// Creates a service with nothing armed.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            armed: None,
        }
    }

    /// Returns the armed deadline, if any.
    #[must_use]
    pub const fn armed(&self) -> Option<ArmedTimer> {
        self.armed
    }

    /// Clears the slot for an expired deadline. Returns `false` when the id
    /// no longer matches, meaning the expiry raced a newer schedule.
    pub fn expire(&mut self, id: u32) -> bool {
        match self.armed {
            Some(armed) if armed.id == id => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }
}

impl TimerService for DeadlineTimers {
    type Handle = u32;

    fn schedule(&mut self, after: CoreDuration, event: TimerEvent) -> Self::Handle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.armed = Some(ArmedTimer {
            id,
            deadline: Instant::now() + to_embassy(after),
            event,
        });
        id
    }

    fn cancel(&mut self, handle: Self::Handle) {
        if let Some(armed) = self.armed
            && armed.id == handle
        {
            self.armed = None;
        }
    }
}

/// Progress sink that forwards each completed-shot total to the transport.
pub struct ProgressPublisher {
    signal: &'static ProgressSignal,
}

impl ProgressPublisher {
    /// Creates a publisher feeding the given signal.
    #[must_use]
    pub const fn new(signal: &'static ProgressSignal) -> Self {
        Self { signal }
    }
}

impl ProgressSink for ProgressPublisher {
    fn progress_updated(&mut self, shots_completed: u16) {
        log_progress(shots_completed);
        self.signal.signal(shots_completed);
    }
}

/// Output driver over the two open-drain release-cable lines.
///
/// Both lines are active-low: driving a pin low closes the corresponding
/// contact on the camera's remote connector.
#[cfg(target_os = "none")]
pub struct ReleaseCableDriver {
    focus: Output<'static>,
    shutter: Output<'static>,
}

#[cfg(target_os = "none")]
impl ReleaseCableDriver {
    /// Wraps the two configured output pins, focus first.
    #[must_use]
    pub const fn new(focus: Output<'static>, shutter: Output<'static>) -> Self {
        Self { focus, shutter }
    }
}

#[cfg(target_os = "none")]
impl OutputDriver for ReleaseCableDriver {
    fn set_line(&mut self, line: LineId, active: bool) {
        let pin = match line {
            LineId::Focus => &mut self.focus,
            LineId::Shutter => &mut self.shutter,
        };
        if active {
            pin.set_low();
        } else {
            pin.set_high();
        }
    }
}

/// Runs the sequencer forever over the given output driver.
pub async fn run<D>(
    commands: CommandReceiver<'static>,
    outputs: D,
    progress: &'static ProgressSignal,
) -> !
where
    D: OutputDriver,
{
    let mut controller =
        SequenceController::new(outputs, DeadlineTimers::new(), ProgressPublisher::new(progress));

    loop {
        match controller.timers().armed() {
            Some(armed) => match select(commands.receive(), Timer::at(armed.deadline)).await {
                Either::First(command) => {
                    log_command(&command);
                    controller.apply(command);
                }
                Either::Second(()) => {
                    if controller.timers_mut().expire(armed.id) {
                        controller.on_timer_expired(armed.event);
                    }
                }
            },
            None => {
                let command = commands.receive().await;
                log_command(&command);
                controller.apply(command);
            }
        }
    }
}

#[cfg(target_os = "none")]
fn log_command(command: &Command) {
    match command {
        Command::TriggerFocus => defmt::info!("shutter: focus pulse"),
        Command::SetFocus(active) => defmt::info!("shutter: focus manual active={}", active),
        Command::StartShooting(params) => defmt::info!(
            "shutter: start count={} delay_ms={} interval_ms={}",
            params.target_count,
            params.delay_before_start.as_millis() as u64,
            params.repeat_interval.as_millis() as u64,
        ),
        Command::Stop => defmt::info!("shutter: stop"),
    }
}

#[cfg(not(target_os = "none"))]
fn log_command(command: &Command) {
    match command {
        Command::TriggerFocus => println!("shutter: focus pulse"),
        Command::SetFocus(active) => println!("shutter: focus manual active={active}"),
        Command::StartShooting(params) => println!(
            "shutter: start count={} delay_ms={} interval_ms={}",
            params.target_count,
            params.delay_before_start.as_millis(),
            params.repeat_interval.as_millis(),
        ),
        Command::Stop => println!("shutter: stop"),
    }
}

#[cfg(target_os = "none")]
fn log_progress(shots_completed: u16) {
    defmt::info!("shutter: shot {} complete", shots_completed);
}

#[cfg(not(target_os = "none"))]
fn log_progress(shots_completed: u16) {
    println!("shutter: shot {shots_completed} complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_arms_a_single_slot() {
        let mut timers = DeadlineTimers::new();
        assert!(timers.armed().is_none());

        let before = Instant::now();
        let handle = timers.schedule(CoreDuration::from_millis(100), TimerEvent::ShutterRelease);

        let armed = timers.armed().expect("slot must be armed");
        assert_eq!(armed.id, handle);
        assert_eq!(armed.event, TimerEvent::ShutterRelease);
        assert!(armed.deadline >= before + Duration::from_millis(100));
    }

    #[test]
    fn cancel_clears_only_the_matching_handle() {
        let mut timers = DeadlineTimers::new();
        let stale = timers.schedule(CoreDuration::from_millis(10), TimerEvent::FocusRelease);
        timers.cancel(stale);
        assert!(timers.armed().is_none());

        let live = timers.schedule(CoreDuration::from_millis(10), TimerEvent::ShutterActivate);
        timers.cancel(stale);
        assert!(timers.armed().is_some());
        timers.cancel(live);
        assert!(timers.armed().is_none());
    }

    #[test]
    fn expire_rejects_a_raced_handle() {
        let mut timers = DeadlineTimers::new();
        let first = timers.schedule(CoreDuration::from_millis(10), TimerEvent::ShutterActivate);
        timers.cancel(first);
        let second = timers.schedule(CoreDuration::from_millis(10), TimerEvent::ShutterRelease);

        assert!(!timers.expire(first));
        assert!(timers.armed().is_some());
        assert!(timers.expire(second));
        assert!(timers.armed().is_none());
    }

    #[test]
    fn publisher_forwards_the_latest_total() {
        let signal: &'static ProgressSignal = Box::leak(Box::new(ProgressSignal::new()));
        let mut publisher = ProgressPublisher::new(signal);

        publisher.progress_updated(1);
        publisher.progress_updated(2);
        assert_eq!(signal.try_take(), Some(2));
        assert_eq!(signal.try_take(), None);
    }

    #[test]
    fn duration_conversion_preserves_milliseconds() {
        assert_eq!(to_embassy(CoreDuration::from_millis(500)), Duration::from_millis(500));
        assert_eq!(to_embassy(CoreDuration::ZERO), Duration::from_micros(0));
    }
}
