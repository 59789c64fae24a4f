//! Shooting sequencer state machine.
//!
//! This module defines the event-driven controller that turns a parameter set
//! into timed focus/shutter pulses. The controller is generic over the timer
//! and GPIO collaborators so the same logic drives real hardware in the
//! firmware and instrumented stand-ins on the host.
//!
//! All entry points run inside a single cooperative dispatch context: writes
//! from the transport and timer expirations arrive as discrete callbacks that
//! never overlap, and each call issues at most one timer schedule or cancel.

use core::time::Duration;

use crate::progress::ProgressSink;
use crate::shooting::{DEFAULT_ACTIVE_PERIOD, LineId, ShootingParameters};

/// Sequencer phase. The output lines mirror the phase: the shutter line is
/// active only in `ShutterActive`, the focus line only in `FocusActive`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    Idle,
    FocusActive,
    WaitingToShoot,
    ShutterActive,
}

impl Phase {
    /// Returns `true` while a multi-shot sequence is in flight.
    pub const fn is_shooting(self) -> bool {
        matches!(self, Phase::WaitingToShoot | Phase::ShutterActive)
    }

    /// The timer event this phase is waiting for, if any. A fired timer that
    /// does not match is stale and must be ignored.
    pub const fn expected_event(self) -> Option<TimerEvent> {
        match self {
            Phase::Idle => None,
            Phase::FocusActive => Some(TimerEvent::FocusRelease),
            Phase::WaitingToShoot => Some(TimerEvent::ShutterActivate),
            Phase::ShutterActive => Some(TimerEvent::ShutterRelease),
        }
    }
}

/// Timer expirations delivered back into the sequencer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimerEvent {
    FocusRelease,
    ShutterActivate,
    ShutterRelease,
}

/// Commands accepted by [`SequenceController::apply`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Pulse the focus line for [`DEFAULT_ACTIVE_PERIOD`].
    TriggerFocus,
    /// Drive the focus line directly; manual control, no timer involved.
    SetFocus(bool),
    /// Replace the active parameters and begin a new sequence.
    StartShooting(ShootingParameters),
    /// Cancel whatever is outstanding and release both lines.
    Stop,
}

/// Abstraction over the physical output drivers.
pub trait OutputDriver {
    /// Drives the requested line active or inactive.
    fn set_line(&mut self, line: LineId, active: bool);

    /// Releases both output lines.
    fn release_all(&mut self) {
        self.set_line(LineId::Focus, false);
        self.set_line(LineId::Shutter, false);
    }
}

/// Output driver that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopOutputDriver;

impl NoopOutputDriver {
    /// Creates a new no-op output driver.
    pub const fn new() -> Self {
        Self
    }
}

impl OutputDriver for NoopOutputDriver {
    fn set_line(&mut self, _: LineId, _: bool) {}
}

/// Single-slot timer collaborator. The controller tracks at most one
/// outstanding handle at any time.
pub trait TimerService {
    /// Opaque handle identifying a scheduled callback.
    type Handle: Copy;

    /// Schedules `event` to fire after `after` and returns its handle.
    fn schedule(&mut self, after: Duration, event: TimerEvent) -> Self::Handle;

    /// Cancels a previously scheduled callback. Cancelling a handle that has
    /// already fired is a no-op.
    fn cancel(&mut self, handle: Self::Handle);
}

/// Timer the controller has scheduled but not yet seen fire.
#[derive(Copy, Clone, Debug)]
struct PendingTimer<H> {
    handle: H,
    event: TimerEvent,
}

/// Mutable sequencer state, owned exclusively by the controller. Created once
/// at startup and never torn down while the device runs.
#[derive(Copy, Clone, Debug)]
pub struct SequenceState<H> {
    phase: Phase,
    shots_completed: u16,
    active: ShootingParameters,
    pending: Option<PendingTimer<H>>,
}

impl<H> SequenceState<H> {
    const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            shots_completed: 0,
            active: ShootingParameters::single_shot(),
            pending: None,
        }
    }
}

/// Event-driven controller for the focus/shutter output lines.
///
/// Owns the [`SequenceState`] plus its three collaborators: the GPIO driver,
/// the timer service, and the progress sink notified once per completed shot.
pub struct SequenceController<D, T, N>
where
    T: TimerService,
{
    outputs: D,
    timers: T,
    notifier: N,
    state: SequenceState<T::Handle>,
}

impl<D, T, N> SequenceController<D, T, N>
where
    D: OutputDriver,
    T: TimerService,
    N: ProgressSink,
{
    /// Creates an idle controller with both lines assumed released.
    pub const fn new(outputs: D, timers: T, notifier: N) -> Self {
        Self {
            outputs,
            timers,
            notifier,
            state: SequenceState::new(),
        }
    }

    /// Reports the current sequencer phase.
    pub const fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Returns the number of shots completed in the active sequence.
    pub const fn progress(&self) -> u16 {
        self.state.shots_completed
    }

    /// Returns the parameters governing the in-flight sequence.
    pub const fn parameters(&self) -> &ShootingParameters {
        &self.state.active
    }

    /// Returns the event the pending timer will deliver, if one is in flight.
    pub fn pending_event(&self) -> Option<TimerEvent> {
        self.state.pending.map(|pending| pending.event)
    }

    /// Accesses the output driver.
    pub const fn outputs(&self) -> &D {
        &self.outputs
    }

    /// Mutably accesses the output driver.
    pub fn outputs_mut(&mut self) -> &mut D {
        &mut self.outputs
    }

    /// Accesses the timer service.
    pub const fn timers(&self) -> &T {
        &self.timers
    }

    /// Mutably accesses the timer service.
    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    /// Accesses the progress sink.
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Consumes one command from the transport.
    ///
    /// Commands that do not apply to the current phase are ignored; malformed
    /// payloads never reach this layer.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::TriggerFocus => self.trigger_focus(),
            Command::SetFocus(active) => self.set_focus_manual(active),
            Command::StartShooting(params) => self.start_shooting(params),
            Command::Stop => self.stop(),
        }
    }

    /// Single callback entry point for all scheduled timers.
    ///
    /// A firing that no longer matches the live phase, or that arrives while
    /// no timer is tracked as pending, is a stale callback and does nothing.
    pub fn on_timer_expired(&mut self, event: TimerEvent) {
        if self.state.phase.expected_event() != Some(event) || self.state.pending.is_none() {
            return;
        }
        self.state.pending = None;

        match event {
            TimerEvent::FocusRelease => {
                self.outputs.set_line(LineId::Focus, false);
                self.state.phase = Phase::Idle;
            }
            TimerEvent::ShutterActivate => self.activate_shutter(),
            TimerEvent::ShutterRelease => self.release_shutter(),
        }
    }

    fn trigger_focus(&mut self) {
        if self.state.phase != Phase::Idle {
            return;
        }
        self.outputs.set_line(LineId::Focus, true);
        self.state.phase = Phase::FocusActive;
        self.schedule(DEFAULT_ACTIVE_PERIOD, TimerEvent::FocusRelease);
    }

    fn set_focus_manual(&mut self, active: bool) {
        if self.state.phase != Phase::Idle {
            return;
        }
        self.outputs.set_line(LineId::Focus, active);
    }

    fn start_shooting(&mut self, params: ShootingParameters) {
        if params.target_count == 0 {
            return;
        }

        self.cancel_pending();
        // An interrupted pulse must not leave its line asserted.
        match self.state.phase {
            Phase::FocusActive => self.outputs.set_line(LineId::Focus, false),
            Phase::ShutterActive => self.outputs.set_line(LineId::Shutter, false),
            Phase::Idle | Phase::WaitingToShoot => {}
        }

        self.state.active = params;
        self.state.shots_completed = 0;

        if params.delay_before_start.is_zero() {
            self.activate_shutter();
        } else {
            self.state.phase = Phase::WaitingToShoot;
            self.schedule(params.delay_before_start, TimerEvent::ShutterActivate);
        }
    }

    fn stop(&mut self) {
        self.cancel_pending();
        self.outputs.release_all();
        self.state.shots_completed = 0;
        self.state.phase = Phase::Idle;
    }

    fn activate_shutter(&mut self) {
        self.outputs.set_line(LineId::Shutter, true);
        self.state.phase = Phase::ShutterActive;

        if let Some(period) = self.state.active.exposure.active_period() {
            self.schedule(period, TimerEvent::ShutterRelease);
        }
    }

    fn release_shutter(&mut self) {
        self.outputs.set_line(LineId::Shutter, false);
        self.state.shots_completed = self.state.shots_completed.saturating_add(1);
        self.notifier.progress_updated(self.state.shots_completed);

        if self.state.shots_completed < self.state.active.target_count {
            self.state.phase = Phase::WaitingToShoot;
            self.schedule(self.state.active.repeat_interval, TimerEvent::ShutterActivate);
        } else {
            self.state.phase = Phase::Idle;
        }
    }

    fn schedule(&mut self, after: Duration, event: TimerEvent) {
        debug_assert!(self.state.pending.is_none());
        let handle = self.timers.schedule(after, event);
        self.state.pending = Some(PendingTimer { handle, event });
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.state.pending.take() {
            self.timers.cancel(pending.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::Bench;
    use crate::shooting::ExposureSetting;

    #[test]
    fn phase_reports_expected_timer_events() {
        assert_eq!(Phase::Idle.expected_event(), None);
        assert_eq!(Phase::FocusActive.expected_event(), Some(TimerEvent::FocusRelease));
        assert_eq!(
            Phase::WaitingToShoot.expected_event(),
            Some(TimerEvent::ShutterActivate)
        );
        assert_eq!(
            Phase::ShutterActive.expected_event(),
            Some(TimerEvent::ShutterRelease)
        );
    }

    #[test]
    fn manual_focus_follows_requested_level() {
        let mut bench = Bench::new();

        bench.apply(Command::SetFocus(true));
        assert_eq!(bench.phase(), Phase::Idle);
        assert!(bench.outputs().is_active(LineId::Focus));
        assert_eq!(bench.timers().outstanding(), 0);

        bench.apply(Command::SetFocus(false));
        assert!(!bench.outputs().is_active(LineId::Focus));
    }

    #[test]
    fn manual_focus_is_ignored_mid_sequence() {
        let mut bench = Bench::new();
        bench.apply(Command::StartShooting(ShootingParameters::from_wire(
            2, 0, 100, 50,
        )));
        assert_eq!(bench.phase(), Phase::ShutterActive);

        bench.apply(Command::SetFocus(true));
        assert!(!bench.outputs().is_active(LineId::Focus));
    }

    #[test]
    fn focus_trigger_mid_sequence_is_ignored() {
        let mut bench = Bench::new();
        bench.apply(Command::StartShooting(ShootingParameters::from_wire(
            2, 0, 100, 50,
        )));

        bench.apply(Command::TriggerFocus);
        assert_eq!(bench.phase(), Phase::ShutterActive);
        assert_eq!(bench.timers().outstanding(), 1);
        assert!(!bench.outputs().is_active(LineId::Focus));
    }

    #[test]
    fn shooting_interrupts_focus_pulse_and_releases_the_line() {
        let mut bench = Bench::new();
        bench.apply(Command::TriggerFocus);
        assert_eq!(bench.phase(), Phase::FocusActive);

        bench.apply(Command::StartShooting(ShootingParameters::new(
            1,
            Duration::ZERO,
            ExposureSetting::Timed(Duration::from_millis(10)),
            Duration::ZERO,
        )));
        assert!(!bench.outputs().is_active(LineId::Focus));
        assert_eq!(bench.phase(), Phase::ShutterActive);
        assert_eq!(bench.timers().outstanding(), 1);
        assert_eq!(bench.timers().cancelled(), 1);
    }

    #[test]
    fn zero_target_count_never_leaves_idle() {
        let mut bench = Bench::new();
        bench.apply(Command::StartShooting(ShootingParameters::from_wire(
            0, 0, 100, 50,
        )));

        assert_eq!(bench.phase(), Phase::Idle);
        assert_eq!(bench.timers().outstanding(), 0);
        assert!(bench.outputs().changes().is_empty());
        assert!(bench.notifications().is_empty());
    }
}
