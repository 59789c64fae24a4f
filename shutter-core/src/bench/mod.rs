//! Instrumented collaborators for exercising the sequencer off-target.
//!
//! The bench swaps the firmware's GPIO, timer, and notification glue for
//! recording stand-ins driven by a virtual clock, so state-machine scenarios
//! run deterministically in host tests and in the emulator.

use core::time::Duration;

use heapless::Vec;

use crate::progress::ProgressLog;
use crate::sequencer::{Command, OutputDriver, Phase, SequenceController, TimerEvent, TimerService};
use crate::shooting::LineId;

/// Upper bound on recorded line transitions per scenario. Transitions past
/// the cap still drive the tracked levels but are dropped from the log.
pub const MAX_RECORDED_TRANSITIONS: usize = 256;

/// Timer slots available to the sequencer. The controller's invariant is a
/// single pending timer; the spare slot exists so a violation surfaces as a
/// bench panic instead of silent truncation.
pub const TIMER_SLOTS: usize = 2;

/// Ceiling on timer firings per scenario before the bench assumes a cycle.
const MAX_FIRINGS: usize = 256;

/// One observed output-line transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LineChange {
    pub line: LineId,
    pub active: bool,
}

/// Output driver that records every transition and tracks current levels.
#[derive(Clone, Debug, Default)]
pub struct RecordingOutputs {
    changes: Vec<LineChange, MAX_RECORDED_TRANSITIONS>,
    focus_active: bool,
    shutter_active: bool,
}

impl RecordingOutputs {
    /// Creates a driver with both lines released.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            changes: Vec::new(),
            focus_active: false,
            shutter_active: false,
        }
    }

    /// Reports the current level of a line.
    #[must_use]
    pub const fn is_active(&self, line: LineId) -> bool {
        match line {
            LineId::Focus => self.focus_active,
            LineId::Shutter => self.shutter_active,
        }
    }

    /// Returns `true` when both lines are released.
    #[must_use]
    pub const fn all_released(&self) -> bool {
        !self.focus_active && !self.shutter_active
    }

    /// Returns every recorded transition in order.
    #[must_use]
    pub fn changes(&self) -> &[LineChange] {
        &self.changes
    }
}

impl OutputDriver for RecordingOutputs {
    fn set_line(&mut self, line: LineId, active: bool) {
        match line {
            LineId::Focus => self.focus_active = active,
            LineId::Shutter => self.shutter_active = active,
        }
        let _ = self.changes.push(LineChange { line, active });
    }
}

/// Timer scheduled through the bench, waiting to be fired.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ScheduledTimer {
    pub id: u32,
    pub event: TimerEvent,
    pub after: Duration,
}

/// Timer service backed by a bounded slot list instead of real deadlines.
#[derive(Clone, Debug, Default)]
pub struct VirtualTimers {
    next_id: u32,
    slots: Vec<ScheduledTimer, TIMER_SLOTS>,
    cancelled: u32,
}

impl VirtualTimers {
    /// Creates an empty timer service.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            slots: Vec::new(),
            cancelled: 0,
        }
    }

    /// Returns the number of timers currently scheduled.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.slots.len()
    }

    /// Returns the oldest scheduled timer without firing it.
    #[must_use]
    pub fn next(&self) -> Option<&ScheduledTimer> {
        self.slots.first()
    }

    /// Returns how many cancellations the sequencer has issued.
    #[must_use]
    pub const fn cancelled(&self) -> u32 {
        self.cancelled
    }

    /// Removes and returns the oldest scheduled timer.
    pub fn take_next(&mut self) -> Option<ScheduledTimer> {
        if self.slots.is_empty() {
            None
        } else {
            Some(self.slots.remove(0))
        }
    }
}

impl TimerService for VirtualTimers {
    type Handle = u32;

    fn schedule(&mut self, after: Duration, event: TimerEvent) -> Self::Handle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.slots
            .push(ScheduledTimer { id, event, after })
            .expect("sequencer scheduled more timers than the bench allows");
        id
    }

    fn cancel(&mut self, handle: Self::Handle) {
        let before = self.slots.len();
        self.slots.retain(|timer| timer.id != handle);
        if self.slots.len() < before {
            self.cancelled += 1;
        }
    }
}

/// Virtual-clock harness wrapping a fully instrumented [`SequenceController`].
pub struct Bench {
    controller: SequenceController<RecordingOutputs, VirtualTimers, ProgressLog>,
    now: Duration,
}

impl Bench {
    /// Creates an idle bench at `t = 0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            controller: SequenceController::new(
                RecordingOutputs::new(),
                VirtualTimers::new(),
                ProgressLog::new(),
            ),
            now: Duration::ZERO,
        }
    }

    /// Feeds one command into the controller.
    pub fn apply(&mut self, command: Command) {
        self.controller.apply(command);
    }

    /// Fires the oldest scheduled timer, advancing the virtual clock by its
    /// delay. Returns the delivered event, or `None` when nothing is pending.
    pub fn fire_next(&mut self) -> Option<TimerEvent> {
        let timer = self.controller.timers_mut().take_next()?;
        self.now += timer.after;
        self.controller.on_timer_expired(timer.event);
        Some(timer.event)
    }

    /// Delivers a timer event that was never scheduled, simulating a stale
    /// callback racing a command.
    pub fn fire_spurious(&mut self, event: TimerEvent) {
        self.controller.on_timer_expired(event);
    }

    /// Fires timers until none remain, returning how many were delivered.
    pub fn run_to_idle(&mut self) -> usize {
        for fired in 0..MAX_FIRINGS {
            if self.fire_next().is_none() {
                return fired;
            }
        }
        panic!("sequencer kept scheduling timers after {MAX_FIRINGS} firings");
    }

    /// Reports the controller's current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    /// Reports the controller's completed-shot count.
    #[must_use]
    pub fn progress(&self) -> u16 {
        self.controller.progress()
    }

    /// Returns the virtual time accumulated by fired timers.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Accesses the recording output driver.
    #[must_use]
    pub fn outputs(&self) -> &RecordingOutputs {
        self.controller.outputs()
    }

    /// Accesses the virtual timer service.
    #[must_use]
    pub fn timers(&self) -> &VirtualTimers {
        self.controller.timers()
    }

    /// Returns the progress notifications recorded so far.
    #[must_use]
    pub fn notifications(&self) -> &[u16] {
        self.controller.notifier().entries()
    }

    /// Accesses the wrapped controller directly.
    #[must_use]
    pub fn controller(&self) -> &SequenceController<RecordingOutputs, VirtualTimers, ProgressLog> {
        &self.controller
    }
}

impl Default for Bench {
    fn default() -> Self {
        Self::new()
    }
}
