//! End-to-end shooting sequences on the virtual-clock bench.

use core::time::Duration;

use shutter_core::bench::{Bench, LineChange};
use shutter_core::sequencer::{Command, Phase, TimerEvent};
use shutter_core::shooting::{
    DEFAULT_ACTIVE_PERIOD, ExposureSetting, LineId, ShootingParameters,
};

fn start(bench: &mut Bench, count: u16, delay_ms: u32, exposure_ms: u32, interval_ms: u32) {
    bench.apply(Command::StartShooting(ShootingParameters::from_wire(
        count,
        delay_ms,
        exposure_ms,
        interval_ms,
    )));
}

#[test]
fn three_shot_sequence_runs_to_completion() {
    let mut bench = Bench::new();
    start(&mut bench, 3, 0, 100, 50);

    // No start delay: the first exposure opens immediately.
    assert_eq!(bench.phase(), Phase::ShutterActive);
    assert!(bench.outputs().is_active(LineId::Shutter));

    let fired = bench.run_to_idle();
    // Three releases plus two re-activations.
    assert_eq!(fired, 5);

    assert_eq!(bench.phase(), Phase::Idle);
    assert_eq!(bench.progress(), 3);
    assert_eq!(bench.notifications(), &[1, 2, 3]);
    assert!(bench.outputs().all_released());

    // 3 * 100ms exposure + 2 * 50ms interval.
    assert_eq!(bench.now(), Duration::from_millis(450));

    let expected: &[LineChange] = &[
        LineChange { line: LineId::Shutter, active: true },
        LineChange { line: LineId::Shutter, active: false },
        LineChange { line: LineId::Shutter, active: true },
        LineChange { line: LineId::Shutter, active: false },
        LineChange { line: LineId::Shutter, active: true },
        LineChange { line: LineId::Shutter, active: false },
    ];
    assert_eq!(bench.outputs().changes(), expected);
}

#[test]
fn start_delay_precedes_the_first_exposure() {
    let mut bench = Bench::new();
    start(&mut bench, 1, 2_000, 100, 0);

    assert_eq!(bench.phase(), Phase::WaitingToShoot);
    assert!(!bench.outputs().is_active(LineId::Shutter));

    assert_eq!(bench.fire_next(), Some(TimerEvent::ShutterActivate));
    assert_eq!(bench.now(), Duration::from_secs(2));
    assert_eq!(bench.phase(), Phase::ShutterActive);
    assert!(bench.outputs().is_active(LineId::Shutter));

    assert_eq!(bench.fire_next(), Some(TimerEvent::ShutterRelease));
    assert_eq!(bench.now(), Duration::from_millis(2_100));
    assert_eq!(bench.phase(), Phase::Idle);
    assert_eq!(bench.notifications(), &[1]);
}

#[test]
fn zero_exposure_uses_the_default_pulse_width() {
    let mut bench = Bench::new();
    start(&mut bench, 1, 0, 0, 0);

    assert_eq!(bench.phase(), Phase::ShutterActive);
    let release = bench.timers().next().copied().expect("release must be scheduled");
    assert_eq!(release.event, TimerEvent::ShutterRelease);
    assert_eq!(release.after, DEFAULT_ACTIVE_PERIOD);

    bench.run_to_idle();
    assert_eq!(bench.now(), DEFAULT_ACTIVE_PERIOD);
    assert_eq!(bench.progress(), 1);
}

#[test]
fn new_parameters_replace_an_in_flight_sequence() {
    let mut bench = Bench::new();
    start(&mut bench, 10, 0, 100, 50);

    // First shot completes, second is pending.
    assert_eq!(bench.fire_next(), Some(TimerEvent::ShutterRelease));
    assert_eq!(bench.progress(), 1);
    assert_eq!(bench.phase(), Phase::WaitingToShoot);

    // A fresh write cancels the pending activation and restarts from zero.
    start(&mut bench, 2, 0, 10, 10);
    assert_eq!(bench.timers().cancelled(), 1);
    assert_eq!(bench.progress(), 0);
    assert_eq!(bench.phase(), Phase::ShutterActive);

    bench.run_to_idle();
    assert_eq!(bench.progress(), 2);
    assert_eq!(bench.notifications(), &[1, 1, 2]);
    assert_eq!(bench.phase(), Phase::Idle);
}

#[test]
fn restart_during_exposure_reopens_the_shutter() {
    let mut bench = Bench::new();
    start(&mut bench, 5, 0, 1_000, 100);
    assert_eq!(bench.phase(), Phase::ShutterActive);

    start(&mut bench, 1, 500, 100, 0);
    // The old release timer is gone, the interrupted exposure is closed, and
    // the new sequence waits out its delay with both lines released.
    assert_eq!(bench.timers().cancelled(), 1);
    assert_eq!(bench.phase(), Phase::WaitingToShoot);
    assert!(!bench.outputs().is_active(LineId::Shutter));
    assert_eq!(bench.timers().outstanding(), 1);

    bench.run_to_idle();
    assert_eq!(bench.progress(), 1);
    assert_eq!(bench.phase(), Phase::Idle);
    assert!(bench.outputs().all_released());
}

#[test]
fn long_sequence_completes_without_exhausting_the_recorder() {
    let mut bench = Bench::new();
    start(&mut bench, 40, 0, 10, 10);

    let fired = bench.run_to_idle();
    assert_eq!(fired, 79);
    assert_eq!(bench.phase(), Phase::Idle);
    assert_eq!(bench.progress(), 40);
    assert!(bench.outputs().all_released());
    // 40 exposures = 80 transitions, all retained in order.
    assert_eq!(bench.outputs().changes().len(), 80);
}

#[test]
fn completed_sequence_leaves_progress_readable() {
    let mut bench = Bench::new();
    bench.apply(Command::StartShooting(ShootingParameters::new(
        2,
        Duration::ZERO,
        ExposureSetting::Timed(Duration::from_millis(10)),
        Duration::from_millis(5),
    )));
    bench.run_to_idle();

    // Progress survives the return to idle until the next start or stop.
    assert_eq!(bench.phase(), Phase::Idle);
    assert_eq!(bench.progress(), 2);
}
