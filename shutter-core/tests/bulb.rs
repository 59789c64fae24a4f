//! Bulb-mode exposures: the shutter stays open until an explicit stop.

use core::time::Duration;

use shutter_core::bench::Bench;
use shutter_core::sequencer::{Command, Phase, TimerEvent};
use shutter_core::shooting::{ExposureSetting, LineId, ShootingParameters};

fn start_bulb(bench: &mut Bench, delay: Duration) {
    bench.apply(Command::StartShooting(ShootingParameters::new(
        1,
        delay,
        ExposureSetting::Hold,
        Duration::ZERO,
    )));
}

#[test]
fn hold_exposure_never_schedules_a_release() {
    let mut bench = Bench::new();
    start_bulb(&mut bench, Duration::ZERO);

    assert_eq!(bench.phase(), Phase::ShutterActive);
    assert!(bench.outputs().is_active(LineId::Shutter));
    assert_eq!(bench.timers().outstanding(), 0);
}

#[test]
fn hold_exposure_after_a_delay() {
    let mut bench = Bench::new();
    start_bulb(&mut bench, Duration::from_secs(1));
    assert_eq!(bench.phase(), Phase::WaitingToShoot);

    assert_eq!(bench.fire_next(), Some(TimerEvent::ShutterActivate));
    assert_eq!(bench.phase(), Phase::ShutterActive);
    assert_eq!(bench.timers().outstanding(), 0);
}

#[test]
fn spurious_release_does_not_close_a_held_shutter() {
    let mut bench = Bench::new();
    start_bulb(&mut bench, Duration::ZERO);

    // No release is pending, so a stray callback must be dropped even though
    // the phase nominally expects one.
    bench.fire_spurious(TimerEvent::ShutterRelease);
    assert_eq!(bench.phase(), Phase::ShutterActive);
    assert!(bench.outputs().is_active(LineId::Shutter));
    assert!(bench.notifications().is_empty());
}

#[test]
fn stop_ends_a_bulb_exposure() {
    let mut bench = Bench::new();
    start_bulb(&mut bench, Duration::ZERO);

    bench.apply(Command::Stop);
    assert_eq!(bench.phase(), Phase::Idle);
    assert!(bench.outputs().all_released());
    // Ending a held exposure counts as no completed shot.
    assert!(bench.notifications().is_empty());
}

#[test]
fn delayed_restart_closes_a_held_shutter() {
    let mut bench = Bench::new();
    start_bulb(&mut bench, Duration::ZERO);
    assert!(bench.outputs().is_active(LineId::Shutter));

    bench.apply(Command::StartShooting(ShootingParameters::from_wire(
        1, 500, 100, 0,
    )));
    // The held exposure must not bleed across the new sequence's delay.
    assert_eq!(bench.phase(), Phase::WaitingToShoot);
    assert!(!bench.outputs().is_active(LineId::Shutter));

    bench.run_to_idle();
    assert_eq!(bench.progress(), 1);
    assert!(bench.outputs().all_released());
}

#[test]
fn new_parameters_supersede_a_held_exposure() {
    let mut bench = Bench::new();
    start_bulb(&mut bench, Duration::ZERO);

    bench.apply(Command::StartShooting(ShootingParameters::from_wire(
        1, 0, 100, 0,
    )));
    assert_eq!(bench.phase(), Phase::ShutterActive);

    bench.run_to_idle();
    assert_eq!(bench.progress(), 1);
    assert!(bench.outputs().all_released());
}
