//! Shooting parameter and output-line data structures shared by firmware and
//! host targets.
//!
//! The sequencer uses these definitions to drive the focus/shutter state
//! machine without embedding any MCU-specific knowledge. Everything in this
//! module is `no_std` friendly so the same data can be compiled for both the
//! nRF firmware and the host-side emulator.

use core::fmt;
use core::time::Duration;

/// Pulse width used for the manual focus trigger and for exposures requested
/// with a zero active period.
pub const DEFAULT_ACTIVE_PERIOD: Duration = Duration::from_millis(500);

/// Wire value on the exposure field meaning "hold the shutter until stopped".
pub const EXPOSURE_HOLD_MS: u32 = 0xFFFF_FFFF;

/// Identifier for the logical output lines exposed by the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineId {
    Focus,
    Shutter,
}

impl LineId {
    /// Deterministic index for lookups into [`ALL_LINES`].
    pub const fn as_index(self) -> usize {
        match self {
            LineId::Focus => 0,
            LineId::Shutter => 1,
        }
    }

    /// Attempts to construct a [`LineId`] from a raw index.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(LineId::Focus),
            1 => Some(LineId::Shutter),
            _ => None,
        }
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineId::Focus => f.write_str("focus"),
            LineId::Shutter => f.write_str("shutter"),
        }
    }
}

/// Line polarity as wired to the camera release cable.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LinePolarity {
    ActiveLow,
    ActiveHigh,
}

/// Metadata describing how an output line is routed on the board.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LineSpec {
    pub id: LineId,
    pub name: &'static str,
    pub mcu_pin: &'static str,
    pub polarity: LinePolarity,
}

impl LineSpec {
    pub const fn new(
        id: LineId,
        name: &'static str,
        mcu_pin: &'static str,
        polarity: LinePolarity,
    ) -> Self {
        Self {
            id,
            name,
            mcu_pin,
            polarity,
        }
    }
}

/// Compile-time catalog of both output lines. The release cable pulls each
/// contact to ground, so both lines are active-low.
pub const ALL_LINES: [LineSpec; 2] = [
    LineSpec::new(LineId::Focus, "FOCUS", "P0.03", LinePolarity::ActiveLow),
    LineSpec::new(LineId::Shutter, "SHUTTER", "P0.04", LinePolarity::ActiveLow),
];

/// Retrieve line metadata by identifier.
pub const fn line_by_id(id: LineId) -> LineSpec {
    ALL_LINES[id.as_index()]
}

/// Requested shutter-active duration for each shot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExposureSetting {
    /// Release the shutter automatically after the given duration. A zero
    /// duration resolves to [`DEFAULT_ACTIVE_PERIOD`] at activation time.
    Timed(Duration),
    /// Bulb mode: keep the shutter active until an explicit stop.
    Hold,
}

impl ExposureSetting {
    /// Maps the wire encoding of the exposure field onto a setting.
    #[must_use]
    pub const fn from_wire_ms(exposure_ms: u32) -> Self {
        if exposure_ms == EXPOSURE_HOLD_MS {
            ExposureSetting::Hold
        } else {
            ExposureSetting::Timed(Duration::from_millis(exposure_ms as u64))
        }
    }

    /// Returns the duration the shutter line stays active, or `None` when the
    /// shutter must be held until stopped.
    #[must_use]
    pub fn active_period(self) -> Option<Duration> {
        match self {
            ExposureSetting::Hold => None,
            ExposureSetting::Timed(period) if period.is_zero() => Some(DEFAULT_ACTIVE_PERIOD),
            ExposureSetting::Timed(period) => Some(period),
        }
    }

    /// Returns `true` for bulb-mode exposures.
    #[must_use]
    pub const fn is_hold(self) -> bool {
        matches!(self, ExposureSetting::Hold)
    }
}

/// Parameter set governing one shooting sequence. Immutable once accepted;
/// a new shooting command replaces the whole set.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ShootingParameters {
    /// Total shots to take. Zero never starts a sequence.
    pub target_count: u16,
    /// Wait before the first shutter activation.
    pub delay_before_start: Duration,
    /// Shutter-active duration per shot.
    pub exposure: ExposureSetting,
    /// Wait between the end of one exposure and the start of the next.
    pub repeat_interval: Duration,
}

impl ShootingParameters {
    pub const fn new(
        target_count: u16,
        delay_before_start: Duration,
        exposure: ExposureSetting,
        repeat_interval: Duration,
    ) -> Self {
        Self {
            target_count,
            delay_before_start,
            exposure,
            repeat_interval,
        }
    }

    /// Builds a parameter set from the millisecond fields carried on the wire.
    #[must_use]
    pub const fn from_wire(count: u16, delay_ms: u32, exposure_ms: u32, interval_ms: u32) -> Self {
        Self::new(
            count,
            Duration::from_millis(delay_ms as u64),
            ExposureSetting::from_wire_ms(exposure_ms),
            Duration::from_millis(interval_ms as u64),
        )
    }

    /// Single shot with no delay and the default exposure pulse.
    #[must_use]
    pub const fn single_shot() -> Self {
        Self::new(
            1,
            Duration::ZERO,
            ExposureSetting::Timed(Duration::ZERO),
            Duration::ZERO,
        )
    }
}
