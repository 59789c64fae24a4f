//! Wire codec for the shutter service characteristics.
//!
//! Stateless decode/encode helpers for the fixed-layout byte buffers the
//! transport exchanges with the host: shooting parameters in, the progress
//! counter out. All multi-byte fields are little-endian.

use core::fmt;

use winnow::Parser;
use winnow::binary::{le_u16, le_u32};
use winnow::error::ContextError;

use crate::sequencer::Command;
use crate::shooting::ShootingParameters;

/// 16-bit UUID of the shutter GATT service.
pub const SERVICE_UUID: u16 = 0xFFF0;

/// Byte length of a shooting-parameter write.
pub const SHOOTING_PAYLOAD_LEN: usize = 14;

/// Byte length of a progress notification.
pub const PROGRESS_PAYLOAD_LEN: usize = 2;

/// Byte length of the single-byte trigger writes (focus, stop).
pub const TRIGGER_PAYLOAD_LEN: usize = 1;

/// Characteristics exposed by the shutter service.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Characteristic {
    Focus,
    Shooting,
    Stop,
    Progress,
}

impl Characteristic {
    /// Returns the characteristic's 16-bit UUID.
    #[must_use]
    pub const fn uuid(self) -> u16 {
        match self {
            Characteristic::Focus => SERVICE_UUID + 1,
            Characteristic::Shooting => SERVICE_UUID + 2,
            Characteristic::Stop => SERVICE_UUID + 3,
            Characteristic::Progress => SERVICE_UUID + 4,
        }
    }

    /// Attempts to resolve a 16-bit UUID to a characteristic.
    #[must_use]
    pub const fn from_uuid(uuid: u16) -> Option<Self> {
        match uuid.wrapping_sub(SERVICE_UUID) {
            1 => Some(Characteristic::Focus),
            2 => Some(Characteristic::Shooting),
            3 => Some(Characteristic::Stop),
            4 => Some(Characteristic::Progress),
            _ => None,
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Characteristic::Focus => f.write_str("focus"),
            Characteristic::Shooting => f.write_str("shooting"),
            Characteristic::Stop => f.write_str("stop"),
            Characteristic::Progress => f.write_str("progress"),
        }
    }
}

/// Errors reported while decoding transport payloads.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// Payload length does not match the characteristic's fixed layout.
    WrongLength { expected: usize, actual: usize },
    /// Write addressed to an attribute that accepts no commands.
    InvalidCommand(u16),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::WrongLength { expected, actual } => {
                write!(f, "expected {expected} byte payload, got {actual}")
            }
            DecodeError::InvalidCommand(uuid) => {
                write!(f, "attribute {uuid:#06x} accepts no commands")
            }
        }
    }
}

/// Decodes a 14-byte shooting-parameter payload.
///
/// Layout: `{count: u16, delay_ms: u32, exposure_ms: u32, interval_ms: u32}`.
/// Field values are not range-checked here; a zero count is accepted and
/// filtered by the sequencer.
pub fn decode_shooting(payload: &[u8]) -> Result<ShootingParameters, DecodeError> {
    let (count, delay_ms, exposure_ms, interval_ms) =
        (le_u16::<_, ContextError>, le_u32, le_u32, le_u32)
            .parse(payload)
            .map_err(|_| DecodeError::WrongLength {
                expected: SHOOTING_PAYLOAD_LEN,
                actual: payload.len(),
            })?;

    Ok(ShootingParameters::from_wire(
        count,
        delay_ms,
        exposure_ms,
        interval_ms,
    ))
}

/// Decodes a single-byte trigger payload (focus or stop).
pub fn decode_trigger(payload: &[u8]) -> Result<u8, DecodeError> {
    match payload {
        [value] => Ok(*value),
        _ => Err(DecodeError::WrongLength {
            expected: TRIGGER_PAYLOAD_LEN,
            actual: payload.len(),
        }),
    }
}

/// Encodes the progress counter for the notification characteristic.
#[must_use]
pub fn encode_progress(shots_completed: u16) -> [u8; PROGRESS_PAYLOAD_LEN] {
    shots_completed.to_le_bytes()
}

/// Routes a characteristic write to the sequencer command it carries.
///
/// Any value on the focus and stop characteristics triggers the command;
/// only the payload length is validated.
pub fn decode_write(
    characteristic: Characteristic,
    payload: &[u8],
) -> Result<Command, DecodeError> {
    match characteristic {
        Characteristic::Focus => decode_trigger(payload).map(|_| Command::TriggerFocus),
        Characteristic::Shooting => decode_shooting(payload).map(Command::StartShooting),
        Characteristic::Stop => decode_trigger(payload).map(|_| Command::Stop),
        Characteristic::Progress => Err(DecodeError::InvalidCommand(
            Characteristic::Progress.uuid(),
        )),
    }
}
