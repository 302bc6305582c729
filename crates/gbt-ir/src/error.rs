//! Error type for IR construction and register decoding.

use core::fmt;

use crate::note::NoteKind;
use crate::track::TrackRole;

/// One of the three packed sound registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    /// Sweep register (first square channel only)
    Swp,
    /// Envelope / duty / length register
    Env,
    /// Frequency / control register
    Frq,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Register::Swp => "SWP",
            Register::Env => "ENV",
            Register::Frq => "FRQ",
        })
    }
}

/// Errors produced while building notes and songs or decoding registers.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A register value has bits outside its declared domain.
    #[error("invalid {register} value 0x{value:04X}: {reason}")]
    InvalidEncoding {
        register: Register,
        value: u16,
        reason: &'static str,
    },
    /// A note or song parameter is outside its domain.
    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    /// A note was placed on a track of the other kind.
    #[error("{kind} note cannot be placed on the {role} track")]
    KindMismatch { kind: NoteKind, role: TrackRole },
    /// Tempo of zero.
    #[error("tempo must be at least 1 BPM")]
    InvalidBpm,
}

pub type Result<T> = core::result::Result<T, Error>;

/// Check `value` against an inclusive range, naming the field on failure.
pub(crate) fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min || value > max {
        return Err(Error::OutOfRange { field, value, min, max });
    }
    Ok(())
}
