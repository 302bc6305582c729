//! Note parameters for the pulse and noise channels.
//!
//! A `Note` is an immutable value: it is built through validating
//! constructors and read through accessors, so every note in a song is
//! guaranteed to be encodable.

use arrayvec::ArrayString;
use core::fmt::{self, Write};

use crate::error::{check_range, Result};

/// Semitone names, indexed by `musical_note` (0 = C).
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Lowest playable octave.
pub const MIN_OCTAVE: u8 = 2;
/// Highest playable octave.
pub const MAX_OCTAVE: u8 = 7;

/// Which parameter group of a note is meaningful.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoteKind {
    Square,
    Noise,
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NoteKind::Square => "square",
            NoteKind::Noise => "noise",
        })
    }
}

/// Pulse width of a square note.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DutyCycle {
    /// 12.5%
    Eighth,
    /// 25%
    Quarter,
    /// 50%
    #[default]
    Half,
    /// 75%
    ThreeQuarters,
}

impl DutyCycle {
    /// Two-bit register code (0-3).
    pub const fn code(self) -> u8 {
        match self {
            DutyCycle::Eighth => 0,
            DutyCycle::Quarter => 1,
            DutyCycle::Half => 2,
            DutyCycle::ThreeQuarters => 3,
        }
    }

    /// Build from a register code; only the low two bits are used.
    pub const fn from_code(code: u8) -> Self {
        match code & 3 {
            0 => DutyCycle::Eighth,
            1 => DutyCycle::Quarter,
            2 => DutyCycle::Half,
            _ => DutyCycle::ThreeQuarters,
        }
    }

    /// Fraction of each period held at positive amplitude.
    pub const fn fraction(self) -> f64 {
        match self {
            DutyCycle::Eighth => 0.125,
            DutyCycle::Quarter => 0.25,
            DutyCycle::Half => 0.5,
            DutyCycle::ThreeQuarters => 0.75,
        }
    }
}

/// Volume envelope shared by both note kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Envelope {
    /// Initial volume (0-15)
    pub volume: u8,
    /// Ramp cadence in 1/64 s units (0-7, 0 = constant volume)
    pub step: u8,
    /// Ramp toward 15 instead of toward 0
    pub increasing: bool,
}

impl Envelope {
    /// A constant-volume envelope.
    pub const fn constant(volume: u8) -> Self {
        Self { volume, step: 0, increasing: false }
    }

    fn validate(&self) -> Result<()> {
        check_range("volume", self.volume as u32, 0, 15)?;
        check_range("envelope step", self.step as u32, 0, 7)
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::constant(15)
    }
}

/// Sound length cutoff.
///
/// The value is kept even when disabled since it still occupies the
/// envelope register.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cutoff {
    pub enabled: bool,
    /// 0-63; cutoff time is `(64 - value) / 256` seconds
    pub value: u8,
}

impl Cutoff {
    /// No cutoff.
    pub const NONE: Cutoff = Cutoff { enabled: false, value: 0 };

    /// An enabled cutoff with the given length value.
    pub const fn after(value: u8) -> Self {
        Self { enabled: true, value }
    }

    /// Time in seconds after which the note is silenced.
    pub fn seconds(self) -> f64 {
        (64 - self.value as i32) as f64 / 256.0
    }

    fn validate(&self) -> Result<()> {
        check_range("cutoff", self.value as u32, 0, 63)
    }
}

/// Frequency sweep of the first square channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Sweep {
    /// Shift amount (0-7): each step moves by `n / 2^rate`
    pub rate: u8,
    /// Cadence in 1/128 s units (0-7, 0 = no sweep)
    pub step: u8,
    pub increasing: bool,
}

/// Square-only parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SquareTone {
    /// Semitone (0-11, 0 = C)
    pub musical_note: u8,
    /// Octave (2-7)
    pub octave: u8,
    pub duty: DutyCycle,
    pub sweep: Sweep,
}

impl SquareTone {
    /// A plain tone with 50% duty and no sweep.
    pub const fn new(musical_note: u8, octave: u8) -> Self {
        Self {
            musical_note,
            octave,
            duty: DutyCycle::Half,
            sweep: Sweep { rate: 0, step: 0, increasing: false },
        }
    }

    /// Equal-tempered frequency in Hz (A4 = 440).
    pub fn frequency(&self) -> f64 {
        let semitones = self.musical_note as i32 - 9 + (self.octave as i32 - 4) * 12;
        440.0 * libm::pow(2.0, semitones as f64 / 12.0)
    }

    fn validate(&self) -> Result<()> {
        check_range("musical note", self.musical_note as u32, 0, 11)?;
        check_range("octave", self.octave as u32, MIN_OCTAVE as u32, MAX_OCTAVE as u32)?;
        check_range("sweep rate", self.sweep.rate as u32, 0, 7)?;
        check_range("sweep step", self.sweep.step as u32, 0, 7)
    }
}

/// Length of the pseudo-random sequence the noise channel walks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CounterWidth {
    /// Long period, wraps at 0x7FFF
    #[default]
    Bits15,
    /// Short, metallic period, wraps at 0x7F
    Bits7,
}

impl CounterWidth {
    /// Table index at which the noise walk wraps back to 0.
    pub const fn wrap(self) -> usize {
        match self {
            CounterWidth::Bits15 => 0x7FFF,
            CounterWidth::Bits7 => 0x7F,
        }
    }
}

/// Noise-only parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoiseTone {
    /// Base divisor (0-7); 0 stands for 0.5 in frequency math
    pub dividing_ratio: u8,
    /// Clock shift (0-15)
    pub shift_clock_frequency: u8,
    pub counter_width: CounterWidth,
}

impl NoiseTone {
    pub const fn new(dividing_ratio: u8, shift_clock_frequency: u8) -> Self {
        Self { dividing_ratio, shift_clock_frequency, counter_width: CounterWidth::Bits15 }
    }

    /// Dividing ratio as used by the frequency formula.
    pub fn effective_dividing_ratio(&self) -> f64 {
        if self.dividing_ratio == 0 {
            0.5
        } else {
            self.dividing_ratio as f64
        }
    }

    /// Rate in Hz at which the noise table advances.
    pub fn frequency(&self) -> f64 {
        524_288.0
            / self.effective_dividing_ratio()
            / libm::pow(2.0, (self.shift_clock_frequency + 1) as f64)
    }

    fn validate(&self) -> Result<()> {
        check_range("dividing ratio", self.dividing_ratio as u32, 0, 7)?;
        check_range("shift clock frequency", self.shift_clock_frequency as u32, 0, 15)
    }
}

/// Kind-specific half of a note.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tone {
    Square(SquareTone),
    Noise(NoiseTone),
}

/// A note for one of the three channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Note {
    tone: Tone,
    envelope: Envelope,
    cutoff: Cutoff,
}

impl Note {
    /// Build a note, checking every field against its domain.
    pub fn new(tone: Tone, envelope: Envelope, cutoff: Cutoff) -> Result<Self> {
        match &tone {
            Tone::Square(square) => square.validate()?,
            Tone::Noise(noise) => noise.validate()?,
        }
        envelope.validate()?;
        cutoff.validate()?;
        Ok(Self { tone, envelope, cutoff })
    }

    pub fn square(tone: SquareTone, envelope: Envelope, cutoff: Cutoff) -> Result<Self> {
        Self::new(Tone::Square(tone), envelope, cutoff)
    }

    pub fn noise(tone: NoiseTone, envelope: Envelope, cutoff: Cutoff) -> Result<Self> {
        Self::new(Tone::Noise(tone), envelope, cutoff)
    }

    pub fn kind(&self) -> NoteKind {
        match self.tone {
            Tone::Square(_) => NoteKind::Square,
            Tone::Noise(_) => NoteKind::Noise,
        }
    }

    pub fn tone(&self) -> &Tone {
        &self.tone
    }

    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    pub fn cutoff(&self) -> Cutoff {
        self.cutoff
    }

    /// Square parameters, if this is a square note.
    pub fn as_square(&self) -> Option<&SquareTone> {
        match &self.tone {
            Tone::Square(square) => Some(square),
            Tone::Noise(_) => None,
        }
    }

    /// Noise parameters, if this is a noise note.
    pub fn as_noise(&self) -> Option<&NoiseTone> {
        match &self.tone {
            Tone::Noise(noise) => Some(noise),
            Tone::Square(_) => None,
        }
    }

    /// Short timeline label: `C#4` for square notes, `ratio|shift` for noise.
    pub fn label(&self) -> ArrayString<8> {
        let mut label = ArrayString::new();
        let _ = match &self.tone {
            Tone::Square(s) => {
                write!(label, "{}{}", NOTE_NAMES[s.musical_note as usize], s.octave)
            }
            Tone::Noise(n) => write!(label, "{}|{}", n.dividing_ratio, n.shift_clock_frequency),
        };
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn duty_code_round_trip() {
        for code in 0..4 {
            assert_eq!(DutyCycle::from_code(code).code(), code);
        }
        assert_eq!(DutyCycle::Quarter.fraction(), 0.25);
    }

    #[test]
    fn a4_is_440_hz() {
        let a4 = SquareTone::new(9, 4);
        assert!((a4.frequency() - 440.0).abs() < 1e-9);
        let a5 = SquareTone::new(9, 5);
        assert!((a5.frequency() - 880.0).abs() < 1e-9);
    }

    #[test]
    fn noise_ratio_zero_aliases_to_half() {
        let zero = NoiseTone::new(0, 3);
        let one = NoiseTone::new(1, 3);
        assert_eq!(zero.effective_dividing_ratio(), 0.5);
        assert_eq!(zero.frequency(), one.frequency() * 2.0);
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let err = Note::square(SquareTone::new(12, 4), Envelope::default(), Cutoff::NONE);
        assert!(matches!(err, Err(Error::OutOfRange { field: "musical note", value: 12, .. })));

        let err = Note::square(SquareTone::new(0, 1), Envelope::default(), Cutoff::NONE);
        assert!(matches!(err, Err(Error::OutOfRange { field: "octave", .. })));

        let err = Note::noise(NoiseTone::new(0, 16), Envelope::default(), Cutoff::NONE);
        assert!(matches!(err, Err(Error::OutOfRange { field: "shift clock frequency", .. })));

        let err = Note::noise(NoiseTone::new(0, 0), Envelope::constant(16), Cutoff::NONE);
        assert!(matches!(err, Err(Error::OutOfRange { field: "volume", .. })));

        let err = Note::noise(NoiseTone::new(0, 0), Envelope::default(), Cutoff::after(64));
        assert!(matches!(err, Err(Error::OutOfRange { field: "cutoff", .. })));
    }

    #[test]
    fn labels() {
        let note = Note::square(SquareTone::new(6, 5), Envelope::default(), Cutoff::NONE).unwrap();
        assert_eq!(note.label().as_str(), "F#5");
        let noise = Note::noise(NoiseTone::new(3, 12), Envelope::default(), Cutoff::NONE).unwrap();
        assert_eq!(noise.label().as_str(), "3|12");
    }

    #[test]
    fn cutoff_seconds() {
        assert_eq!(Cutoff::after(0).seconds(), 0.25);
        assert_eq!(Cutoff::after(63).seconds(), 1.0 / 256.0);
    }
}
