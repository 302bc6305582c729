//! Conversion between notes and the packed SWP/ENV/FRQ sound registers.
//!
//! Layout (16-bit registers):
//!
//! ```text
//! ENV  VVVV IEEE DDCC CCCC   V volume, I increasing, E env step, D duty, C cutoff
//! SWP  0000 0000 0SSS NRRR   S sweep step, N decreasing, R sweep rate
//! FRQ  TL.. .FFF FFFF FFFF   T trigger (always set), L cutoff enabled
//!                            square: F = 2048 - (base >> octave)
//!                            noise:  ---- ---- SSSS WRRR  S shift, W 7-bit, R ratio
//! ```
//!
//! Square pitch decoding goes through Hz and snaps to the nearest
//! equal-tempered semitone, so only encoder output decodes losslessly.

use core::fmt;

use crate::error::{Error, Register, Result};
use crate::note::{
    CounterWidth, Cutoff, DutyCycle, Envelope, NoiseTone, Note, SquareTone, Sweep, Tone,
    MAX_OCTAVE, MIN_OCTAVE,
};

/// Octave-0 period divisors per semitone, C through B.
pub const BASE_FREQUENCY_TABLE: [u16; 12] = [
    8013, 7566, 7144, 6742, 6362, 6005, 5666, 5346, 5048, 4766, 4499, 4246,
];

const TRIGGER: u16 = 0x8000;
const CUTOFF_ENABLE: u16 = 0x4000;

const SWP_RESERVED: u16 = 0xFF80;
const NOISE_ENV_RESERVED: u16 = 0x00C0;
const SQUARE_FRQ_RESERVED: u16 = 0x3800;
const NOISE_FRQ_RESERVED: u16 = 0x3F00;

/// Register values for one note. `swp` is `None` for noise notes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Registers {
    pub swp: Option<u16>,
    pub env: u16,
    pub frq: u16,
}

impl Registers {
    /// Decode back into a note; square when `swp` is present.
    pub fn decode(&self) -> Result<Note> {
        match self.swp {
            Some(swp) => decode_square(swp, self.env, self.frq),
            None => decode_noise(self.env, self.frq),
        }
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(swp) = self.swp {
            write!(f, "SWP: 0x{:04X}  ", swp)?;
        }
        write!(f, "ENV: 0x{:04X}  FRQ: 0x{:04X}", self.env, self.frq)
    }
}

/// Encode a note into its register values.
pub fn encode(note: &Note) -> Registers {
    let envelope = note.envelope();
    let cutoff = note.cutoff();

    let duty = note.as_square().map_or(0, |s| s.duty.code());
    let env = cutoff.value as u16
        | (duty as u16) << 6
        | (envelope.step as u16) << 8
        | (envelope.increasing as u16) << 11
        | (envelope.volume as u16) << 12;

    let mut frq = TRIGGER | if cutoff.enabled { CUTOFF_ENABLE } else { 0 };
    let swp = match note.tone() {
        Tone::Square(square) => {
            let divisor = BASE_FREQUENCY_TABLE[square.musical_note as usize] >> square.octave;
            frq |= 2048 - divisor;
            Some(
                square.sweep.rate as u16
                    | (!square.sweep.increasing as u16) << 3
                    | (square.sweep.step as u16) << 4,
            )
        }
        Tone::Noise(noise) => {
            frq |= noise.dividing_ratio as u16
                | ((noise.counter_width == CounterWidth::Bits7) as u16) << 3
                | (noise.shift_clock_frequency as u16) << 4;
            None
        }
    };

    Registers { swp, env, frq }
}

/// Decode square channel registers.
pub fn decode_square(swp: u16, env: u16, frq: u16) -> Result<Note> {
    check_reserved(Register::Swp, swp, SWP_RESERVED)?;
    check_trigger(frq)?;
    check_reserved(Register::Frq, frq, SQUARE_FRQ_RESERVED)?;

    let (musical_note, octave) = frq_to_pitch(frq)?;
    let tone = SquareTone {
        musical_note,
        octave,
        duty: DutyCycle::from_code((env >> 6) as u8),
        sweep: Sweep {
            rate: (swp & 7) as u8,
            step: ((swp >> 4) & 7) as u8,
            increasing: (swp >> 3) & 1 == 0,
        },
    };
    Note::square(tone, decode_envelope(env), decode_cutoff(env, frq))
}

/// Decode noise channel registers.
pub fn decode_noise(env: u16, frq: u16) -> Result<Note> {
    check_reserved(Register::Env, env, NOISE_ENV_RESERVED)?;
    check_trigger(frq)?;
    check_reserved(Register::Frq, frq, NOISE_FRQ_RESERVED)?;

    let tone = NoiseTone {
        dividing_ratio: (frq & 7) as u8,
        shift_clock_frequency: ((frq >> 4) & 0xF) as u8,
        counter_width: if (frq >> 3) & 1 == 0 {
            CounterWidth::Bits15
        } else {
            CounterWidth::Bits7
        },
    };
    Note::noise(tone, decode_envelope(env), decode_cutoff(env, frq))
}

/// Map an 11-bit square frequency field to the nearest (semitone, octave).
fn frq_to_pitch(frq: u16) -> Result<(u8, u8)> {
    let period = 2048 - (frq & 0x7FF) as u32;
    let hz = 131_072.0 / period as f64;
    let steps = libm::floor(libm::log2(hz / 440.0) * 12.0 + 0.5) as i32 + 33;
    let octave = steps.div_euclid(12) + 2;
    if steps < 0 || octave < MIN_OCTAVE as i32 || octave > MAX_OCTAVE as i32 {
        return Err(Error::InvalidEncoding {
            register: Register::Frq,
            value: frq,
            reason: "frequency is outside octaves 2-7",
        });
    }
    Ok(((steps % 12) as u8, octave as u8))
}

fn decode_envelope(env: u16) -> Envelope {
    Envelope {
        volume: (env >> 12) as u8,
        step: ((env >> 8) & 7) as u8,
        increasing: (env >> 11) & 1 == 1,
    }
}

fn decode_cutoff(env: u16, frq: u16) -> Cutoff {
    Cutoff {
        enabled: frq & CUTOFF_ENABLE != 0,
        value: (env & 0x3F) as u8,
    }
}

fn check_trigger(frq: u16) -> Result<()> {
    if frq & TRIGGER == 0 {
        return Err(Error::InvalidEncoding {
            register: Register::Frq,
            value: frq,
            reason: "trigger bit 15 is clear",
        });
    }
    Ok(())
}

fn check_reserved(register: Register, value: u16, mask: u16) -> Result<()> {
    if value & mask != 0 {
        return Err(Error::InvalidEncoding { register, value, reason: "reserved bits are set" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    fn square(tone: SquareTone, envelope: Envelope, cutoff: Cutoff) -> Note {
        Note::square(tone, envelope, cutoff).unwrap()
    }

    #[test]
    fn c4_square_registers() {
        let note = square(SquareTone::new(0, 4), Envelope::constant(15), Cutoff::NONE);
        let regs = encode(&note);
        // 8013 >> 4 = 500, 2048 - 500 = 1548 = 0x60C; duty 1/2 -> code 2
        assert_eq!(regs.frq, 0x8000 | 0x060C);
        assert_eq!(regs.env, 0xF080);
        // increasing = false sets the decrease bit
        assert_eq!(regs.swp, Some(0x0008));
    }

    #[test]
    fn square_field_packing() {
        let tone = SquareTone {
            musical_note: 9,
            octave: 5,
            duty: DutyCycle::Eighth,
            sweep: Sweep { rate: 5, step: 3, increasing: true },
        };
        let envelope = Envelope { volume: 0xA, step: 6, increasing: true };
        let note = square(tone, envelope, Cutoff::after(0x2B));
        let regs = encode(&note);
        assert_eq!(regs.swp, Some(0x0035));
        assert_eq!(regs.env, 0xAE2B);
        assert_eq!(regs.frq & 0xC000, 0xC000);
    }

    #[test]
    fn every_square_note_round_trips() {
        for octave in MIN_OCTAVE..=MAX_OCTAVE {
            for musical_note in 0..12 {
                for duty in 0..4 {
                    let tone = SquareTone {
                        musical_note,
                        octave,
                        duty: DutyCycle::from_code(duty),
                        sweep: Sweep { rate: duty, step: 7 - duty, increasing: duty % 2 == 0 },
                    };
                    let envelope = Envelope { volume: musical_note, step: duty, increasing: true };
                    let note = square(tone, envelope, Cutoff { enabled: duty == 1, value: 40 });
                    let regs = encode(&note);
                    assert_eq!(regs.decode().unwrap(), note, "{}{}", musical_note, octave);
                    assert_eq!(encode(&regs.decode().unwrap()), regs);
                }
            }
        }
    }

    #[test]
    fn every_noise_note_round_trips() {
        for dividing_ratio in 0..8 {
            for shift_clock_frequency in 0..16 {
                for counter_width in [CounterWidth::Bits15, CounterWidth::Bits7] {
                    let tone = NoiseTone { dividing_ratio, shift_clock_frequency, counter_width };
                    let note = Note::noise(
                        tone,
                        Envelope { volume: shift_clock_frequency, step: dividing_ratio, increasing: false },
                        Cutoff { enabled: dividing_ratio > 3, value: 63 },
                    )
                    .unwrap();
                    let regs = encode(&note);
                    assert_eq!(regs.swp, None);
                    assert_eq!(decode_noise(regs.env, regs.frq).unwrap(), note);
                }
            }
        }
    }

    #[test]
    fn noise_env_and_frq_fields_round_trip_exhaustively() {
        for env in (0u16..=0xFFFF).filter(|env| env & NOISE_ENV_RESERVED == 0) {
            let frq = 0x8000 | (env & 0x40FF);
            let note = decode_noise(env, frq).unwrap();
            assert_eq!(encode(&note), Registers { swp: None, env, frq });
        }
    }

    #[test]
    fn square_env_and_swp_round_trip_exhaustively() {
        let frq = encode(&square(SquareTone::new(4, 3), Envelope::default(), Cutoff::NONE)).frq;
        for env in 0u16..=0xFFFF {
            let note = decode_square(0x0008, env, frq).unwrap();
            assert_eq!(encode(&note), Registers { swp: Some(0x0008), env, frq });
        }
        for swp in 0u16..0x80 {
            let note = decode_square(swp, 0x7A3F, frq | CUTOFF_ENABLE).unwrap();
            assert_eq!(encode(&note), Registers { swp: Some(swp), env: 0x7A3F, frq: frq | CUTOFF_ENABLE });
        }
    }

    #[test]
    fn lowest_frequency_field_decodes_to_c2() {
        let note = decode_square(0, 0xF000, 0x8000).unwrap();
        let tone = note.as_square().unwrap();
        assert_eq!((tone.musical_note, tone.octave), (0, 2));
    }

    #[test]
    fn very_high_frequency_is_invalid() {
        let err = decode_square(0, 0xF000, 0x8000 | 0x7FF).unwrap_err();
        assert!(matches!(err, Error::InvalidEncoding { register: Register::Frq, .. }));
    }

    #[test]
    fn missing_trigger_bit_is_invalid() {
        assert!(decode_square(0, 0, 0x060C).is_err());
        assert!(decode_noise(0, 0x0013).is_err());
    }

    #[test]
    fn reserved_bits_are_invalid() {
        let err = decode_square(0x0080, 0, 0x860C).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidEncoding { register: Register::Swp, value: 0x0080, reason: "reserved bits are set" }
        );
        assert!(decode_noise(0x0040, 0x8000).is_err());
        assert!(decode_noise(0, 0x8100).is_err());
        assert!(decode_square(0, 0, 0x8800).is_err());
    }

    #[test]
    fn display_matches_editor_readout() {
        let regs = Registers { swp: Some(0x0008), env: 0xF080, frq: 0x860C };
        assert_eq!(format!("{}", regs), "SWP: 0x0008  ENV: 0xF080  FRQ: 0x860C");
        let regs = Registers { swp: None, env: 0xF000, frq: 0x8031 };
        assert_eq!(format!("{}", regs), "ENV: 0xF000  FRQ: 0x8031");
    }
}
