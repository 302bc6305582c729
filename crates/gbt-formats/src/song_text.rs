//! Song text format.
//!
//! A flat list of comma-separated decimal integers:
//!
//! ```text
//! endStep,loopStep,
//! len0, SWP,ENV,FRQ,step, ...    square + sweep track
//! len1, SWP,ENV,FRQ,step, ...    square track
//! len2, ENV,FRQ,step, ...        noise track
//! bpm,looping
//! ```
//!
//! Notes are stored as their register values. The trailing `bpm,looping`
//! pair is optional when reading (120 BPM, looping on).

use std::fmt::Write;

use gbt_ir::{
    decode_noise, decode_square, encode, Song, Track, TrackRole, DEFAULT_BPM,
};

use crate::error::FormatError;

/// Write `song` in the text format.
pub fn serialize_song(song: &Song) -> String {
    let mut fields: Vec<u32> = vec![song.end_step(), song.loop_step()];
    for role in TrackRole::ALL {
        let track = song.track(role);
        fields.push(track.len() as u32);
        for (step, note) in track.iter() {
            let regs = encode(note);
            if let Some(swp) = regs.swp {
                fields.push(swp as u32);
            }
            fields.push(regs.env as u32);
            fields.push(regs.frq as u32);
            fields.push(step);
        }
    }
    fields.push(song.bpm() as u32);
    fields.push(song.looping() as u32);

    let mut text = String::with_capacity(fields.len() * 6);
    for (i, value) in fields.iter().enumerate() {
        if i > 0 {
            text.push(',');
        }
        let _ = write!(text, "{}", value);
    }
    text
}

/// Cursor over the comma-separated fields of a document.
struct Fields<'a> {
    parts: std::iter::Peekable<std::str::Split<'a, char>>,
    index: usize,
}

impl<'a> Fields<'a> {
    fn new(text: &'a str) -> Self {
        Self { parts: text.trim().split(',').peekable(), index: 0 }
    }

    fn is_empty(&mut self) -> bool {
        self.parts.peek().is_none()
    }

    fn remaining(&mut self) -> usize {
        self.parts.clone().count()
    }

    fn next_u32(&mut self, field: &str) -> Result<u32, FormatError> {
        let index = self.index;
        let part = self
            .parts
            .next()
            .ok_or_else(|| FormatError::malformed(field, format!("missing field {}", index)))?;
        self.index += 1;
        part.trim().parse::<u32>().map_err(|e| {
            FormatError::malformed(field, format!("field {} {:?}: {}", index, part.trim(), e))
        })
    }

    fn next_register(&mut self, field: &str) -> Result<u16, FormatError> {
        let value = self.next_u32(field)?;
        u16::try_from(value)
            .map_err(|_| FormatError::malformed(field, format!("{} does not fit 16 bits", value)))
    }
}

/// Parse a song from the text format.
///
/// Any defect fails the whole parse; nothing partial is returned.
pub fn parse_song(text: &str) -> Result<Song, FormatError> {
    let mut fields = Fields::new(text);
    let end_step = fields.next_u32("endStep")?;
    let loop_step = fields.next_u32("loopStep")?;

    let mut tracks: [Track; 3] = Default::default();
    for role in TrackRole::ALL {
        let len = fields.next_u32(&format!("{} track length", role))?;
        let track = &mut tracks[role.index()];
        let mut last_step: Option<u32> = None;
        for n in 0..len {
            let field = format!("{} note {}", role, n);
            let note = match role {
                TrackRole::Noise => {
                    let env = fields.next_register(&field)?;
                    let frq = fields.next_register(&field)?;
                    decode_noise(env, frq)
                }
                _ => {
                    let swp = fields.next_register(&field)?;
                    let env = fields.next_register(&field)?;
                    let frq = fields.next_register(&field)?;
                    decode_square(swp, env, frq)
                }
            }
            .map_err(|e| FormatError::malformed(field.as_str(), e))?;
            let step = fields.next_u32(&field)?;
            if last_step.is_some_and(|last| step <= last) {
                return Err(FormatError::malformed(field, "steps are not ascending"));
            }
            last_step = Some(step);
            track.insert(step, note);
        }
    }

    let (bpm, looping) = if fields.is_empty() {
        (DEFAULT_BPM, true)
    } else {
        let count = fields.remaining();
        if count != 2 {
            return Err(FormatError::malformed(
                "trailer",
                format!("expected bpm,looping but found {} fields", count),
            ));
        }
        let bpm = fields.next_u32("bpm")?;
        let bpm = u16::try_from(bpm)
            .map_err(|_| FormatError::malformed("bpm", format!("{} is too fast", bpm)))?;
        let looping = match fields.next_u32("looping")? {
            0 => false,
            1 => true,
            other => return Err(FormatError::malformed("looping", format!("{} is not 0 or 1", other))),
        };
        (bpm, looping)
    };

    log::debug!(
        "parsed song: {} steps, loop at {}, notes per track {:?}",
        end_step,
        loop_step,
        tracks.iter().map(Track::len).collect::<Vec<_>>()
    );
    Song::from_parts(tracks, end_step, loop_step, looping, bpm)
        .map_err(|e| FormatError::malformed("song", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbt_ir::{Cutoff, DutyCycle, Envelope, NoiseTone, Note, SquareTone, Sweep};

    fn c4() -> Note {
        Note::square(SquareTone::new(0, 4), Envelope::default(), Cutoff::NONE).unwrap()
    }

    fn assert_malformed(text: &str) {
        match parse_song(text) {
            Err(FormatError::MalformedSerialization { .. }) => {}
            other => panic!("expected malformed error for {:?}, got {:?}", text, other),
        }
    }

    #[test]
    fn serializes_empty_song() {
        assert_eq!(serialize_song(&Song::new()), "48,0,0,0,0,120,1");
    }

    #[test]
    fn serializes_registers_in_track_order() {
        let mut song = Song::new();
        song.set_note(TrackRole::SquareSweep, 0, c4()).unwrap();
        song.set_note(
            TrackRole::Noise,
            12,
            Note::noise(NoiseTone::new(1, 2), Envelope::default(), Cutoff::NONE).unwrap(),
        )
        .unwrap();
        song.set_loop_step(3);
        // C4: SWP 0x0008, ENV 0xF080, FRQ 0x860C; noise ENV 0xF000, FRQ 0x8021
        assert_eq!(
            serialize_song(&song),
            "48,3,1,8,61568,34316,0,0,1,61440,32801,12,120,1"
        );
    }

    #[test]
    fn round_trips_a_full_song() {
        let mut song = Song::new();
        let mut swept = SquareTone::new(3, 5);
        swept.duty = DutyCycle::ThreeQuarters;
        swept.sweep = Sweep { rate: 2, step: 4, increasing: false };
        song.set_note(
            TrackRole::SquareSweep,
            0,
            Note::square(swept, Envelope { volume: 9, step: 2, increasing: true }, Cutoff::after(40))
                .unwrap(),
        )
        .unwrap();
        song.set_note(TrackRole::Square, 7, c4()).unwrap();
        song.set_note(TrackRole::Square, 70, c4()).unwrap();
        let mut noise = NoiseTone::new(0, 13);
        noise.counter_width = gbt_ir::CounterWidth::Bits7;
        song.set_note(
            TrackRole::Noise,
            5,
            Note::noise(noise, Envelope::constant(4), Cutoff::NONE).unwrap(),
        )
        .unwrap();
        song.set_bpm(150).unwrap();
        song.set_looping(false);
        song.set_loop_step(24);

        let parsed = parse_song(&serialize_song(&song)).unwrap();
        assert_eq!(parsed, song);
    }

    #[test]
    fn trailer_is_optional_and_whitespace_ignored() {
        let song = parse_song(" 96 , 4 ,1, 8,61568,34316,0 ,0,0\n").unwrap();
        assert_eq!(song.end_step(), 96);
        assert_eq!(song.loop_step(), 4);
        assert_eq!(song.bpm(), DEFAULT_BPM);
        assert!(song.looping());
        assert_eq!(song.note(TrackRole::SquareSweep, 0), Some(&c4()));
    }

    #[test]
    fn rejects_malformed_documents() {
        assert_malformed("");
        assert_malformed("48");
        assert_malformed("48,0,1,8,61568");
        assert_malformed("48,0,x,0,0");
        assert_malformed("48,0,0,0,0,120");
        assert_malformed("48,0,0,0,0,120,1,7");
        assert_malformed("48,0,0,0,0,0,1");
        assert_malformed("48,0,0,0,0,120,2");
        // loop marker past the end
        assert_malformed("48,48,0,0,0");
        // note at the end marker
        assert_malformed("48,0,1,8,61568,34316,48,0,0");
        // FRQ without its always-set bit
        assert_malformed("48,0,1,8,61568,1548,0,0,0");
        // steps out of order
        assert_malformed("48,0,2,8,61568,34316,5,8,61568,34316,5,0,0");
        // register wider than 16 bits
        assert_malformed("48,0,1,8,61568,100000,0,0,0");
    }
}
