//! Offline mixer: renders a whole song to 16-bit stereo frames.
//!
//! Follows the live sequencer's rules: each note restarts its channel's
//! buffer at its step, empty steps leave the previous buffer sounding, and
//! the timeline wraps to the loop marker for extra passes.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use gbt_ir::{Song, TrackRole};

use crate::frame::Frame;
use crate::synth::{SampleBuffer, Synthesizer, SAMPLE_RATE};

/// Gain from an 8-bit note sample to the 16-bit mix.
pub const SAMPLE_SCALE: i16 = 128;

/// Samples per step at `bpm` (`5000 / bpm` ms at 48 kHz).
pub fn step_samples(bpm: u16) -> f64 {
    SAMPLE_RATE as f64 * 5.0 / bpm.max(1) as f64
}

#[derive(Clone, Debug, Default)]
struct Voice {
    buffer: Option<SampleBuffer>,
    position: usize,
}

impl Voice {
    fn start(&mut self, buffer: SampleBuffer) {
        self.buffer = Some(buffer);
        self.position = 0;
    }

    fn next_sample(&mut self) -> i8 {
        let Some(buffer) = &self.buffer else {
            return 0;
        };
        match buffer.get(self.position) {
            Some(&sample) => {
                self.position += 1;
                sample
            }
            None => {
                self.buffer = None;
                0
            }
        }
    }

    fn is_active(&self) -> bool {
        self.buffer.as_ref().is_some_and(|b| self.position < b.len())
    }
}

/// Frame-by-frame renderer for one song.
pub struct OfflineMixer {
    notes: [BTreeMap<u32, SampleBuffer>; 3],
    voices: [Voice; 3],
    end_step: u32,
    loop_step: u32,
    /// Steps in the timeline, loop passes included
    total_steps: u64,
    next_index: u64,
    bpm: u16,
    sample_pos: u64,
}

impl OfflineMixer {
    /// Prepare `song` for `passes` runs through the timeline.
    ///
    /// A non-looping song plays once regardless of `passes`. Extra passes of
    /// a looping song start at the loop marker.
    pub fn new(song: &Song, synth: &Synthesizer, passes: u32) -> Self {
        let mut notes: [BTreeMap<u32, SampleBuffer>; 3] = Default::default();
        for role in TrackRole::ALL {
            for (step, note) in song.track(role).iter() {
                notes[role.index()].insert(step, synth.render_note(note, role.has_sweep()));
            }
        }

        let end_step = song.end_step();
        let loop_step = song.loop_step();
        let extra_passes = if song.looping() { passes.max(1) as u64 - 1 } else { 0 };
        let total_steps = end_step as u64 + extra_passes * (end_step - loop_step) as u64;

        Self {
            notes,
            voices: Default::default(),
            end_step,
            loop_step,
            total_steps,
            next_index: 0,
            bpm: song.bpm(),
            sample_pos: 0,
        }
    }

    /// Song step played at timeline position `index`.
    fn step_at(&self, index: u64) -> u32 {
        let end = self.end_step as u64;
        if index < end {
            return index as u32;
        }
        let span = (self.end_step - self.loop_step) as u64;
        self.loop_step + ((index - end) % span) as u32
    }

    /// Number of frames until the last step ends (not counting the tail).
    pub fn timeline_frames(&self) -> u64 {
        self.step_boundary(self.total_steps)
    }

    /// True once the timeline is done and every voice has run out.
    pub fn is_finished(&self) -> bool {
        self.sample_pos >= self.timeline_frames() && !self.voices.iter().any(Voice::is_active)
    }

    /// Render one frame.
    pub fn render_frame(&mut self) -> Frame {
        while self.next_index < self.total_steps
            && self.sample_pos >= self.step_boundary(self.next_index)
        {
            let step = self.step_at(self.next_index);
            for role in TrackRole::ALL {
                if let Some(buffer) = self.notes[role.index()].get(&step) {
                    self.voices[role.index()].start(buffer.clone());
                }
            }
            self.next_index += 1;
        }

        let mut frame = Frame::silence();
        for voice in &mut self.voices {
            frame.mix(Frame::from_note_sample(voice.next_sample()));
        }
        self.sample_pos += 1;
        frame
    }

    fn step_boundary(&self, index: u64) -> u64 {
        // Integer form of floor(index * 240000 / bpm)
        let samples = index as u128 * SAMPLE_RATE as u128 * 5 / self.bpm.max(1) as u128;
        u64::try_from(samples).unwrap_or(u64::MAX)
    }
}

/// Render `song` to frames, including the release tail of the last notes.
pub fn render_song(song: &Song, synth: &Synthesizer, passes: u32) -> Vec<Frame> {
    let mut mixer = OfflineMixer::new(song, synth, passes);
    // Reserve at most a minute up front; longer songs grow as they render.
    let reserve = mixer.timeline_frames().min(60 * SAMPLE_RATE as u64);
    let mut frames = Vec::with_capacity(reserve as usize);
    while !mixer.is_finished() {
        frames.push(mixer.render_frame());
    }
    log::debug!("rendered {} frames ({} passes)", frames.len(), passes.max(1));
    frames
}
