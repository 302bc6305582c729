//! Step sequencer: owns the song, the rendered note cache and the tempo clock.
//!
//! The host drives it with [`Sequencer::tick`]. Each tick either does nothing
//! or fires one step, returning a [`StepEvent`] with a trigger per track that
//! has a note at that step. Audio output consumes the triggers; UI code can
//! read the cursor fields of the same event.
//!
//! Every note is rendered before playback starts (the prepare pass), so the
//! tick path only clones `Arc`s and never allocates.

use alloc::collections::BTreeMap;
use core::time::Duration;

use gbt_ir::{Note, Song, TrackRole};
use thiserror::Error;

use crate::clock::TempoClock;
use crate::synth::{SampleBuffer, Synthesizer};

/// Errors from sequencer transport and editing operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequencerError {
    #[error("already playing")]
    AlreadyPlaying,
    #[error("step {step} is past the end of the song ({end_step} steps)")]
    StepOutOfRange { step: u32, end_step: u32 },
    #[error(transparent)]
    Song(#[from] gbt_ir::Error),
}

/// Transport state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Instruction to start a rendered buffer on one channel.
#[derive(Clone, Debug)]
pub struct StepTrigger {
    pub role: TrackRole,
    pub step: u32,
    pub buffer: SampleBuffer,
}

/// Everything that happened on one fired step.
#[derive(Clone, Debug)]
pub struct StepEvent {
    /// Step that was played
    pub step: u32,
    /// One entry per track with a note at `step`
    pub triggers: heapless::Vec<StepTrigger, 3>,
    /// Cursor after the step, `None` once playback finished
    pub next_step: Option<u32>,
    /// Set when the song ended without looping: the step to restore the view to
    pub finished: Option<u32>,
}

#[derive(Clone, Debug)]
struct Rendered {
    note: Note,
    buffer: SampleBuffer,
}

#[derive(Clone, Copy, Debug)]
struct Cursor {
    step: u32,
    start_step: u32,
}

/// Plays a [`Song`] against a tempo clock.
pub struct Sequencer {
    song: Song,
    synth: Synthesizer,
    rendered: [BTreeMap<u32, Rendered>; 3],
    clock: TempoClock,
    cursor: Option<Cursor>,
}

impl Sequencer {
    pub fn new(song: Song, synth: Synthesizer) -> Self {
        let clock = TempoClock::new(song.bpm());
        Self {
            song,
            synth,
            rendered: Default::default(),
            clock,
            cursor: None,
        }
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn synth(&self) -> &Synthesizer {
        &self.synth
    }

    pub fn state(&self) -> PlaybackState {
        if self.cursor.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        }
    }

    pub fn is_playing(&self) -> bool {
        self.cursor.is_some()
    }

    /// Step the next trigger will play, while playing.
    pub fn current_step(&self) -> Option<u32> {
        self.cursor.map(|c| c.step)
    }

    /// Cached buffer for the note at `step`, if it has been rendered.
    pub fn rendered(&self, role: TrackRole, step: u32) -> Option<&SampleBuffer> {
        self.rendered[role.index()].get(&step).map(|r| &r.buffer)
    }

    // --- transport ---

    pub fn play_from_start(&mut self) -> Result<(), SequencerError> {
        self.play_from_step(0)
    }

    /// Prepare every note and start playing at `step`.
    pub fn play_from_step(&mut self, step: u32) -> Result<(), SequencerError> {
        if self.is_playing() {
            return Err(SequencerError::AlreadyPlaying);
        }
        let end_step = self.song.end_step();
        if step >= end_step {
            return Err(SequencerError::StepOutOfRange { step, end_step });
        }
        self.prepare();
        self.clock.set_bpm(self.song.bpm());
        self.clock.arm();
        self.cursor = Some(Cursor { step, start_step: step });
        log::info!("playing from step {} of {}", step, end_step);
        Ok(())
    }

    /// Stop playback, returning the step playback started from.
    ///
    /// Returns `None` when already stopped.
    pub fn stop(&mut self) -> Option<u32> {
        let cursor = self.cursor.take()?;
        self.clock.reset();
        log::info!("stopped at step {}", cursor.step);
        Some(cursor.start_step)
    }

    /// Advance the clock by `elapsed`; fires at most one step.
    pub fn tick(&mut self, elapsed: Duration) -> Option<StepEvent> {
        self.cursor?;
        if !self.clock.advance(elapsed) {
            return None;
        }
        self.fire_step()
    }

    /// Render every placed note, keeping cached buffers whose note is unchanged.
    pub fn prepare(&mut self) {
        let mut reused = 0usize;
        let mut rendered = 0usize;
        for role in TrackRole::ALL {
            let cache = &mut self.rendered[role.index()];
            let track = self.song.track(role);
            cache.retain(|step, r| track.get(*step) == Some(&r.note));
            for (step, note) in track.iter() {
                if cache.contains_key(&step) {
                    reused += 1;
                    continue;
                }
                let buffer = self.synth.render_note(note, role.has_sweep());
                cache.insert(step, Rendered { note: *note, buffer });
                rendered += 1;
            }
        }
        log::debug!("prepare pass: {} rendered, {} reused", rendered, reused);
    }

    fn fire_step(&mut self) -> Option<StepEvent> {
        let mut cursor = self.cursor?;
        let end_step = self.song.end_step();

        // The end marker may have moved under the cursor since the last step.
        if cursor.step >= end_step {
            if self.song.looping() {
                cursor.step = self.song.loop_step();
            } else {
                self.cursor = None;
                self.clock.reset();
                return Some(StepEvent {
                    step: cursor.step,
                    triggers: heapless::Vec::new(),
                    next_step: None,
                    finished: Some(cursor.start_step),
                });
            }
        }

        let step = cursor.step;
        let mut triggers = heapless::Vec::new();
        for role in TrackRole::ALL {
            if let Some(rendered) = self.rendered[role.index()].get(&step) {
                let trigger = StepTrigger { role, step, buffer: rendered.buffer.clone() };
                // One slot per role.
                let _ = triggers.push(trigger);
            }
        }

        cursor.step += 1;
        let mut finished = None;
        if cursor.step >= end_step {
            if self.song.looping() {
                cursor.step = self.song.loop_step();
            } else {
                finished = Some(cursor.start_step);
            }
        }

        let next_step = if finished.is_some() {
            self.cursor = None;
            self.clock.reset();
            None
        } else {
            self.cursor = Some(cursor);
            Some(cursor.step)
        };

        Some(StepEvent { step, triggers, next_step, finished })
    }

    // --- editing ---

    /// Place `note`, replacing any note at that step.
    ///
    /// While playing, the note is rendered right away so the next trigger
    /// uses it.
    pub fn set_note(
        &mut self,
        role: TrackRole,
        step: u32,
        note: Note,
    ) -> Result<Option<Note>, SequencerError> {
        let previous = self.song.set_note(role, step, note)?;
        let cache = &mut self.rendered[role.index()];
        if self.cursor.is_some() {
            let buffer = self.synth.render_note(&note, role.has_sweep());
            cache.insert(step, Rendered { note, buffer });
        } else {
            cache.remove(&step);
        }
        Ok(previous)
    }

    pub fn clear_note(&mut self, role: TrackRole, step: u32) -> Option<Note> {
        self.rendered[role.index()].remove(&step);
        self.song.clear_note(role, step)
    }

    /// Remove every note from every track.
    pub fn clear_all(&mut self) {
        for cache in &mut self.rendered {
            cache.clear();
        }
        self.song.clear_all();
    }

    pub fn max_occupied_step(&self) -> u32 {
        self.song.max_occupied_step()
    }

    pub fn looping(&self) -> bool {
        self.song.looping()
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.song.set_looping(looping);
    }

    pub fn end_step(&self) -> u32 {
        self.song.end_step()
    }

    /// Move the end marker; returns the value after clamping.
    pub fn set_end_step(&mut self, end_step: u32) -> u32 {
        self.song.set_end_step(end_step)
    }

    pub fn loop_step(&self) -> u32 {
        self.song.loop_step()
    }

    /// Move the loop marker; returns the value after clamping.
    pub fn set_loop_step(&mut self, loop_step: u32) -> u32 {
        self.song.set_loop_step(loop_step)
    }

    pub fn bpm(&self) -> u16 {
        self.song.bpm()
    }

    pub fn set_bpm(&mut self, bpm: u16) -> Result<(), SequencerError> {
        self.song.set_bpm(bpm)?;
        self.clock.set_bpm(bpm);
        Ok(())
    }

    /// Swap in a new song, stopping playback first.
    ///
    /// Returns the view step from the stop, if playback was running.
    pub fn replace_song(&mut self, song: Song) -> Option<u32> {
        let view = self.stop();
        self.song = song;
        self.clock.set_bpm(self.song.bpm());
        for cache in &mut self.rendered {
            cache.clear();
        }
        view
    }
}
