//! Headless controller for gbtracker.
//!
//! Owns the sequencer and the output channels and exposes the control
//! surface an editor or the CLI drives: transport, note editing, markers,
//! load/save, export and WAV bounce. The host calls [`Controller::tick`]
//! from one thread at [`PlayerConfig::tick_hz`].

mod config;
mod error;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use gbt_audio::memory::MemoryFactory;
use gbt_audio::{ChannelRegistry, CpalFactory};
use gbt_engine::{NoiseTable, Sequencer, StepEvent, Synthesizer};

// Re-export common types so callers don't need the lower crates directly.
pub use config::PlayerConfig;
pub use error::{Error, Result};
pub use gbt_audio::{AudioConfig, ChannelStatus, SinkFactory};
pub use gbt_engine::{Frame, PlaybackState, SynthConfig, SAMPLE_RATE};
pub use gbt_formats::{frames_to_wav, note_to_wav, write_wav, ExportRow, FormatError};
pub use gbt_ir::{Note, Song, TrackRole};

/// UI-side notifications, separate from the audio step triggers.
pub trait PlaybackObserver {
    /// The cursor played `step`.
    fn on_step(&mut self, _step: u32) {}

    /// Playback stopped; the view should return to `view_step`.
    fn on_stopped(&mut self, _view_step: u32) {}
}

/// Headless tracker controller: one song, one sequencer, four channels.
pub struct Controller {
    config: PlayerConfig,
    sequencer: Sequencer,
    channels: ChannelRegistry,
    observer: Option<Box<dyn PlaybackObserver>>,
}

impl Controller {
    /// Build a controller whose channels come from `factory`.
    pub fn new(config: PlayerConfig, factory: &dyn SinkFactory) -> Self {
        let noise = Arc::new(NoiseTable::generate());
        let synth = Synthesizer::new(noise, config.synth);
        Self {
            config,
            sequencer: Sequencer::new(Song::new(), synth),
            channels: ChannelRegistry::open(factory),
            observer: None,
        }
    }

    /// Build a controller playing through the default audio device.
    pub fn with_audio_device(config: PlayerConfig) -> Self {
        let factory = CpalFactory::new(config.audio);
        Self::new(config, &factory)
    }

    /// Build a controller with in-memory channels, for offline work.
    pub fn headless(config: PlayerConfig) -> Self {
        Self::new(config, &MemoryFactory::new())
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn song(&self) -> &Song {
        self.sequencer.song()
    }

    pub fn set_observer(&mut self, observer: Box<dyn PlaybackObserver>) {
        self.observer = Some(observer);
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    // --- Transport ---

    pub fn play_from_start(&mut self) -> Result<()> {
        self.sequencer.play_from_start()?;
        Ok(())
    }

    pub fn play_from_step(&mut self, step: u32) -> Result<()> {
        self.sequencer.play_from_step(step)?;
        Ok(())
    }

    /// Stop playback and silence every channel.
    ///
    /// Returns the step playback started from, or `None` if already stopped.
    pub fn stop(&mut self) -> Option<u32> {
        let view = self.sequencer.stop()?;
        self.channels.silence_all();
        if let Some(observer) = self.observer.as_mut() {
            observer.on_stopped(view);
        }
        Some(view)
    }

    pub fn state(&self) -> PlaybackState {
        self.sequencer.state()
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    pub fn current_step(&self) -> Option<u32> {
        self.sequencer.current_step()
    }

    /// Advance playback by `elapsed`, starting any triggered notes.
    ///
    /// Returns the step that fired, if any.
    pub fn tick(&mut self, elapsed: Duration) -> Option<u32> {
        #[cfg(feature = "alloc_check")]
        {
            assert_no_alloc::assert_no_alloc(|| self.tick_inner(elapsed))
        }
        #[cfg(not(feature = "alloc_check"))]
        {
            self.tick_inner(elapsed)
        }
    }

    fn tick_inner(&mut self, elapsed: Duration) -> Option<u32> {
        let event = self.sequencer.tick(elapsed)?;
        self.dispatch(&event);
        Some(event.step)
    }

    fn dispatch(&mut self, event: &StepEvent) {
        self.channels.dispatch(&event.triggers);
        if let Some(observer) = self.observer.as_mut() {
            observer.on_step(event.step);
            if let Some(view) = event.finished {
                observer.on_stopped(view);
            }
        }
    }

    // --- Editing ---

    /// Place `note` on `role` at `step`, returning the note it replaced.
    pub fn set_note(&mut self, role: TrackRole, step: u32, note: Note) -> Result<Option<Note>> {
        Ok(self.sequencer.set_note(role, step, note)?)
    }

    pub fn clear_note(&mut self, role: TrackRole, step: u32) -> Option<Note> {
        self.sequencer.clear_note(role, step)
    }

    pub fn clear_all(&mut self) {
        self.sequencer.clear_all();
    }

    pub fn max_occupied_step(&self) -> u32 {
        self.sequencer.max_occupied_step()
    }

    pub fn looping(&self) -> bool {
        self.sequencer.looping()
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.sequencer.set_looping(looping);
    }

    pub fn end_step(&self) -> u32 {
        self.sequencer.end_step()
    }

    pub fn set_end_step(&mut self, end_step: u32) -> u32 {
        self.sequencer.set_end_step(end_step)
    }

    pub fn loop_step(&self) -> u32 {
        self.sequencer.loop_step()
    }

    pub fn set_loop_step(&mut self, loop_step: u32) -> u32 {
        self.sequencer.set_loop_step(loop_step)
    }

    pub fn bpm(&self) -> u16 {
        self.sequencer.bpm()
    }

    pub fn set_bpm(&mut self, bpm: u16) -> Result<()> {
        Ok(self.sequencer.set_bpm(bpm)?)
    }

    /// Render `note` and play it on the preview channel.
    ///
    /// `role` decides whether the sweep unit applies.
    pub fn preview_note(&mut self, note: &Note, role: TrackRole) -> Result<()> {
        let buffer = self.sequencer.synth().render_note(note, role.has_sweep());
        self.channels.preview_buffer(buffer)?;
        Ok(())
    }

    // --- Channels ---

    pub fn channel_status(&self) -> [ChannelStatus; 3] {
        self.channels.status()
    }

    /// Retry channels whose audio resource was unavailable.
    pub fn reacquire_channels(&mut self, factory: &dyn SinkFactory) -> usize {
        self.channels.reacquire_unavailable(factory)
    }

    // --- Song files ---

    /// Replace the song with one parsed from `text`.
    ///
    /// On failure the current song is left untouched.
    pub fn load_song_text(&mut self, text: &str) -> Result<()> {
        let song = gbt_formats::parse_song(text)?;
        self.replace_song(song);
        Ok(())
    }

    pub fn load_song_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let text = fs::read_to_string(path.as_ref())?;
        self.load_song_text(&text)?;
        log::info!("loaded {}", path.as_ref().display());
        Ok(())
    }

    pub fn replace_song(&mut self, song: Song) {
        if let Some(view) = self.sequencer.replace_song(song) {
            self.channels.silence_all();
            if let Some(observer) = self.observer.as_mut() {
                observer.on_stopped(view);
            }
        }
    }

    pub fn save_song_text(&self) -> String {
        gbt_formats::serialize_song(self.song())
    }

    pub fn save_song_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut text = self.save_song_text();
        text.push('\n');
        fs::write(path.as_ref(), text)?;
        log::info!("saved {}", path.as_ref().display());
        Ok(())
    }

    // --- Export ---

    pub fn export_rows(&self) -> Vec<ExportRow> {
        gbt_formats::export_rows(self.song())
    }

    pub fn export_table(&self) -> String {
        gbt_formats::export_table(self.song())
    }

    // --- Offline rendering ---

    /// Mix the song offline, `passes` times through a looping song.
    pub fn render_frames(&self, passes: u32) -> Vec<Frame> {
        gbt_engine::render_song(self.song(), self.sequencer.synth(), passes)
    }

    pub fn render_to_wav(&self, passes: u32) -> Vec<u8> {
        let frames = self.render_frames(passes);
        frames_to_wav(&frames, SAMPLE_RATE)
    }

    /// Render the note at `step` on `role` as an 8-bit mono WAV.
    ///
    /// Returns `None` when the step is empty.
    pub fn bounce_note(&self, role: TrackRole, step: u32) -> Option<Vec<u8>> {
        let note = self.song().note(role, step)?;
        let buffer = self.sequencer.synth().render_note(note, role.has_sweep());
        Some(note_to_wav(&buffer, SAMPLE_RATE))
    }
}
