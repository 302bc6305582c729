//! gbtracker CLI: play a song file, bounce it to WAV or print its export table.
//!
//! Usage:
//!   gbt-cli path/to/song.gbt
//!   gbt-cli path/to/song.gbt --wav output.wav --loops 2
//!   gbt-cli path/to/song.gbt --export --list
//!   gbt-cli path/to/song.gbt --note-wav note.wav --track 1 --from 24

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use gbt_master::{
    ChannelStatus, Controller, PlaybackObserver, PlayerConfig, Song, SynthConfig, TrackRole,
};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gbt-cli")]
#[command(version)]
#[command(about = "Play and bounce gbtracker songs", long_about = None)]
struct Args {
    /// Song file in gbtracker text format
    song: PathBuf,

    /// Render to a 16-bit stereo WAV file instead of playing
    #[arg(long, value_name = "FILE")]
    wav: Option<PathBuf>,

    /// Print the register export table instead of playing
    #[arg(long)]
    export: bool,

    /// List every note with its registers
    #[arg(long)]
    list: bool,

    /// Bounce the note at --from on --track to an 8-bit mono WAV file
    #[arg(long, value_name = "FILE", requires = "track")]
    note_wav: Option<PathBuf>,

    /// Track for --note-wav: 1 square+sweep, 2 square, 3 noise
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=3))]
    track: Option<u8>,

    /// Start playback at this step
    #[arg(long, value_name = "STEP", default_value_t = 0)]
    from: u32,

    /// Play through once even if the song loops
    #[arg(long)]
    no_loop: bool,

    /// Stop after this many passes through a looping song
    #[arg(long, value_name = "N")]
    loops: Option<u32>,

    /// Override the song tempo
    #[arg(long, value_name = "N")]
    bpm: Option<u16>,

    /// Output level at full volume (0.3 to 0.5)
    #[arg(long, value_name = "F")]
    player_volume: Option<f32>,

    /// Log engine and audio activity
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}

/// Prints the cursor on one line as playback advances.
struct CursorPrinter {
    end_step: u32,
}

impl PlaybackObserver for CursorPrinter {
    fn on_step(&mut self, step: u32) {
        print!(
            "\rBar: {:3} | Step: {:2} | {:4}/{}",
            step / gbt_ir::STEPS_PER_BAR + 1,
            step % gbt_ir::STEPS_PER_BAR,
            step,
            self.end_step
        );
        let _ = std::io::stdout().flush();
    }

    fn on_stopped(&mut self, view_step: u32) {
        println!("\rStopped, view back at step {}          ", view_step);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);
    log::debug!("{:?}", args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), gbt_master::Error> {
    let mut config = PlayerConfig::default();
    if let Some(volume) = args.player_volume {
        config.synth = SynthConfig::with_player_volume(volume);
    }

    // Offline modes never touch the audio device.
    let offline = args.wav.is_some() || args.export || args.note_wav.is_some();
    let mut ctrl = if offline {
        Controller::headless(config)
    } else {
        Controller::with_audio_device(config)
    };

    ctrl.load_song_file(&args.song)?;
    if let Some(bpm) = args.bpm {
        ctrl.set_bpm(bpm)?;
    }
    if args.no_loop {
        ctrl.set_looping(false);
    }

    print_summary(&ctrl);
    if args.list {
        print_notes(ctrl.song());
    }

    if args.export {
        println!("{}", ctrl.export_table());
    }
    if let Some(path) = &args.wav {
        let passes = args.loops.unwrap_or(1);
        println!("Rendering {} pass(es) to {}...", passes, path.display());
        let wav = ctrl.render_to_wav(passes);
        std::fs::write(path, &wav)?;
        println!("Wrote {} bytes.", wav.len());
    }
    if let (Some(path), Some(track)) = (&args.note_wav, args.track) {
        let role = TrackRole::ALL[track as usize - 1];
        match ctrl.bounce_note(role, args.from) {
            Some(wav) => {
                std::fs::write(path, &wav)?;
                println!("Wrote {} note at step {} to {}.", role, args.from, path.display());
            }
            None => eprintln!("no {} note at step {}", role, args.from),
        }
    }
    if offline {
        return Ok(());
    }

    play(&mut ctrl, args)
}

fn print_summary(ctrl: &Controller) {
    let song = ctrl.song();
    println!("Length:   {} steps ({} bars)", song.end_step(), song.bars());
    if song.looping() {
        println!("Loop:     from step {}", song.loop_step());
    } else {
        println!("Loop:     off");
    }
    println!("Tempo:    {} BPM", song.bpm());
    for (i, status) in ctrl.channel_status().iter().enumerate() {
        if let ChannelStatus::Unavailable(reason) = status {
            println!("Channel {}: unavailable ({})", i + 1, reason);
        }
    }
    println!();
    print!("{}", gbt_ir::analyze(song));
    println!();
}

fn print_notes(song: &Song) {
    for role in TrackRole::ALL {
        let track = song.track(role);
        println!("{} ({} notes)", role, track.len());
        for (step, note) in track.iter() {
            println!("  {:5}  {:<5} {}", step, note.label().as_str(), gbt_ir::encode(note));
        }
    }
    println!();
}

fn play(ctrl: &mut Controller, args: &Args) -> Result<(), gbt_master::Error> {
    let end_step = ctrl.end_step();
    let loop_step = ctrl.loop_step();
    let max_passes = args.loops.unwrap_or(u32::MAX).max(1);
    ctrl.set_observer(Box::new(CursorPrinter { end_step }));
    ctrl.play_from_step(args.from)?;
    println!("Playing...");

    let interval = ctrl.config().tick_interval();
    let mut passes = 1;
    if ctrl.looping() {
        log::debug!("looping back to step {} after step {}", loop_step, end_step - 1);
    }
    let mut last_step = None;
    let mut last_tick = Instant::now();

    while ctrl.is_playing() {
        std::thread::sleep(interval);
        let now = Instant::now();
        let fired = ctrl.tick(now - last_tick);
        last_tick = now;

        if let Some(step) = fired {
            if step == loop_step && last_step == Some(end_step - 1) {
                passes += 1;
                if passes > max_passes {
                    ctrl.stop();
                    break;
                }
            }
            last_step = Some(step);
        }
    }

    // Let the last notes ring out.
    std::thread::sleep(Duration::from_secs(1));
    println!("\rDone.                                   ");
    Ok(())
}
