//! Integration tests for the song text format against fixture files.

use gbt_formats::{export_rows, parse_song, serialize_song, FormatError};
use gbt_ir::{analyze, DutyCycle, Song, TrackRole};
use std::fs;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures/gbt")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

fn load_fixture(name: &str) -> Song {
    parse_song(&read_fixture(name)).unwrap_or_else(|e| panic!("Failed to parse {}: {}", name, e))
}

fn assert_song_invariants(song: &Song) {
    assert!(song.loop_step() < song.end_step());
    assert!(song.max_occupied_step() < song.end_step());
    assert!(song.bpm() > 0);
    for role in TrackRole::ALL {
        for (_, note) in song.track(role).iter() {
            assert_eq!(note.kind(), role.note_kind());
        }
    }
}

// --- scale.gbt ---

#[test]
fn scale_loads() {
    let song = load_fixture("scale.gbt");
    assert_song_invariants(&song);
    assert_eq!(song.end_step(), 48);
    assert_eq!(song.bpm(), 120);
    assert!(song.looping());

    let features = analyze(&song);
    assert_eq!(features.notes_per_track, [2, 8, 4]);
    assert_eq!(features.pitch_range, Some(((4, 0), (5, 0))));
    assert_eq!(features.cutoff_notes, 6);

    let lead = song.note(TrackRole::SquareSweep, 24).unwrap().as_square().unwrap();
    assert_eq!((lead.musical_note, lead.octave), (7, 4));
    assert_eq!(lead.duty, DutyCycle::Quarter);
}

#[test]
fn scale_round_trips_text_exactly() {
    let text = read_fixture("scale.gbt");
    let song = parse_song(&text).unwrap();
    assert_eq!(serialize_song(&song), text.trim());
}

#[test]
fn scale_export_rows_cover_song() {
    let song = load_fixture("scale.gbt");
    let rows = export_rows(&song);
    assert_eq!(rows.len(), 8);
    assert!(rows.iter().all(|r| r.run_length == 6));
    assert_eq!(rows.iter().map(|r| r.run_length).sum::<u32>(), song.end_step());
}

// --- sweep_intro.gbt ---

#[test]
fn sweep_intro_loads() {
    let song = load_fixture("sweep_intro.gbt");
    assert_song_invariants(&song);
    assert_eq!(song.end_step(), 96);
    assert_eq!(song.loop_step(), 48);
    assert_eq!(song.bpm(), 150);
    assert!(!song.looping());

    let features = analyze(&song);
    assert_eq!(features.sweep_notes, 2);
    assert_eq!(features.short_noise_notes, 1);
}

#[test]
fn sweep_intro_export_rows_follow_notes() {
    let song = load_fixture("sweep_intro.gbt");
    let rows = export_rows(&song);
    assert_eq!(rows[0].step, 0);
    assert!(!rows[0].is_rest());
    let steps: Vec<u32> = rows.iter().map(|r| r.step).collect();
    assert_eq!(steps, [0, 12, 36, 48, 60, 84]);
    assert_eq!(rows.last().unwrap().run_length, 12);
}

// --- legacy.gbt ---

#[test]
fn legacy_without_trailer_uses_defaults() {
    let song = load_fixture("legacy.gbt");
    assert_eq!(song.bpm(), 120);
    assert!(song.looping());
    assert!(song.note(TrackRole::SquareSweep, 0).is_some());
    // Saving adds the trailer.
    assert_eq!(serialize_song(&song), "48,0,1,8,61568,34316,0,0,0,120,1");
}

// --- corrupt.gbt ---

#[test]
fn corrupt_fixture_is_rejected() {
    match parse_song(&read_fixture("corrupt.gbt")) {
        Err(FormatError::MalformedSerialization { field, reason }) => {
            assert!(field.contains("noise"), "field {}", field);
            assert!(reason.contains("FRQ"), "reason {}", reason);
        }
        other => panic!("expected malformed error, got {:?}", other),
    }
}
