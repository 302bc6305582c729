//! Loading, saving and exporting song files through the controller.

use std::fs;
use std::path::PathBuf;

use gbt_audio::memory::MemoryFactory;
use gbt_master::{Controller, Error, FormatError, PlayerConfig, TrackRole};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/gbt").join(name)
}

fn controller() -> Controller {
    Controller::new(PlayerConfig::default(), &MemoryFactory::new())
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("gbtracker-{}-{}", std::process::id(), name))
}

#[test]
fn save_file_reloads_identically() {
    let mut ctrl = controller();
    ctrl.load_song_file(fixture("sweep_intro.gbt")).unwrap();

    let path = scratch_path("sweep_intro.gbt");
    ctrl.save_song_file(&path).unwrap();
    let saved = fs::read_to_string(&path).unwrap();
    let _ = fs::remove_file(&path);

    assert!(saved.ends_with(",150,0\n"));

    let mut other = controller();
    other.load_song_text(&saved).unwrap();
    assert_eq!(other.song(), ctrl.song());
}

#[test]
fn corrupt_file_keeps_current_song() {
    let mut ctrl = controller();
    ctrl.load_song_file(fixture("scale.gbt")).unwrap();
    let before = ctrl.song().clone();

    let err = ctrl.load_song_file(fixture("corrupt.gbt")).unwrap_err();
    assert!(matches!(
        err,
        Error::Format(FormatError::MalformedSerialization { .. })
    ));
    assert_eq!(ctrl.song(), &before);
}

#[test]
fn missing_file_is_io_error() {
    let mut ctrl = controller();
    let err = ctrl.load_song_file(fixture("no_such_song.gbt")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn legacy_file_gets_default_tempo() {
    let mut ctrl = controller();
    ctrl.set_bpm(200).unwrap();
    ctrl.load_song_file(fixture("legacy.gbt")).unwrap();
    assert_eq!(ctrl.bpm(), 120);
    assert!(ctrl.looping());
    assert!(ctrl.song().note(TrackRole::SquareSweep, 0).is_some());
    // Saving upgrades the file with the trailer.
    assert!(ctrl.save_song_text().ends_with(",120,1"));
}

#[test]
fn export_table_follows_edits() {
    let mut ctrl = controller();
    ctrl.load_song_file(fixture("legacy.gbt")).unwrap();
    assert_eq!(
        ctrl.export_table(),
        "{0x0008, 0xF080, 0x860C, 0x0000, 0x0000, 0x0000, 0x0000, 0x0030}"
    );

    let note = *ctrl.song().note(TrackRole::SquareSweep, 0).unwrap();
    ctrl.set_note(TrackRole::Square, 16, note).unwrap();
    let rows = ctrl.export_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].run_length, 16);
    assert_eq!(rows[1].step, 16);
    assert_eq!((rows[1].env2, rows[1].frq2), (0xF080, 0x860C));
    assert_eq!(rows[1].run_length, 32);
}

#[test]
fn clear_all_keeps_markers_but_drops_notes() {
    let mut ctrl = controller();
    ctrl.load_song_file(fixture("scale.gbt")).unwrap();
    ctrl.clear_all();
    assert_eq!(ctrl.max_occupied_step(), 0);
    assert_eq!(ctrl.export_rows().len(), 1);
    assert!(ctrl.export_rows()[0].is_rest());
}
