//! Controller state machine tests
//!
//! Exercises the queue/history transitions through the public command
//! interface, with real decodable fixtures so load paths succeed.

mod helpers;

use loudd::controller::Controller;
use loudd::engine::RenderEngine;
use loudd::protocol::Command;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

fn test_controller() -> Arc<Controller> {
    let engine = Arc::new(RenderEngine::new(2, 44100));
    let shutdown = Arc::new(AtomicBool::new(false));
    Controller::new(engine, shutdown)
}

fn play(controller: &Controller, path: &Path) {
    controller.dispatch(Command::PlayDirect(path.to_string_lossy().into_owned()));
}

fn enqueue(controller: &Controller, path: &Path) {
    controller.dispatch(Command::Enqueue(path.to_string_lossy().into_owned()));
}

#[test]
fn enqueued_tracks_play_in_insertion_order() {
    let dir = tempdir().unwrap();
    let tracks = helpers::fixture_tracks(dir.path(), 4);
    let controller = test_controller();

    for track in &tracks {
        enqueue(&controller, track);
    }

    // The first enqueue starts playback immediately from idle
    assert_eq!(controller.current_track().as_deref(), Some(tracks[0].as_path()));
    assert!(controller.is_playing_from_queue());

    for expected in &tracks[1..] {
        controller.dispatch(Command::Next);
        assert_eq!(controller.current_track().as_deref(), Some(expected.as_path()));
    }

    assert!(controller.queue_tracks().is_empty());
}

#[test]
fn next_with_empty_queue_changes_nothing() {
    let dir = tempdir().unwrap();
    let tracks = helpers::fixture_tracks(dir.path(), 1);
    let controller = test_controller();

    enqueue(&controller, &tracks[0]);
    let current = controller.current_track();
    let mode = controller.is_playing_from_queue();

    controller.dispatch(Command::Next);

    assert_eq!(controller.current_track(), current);
    assert_eq!(controller.is_playing_from_queue(), mode);
}

#[test]
fn history_is_capped_at_twenty_most_recent() {
    let dir = tempdir().unwrap();
    let tracks = helpers::fixture_tracks(dir.path(), 25);
    let controller = test_controller();

    for track in &tracks {
        enqueue(&controller, track);
    }
    // Advance through the remaining 24 tracks
    for _ in 0..24 {
        controller.dispatch(Command::Next);
        assert!(controller.history_tracks().len() <= 20);
    }

    assert_eq!(controller.current_track().as_deref(), Some(tracks[24].as_path()));

    // Most recent 20 of the 24 finished tracks, most-recent-first: t24 .. t05
    let history = controller.history_tracks();
    assert_eq!(history.len(), 20);
    let expected: Vec<_> = tracks[4..24].iter().rev().cloned().collect();
    assert_eq!(history, expected);
}

#[test]
fn prev_then_next_restores_current_track() {
    let dir = tempdir().unwrap();
    let tracks = helpers::fixture_tracks(dir.path(), 2);
    let controller = test_controller();

    play(&controller, &tracks[0]);
    play(&controller, &tracks[1]);
    assert_eq!(controller.current_track().as_deref(), Some(tracks[1].as_path()));
    assert_eq!(controller.history_tracks(), vec![tracks[0].clone()]);

    controller.dispatch(Command::Prev);
    assert_eq!(controller.current_track().as_deref(), Some(tracks[0].as_path()));
    // The interrupted track waits at the queue front
    assert_eq!(controller.queue_tracks(), vec![tracks[1].clone()]);

    controller.dispatch(Command::Next);
    assert_eq!(controller.current_track().as_deref(), Some(tracks[1].as_path()));
    assert!(controller.queue_tracks().is_empty());
}

#[test]
fn stop_clears_current_but_keeps_queue_and_history() {
    let dir = tempdir().unwrap();
    let tracks = helpers::fixture_tracks(dir.path(), 3);
    let engine = Arc::new(RenderEngine::new(2, 44100));
    let controller = Controller::new(Arc::clone(&engine), Arc::new(AtomicBool::new(false)));

    play(&controller, &tracks[0]);
    play(&controller, &tracks[1]);
    enqueue(&controller, &tracks[2]);

    controller.dispatch(Command::Stop);

    assert!(controller.current_track().is_none());
    assert!(engine.is_idle());
    assert!(!controller.is_playing_from_queue());
    assert_eq!(controller.queue_tracks(), vec![tracks[2].clone()]);
    assert_eq!(controller.history_tracks(), vec![tracks[0].clone()]);
}

#[test]
fn play_direct_replaces_queue() {
    let dir = tempdir().unwrap();
    let tracks = helpers::fixture_tracks(dir.path(), 3);
    let controller = test_controller();

    enqueue(&controller, &tracks[0]);
    enqueue(&controller, &tracks[1]);
    assert_eq!(controller.queue_tracks().len(), 1);

    play(&controller, &tracks[2]);

    assert_eq!(controller.current_track().as_deref(), Some(tracks[2].as_path()));
    assert!(controller.queue_tracks().is_empty());
    // The interrupted track went to history
    assert_eq!(controller.history_tracks(), vec![tracks[0].clone()]);
}

#[test]
fn play_direct_folder_shuffles_all_tracks_into_rotation() {
    let dir = tempdir().unwrap();
    let tracks = helpers::fixture_tracks(dir.path(), 5);
    let controller = test_controller();

    play(&controller, dir.path());

    let current = controller.current_track().expect("folder play starts a track");
    let mut rotation = controller.queue_tracks();
    rotation.push(current);
    rotation.sort();

    let mut expected = tracks.clone();
    expected.sort();
    assert_eq!(rotation, expected);
    assert!(controller.is_playing_from_queue());
}

#[test]
fn enqueue_folder_without_audio_files_is_noop() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not audio").unwrap();
    let controller = test_controller();

    controller.dispatch(Command::Enqueue(dir.path().to_string_lossy().into_owned()));

    assert!(controller.current_track().is_none());
    assert!(controller.queue_tracks().is_empty());
    assert!(!controller.is_playing_from_queue());
}

#[test]
fn missing_queue_entries_are_skipped_in_bounded_fashion() {
    let dir = tempdir().unwrap();
    let tracks = helpers::fixture_tracks(dir.path(), 2);
    let controller = test_controller();

    enqueue(&controller, &tracks[0]);

    // Queue two paths that vanish before they play, then a real one
    let ghost1 = dir.path().join("ghost1.wav");
    let ghost2 = dir.path().join("ghost2.wav");
    helpers::write_sine_wav(&ghost1, 64, 44100, 2, 0.5);
    helpers::write_sine_wav(&ghost2, 64, 44100, 2, 0.5);
    enqueue(&controller, &ghost1);
    enqueue(&controller, &ghost2);
    enqueue(&controller, &tracks[1]);
    std::fs::remove_file(&ghost1).unwrap();
    std::fs::remove_file(&ghost2).unwrap();

    controller.dispatch(Command::Next);

    assert_eq!(controller.current_track().as_deref(), Some(tracks[1].as_path()));
    assert!(controller.queue_tracks().is_empty());
}

#[test]
fn legacy_play_bypasses_queue_mode() {
    let dir = tempdir().unwrap();
    let tracks = helpers::fixture_tracks(dir.path(), 2);
    let controller = test_controller();

    play(&controller, &tracks[0]);
    controller.dispatch(Command::LegacyPlay(
        tracks[1].to_string_lossy().into_owned(),
    ));

    assert_eq!(controller.current_track().as_deref(), Some(tracks[1].as_path()));
    assert!(!controller.is_playing_from_queue());
    assert_eq!(controller.history_tracks(), vec![tracks[0].clone()]);
}

#[test]
fn end_of_track_advances_the_queue_through_the_engine() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.wav");
    let second = dir.path().join("second.wav");
    helpers::write_sine_wav(&first, 400, 44100, 2, 0.5);
    helpers::write_sine_wav(&second, 2000, 44100, 2, 0.5);

    let engine = Arc::new(RenderEngine::new(2, 44100));
    let controller = Controller::new(Arc::clone(&engine), Arc::new(AtomicBool::new(false)));
    controller.install_track_end_handler();

    enqueue(&controller, &first);
    enqueue(&controller, &second);
    assert_eq!(controller.current_track().as_deref(), Some(first.as_path()));

    // One block spanning the end of the first track
    let mut block = vec![0.0f32; 1000 * 2];
    engine.render(&mut block);

    assert_eq!(controller.current_track().as_deref(), Some(second.as_path()));
    assert!(controller.queue_tracks().is_empty());
    assert_eq!(controller.history_tracks(), vec![first.clone()]);
    assert!(!engine.is_idle());
    assert!(helpers::energy(&block[400 * 2..]) > 0.0, "no audio past the boundary");
}

#[test]
fn undecodable_queue_entry_is_skipped_at_track_end() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.wav");
    let broken = dir.path().join("broken.wav");
    let third = dir.path().join("third.wav");
    helpers::write_sine_wav(&first, 400, 44100, 2, 0.5);
    std::fs::write(&broken, [0xFFu8; 64]).unwrap();
    helpers::write_sine_wav(&third, 2000, 44100, 2, 0.5);

    let engine = Arc::new(RenderEngine::new(2, 44100));
    let controller = Controller::new(Arc::clone(&engine), Arc::new(AtomicBool::new(false)));
    controller.install_track_end_handler();

    enqueue(&controller, &first);
    enqueue(&controller, &broken);
    enqueue(&controller, &third);

    let mut block = vec![0.0f32; 1000 * 2];
    engine.render(&mut block);

    // The broken entry is skipped and the queue keeps playing
    assert_eq!(controller.current_track().as_deref(), Some(third.as_path()));
    assert!(controller.queue_tracks().is_empty());
    assert_eq!(
        controller.history_tracks(),
        vec![broken.clone(), first.clone()]
    );
    assert!(controller.is_playing_from_queue());
    assert!(!engine.is_idle());
    assert!(helpers::energy(&block[400 * 2..]) > 0.0);
}

#[test]
fn undecodable_final_entry_returns_to_rest() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.wav");
    let broken = dir.path().join("broken.wav");
    helpers::write_sine_wav(&first, 400, 44100, 2, 0.5);
    std::fs::write(&broken, [0xFFu8; 64]).unwrap();

    let engine = Arc::new(RenderEngine::new(2, 44100));
    let controller = Controller::new(Arc::clone(&engine), Arc::new(AtomicBool::new(false)));
    controller.install_track_end_handler();

    enqueue(&controller, &first);
    enqueue(&controller, &broken);

    let mut block = vec![0.0f32; 1000 * 2];
    engine.render(&mut block);

    // At rest: no current track, no decoder, nothing stranded
    assert!(controller.current_track().is_none());
    assert!(engine.is_idle());
    assert!(controller.queue_tracks().is_empty());
    assert!(!controller.is_playing_from_queue());
    assert_eq!(
        controller.history_tracks(),
        vec![broken.clone(), first.clone()]
    );
}

#[test]
fn quit_drains_everything_and_raises_shutdown() {
    let dir = tempdir().unwrap();
    let tracks = helpers::fixture_tracks(dir.path(), 3);
    let engine = Arc::new(RenderEngine::new(2, 44100));
    let shutdown = Arc::new(AtomicBool::new(false));
    let controller = Controller::new(Arc::clone(&engine), Arc::clone(&shutdown));

    play(&controller, &tracks[0]);
    play(&controller, &tracks[1]);
    enqueue(&controller, &tracks[2]);

    controller.dispatch(Command::Quit);

    assert!(shutdown.load(std::sync::atomic::Ordering::SeqCst));
    assert!(controller.current_track().is_none());
    assert!(controller.queue_tracks().is_empty());
    assert!(controller.history_tracks().is_empty());
    assert!(engine.is_idle());
}
