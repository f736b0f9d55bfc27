//! Integration tests for the trigger → cycle → journal pipeline.
//!
//! Every engine here runs on a virtual clock, so frame delays, holds and
//! cooldowns cost no wall-clock time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use beemo::adapters::journal::MemoryJournal;
use beemo::app::consumer;
use beemo::app::ports::{Clock, Joint};
use beemo::app::{RejectReason, TriggerOutcome};
use beemo::drivers::actuators::{MotionMode, MotionOutcome};
use beemo::emotion::TOUCH_EMOTIONS;
use beemo::events::{EventQueue, SensorEvent, SensorSource};
use beemo::{EmotionEngine, EngineConfig, TriggerKind};

use crossbeam_channel::Sender;

use crate::mock_hw::{
    HangingServos, MockDisplay, MockServos, RecordingClock, Step, StepLog, test_config,
    write_all_frames, write_frames,
};

type Engine = EmotionEngine<MockDisplay, MockServos>;

struct Rig {
    engine: Engine,
    clock: Arc<RecordingClock>,
    log: StepLog,
    journal: MemoryJournal,
}

fn rig(config: EngineConfig, with_servos: bool) -> Rig {
    let log = StepLog::default();
    let clock = Arc::new(RecordingClock::new(log.clone()));
    let journal = MemoryJournal::new();
    let servos = with_servos.then(|| MockServos { log: log.clone() });
    let engine = EmotionEngine::new(
        config,
        Some(MockDisplay { log: log.clone() }),
        servos,
        Box::new(journal.clone()),
        clock.clone(),
    );
    Rig {
        engine,
        clock,
        log,
        journal,
    }
}

fn emotions(journal: &MemoryJournal) -> Vec<String> {
    journal.history(usize::MAX).into_iter().map(|r| r.emotion).collect()
}

// ── Cooldown ──────────────────────────────────────────────────

#[test]
fn second_trigger_inside_cooldown_is_rejected_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), "happy", 3);
    let r = rig(test_config(dir.path()), false);

    assert!(r.engine.trigger(TriggerKind::Success, None));
    let shown = r.log.frames_shown();

    match r.engine.trigger_outcome(TriggerKind::Success, None) {
        TriggerOutcome::Rejected(RejectReason::Cooldown { remaining }) => {
            assert!(remaining <= Duration::from_secs(2));
        }
        other => panic!("expected cooldown rejection, got {other:?}"),
    }
    assert_eq!(r.log.frames_shown(), shown, "rejected trigger drew frames");
    assert_eq!(r.journal.history(10).len(), 1);
}

#[test]
fn trigger_after_cooldown_elapses_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), "happy", 3);
    write_frames(dir.path(), "sad", 2);
    let r = rig(test_config(dir.path()), false);

    assert!(r.engine.trigger(TriggerKind::Success, None));
    r.clock.advance(Duration::from_millis(1999));
    assert!(!r.engine.trigger(TriggerKind::Error, None));
    r.clock.advance(Duration::from_millis(1));
    assert!(r.engine.trigger(TriggerKind::Error, None));

    assert_eq!(emotions(&r.journal), ["sad", "happy"]);
    assert_eq!(r.engine.state().current_emotion, "sad");
}

#[test]
fn cooldown_is_measured_from_cycle_end() {
    let dir = tempfile::tempdir().unwrap();
    // 31 frames at 15 fps: just over two seconds of playback.
    write_frames(dir.path(), "happy", 31);
    let r = rig(test_config(dir.path()), false);

    let before = r.clock.now();
    assert!(r.engine.trigger(TriggerKind::Success, None));
    assert!(r.clock.now() - before >= Duration::from_secs(2));
    assert!(matches!(
        r.engine.trigger_outcome(TriggerKind::Success, None),
        TriggerOutcome::Rejected(RejectReason::Cooldown { .. })
    ));
}

// ── Trigger resolution + journal ──────────────────────────────

#[test]
fn command_context_resolves_to_excited_and_is_journaled() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), "excited", 2);
    let r = rig(test_config(dir.path()), false);

    assert!(r.engine.trigger(TriggerKind::Command, Some("turn on the light")));

    let history = r.journal.history(1);
    assert_eq!(history[0].emotion, "excited");
    assert_eq!(history[0].trigger, "command");
    assert_eq!(r.journal.stats()["excited"].count, 1);
}

#[test]
fn frames_are_shown_in_numeric_order() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), "happy", 12);
    let r = rig(test_config(dir.path()), false);

    assert!(r.engine.trigger(TriggerKind::Success, None));
    let order: Vec<u32> = r
        .log
        .steps()
        .into_iter()
        .filter_map(|s| match s {
            Step::Show { index } => Some(index),
            _ => None,
        })
        .collect();
    assert_eq!(order, (1..=12).collect::<Vec<_>>());
}

// ── Motion alongside playback ─────────────────────────────────

#[test]
fn played_cycle_reports_synchronized_motion() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), "happy", 4);
    let r = rig(test_config(dir.path()), true);

    match r.engine.trigger_outcome(TriggerKind::Success, None) {
        TriggerOutcome::Played {
            emotion, motion, ..
        } => {
            assert_eq!(emotion, "happy");
            assert_eq!(motion, Some(MotionOutcome::Completed(MotionMode::Synchronized)));
        }
        other => panic!("expected a played cycle, got {other:?}"),
    }

    let servo = r.log.servo_steps();
    assert_eq!(servo[0], Step::Throttle(0.5));
    assert_eq!(servo[1], Step::Angle(Joint::Left, 45.0));
    assert_eq!(servo[2], Step::Angle(Joint::Right, 135.0));
    assert_eq!(servo.last(), Some(&Step::Angle(Joint::Right, 90.0)));
}

#[test]
fn emotion_without_motion_leaves_servos_idle() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), "happy2", 2);
    let r = rig(test_config(dir.path()), true);

    match r.engine.trigger_outcome(TriggerKind::Joke, None) {
        TriggerOutcome::Played { motion, .. } => assert_eq!(motion, Some(MotionOutcome::Skipped)),
        other => panic!("expected a played cycle, got {other:?}"),
    }
    assert!(r.log.servo_steps().is_empty());
}

#[test]
fn missing_frames_never_move_the_servos() {
    let dir = tempfile::tempdir().unwrap();
    let r = rig(test_config(dir.path()), true);

    assert!(!r.engine.trigger(TriggerKind::Error, None));
    assert!(r.log.servo_steps().is_empty());
    assert_eq!(r.log.frames_shown(), 0);
}

// ── Actuator deadline ─────────────────────────────────────────

struct HungRig {
    engine: Arc<EmotionEngine<MockDisplay, HangingServos>>,
    clock: Arc<RecordingClock>,
    log: StepLog,
    journal: MemoryJournal,
    /// Dropping this lets the stalled servo writes return.
    gate: Sender<()>,
}

fn hung_rig(root: &std::path::Path) -> HungRig {
    let log = StepLog::default();
    let clock = Arc::new(RecordingClock::new(log.clone()));
    let journal = MemoryJournal::new();
    let (gate, gate_rx) = crossbeam_channel::bounded(0);
    let config = EngineConfig {
        actuator_join_timeout_ms: 100,
        ..test_config(root)
    };
    let engine = EmotionEngine::new(
        config,
        Some(MockDisplay { log: log.clone() }),
        Some(HangingServos {
            log: log.clone(),
            gate: gate_rx,
        }),
        Box::new(journal.clone()),
        clock.clone(),
    );
    HungRig {
        engine: Arc::new(engine),
        clock,
        log,
        journal,
        gate,
    }
}

/// Wait until the motion thread has reached its first joint write.
fn wait_for_stall(log: &StepLog) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !log.steps().iter().any(|s| matches!(s, Step::Angle(..))) {
        assert!(Instant::now() < deadline, "motion thread never started");
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn stalled_motion_is_detached_and_the_cycle_still_counts() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path(), "happy", 2);
    let r = hung_rig(dir.path());

    match r.engine.trigger_outcome(TriggerKind::Success, None) {
        TriggerOutcome::Played { emotion, motion, .. } => {
            assert_eq!(emotion, "happy");
            assert_eq!(motion, None);
        }
        other => panic!("expected a played cycle, got {other:?}"),
    }
    assert_eq!(r.engine.state().current_emotion, "happy");
    assert_eq!(r.engine.state().cycles, 1);
    assert_eq!(emotions(&r.journal), ["happy"]);

    // The detached thread still owns the servos; the next cycle plays
    // without them instead of waiting.
    wait_for_stall(&r.log);
    r.clock.advance(Duration::from_secs(2));
    match r.engine.trigger_outcome(TriggerKind::Success, None) {
        TriggerOutcome::Played { motion, .. } => assert_eq!(motion, Some(MotionOutcome::Busy)),
        other => panic!("expected a played cycle, got {other:?}"),
    }
    assert_eq!(r.engine.state().cycles, 2);

    drop(r.gate);
}

#[test]
fn sequences_do_not_wait_for_a_stalled_actuator() {
    let dir = tempfile::tempdir().unwrap();
    write_all_frames(dir.path(), 1);
    let r = hung_rig(dir.path());

    assert!(r.engine.trigger(TriggerKind::Success, None));
    wait_for_stall(&r.log);

    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    let engine = Arc::clone(&r.engine);
    let worker = std::thread::spawn(move || {
        let started = engine.startup_sequence();
        engine.shutdown();
        let _ = done_tx.send(started);
    });
    let finished = done_rx.recv_timeout(Duration::from_secs(3));
    drop(r.gate);
    worker.join().unwrap();

    assert_eq!(finished, Ok(true), "sequences blocked on the stalled actuator");
    assert_eq!(r.engine.state().current_emotion, "sleep");
    assert!(r.log.steps().contains(&Step::Clear));
    // Parking was skipped while the stalled move held the servos.
    assert!(!r.log.servo_steps().contains(&Step::Release));
}

// ── Sensor events ─────────────────────────────────────────────

#[test]
fn touch_event_plays_then_returns_to_neutral() {
    let dir = tempfile::tempdir().unwrap();
    write_all_frames(dir.path(), 2);
    let r = rig(test_config(dir.path()), false);

    let event = SensorEvent::new(SensorSource::Touch, "happy3");
    assert!(consumer::process_event(&r.engine, &event).is_played());

    let history = r.journal.history(2);
    assert_eq!(history[0].emotion, "neutral");
    assert_eq!(history[0].trigger, "recovery");
    assert_eq!(history[1].emotion, "happy3");
    assert_eq!(history[1].trigger, "touch");
}

#[test]
fn vibration_event_shows_banner_before_the_animation() {
    let dir = tempfile::tempdir().unwrap();
    write_all_frames(dir.path(), 2);
    let r = rig(test_config(dir.path()), false);

    let event = SensorEvent::new(SensorSource::Vibration, "angry");
    consumer::process_event(&r.engine, &event);

    let steps = r.log.steps();
    // The banner is a rendered text frame, index 0, held for two seconds.
    assert_eq!(steps[0], Step::Show { index: 0 });
    assert_eq!(steps[1], Step::Sleep(Duration::from_secs(2)));
    assert_eq!(steps[2], Step::Show { index: 1 });
    assert_eq!(emotions(&r.journal), ["neutral", "angry"]);
}

#[test]
fn sensor_event_obeys_cooldown_but_neutral_return_does_not() {
    let dir = tempfile::tempdir().unwrap();
    write_all_frames(dir.path(), 2);
    let r = rig(test_config(dir.path()), false);

    assert!(r.engine.trigger(TriggerKind::Success, None));
    let event = SensorEvent::new(SensorSource::Touch, "excited");
    let outcome = consumer::process_event(&r.engine, &event);

    // The event lands inside the cooldown; the forced neutral bypasses it.
    assert!(matches!(
        outcome,
        TriggerOutcome::Rejected(RejectReason::Cooldown { .. })
    ));
    assert_eq!(emotions(&r.journal), ["neutral", "happy"]);
}

#[test]
fn consumer_thread_drains_queue_in_order() {
    let dir = tempfile::tempdir().unwrap();
    write_all_frames(dir.path(), 1);
    let config = EngineConfig {
        consumer_wait_ms: 10,
        cooldown_ms: 0,
        ..test_config(dir.path())
    };
    let r = rig(config, false);
    let engine = Arc::new(r.engine);
    let queue = EventQueue::new(4);
    assert!(queue.push(SensorEvent::new(SensorSource::Touch, TOUCH_EMOTIONS[0])));
    assert!(queue.push(SensorEvent::new(SensorSource::Vibration, "sad")));

    let handle = consumer::spawn(Arc::clone(&engine), queue.clone()).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while r.journal.history(10).len() < 4 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    engine.stop();
    handle.join().unwrap();

    assert_eq!(emotions(&r.journal), ["neutral", "sad", "neutral", "happy"]);
    assert!(queue.is_empty());
}

#[test]
fn quiet_consumer_continues_along_the_transition_graph() {
    let dir = tempfile::tempdir().unwrap();
    write_all_frames(dir.path(), 1);
    let config = EngineConfig {
        consumer_wait_ms: 10,
        idle_interval_secs: Some(0),
        ..test_config(dir.path())
    };
    let r = rig(config, false);
    let engine = Arc::new(r.engine);

    let handle = consumer::spawn(Arc::clone(&engine), EventQueue::new(4)).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while r.journal.history(1).is_empty() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    engine.stop();
    handle.join().unwrap();

    let first = r.journal.history(usize::MAX).pop().unwrap();
    assert_eq!(first.trigger, "transition");
    assert!(["blink", "blink2"].contains(&first.emotion.as_str()));
}

// ── Sequences ─────────────────────────────────────────────────

#[test]
fn startup_sequence_shows_banners_boot_animation_and_idle() {
    let dir = tempfile::tempdir().unwrap();
    write_all_frames(dir.path(), 2);
    let r = rig(test_config(dir.path()), true);

    assert!(r.engine.startup_sequence());

    let history = r.journal.history(10);
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].emotion, "bootup3");
    assert_eq!(history[1].trigger, "startup");
    assert_eq!(history[0].emotion, "neutral");
    // Three text frames plus two animations of two frames.
    assert_eq!(r.log.frames_shown(), 7);
    // Servos centre before anything is drawn.
    assert_eq!(r.log.steps()[0], Step::Throttle(0.0));
}

#[test]
fn shutdown_stops_clears_and_releases() {
    let dir = tempfile::tempdir().unwrap();
    write_all_frames(dir.path(), 1);
    let r = rig(test_config(dir.path()), true);

    r.engine.shutdown();

    assert!(!r.engine.is_running());
    assert_eq!(r.engine.state().current_emotion, "sleep");
    let steps = r.log.steps();
    assert!(steps.contains(&Step::Clear));
    assert_eq!(r.log.servo_steps().last(), Some(&Step::Release));
}
