//! Integration tests for the actuator coordinator's timing and ordering.

use std::sync::Arc;
use std::time::Duration;

use beemo::app::ports::Joint;
use beemo::drivers::actuators::{ActuatorCoordinator, MotionMode, MotionOutcome, MotionTiming};
use beemo::emotion::{EmotionCatalog, EmotionProfile, JointTarget, Pose};

use crate::mock_hw::{MockServos, RecordingClock, Step, StepLog};

fn coordinator(log: &StepLog) -> ActuatorCoordinator<MockServos> {
    ActuatorCoordinator::new(
        Some(MockServos { log: log.clone() }),
        Arc::new(RecordingClock::new(log.clone())),
        MotionTiming::default(),
    )
}

fn profile(name: &str) -> EmotionProfile {
    EmotionCatalog::builtin().get(name).cloned().unwrap()
}

#[test]
fn synchronized_move_writes_every_channel_before_the_first_delay() {
    let log = StepLog::default();
    let mut act = coordinator(&log);

    assert_eq!(
        act.move_to(&profile("sad")),
        MotionOutcome::Completed(MotionMode::Synchronized)
    );

    let steps = log.steps();
    let first_sleep = steps
        .iter()
        .position(|s| matches!(s, Step::Sleep(_)))
        .unwrap();
    assert_eq!(
        &steps[..first_sleep],
        &[
            Step::Throttle(-30.0 / 180.0),
            Step::Angle(Joint::Left, 135.0),
            Step::Angle(Joint::Right, 45.0),
        ]
    );
    assert_eq!(steps[first_sleep], Step::Sleep(Duration::from_secs(1)));
}

#[test]
fn every_mode_ends_at_neutral_then_settles() {
    for name in ["happy", "dizzy", "angry"] {
        let log = StepLog::default();
        let mut act = coordinator(&log);
        assert!(matches!(act.move_to(&profile(name)), MotionOutcome::Completed(_)));

        let steps = log.steps();
        let tail = &steps[steps.len() - 4..];
        assert_eq!(
            tail,
            &[
                Step::Throttle(0.0),
                Step::Angle(Joint::Left, 90.0),
                Step::Angle(Joint::Right, 90.0),
                Step::Sleep(Duration::from_millis(500)),
            ],
            "{name} did not finish at neutral"
        );
    }
}

#[test]
fn oscillation_sweeps_both_joints_for_two_seconds() {
    let log = StepLog::default();
    let mut act = coordinator(&log);

    assert_eq!(
        act.move_to(&profile("dizzy")),
        MotionOutcome::Completed(MotionMode::Oscillation)
    );

    let steps = log.steps();
    assert_eq!(steps[0], Step::Throttle(1.0));
    let sweep_time: Duration = steps
        .iter()
        .filter_map(|s| match s {
            Step::Sleep(d) if *d == Duration::from_millis(300) => Some(*d),
            _ => None,
        })
        .sum();
    assert!(sweep_time >= Duration::from_secs(2));
    assert!(steps.contains(&Step::Angle(Joint::Left, 120.0)));
    assert!(steps.contains(&Step::Angle(Joint::Right, 60.0)));
}

#[test]
fn single_joint_pose_moves_individually() {
    let log = StepLog::default();
    let mut act = coordinator(&log);
    let wave = EmotionProfile {
        name: "wave",
        frame_count: 0,
        motion: Some(Pose {
            left: Some(JointTarget::Angle(20.0)),
            right: None,
            spin: 0.0,
        }),
        transitions: &[],
    };

    assert_eq!(
        act.move_to(&wave),
        MotionOutcome::Completed(MotionMode::Individual)
    );
    let steps = log.steps();
    assert_eq!(steps[0], Step::Throttle(0.0));
    assert_eq!(steps[1], Step::Angle(Joint::Left, 20.0));
    assert_eq!(steps[2], Step::Sleep(Duration::from_secs(1)));
    assert!(!steps[..3].iter().any(|s| matches!(s, Step::Angle(Joint::Right, _))));
}

#[test]
fn park_centres_then_releases() {
    let log = StepLog::default();
    let mut act = coordinator(&log);

    act.park().unwrap();
    assert_eq!(log.servo_steps().last(), Some(&Step::Release));
}
