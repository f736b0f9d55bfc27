//! Emotion profiles: the static definition of every named state.
//!
//! A profile bundles the animation (frame directory + expected frame
//! count), the servo pose or motion, and the plausible follow-up emotions
//! used by the [`TransitionGraph`](transitions::TransitionGraph).
//!
//! | Emotion   | Frames | Left     | Right    | Spin |
//! |-----------|--------|----------|----------|------|
//! | happy     | 44     | 45°      | 135°     | 90   |
//! | excited   | 24     | 30°      | 150°     | 120  |
//! | sad       | 47     | 135°     | 45°      | -30  |
//! | angry     | 20     | 0°       | 180°     | -90  |
//! | neutral   | 61     | 90°      | 90°      | 0    |
//! | dizzy     | 67     | oscillate| oscillate| 180  |
//! | blink     | 39     | 90°      | 90°      | 0    |
//! | sleep     | 44     | 180°     | 0°       | 0    |
//!
//! `happy2`, `happy3`, `blink2` and `bootup3` animate without moving.

pub mod transitions;
pub mod triggers;

/// The idle emotion every cycle falls back to.
pub const IDLE_EMOTION: &str = "neutral";

/// Emotions a touch may produce.
pub const TOUCH_EMOTIONS: [&str; 4] = ["happy", "excited", "happy2", "happy3"];
/// Emotions a vibration may produce.
pub const VIBRATION_EMOTIONS: [&str; 3] = ["dizzy", "angry", "sad"];

/// Target for one angular joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointTarget {
    /// Move to this angle (degrees, 0–180).
    Angle(f32),
    /// Sweep back and forth about centre.
    Oscillate,
}

/// Servo motion for one emotion.
///
/// `spin` is expressed on the nominal degrees scale (±180) and normalised
/// to a throttle by the actuator coordinator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub left: Option<JointTarget>,
    pub right: Option<JointTarget>,
    pub spin: f32,
}

impl Pose {
    pub const fn fixed(left: f32, right: f32, spin: f32) -> Self {
        Self {
            left: Some(JointTarget::Angle(left)),
            right: Some(JointTarget::Angle(right)),
            spin,
        }
    }

    pub const fn oscillate(spin: f32) -> Self {
        Self {
            left: Some(JointTarget::Oscillate),
            right: Some(JointTarget::Oscillate),
            spin,
        }
    }
}

/// Static definition of one named emotional state.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionProfile {
    pub name: &'static str,
    /// Number of frames the asset set is expected to contain (0 = unknown).
    pub frame_count: u16,
    /// `None` = the emotion animates without moving.
    pub motion: Option<Pose>,
    /// Plausible next emotions for self-chaining / idle continuation.
    pub transitions: &'static [&'static str],
}

const BUILTIN: [EmotionProfile; 12] = [
    EmotionProfile {
        name: "happy",
        frame_count: 44,
        motion: Some(Pose::fixed(45.0, 135.0, 90.0)),
        transitions: &["excited", "neutral", "happy2", "happy3"],
    },
    EmotionProfile {
        name: "excited",
        frame_count: 24,
        motion: Some(Pose::fixed(30.0, 150.0, 120.0)),
        transitions: &["happy", "neutral", "happy2"],
    },
    EmotionProfile {
        name: "sad",
        frame_count: 47,
        motion: Some(Pose::fixed(135.0, 45.0, -30.0)),
        transitions: &["neutral", "blink"],
    },
    EmotionProfile {
        name: "angry",
        frame_count: 20,
        motion: Some(Pose::fixed(0.0, 180.0, -90.0)),
        transitions: &["neutral", "sad"],
    },
    EmotionProfile {
        name: "neutral",
        frame_count: 61,
        motion: Some(Pose::fixed(90.0, 90.0, 0.0)),
        transitions: &["blink", "blink2"],
    },
    EmotionProfile {
        name: "dizzy",
        frame_count: 67,
        motion: Some(Pose::oscillate(180.0)),
        transitions: &["neutral", "sad"],
    },
    EmotionProfile {
        name: "blink",
        frame_count: 39,
        motion: Some(Pose::fixed(90.0, 90.0, 0.0)),
        transitions: &["neutral", "blink2"],
    },
    EmotionProfile {
        name: "sleep",
        frame_count: 44,
        motion: Some(Pose::fixed(180.0, 0.0, 0.0)),
        transitions: &["neutral", "blink"],
    },
    EmotionProfile {
        name: "happy2",
        frame_count: 20,
        motion: None,
        transitions: &["happy", "excited", "neutral"],
    },
    EmotionProfile {
        name: "happy3",
        frame_count: 26,
        motion: None,
        transitions: &["happy", "happy2", "neutral"],
    },
    EmotionProfile {
        name: "blink2",
        frame_count: 20,
        motion: None,
        transitions: &["neutral", "blink"],
    },
    EmotionProfile {
        name: "bootup3",
        frame_count: 97,
        motion: None,
        transitions: &[],
    },
];

/// Immutable set of emotion profiles, built once at startup.
#[derive(Debug, Clone)]
pub struct EmotionCatalog {
    profiles: Vec<EmotionProfile>,
}

impl EmotionCatalog {
    /// The shipped emotion set.
    pub fn builtin() -> Self {
        Self {
            profiles: BUILTIN.to_vec(),
        }
    }

    pub fn from_profiles(profiles: Vec<EmotionProfile>) -> Self {
        Self { profiles }
    }

    pub fn get(&self, name: &str) -> Option<&EmotionProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Look up `name`, falling back to a motionless profile of unknown length.
    pub fn profile_or_still(&self, name: &'static str) -> EmotionProfile {
        self.get(name).cloned().unwrap_or(EmotionProfile {
            name,
            frame_count: 0,
            motion: None,
            transitions: &[],
        })
    }

    /// Resolve a runtime string to the catalog's `'static` name.
    pub fn intern(&self, name: &str) -> Option<&'static str> {
        self.get(name).map(|p| p.name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmotionProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for EmotionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
