//! Trigger kinds and their static emotion mapping.
//!
//! | Kind     | Emotion  |
//! |----------|----------|
//! | command  | neutral (refined by context keywords) |
//! | startup  | bootup3  |
//! | shutdown | sleep    |
//! | error    | sad      |
//! | success  | happy    |
//! | weather  | neutral  |
//! | joke     | happy2   |
//! | default  | neutral  |

use core::fmt;
use core::str::FromStr;

/// Semantic trigger supplied by the command layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Command,
    Startup,
    Shutdown,
    Error,
    Success,
    Weather,
    Joke,
    Default,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 8] = [
        Self::Command,
        Self::Startup,
        Self::Shutdown,
        Self::Error,
        Self::Success,
        Self::Weather,
        Self::Joke,
        Self::Default,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Error => "error",
            Self::Success => "success",
            Self::Weather => "weather",
            Self::Joke => "joke",
            Self::Default => "default",
        }
    }

    /// Emotion for this kind when no context refines it.
    pub fn base_emotion(self) -> &'static str {
        match self {
            Self::Command | Self::Weather | Self::Default => "neutral",
            Self::Startup => "bootup3",
            Self::Shutdown => "sleep",
            Self::Error => "sad",
            Self::Success => "happy",
            Self::Joke => "happy2",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerKind {
    type Err = UnknownTrigger;

    /// Unknown names are an error; callers that want the lenient
    /// behaviour map the error to [`TriggerKind::Default`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(UnknownTrigger)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownTrigger;

impl fmt::Display for UnknownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown trigger kind")
    }
}

impl std::error::Error for UnknownTrigger {}

/// Keyword rules for `command` context, checked in order; first match wins.
const COMMAND_KEYWORDS: [(&[&str], &str); 3] = [
    (&["weather"], "neutral"),
    (&["on", "off", "set"], "excited"),
    (&["joke"], "happy"),
];

/// Resolve a trigger (plus optional free text) to a concrete emotion name.
pub fn resolve(kind: TriggerKind, context: Option<&str>) -> &'static str {
    if kind == TriggerKind::Command {
        if let Some(text) = context {
            let text = text.to_lowercase();
            for (words, emotion) in COMMAND_KEYWORDS {
                if words.iter().any(|w| text.contains(w)) {
                    return emotion;
                }
            }
        }
    }
    kind.base_emotion()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_mapping() {
        assert_eq!(resolve(TriggerKind::Startup, None), "bootup3");
        assert_eq!(resolve(TriggerKind::Shutdown, None), "sleep");
        assert_eq!(resolve(TriggerKind::Error, None), "sad");
        assert_eq!(resolve(TriggerKind::Success, None), "happy");
        assert_eq!(resolve(TriggerKind::Joke, None), "happy2");
        assert_eq!(resolve(TriggerKind::Command, None), "neutral");
    }

    #[test]
    fn command_keyword_turn_on_is_excited() {
        assert_eq!(resolve(TriggerKind::Command, Some("turn on the light")), "excited");
    }

    #[test]
    fn command_keyword_match_is_case_insensitive() {
        assert_eq!(resolve(TriggerKind::Command, Some("Tell me a JOKE")), "happy");
        assert_eq!(resolve(TriggerKind::Command, Some("SET a timer")), "excited");
    }

    #[test]
    fn weather_wins_over_later_rules() {
        assert_eq!(resolve(TriggerKind::Command, Some("weather on monday")), "neutral");
    }

    #[test]
    fn unmatched_command_defaults_to_neutral() {
        assert_eq!(resolve(TriggerKind::Command, Some("what time is it")), "neutral");
    }

    #[test]
    fn context_ignored_for_non_command() {
        assert_eq!(resolve(TriggerKind::Error, Some("turn on the light")), "sad");
    }

    #[test]
    fn parse_round_trips_names() {
        for kind in TriggerKind::ALL {
            assert_eq!(kind.as_str().parse::<TriggerKind>(), Ok(kind));
        }
        assert_eq!("  Error ".parse::<TriggerKind>(), Ok(TriggerKind::Error));
        assert!("dance".parse::<TriggerKind>().is_err());
    }
}
