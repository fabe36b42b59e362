//! Maps free-form transcription text to the fixed command vocabulary.

/// The closed set of voice commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Select the top video
    Top,
    /// Select the bottom video
    Bottom,
    /// Start or resume playback
    Play,
    /// Pause playback
    Pause,
}

impl CommandKind {
    /// Stable lowercase identifier, used for logging and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Top => "top",
            CommandKind::Bottom => "bottom",
            CommandKind::Play => "play",
            CommandKind::Pause => "pause",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority-ordered trigger table.
///
/// Directional commands come before transport commands: directional votes are
/// time-critical and more likely intended when ambiguous text contains both
/// kinds of trigger ("stop at the top one" selects Top).
const TRIGGERS: &[(CommandKind, &[&str])] = &[
    (CommandKind::Top, &["top", "first", "one", "1"]),
    (CommandKind::Bottom, &["bottom", "second", "two", "too", "to", "2"]),
    (CommandKind::Pause, &["pause", "stop"]),
    (CommandKind::Play, &["play", "resume", "start"]),
];

/// Word-boundary command matcher over the priority trigger table.
#[derive(Debug, Clone, Default)]
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Self
    }

    /// Returns the first command whose trigger set matches a whole token of
    /// `text`, in priority order. Case-insensitive. `None` means no match,
    /// which is not an error.
    pub fn interpret(&self, text: &str) -> Option<CommandKind> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = tokenize(&lowered).collect();

        for (kind, triggers) in TRIGGERS {
            if tokens
                .iter()
                .any(|token| triggers.contains(token))
            {
                return Some(*kind);
            }
        }
        None
    }

    /// True if `text` contains any of `triggers` as a whole token.
    ///
    /// Used by the gate to decide whether an interim partial is already
    /// unambiguous enough to act on.
    pub fn contains_trigger(&self, text: &str, triggers: &[String]) -> bool {
        let lowered = text.to_lowercase();
        tokenize(&lowered).any(|token| triggers.iter().any(|t| t == token))
    }
}

/// Splits text into alphanumeric tokens; everything else is a boundary.
///
/// This is what gives the whole-word guarantee: "stopwatch" yields the token
/// "stopwatch", which never equals "stop".
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}
