use std::fmt;

use serde::{Deserialize, Serialize};

/// Classified purpose of one inbound message. Derived fresh per message, never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Help,
    Transcript,
    AboutBot,
    Regenerate,
    GenerateTitle,
    Unknown,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Self::Help,
        Self::Transcript,
        Self::AboutBot,
        Self::Regenerate,
        Self::GenerateTitle,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Help => "HELP",
            Self::Transcript => "TRANSCRIPT",
            Self::AboutBot => "ABOUT_BOT",
            Self::Regenerate => "REGENERATE",
            Self::GenerateTitle => "GENERATE_TITLE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Intents answered from fixed text without touching memory or the gateway.
    pub fn is_canned(&self) -> bool {
        matches!(self, Self::Help | Self::Transcript | Self::AboutBot)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
