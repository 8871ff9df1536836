//! Engine processing status

use serde::{Deserialize, Serialize};

/// Result of one engine processing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DuelStatus {
    /// Duel is over
    Ended,
    /// Engine is waiting for an answer
    AwaitingInput,
    /// More processing remains, advance again without input
    Continue,
}

impl DuelStatus {
    /// Map the engine's raw status value
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(DuelStatus::Ended),
            1 => Some(DuelStatus::AwaitingInput),
            2 => Some(DuelStatus::Continue),
            _ => None,
        }
    }

    /// Raw status value as the engine reports it
    pub fn as_raw(self) -> i32 {
        match self {
            DuelStatus::Ended => 0,
            DuelStatus::AwaitingInput => 1,
            DuelStatus::Continue => 2,
        }
    }

    /// True when the engine has output worth reading
    pub fn has_output(self) -> bool {
        matches!(self, DuelStatus::Ended | DuelStatus::AwaitingInput)
    }
}
