//! Duel options and bridge configuration

use serde::{Deserialize, Serialize};

use crate::error::{DuelError, Result};

/// Options used to create a duel, applied to both teams
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DuelOptions {
    /// Seed words for the engine's random generator
    pub seed: [u64; 4],
    /// Duel mode flags, passed through to the engine
    #[serde(default)]
    pub flags: u64,
    /// Starting life points
    #[serde(default = "default_starting_lp", rename = "StartingLP")]
    pub starting_lp: u32,
    /// Cards drawn before the first turn
    #[serde(default = "default_starting_draw_count")]
    pub starting_draw_count: u32,
    /// Cards drawn at each draw phase
    #[serde(default = "default_draw_count_per_turn")]
    pub draw_count_per_turn: u32,
}

fn default_starting_lp() -> u32 {
    8000
}

fn default_starting_draw_count() -> u32 {
    5
}

fn default_draw_count_per_turn() -> u32 {
    1
}

impl Default for DuelOptions {
    fn default() -> Self {
        Self {
            seed: [12345, 0, 0, 0],
            flags: 0,
            starting_lp: default_starting_lp(),
            starting_draw_count: default_starting_draw_count(),
            draw_count_per_turn: default_draw_count_per_turn(),
        }
    }
}

impl DuelOptions {
    /// Options with a specific seed and standard life points and draws
    pub fn with_seed(seed: [u64; 4]) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Parse options supplied by a host as JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Limits applied by the bridge itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BridgeConfig {
    /// Largest frame payload accepted from the engine
    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,
    /// Largest answer buffer accepted from a caller
    #[serde(default = "default_max_answer_len")]
    pub max_answer_len: usize,
    /// Live sessions a registry will hold
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_max_frame_len() -> usize {
    64 * 1024 * 1024
}

fn default_max_answer_len() -> usize {
    64 * 1024
}

fn default_max_sessions() -> usize {
    64
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_frame_len: default_max_frame_len(),
            max_answer_len: default_max_answer_len(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl BridgeConfig {
    /// Parse a configuration supplied as JSON, rejecting zero limits
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every limit is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_len == 0 {
            return Err(DuelError::Config("MaxFrameLen must be > 0".into()));
        }
        if self.max_answer_len == 0 {
            return Err(DuelError::Config("MaxAnswerLen must be > 0".into()));
        }
        if self.max_sessions == 0 {
            return Err(DuelError::Config("MaxSessions must be > 0".into()));
        }
        Ok(())
    }
}
