//! Engine boundary
//!
//! The rules engine is an external collaborator. The bridge only needs to
//! create a duel, feed it cards, run it, read its output buffer and hand it
//! raw responses. Card data, scripts and log lines flow the other way through
//! [`DuelCallbacks`].

use duel_core::{CardData, DuelOptions, DuelStatus, NewCard};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// One running duel inside the engine.
///
/// Dropping the value destroys the duel.
pub trait DuelEngine: Send {
    /// Add a card before the duel starts
    fn add_card(&mut self, card: &NewCard);

    /// Start the duel once all cards are in place
    fn start(&mut self);

    /// Run until the duel ends, needs a decision, or yields
    fn process(&mut self) -> DuelStatus;

    /// Raw output of the last processing run, valid until the next call
    fn pending_output(&mut self) -> Option<&[u8]>;

    /// Hand the engine a raw response for the decision it awaits
    fn set_response(&mut self, response: &[u8]);
}

/// Creates duels
pub trait EngineFactory {
    type Engine: DuelEngine;

    /// Create a duel, or fail with the engine's reason
    fn create(
        &self,
        options: &DuelOptions,
        callbacks: Arc<dyn DuelCallbacks>,
    ) -> Result<Self::Engine, String>;
}

/// Severity of an engine log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineLogKind {
    Error,
    FromScript,
    ForDebug,
    Undefined,
}

impl EngineLogKind {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => EngineLogKind::Error,
            1 => EngineLogKind::FromScript,
            2 => EngineLogKind::ForDebug,
            _ => EngineLogKind::Undefined,
        }
    }
}

/// Services the engine calls back into while it runs
pub trait DuelCallbacks: Send + Sync {
    /// Stats for a card passcode; unknown cards get blank stats
    fn read_card(&self, code: u32) -> CardData {
        CardData::blank(code)
    }

    /// Lua source for a script name, `None` if it does not exist
    fn read_script(&self, _name: &str) -> Option<Vec<u8>> {
        None
    }

    /// A log line emitted by the engine
    fn log(&self, message: &str, kind: EngineLogKind) {
        match kind {
            EngineLogKind::Error => error!(target: "engine", "{}", message),
            EngineLogKind::FromScript => info!(target: "engine", "{}", message),
            EngineLogKind::ForDebug => debug!(target: "engine", "{}", message),
            EngineLogKind::Undefined => warn!(target: "engine", "{}", message),
        }
    }
}

/// In-memory card and script store
#[derive(Debug, Default, Clone)]
pub struct CardLibrary {
    cards: HashMap<u32, CardData>,
    scripts: HashMap<String, Vec<u8>>,
}

impl CardLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a card
    pub fn insert_card(&mut self, card: CardData) {
        self.cards.insert(card.code, card);
    }

    /// Add or replace a script
    pub fn insert_script(&mut self, name: impl Into<String>, source: impl Into<Vec<u8>>) {
        self.scripts.insert(name.into(), source.into());
    }

    pub fn card(&self, code: u32) -> Option<&CardData> {
        self.cards.get(&code)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl DuelCallbacks for CardLibrary {
    fn read_card(&self, code: u32) -> CardData {
        match self.cards.get(&code) {
            Some(card) => card.clone(),
            None => {
                debug!(code, "Card not in library, using blank stats");
                CardData::blank(code)
            }
        }
    }

    fn read_script(&self, name: &str) -> Option<Vec<u8>> {
        let script = self.scripts.get(name).cloned();
        if script.is_none() {
            debug!(name, "Script not in library");
        }
        script
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_falls_back_to_blank_card() {
        let mut library = CardLibrary::new();
        library.insert_card(CardData::from_db_row(69140098, 0, 0, 0x1, 4, 0x10, 0x2, 1900, 900));

        assert_eq!(library.read_card(69140098).attack, 1900);
        assert_eq!(library.read_card(1), CardData::blank(1));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_library_scripts() {
        let mut library = CardLibrary::new();
        library.insert_script("c69140098.lua", "-- gemini elf");

        assert_eq!(
            library.read_script("c69140098.lua").as_deref(),
            Some(&b"-- gemini elf"[..])
        );
        assert!(library.read_script("missing.lua").is_none());
    }

    #[test]
    fn test_log_kind_mapping() {
        assert_eq!(EngineLogKind::from_raw(0), EngineLogKind::Error);
        assert_eq!(EngineLogKind::from_raw(2), EngineLogKind::ForDebug);
        assert_eq!(EngineLogKind::from_raw(42), EngineLogKind::Undefined);
    }
}
