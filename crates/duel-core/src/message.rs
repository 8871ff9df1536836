//! Structured duel messages and answers
//!
//! Messages are what the bridge hands to a host after each advance; answers are
//! what the host sends back for the outstanding request. Both travel as
//! MessagePack with named fields.

use serde::{Deserialize, Serialize};

use crate::card::Place;

/// One structured message produced from an engine frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Msg {
    /// Something happened; no decision needed
    Event(Event),
    /// The engine is waiting for a decision
    Request(Request),
}

impl Msg {
    /// The request sub-field, if this message asks for a decision
    pub fn request(&self) -> Option<&Request> {
        match self {
            Msg::Request(request) => Some(request),
            Msg::Event(_) => None,
        }
    }
}

/// A card identified by passcode and place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CardRef {
    pub code: u32,
    pub place: Place,
}

/// An activatable effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Activation {
    pub card: CardRef,
    /// String id of the effect description
    pub description: u64,
    pub client_mode: u8,
}

/// A monster able to attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attacker {
    pub card: CardRef,
    pub can_direct_attack: bool,
}

/// A card drawn from the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DrawnCard {
    pub code: u32,
    pub position: u32,
}

/// Events that need no answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all = "PascalCase", rename_all_fields = "PascalCase")]
pub enum Event {
    /// The last response was rejected and the request will be repeated
    Retry,
    Hint {
        hint_type: u8,
        player: u8,
        data: u64,
    },
    Win {
        /// Winning player, 2 for a draw
        player: u8,
        reason: u8,
        /// Reason recorded by a preceding match-kill, 0 if none
        match_reason: u32,
    },
    NewTurn {
        player: u8,
    },
    NewPhase {
        phase: u16,
    },
    Draw {
        player: u8,
        cards: Vec<DrawnCard>,
    },
    ShuffleDeck {
        player: u8,
        deck_size: usize,
    },
    Move {
        code: u32,
        from: Place,
        to: Place,
        position: u32,
        reason: u32,
        /// The card was an xyz material before the move
        detached: bool,
    },
    Damage {
        player: u8,
        amount: u32,
    },
    Recover {
        player: u8,
        amount: u32,
    },
    LpUpdate {
        player: u8,
        lp: u32,
    },
}

/// Decisions the engine can ask for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all = "PascalCase", rename_all_fields = "PascalCase")]
pub enum Request {
    SelectIdle {
        player: u8,
        summonable: Vec<CardRef>,
        special_summonable: Vec<CardRef>,
        repositionable: Vec<CardRef>,
        monster_settable: Vec<CardRef>,
        spell_settable: Vec<CardRef>,
        activatable: Vec<Activation>,
        can_battle_phase: bool,
        can_end_phase: bool,
        can_shuffle: bool,
    },
    SelectBattle {
        player: u8,
        activatable: Vec<Activation>,
        attackers: Vec<Attacker>,
        can_main_phase2: bool,
        can_end_phase: bool,
    },
    SelectEffectYn {
        player: u8,
        card: CardRef,
        position: u32,
        description: u64,
    },
    SelectYesNo {
        player: u8,
        description: u64,
    },
    SelectOption {
        player: u8,
        options: Vec<u64>,
    },
    SelectCard {
        player: u8,
        cancelable: bool,
        min: u32,
        max: u32,
        cards: Vec<CardRef>,
    },
    SelectChain {
        player: u8,
        forced: bool,
        hint_timing: u32,
        other_timing: u32,
        chains: Vec<Activation>,
    },
    SelectPosition {
        player: u8,
        code: u32,
        /// Allowed position flags
        positions: u32,
    },
}

/// Request discriminant, for logging and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    SelectIdle,
    SelectBattle,
    SelectEffectYn,
    SelectYesNo,
    SelectOption,
    SelectCard,
    SelectChain,
    SelectPosition,
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::SelectIdle { .. } => RequestKind::SelectIdle,
            Request::SelectBattle { .. } => RequestKind::SelectBattle,
            Request::SelectEffectYn { .. } => RequestKind::SelectEffectYn,
            Request::SelectYesNo { .. } => RequestKind::SelectYesNo,
            Request::SelectOption { .. } => RequestKind::SelectOption,
            Request::SelectCard { .. } => RequestKind::SelectCard,
            Request::SelectChain { .. } => RequestKind::SelectChain,
            Request::SelectPosition { .. } => RequestKind::SelectPosition,
        }
    }

    /// Player who must answer
    pub fn player(&self) -> u8 {
        match self {
            Request::SelectIdle { player, .. }
            | Request::SelectBattle { player, .. }
            | Request::SelectEffectYn { player, .. }
            | Request::SelectYesNo { player, .. }
            | Request::SelectOption { player, .. }
            | Request::SelectCard { player, .. }
            | Request::SelectChain { player, .. }
            | Request::SelectPosition { player, .. } => *player,
        }
    }
}

/// Main phase command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdleChoice {
    Summon(u32),
    SpecialSummon(u32),
    Reposition(u32),
    MonsterSet(u32),
    SpellSet(u32),
    Activate(u32),
    BattlePhase,
    EndPhase,
    Shuffle,
}

/// Battle phase command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleChoice {
    Activate(u32),
    Attack(u32),
    MainPhase2,
    EndPhase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardChoice {
    Cancel,
    /// Indices into the request's card list
    Select(Vec<u32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainChoice {
    Decline,
    /// Index into the request's chain list
    Chain(u32),
}

/// A host's decision for the outstanding request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    SelectIdle(IdleChoice),
    SelectBattle(BattleChoice),
    /// Answers both yes/no and effect yes/no requests
    YesNo(bool),
    SelectOption(u32),
    SelectCards(CardChoice),
    SelectChain(ChainChoice),
    /// A single position flag
    SelectPosition(u32),
}

/// Serialize a message to MessagePack bytes
pub fn serialize_msg(msg: &Msg) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::to_vec_named(msg)
}

/// Deserialize a message from MessagePack bytes
pub fn deserialize_msg(bytes: &[u8]) -> Result<Msg, rmp_serde::decode::Error> {
    rmp_serde::from_slice(bytes)
}

/// Serialize an answer to MessagePack bytes
pub fn serialize_answer(answer: &Answer) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::to_vec_named(answer)
}

/// Deserialize an answer from MessagePack bytes
pub fn deserialize_answer(bytes: &[u8]) -> Result<Answer, rmp_serde::decode::Error> {
    rmp_serde::from_slice(bytes)
}
