//! Scripted engine and raw message builders shared by the integration tests

#![allow(dead_code)]

use duel_bridge::codec::msg_type;
use duel_bridge::{DuelCallbacks, DuelEngine, EngineFactory, encode_frame};
use duel_core::{DuelOptions, DuelStatus, NewCard, location, position};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// What the scripted engine saw
#[derive(Debug, Default)]
pub struct EngineLog {
    pub options: Option<DuelOptions>,
    pub cards: Vec<NewCard>,
    pub started: bool,
    pub responses: Vec<Vec<u8>>,
    pub destroyed: usize,
}

/// Engine that replays a fixed list of (status, output buffer) steps
pub struct ScriptedEngine {
    steps: VecDeque<(DuelStatus, Vec<u8>)>,
    output: Vec<u8>,
    log: Arc<Mutex<EngineLog>>,
}

impl DuelEngine for ScriptedEngine {
    fn add_card(&mut self, card: &NewCard) {
        self.log.lock().unwrap().cards.push(card.clone());
    }

    fn start(&mut self) {
        self.log.lock().unwrap().started = true;
    }

    fn process(&mut self) -> DuelStatus {
        let (status, output) = self
            .steps
            .pop_front()
            .unwrap_or((DuelStatus::Ended, Vec::new()));
        self.output = output;
        status
    }

    fn pending_output(&mut self) -> Option<&[u8]> {
        (!self.output.is_empty()).then_some(self.output.as_slice())
    }

    fn set_response(&mut self, response: &[u8]) {
        self.log.lock().unwrap().responses.push(response.to_vec());
    }
}

impl Drop for ScriptedEngine {
    fn drop(&mut self) {
        self.log.lock().unwrap().destroyed += 1;
    }
}

#[derive(Default)]
pub struct ScriptedFactory {
    pub steps: Vec<(DuelStatus, Vec<u8>)>,
    pub log: Arc<Mutex<EngineLog>>,
    pub refuse: bool,
}

impl ScriptedFactory {
    pub fn new(steps: Vec<(DuelStatus, Vec<u8>)>) -> Self {
        Self {
            steps,
            ..Default::default()
        }
    }
}

impl EngineFactory for ScriptedFactory {
    type Engine = ScriptedEngine;

    fn create(
        &self,
        options: &DuelOptions,
        _callbacks: Arc<dyn DuelCallbacks>,
    ) -> Result<ScriptedEngine, String> {
        if self.refuse {
            return Err("duel creation failed".into());
        }
        self.log.lock().unwrap().options = Some(options.clone());
        Ok(ScriptedEngine {
            steps: self.steps.clone().into(),
            output: Vec::new(),
            log: Arc::clone(&self.log),
        })
    }
}

/// Little-endian raw message builder
pub struct Raw(pub Vec<u8>);

impl Raw {
    pub fn msg(kind: u8) -> Self {
        Raw(vec![kind])
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u64(mut self, v: u64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn card(self, code: u32, controller: u8, loc: u32, seq: u32) -> Self {
        self.u32(code).u8(controller).u8(loc as u8).u32(seq)
    }

    pub fn build(self) -> Vec<u8> {
        self.0
    }
}

/// Frame each payload and concatenate them into one engine buffer
pub fn batch(payloads: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = Vec::new();
    for payload in payloads {
        encode_frame(payload, &mut buf);
    }
    buf
}

pub const GEMINI_ELF: u32 = 69140098;
pub const MYSTICAL_ELF: u32 = 15025844;

pub fn deck_card(team: u8, code: u32, sequence: u32) -> NewCard {
    NewCard {
        team,
        duelist: 0,
        code,
        controller: team,
        location: location::DECK,
        sequence,
        position: position::FACEDOWN_DEFENSE,
    }
}

pub fn new_turn(player: u8) -> Vec<u8> {
    Raw::msg(msg_type::NEW_TURN).u8(player).build()
}

pub fn new_phase(phase: u16) -> Vec<u8> {
    Raw::msg(msg_type::NEW_PHASE).u16(phase).build()
}

pub fn draw(player: u8, codes: &[u32]) -> Vec<u8> {
    let mut raw = Raw::msg(msg_type::DRAW).u8(player).u32(codes.len() as u32);
    for &code in codes {
        raw = raw.u32(code).u32(position::FACEDOWN_ATTACK);
    }
    raw.build()
}

/// Idle command offering a summon and a set of `code` from hand, plus end phase
pub fn select_idle(player: u8, code: u32) -> Vec<u8> {
    Raw::msg(msg_type::SELECT_IDLECMD)
        .u8(player)
        .u32(1)
        .card(code, player, location::HAND, 0)
        .u32(0)
        .u32(0)
        .u32(1)
        .card(code, player, location::HAND, 0)
        .u32(0)
        .u32(0)
        .u8(0)
        .u8(1)
        .u8(0)
        .build()
}

pub fn select_yes_no(player: u8, description: u64) -> Vec<u8> {
    Raw::msg(msg_type::SELECT_YESNO)
        .u8(player)
        .u64(description)
        .build()
}

pub fn hint(hint_type: u8, player: u8, data: u64) -> Vec<u8> {
    Raw::msg(msg_type::HINT)
        .u8(hint_type)
        .u8(player)
        .u64(data)
        .build()
}
