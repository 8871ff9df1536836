//! Duel session: one engine, its message buffer and the outstanding request
//!
//! A session is driven by a single caller in strict alternation:
//! [`Session::advance`], then [`Session::next_message`] until it returns
//! `None`, then [`Session::apply_answer`] if the engine awaits a decision.

use crate::codec::{DuelCodec, Encoded, OcgCodec};
use crate::context::BoardState;
use crate::engine::{DuelCallbacks, DuelEngine, EngineFactory};
use crate::frame::FrameReader;
use duel_core::message::{deserialize_answer, serialize_msg};
use duel_core::{BridgeConfig, DuelError, DuelOptions, DuelStatus, NewCard, Request, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Frame accounting for one advance cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CycleStats {
    /// Complete frames read from the engine buffer
    pub frames: usize,
    /// Frames that produced a message
    pub produced: usize,
    pub swallowed: usize,
    /// Unknown message types, malformed bodies and unserializable messages
    pub unrecognized: usize,
    /// Bytes left behind by a truncated or oversized frame
    pub truncated_bytes: usize,
}

/// One live duel
pub struct Session<E: DuelEngine, C: DuelCodec = OcgCodec> {
    engine: Option<E>,
    codec: C,
    board: BoardState,
    /// Serialized messages of the current cycle
    messages: Vec<Vec<u8>>,
    cursor: usize,
    outstanding: Option<Request>,
    config: BridgeConfig,
    stats: CycleStats,
}

impl<E: DuelEngine, C: DuelCodec> Session<E, C> {
    /// Create a duel through `factory`
    pub fn create<F>(
        factory: &F,
        options: &DuelOptions,
        callbacks: Arc<dyn DuelCallbacks>,
        codec: C,
        config: BridgeConfig,
    ) -> Result<Self>
    where
        F: EngineFactory<Engine = E>,
    {
        let engine = factory.create(options, callbacks).map_err(|reason| {
            warn!(%reason, "Engine refused to create duel");
            DuelError::EngineUnavailable(reason)
        })?;

        info!(
            seed = ?options.seed,
            starting_lp = options.starting_lp,
            starting_draw_count = options.starting_draw_count,
            draw_count_per_turn = options.draw_count_per_turn,
            "Duel created"
        );

        Ok(Self {
            engine: Some(engine),
            codec,
            board: BoardState::new(),
            messages: Vec::new(),
            cursor: 0,
            outstanding: None,
            config,
            stats: CycleStats::default(),
        })
    }

    /// Release the engine. Later calls on this session fail with
    /// [`DuelError::SessionClosed`]; destroying twice does nothing.
    pub fn destroy(&mut self) {
        if let Some(engine) = self.engine.take() {
            drop(engine);
            self.messages.clear();
            self.cursor = 0;
            self.outstanding = None;
            info!("Duel destroyed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.engine.is_some()
    }

    fn engine_mut(&mut self) -> Result<&mut E> {
        self.engine.as_mut().ok_or(DuelError::SessionClosed)
    }

    /// Add a card before the duel starts
    pub fn add_card(&mut self, card: &NewCard) -> Result<()> {
        self.engine_mut()?.add_card(card);
        self.board.place_card(card.controller, card.location);
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.engine_mut()?.start();
        debug!("Duel started");
        Ok(())
    }

    /// Run one advance cycle and return the engine status unchanged.
    ///
    /// The message buffer is rebuilt from scratch. A frame the codec cannot
    /// read is dropped and the rest of the batch still goes through.
    pub fn advance(&mut self) -> Result<DuelStatus> {
        let Self {
            engine,
            codec,
            board,
            messages,
            cursor,
            outstanding,
            config,
            stats,
        } = self;
        let engine = engine.as_mut().ok_or(DuelError::SessionClosed)?;

        messages.clear();
        *cursor = 0;
        *stats = CycleStats::default();

        let status = engine.process();
        if !status.has_output() {
            debug!(?status, "Advance cycle produced no output");
            return Ok(status);
        }

        let Some(buf) = engine.pending_output() else {
            return Ok(status);
        };

        let mut frames = FrameReader::new(buf, config.max_frame_len);
        for frame in frames.by_ref() {
            stats.frames += 1;
            match codec.encode_one(board, frame) {
                Ok(Encoded::Keep(msg)) => match serialize_msg(&msg) {
                    Ok(bytes) => {
                        if let Some(request) = msg.request() {
                            *outstanding = Some(request.clone());
                        }
                        messages.push(bytes);
                        stats.produced += 1;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize message, dropping it");
                        stats.unrecognized += 1;
                    }
                },
                Ok(Encoded::Swallowed) => stats.swallowed += 1,
                Ok(Encoded::Unrecognized) => stats.unrecognized += 1,
                Err(e) => {
                    warn!(error = %e, frame_len = frame.len(), "Dropping malformed frame");
                    stats.unrecognized += 1;
                }
            }
        }
        stats.truncated_bytes = buf.len() - frames.consumed();

        debug!(
            ?status,
            frames = stats.frames,
            produced = stats.produced,
            swallowed = stats.swallowed,
            unrecognized = stats.unrecognized,
            truncated_bytes = stats.truncated_bytes,
            "Advance cycle complete"
        );
        Ok(status)
    }

    /// Next unread message of the current cycle, or `None` once drained
    pub fn next_message(&mut self) -> Result<Option<&[u8]>> {
        if !self.is_open() {
            return Err(DuelError::SessionClosed);
        }
        let Some(msg) = self.messages.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        Ok(Some(msg.as_slice()))
    }

    /// Messages not yet drained this cycle
    pub fn pending_messages(&self) -> usize {
        self.messages.len() - self.cursor
    }

    /// Decode a serialized answer against the outstanding request and hand
    /// the raw response to the engine.
    ///
    /// The outstanding request is kept; only the next request-bearing
    /// message replaces it.
    pub fn apply_answer(&mut self, bytes: &[u8]) -> Result<()> {
        let engine = self.engine.as_mut().ok_or(DuelError::SessionClosed)?;
        if bytes.is_empty() {
            return Err(DuelError::EmptyAnswer);
        }
        if bytes.len() > self.config.max_answer_len {
            return Err(DuelError::AnswerTooLarge {
                len: bytes.len(),
                max: self.config.max_answer_len,
            });
        }

        let answer = deserialize_answer(bytes).map_err(|e| {
            debug!(error = %e, len = bytes.len(), "Answer failed to decode");
            DuelError::MalformedAnswer(e.to_string())
        })?;

        let response = self
            .codec
            .decode_answer(self.outstanding.as_ref(), &answer)
            .filter(|response| !response.is_empty())
            .ok_or_else(|| {
                let reason = match &self.outstanding {
                    Some(request) => format!("{:?} cannot take {:?}", request.kind(), answer),
                    None => "no outstanding request".to_string(),
                };
                warn!(%reason, "Rejected answer");
                DuelError::InapplicableAnswer(reason)
            })?;

        engine.set_response(&response);
        debug!(len = response.len(), "Response submitted to engine");
        Ok(())
    }

    /// Most recent request-bearing message, if any
    pub fn outstanding_request(&self) -> Option<&Request> {
        self.outstanding.as_ref()
    }

    /// Frame accounting of the last advance cycle
    pub fn last_cycle(&self) -> CycleStats {
        self.stats
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }
}

impl<E: DuelEngine, C: DuelCodec> Drop for Session<E, C> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<E: DuelEngine, C: DuelCodec> std::fmt::Debug for Session<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("open", &self.is_open())
            .field("messages", &self.messages.len())
            .field("cursor", &self.cursor)
            .field("outstanding", &self.outstanding.as_ref().map(Request::kind))
            .field("stats", &self.stats)
            .finish()
    }
}
