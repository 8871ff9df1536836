//! Codec boundary between raw engine frames and structured messages
//!
//! - [`DuelCodec`] - what the session needs from a codec
//! - [`OcgCodec`] - codec for the edo9300 ocgcore raw format

mod ocgcore;
mod reader;

pub use ocgcore::{OcgCodec, msg_type};
pub use reader::RawReader;

use crate::context::EncodeContext;
use duel_core::{Answer, Msg, Request};
use thiserror::Error;

/// Outcome of encoding one frame
#[derive(Debug, Clone, PartialEq)]
pub enum Encoded {
    /// A message to hand to the caller
    Keep(Msg),
    /// Valid but internal; nothing to surface
    Swallowed,
    /// Message type the codec does not know
    Unrecognized,
}

/// Faults while reading a single frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("frame truncated: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("empty frame")]
    Empty,

    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: u64 },
}

/// Translator between engine frames/responses and structured messages
pub trait DuelCodec {
    /// Turn one frame payload into at most one message
    fn encode_one(
        &self,
        ctx: &mut dyn EncodeContext,
        frame: &[u8],
    ) -> Result<Encoded, CodecError>;

    /// Raw response for `answer`, or `None` if it does not fit `request`
    fn decode_answer(&self, request: Option<&Request>, answer: &Answer) -> Option<Vec<u8>>;
}
