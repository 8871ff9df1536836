//! # duel-bridge
//!
//! Session adapter between a duel engine's raw message stream and structured
//! duel messages.
//!
//! This crate provides:
//! - `FrameReader` for splitting the engine's length-prefixed output
//! - `DuelEngine` / `EngineFactory` / `DuelCallbacks` engine boundary traits
//! - `CardDatabase`, card stats from a `.cdb` file (feature `carddb`, on by default)
//! - `DuelCodec` and the default `OcgCodec`
//! - `EncodeContext` with `BoardState` board tracking
//! - `Session` (advance, drain, answer) and the `DuelRegistry` handle table
//! - `OcgEngineFactory`, a native ocgcore binding (feature `ocgcore`)

#[cfg(feature = "carddb")]
pub mod carddb;
pub mod codec;
pub mod context;
pub mod engine;
#[cfg(feature = "ocgcore")]
pub mod ffi;
pub mod frame;
pub mod registry;
pub mod session;
mod setcodes;

#[cfg(feature = "carddb")]
pub use carddb::{CardDatabase, CardDbError};
pub use codec::{CodecError, DuelCodec, Encoded, OcgCodec};
pub use context::{BoardState, EncodeContext, InertContext};
pub use engine::{CardLibrary, DuelCallbacks, DuelEngine, EngineFactory, EngineLogKind};
#[cfg(feature = "ocgcore")]
pub use ffi::{OcgDuel, OcgEngineFactory};
pub use frame::{FrameReader, Truncation, encode_frame};
pub use registry::{DuelHandle, DuelRegistry};
pub use session::{CycleStats, Session};
