//! # duel-core
//!
//! Core types shared by the duel bridge:
//! - Duel options and bridge limits
//! - Cards, locations and board places
//! - Engine status codes
//! - Structured messages, requests and answers with their wire encoding
//! - Error taxonomy and host status codes

pub mod card;
pub mod error;
pub mod message;
pub mod options;
pub mod status;

pub use card::{CardData, NewCard, Place, location, position};
pub use error::{DuelError, Result, error_codes};
pub use message::{
    Activation, Answer, Attacker, BattleChoice, CardChoice, CardRef, ChainChoice, DrawnCard,
    Event, IdleChoice, Msg, Request, RequestKind,
};
pub use options::{BridgeConfig, DuelOptions};
pub use status::DuelStatus;
