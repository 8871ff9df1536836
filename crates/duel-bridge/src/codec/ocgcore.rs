//! Codec for the edo9300 ocgcore raw message format
//!
//! A frame payload is a one-byte message type followed by little-endian
//! fields. Responses are small little-endian blobs whose layout depends on the
//! request being answered.

use super::{CodecError, DuelCodec, Encoded, RawReader};
use crate::context::EncodeContext;
use duel_core::{
    Activation, Answer, Attacker, BattleChoice, CardChoice, CardRef, ChainChoice, DrawnCard,
    Event, IdleChoice, Msg, Place, Request, location,
};
use tracing::{debug, trace};

/// Raw message type bytes
pub mod msg_type {
    pub const RETRY: u8 = 1;
    pub const HINT: u8 = 2;
    pub const WAITING: u8 = 3;
    pub const START: u8 = 4;
    pub const WIN: u8 = 5;
    pub const SELECT_BATTLECMD: u8 = 10;
    pub const SELECT_IDLECMD: u8 = 11;
    pub const SELECT_EFFECTYN: u8 = 12;
    pub const SELECT_YESNO: u8 = 13;
    pub const SELECT_OPTION: u8 = 14;
    pub const SELECT_CARD: u8 = 15;
    pub const SELECT_CHAIN: u8 = 16;
    pub const SELECT_POSITION: u8 = 19;
    pub const SHUFFLE_DECK: u8 = 32;
    pub const NEW_TURN: u8 = 40;
    pub const NEW_PHASE: u8 = 41;
    pub const MOVE: u8 = 50;
    pub const DRAW: u8 = 90;
    pub const DAMAGE: u8 = 91;
    pub const RECOVER: u8 = 92;
    pub const LPUPDATE: u8 = 94;
    pub const MATCH_KILL: u8 = 170;
}

// Entry sizes, used to bound list counts before reading them
const CARD_LEN: usize = 10;
const REPOS_LEN: usize = 7;
const ACTIVATION_LEN: usize = 19;
const ATTACKER_LEN: usize = 8;
const LOC_CARD_LEN: usize = 14;
const CHAIN_LEN: usize = 23;
const DRAWN_LEN: usize = 8;

// Idle and battle command response codes
const IDLE_SUMMON: u32 = 0;
const IDLE_SPSUMMON: u32 = 1;
const IDLE_REPOSITION: u32 = 2;
const IDLE_MSET: u32 = 3;
const IDLE_SSET: u32 = 4;
const IDLE_ACTIVATE: u32 = 5;
const IDLE_BATTLE_PHASE: u32 = 6;
const IDLE_END_PHASE: u32 = 7;
const IDLE_SHUFFLE: u32 = 8;
const BATTLE_ACTIVATE: u32 = 0;
const BATTLE_ATTACK: u32 = 1;
const BATTLE_MAIN2: u32 = 2;
const BATTLE_END_PHASE: u32 = 3;

/// Codec for ocgcore frames and responses
#[derive(Debug, Default, Clone, Copy)]
pub struct OcgCodec;

impl OcgCodec {
    pub fn new() -> Self {
        Self
    }
}

impl DuelCodec for OcgCodec {
    fn encode_one(
        &self,
        ctx: &mut dyn EncodeContext,
        frame: &[u8],
    ) -> Result<Encoded, CodecError> {
        let mut r = RawReader::new(frame);
        let kind = r.u8().map_err(|_| CodecError::Empty)?;

        // materials attached by a run of moves are committed once it ends
        if kind != msg_type::MOVE {
            ctx.take_deferred_xyz_mat();
        }

        let msg = match kind {
            msg_type::RETRY => Msg::Event(Event::Retry),
            msg_type::HINT => Msg::Event(Event::Hint {
                hint_type: r.u8()?,
                player: r.u8()?,
                data: r.u64()?,
            }),
            msg_type::WAITING | msg_type::START => return Ok(Encoded::Swallowed),
            msg_type::MATCH_KILL => {
                ctx.set_match_win_reason(r.u32()?);
                return Ok(Encoded::Swallowed);
            }
            msg_type::WIN => Msg::Event(Event::Win {
                player: r.u8()?,
                reason: r.u8()?,
                match_reason: ctx.match_win_reason(),
            }),
            msg_type::SELECT_IDLECMD => Msg::Request(read_select_idle(&mut r)?),
            msg_type::SELECT_BATTLECMD => Msg::Request(read_select_battle(&mut r)?),
            msg_type::SELECT_EFFECTYN => {
                let player = read_player(&mut r)?;
                let code = r.u32()?;
                let (place, position) = r.loc_info()?;
                Msg::Request(Request::SelectEffectYn {
                    player,
                    card: CardRef { code, place },
                    position,
                    description: r.u64()?,
                })
            }
            msg_type::SELECT_YESNO => Msg::Request(Request::SelectYesNo {
                player: read_player(&mut r)?,
                description: r.u64()?,
            }),
            msg_type::SELECT_OPTION => {
                let player = read_player(&mut r)?;
                let count = r.u8()?;
                let options = (0..count).map(|_| r.u64()).collect::<Result<_, _>>()?;
                Msg::Request(Request::SelectOption { player, options })
            }
            msg_type::SELECT_CARD => {
                let player = read_player(&mut r)?;
                let cancelable = r.bool()?;
                let min = r.u32()?;
                let max = r.u32()?;
                let count = r.count(LOC_CARD_LEN)?;
                let cards = (0..count)
                    .map(|_| read_loc_card(&mut r))
                    .collect::<Result<_, _>>()?;
                Msg::Request(Request::SelectCard {
                    player,
                    cancelable,
                    min,
                    max,
                    cards,
                })
            }
            msg_type::SELECT_CHAIN => {
                let player = read_player(&mut r)?;
                let _spe_count = r.u8()?;
                let forced = r.bool()?;
                let hint_timing = r.u32()?;
                let other_timing = r.u32()?;
                let count = r.count(CHAIN_LEN)?;
                let chains = (0..count)
                    .map(|_| {
                        let card = read_loc_card(&mut r)?;
                        Ok(Activation {
                            card,
                            description: r.u64()?,
                            client_mode: r.u8()?,
                        })
                    })
                    .collect::<Result<_, CodecError>>()?;
                Msg::Request(Request::SelectChain {
                    player,
                    forced,
                    hint_timing,
                    other_timing,
                    chains,
                })
            }
            msg_type::SELECT_POSITION => Msg::Request(Request::SelectPosition {
                player: read_player(&mut r)?,
                code: r.u32()?,
                positions: r.u8()? as u32,
            }),
            msg_type::SHUFFLE_DECK => {
                let player = read_player(&mut r)?;
                Msg::Event(Event::ShuffleDeck {
                    player,
                    deck_size: ctx.pile_size(player, location::DECK),
                })
            }
            msg_type::NEW_TURN => Msg::Event(Event::NewTurn {
                player: read_player(&mut r)?,
            }),
            msg_type::NEW_PHASE => Msg::Event(Event::NewPhase { phase: r.u16()? }),
            msg_type::MOVE => Msg::Event(read_move(ctx, &mut r)?),
            msg_type::DRAW => {
                let player = read_player(&mut r)?;
                let count = r.count(DRAWN_LEN)?;
                let mut cards = Vec::with_capacity(count);
                for _ in 0..count {
                    cards.push(DrawnCard {
                        code: r.u32()?,
                        position: r.u32()?,
                    });
                    ctx.record_move(
                        &Place::new(player, location::DECK, 0),
                        &Place::new(player, location::HAND, 0),
                    );
                }
                Msg::Event(Event::Draw { player, cards })
            }
            msg_type::DAMAGE => Msg::Event(Event::Damage {
                player: read_player(&mut r)?,
                amount: r.u32()?,
            }),
            msg_type::RECOVER => Msg::Event(Event::Recover {
                player: read_player(&mut r)?,
                amount: r.u32()?,
            }),
            msg_type::LPUPDATE => Msg::Event(Event::LpUpdate {
                player: read_player(&mut r)?,
                lp: r.u32()?,
            }),
            other => {
                trace!(msg_type = other, len = frame.len(), "Unrecognized engine message");
                return Ok(Encoded::Unrecognized);
            }
        };

        if r.remaining() > 0 {
            debug!(msg_type = kind, extra = r.remaining(), "Ignoring trailing bytes in frame");
        }
        Ok(Encoded::Keep(msg))
    }

    fn decode_answer(&self, request: Option<&Request>, answer: &Answer) -> Option<Vec<u8>> {
        let Some(request) = request else {
            debug!("Answer received with no outstanding request");
            return None;
        };

        let response = match (request, answer) {
            (
                Request::SelectIdle {
                    summonable,
                    special_summonable,
                    repositionable,
                    monster_settable,
                    spell_settable,
                    activatable,
                    can_battle_phase,
                    can_end_phase,
                    can_shuffle,
                    ..
                },
                Answer::SelectIdle(choice),
            ) => match *choice {
                IdleChoice::Summon(i) => command(IDLE_SUMMON, i, summonable.len()),
                IdleChoice::SpecialSummon(i) => command(IDLE_SPSUMMON, i, special_summonable.len()),
                IdleChoice::Reposition(i) => command(IDLE_REPOSITION, i, repositionable.len()),
                IdleChoice::MonsterSet(i) => command(IDLE_MSET, i, monster_settable.len()),
                IdleChoice::SpellSet(i) => command(IDLE_SSET, i, spell_settable.len()),
                IdleChoice::Activate(i) => command(IDLE_ACTIVATE, i, activatable.len()),
                IdleChoice::BattlePhase => can_battle_phase.then(|| i32_response(IDLE_BATTLE_PHASE as i32)),
                IdleChoice::EndPhase => can_end_phase.then(|| i32_response(IDLE_END_PHASE as i32)),
                IdleChoice::Shuffle => can_shuffle.then(|| i32_response(IDLE_SHUFFLE as i32)),
            },
            (
                Request::SelectBattle {
                    activatable,
                    attackers,
                    can_main_phase2,
                    can_end_phase,
                    ..
                },
                Answer::SelectBattle(choice),
            ) => match *choice {
                BattleChoice::Activate(i) => command(BATTLE_ACTIVATE, i, activatable.len()),
                BattleChoice::Attack(i) => command(BATTLE_ATTACK, i, attackers.len()),
                BattleChoice::MainPhase2 => can_main_phase2.then(|| i32_response(BATTLE_MAIN2 as i32)),
                BattleChoice::EndPhase => can_end_phase.then(|| i32_response(BATTLE_END_PHASE as i32)),
            },
            (Request::SelectEffectYn { .. } | Request::SelectYesNo { .. }, Answer::YesNo(yes)) => {
                Some(i32_response(*yes as i32))
            }
            (Request::SelectOption { options, .. }, Answer::SelectOption(i)) => {
                in_range(*i, options.len()).then(|| i32_response(*i as i32))
            }
            (
                Request::SelectCard {
                    cancelable,
                    min,
                    max,
                    cards,
                    ..
                },
                Answer::SelectCards(choice),
            ) => match choice {
                CardChoice::Cancel => cancelable.then(|| i32_response(-1)),
                CardChoice::Select(indices) => card_selection(indices, *min, *max, cards.len()),
            },
            (Request::SelectChain { forced, chains, .. }, Answer::SelectChain(choice)) => match *choice {
                ChainChoice::Decline => (!forced).then(|| i32_response(-1)),
                ChainChoice::Chain(i) => in_range(i, chains.len()).then(|| i32_response(i as i32)),
            },
            (Request::SelectPosition { positions, .. }, Answer::SelectPosition(position)) => {
                let single = position.count_ones() == 1;
                (single && positions & position != 0).then(|| i32_response(*position as i32))
            }
            _ => None,
        };

        if response.is_none() {
            debug!(request = ?request.kind(), ?answer, "Answer does not fit outstanding request");
        }
        response
    }
}

fn read_player(r: &mut RawReader<'_>) -> Result<u8, CodecError> {
    let player = r.u8()?;
    if player > 1 {
        return Err(CodecError::InvalidValue {
            field: "player",
            value: player as u64,
        });
    }
    Ok(player)
}

/// code u32, controller u8, location u8, sequence u32 (or u8 when `short_seq`)
fn read_card(r: &mut RawReader<'_>, short_seq: bool) -> Result<CardRef, CodecError> {
    let code = r.u32()?;
    let controller = r.u8()?;
    let location = r.u8()? as u32;
    let sequence = if short_seq { r.u8()? as u32 } else { r.u32()? };
    Ok(CardRef {
        code,
        place: Place::new(controller, location, sequence),
    })
}

fn read_loc_card(r: &mut RawReader<'_>) -> Result<CardRef, CodecError> {
    let code = r.u32()?;
    let (place, _) = r.loc_info()?;
    Ok(CardRef { code, place })
}

fn read_cards(
    r: &mut RawReader<'_>,
    entry_len: usize,
    short_seq: bool,
) -> Result<Vec<CardRef>, CodecError> {
    let count = r.count(entry_len)?;
    (0..count).map(|_| read_card(r, short_seq)).collect()
}

fn read_activations(r: &mut RawReader<'_>) -> Result<Vec<Activation>, CodecError> {
    let count = r.count(ACTIVATION_LEN)?;
    (0..count)
        .map(|_| {
            let card = read_card(r, false)?;
            Ok(Activation {
                card,
                description: r.u64()?,
                client_mode: r.u8()?,
            })
        })
        .collect()
}

fn read_select_idle(r: &mut RawReader<'_>) -> Result<Request, CodecError> {
    Ok(Request::SelectIdle {
        player: read_player(r)?,
        summonable: read_cards(r, CARD_LEN, false)?,
        special_summonable: read_cards(r, CARD_LEN, false)?,
        repositionable: read_cards(r, REPOS_LEN, true)?,
        monster_settable: read_cards(r, CARD_LEN, false)?,
        spell_settable: read_cards(r, CARD_LEN, false)?,
        activatable: read_activations(r)?,
        can_battle_phase: r.bool()?,
        can_end_phase: r.bool()?,
        can_shuffle: r.bool()?,
    })
}

fn read_select_battle(r: &mut RawReader<'_>) -> Result<Request, CodecError> {
    let player = read_player(r)?;
    let activatable = read_activations(r)?;
    let count = r.count(ATTACKER_LEN)?;
    let attackers = (0..count)
        .map(|_| {
            let card = read_card(r, true)?;
            Ok(Attacker {
                card,
                can_direct_attack: r.bool()?,
            })
        })
        .collect::<Result<_, CodecError>>()?;
    Ok(Request::SelectBattle {
        player,
        activatable,
        attackers,
        can_main_phase2: r.bool()?,
        can_end_phase: r.bool()?,
    })
}

fn read_move(ctx: &mut dyn EncodeContext, r: &mut RawReader<'_>) -> Result<Event, CodecError> {
    let code = r.u32()?;
    let (from, _) = r.loc_info()?;
    let (to, position) = r.loc_info()?;
    let reason = r.u32()?;

    let detached = from.is_overlay();
    if detached {
        ctx.xyz_left(&from, &to);
    }
    if to.is_overlay() {
        ctx.xyz_mat_defer(&to);
    }
    ctx.record_move(&from, &to);

    Ok(Event::Move {
        code,
        from,
        to,
        position,
        reason,
        detached,
    })
}

fn in_range(index: u32, len: usize) -> bool {
    (index as usize) < len
}

fn i32_response(value: i32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Command response: index in the high half, command code in the low half
fn command(code: u32, index: u32, len: usize) -> Option<Vec<u8>> {
    if !in_range(index, len) || index > u16::MAX as u32 {
        return None;
    }
    Some(((index << 16) | code).to_le_bytes().to_vec())
}

/// `0i32`, count u32, then each index as u32
fn card_selection(indices: &[u32], min: u32, max: u32, len: usize) -> Option<Vec<u8>> {
    let count = indices.len() as u32;
    if count < min || count > max {
        return None;
    }
    let mut seen = vec![false; len];
    for &i in indices {
        let slot = seen.get_mut(i as usize)?;
        if *slot {
            return None;
        }
        *slot = true;
    }

    let mut out = Vec::with_capacity(8 + indices.len() * 4);
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    for &i in indices {
        out.extend_from_slice(&i.to_le_bytes());
    }
    Some(out)
}
