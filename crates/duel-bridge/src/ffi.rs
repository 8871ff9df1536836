//! Binding to the native ocgcore library
//!
//! Enabled with the `ocgcore` feature. The engine's callbacks take an untyped
//! payload pointer; here that pointer is always a boxed
//! `Arc<dyn DuelCallbacks>` owned by the [`OcgDuel`] it was registered with.

use crate::engine::{DuelCallbacks, DuelEngine, EngineFactory, EngineLogKind};
use crate::setcodes;
use duel_core::{DuelOptions, DuelStatus, NewCard};
use std::ffi::{CStr, c_char, c_int, c_void};
use std::ptr;
use std::sync::Arc;
use tracing::{debug, error};

type OcgDuelHandle = *mut c_void;

#[repr(C)]
struct OcgCardData {
    code: u32,
    alias: u32,
    setcodes: *mut u16,
    card_type: u32,
    level: u32,
    attribute: u32,
    race: u64,
    attack: i32,
    defense: i32,
    lscale: u32,
    rscale: u32,
    link_marker: u32,
}

#[repr(C)]
struct OcgPlayer {
    starting_lp: u32,
    starting_draw_count: u32,
    draw_count_per_turn: u32,
}

type DataReader = unsafe extern "C" fn(*mut c_void, u32, *mut OcgCardData);
type ScriptReader = unsafe extern "C" fn(*mut c_void, OcgDuelHandle, *const c_char) -> c_int;
type LogHandler = unsafe extern "C" fn(*mut c_void, *const c_char, c_int);
type DataReaderDone = unsafe extern "C" fn(*mut c_void, *mut OcgCardData);

#[repr(C)]
struct OcgDuelOptions {
    seed: [u64; 4],
    flags: u64,
    team1: OcgPlayer,
    team2: OcgPlayer,
    card_reader: DataReader,
    payload1: *mut c_void,
    script_reader: ScriptReader,
    payload2: *mut c_void,
    log_handler: LogHandler,
    payload3: *mut c_void,
    card_reader_done: DataReaderDone,
    payload4: *mut c_void,
    enable_unsafe_libraries: u8,
}

#[repr(C)]
struct OcgNewCardInfo {
    team: u8,
    duelist: u8,
    code: u32,
    con: u8,
    loc: u32,
    seq: u32,
    pos: u32,
}

const DUEL_CREATION_SUCCESS: c_int = 0;

#[link(name = "ocgcore")]
unsafe extern "C" {
    fn OCG_CreateDuel(out: *mut OcgDuelHandle, options: *const OcgDuelOptions) -> c_int;
    fn OCG_DestroyDuel(duel: OcgDuelHandle);
    fn OCG_DuelNewCard(duel: OcgDuelHandle, info: *const OcgNewCardInfo);
    fn OCG_StartDuel(duel: OcgDuelHandle);
    fn OCG_DuelProcess(duel: OcgDuelHandle) -> c_int;
    fn OCG_DuelGetMessage(duel: OcgDuelHandle, length: *mut u32) -> *mut c_void;
    fn OCG_DuelSetResponse(duel: OcgDuelHandle, buffer: *const c_void, length: u32);
    fn OCG_LoadScript(
        duel: OcgDuelHandle,
        buffer: *const c_char,
        length: u32,
        name: *const c_char,
    ) -> c_int;
}

type Payload = Arc<dyn DuelCallbacks>;

/// # Safety
/// `payload` must point at a live `Payload`.
unsafe fn callbacks<'a>(payload: *mut c_void) -> &'a dyn DuelCallbacks {
    unsafe { &**(payload as *const Payload) }
}

unsafe extern "C" fn read_card(payload: *mut c_void, code: u32, out: *mut OcgCardData) {
    let card = unsafe { callbacks(payload) }.read_card(code);

    // released in `read_card_done`
    let setcodes = setcodes::leak_terminated(&card.setcodes);

    unsafe {
        out.write(OcgCardData {
            code: card.code,
            alias: card.alias,
            setcodes,
            card_type: card.card_type,
            level: card.level,
            attribute: card.attribute,
            race: card.race,
            attack: card.attack,
            defense: card.defense,
            lscale: card.lscale,
            rscale: card.rscale,
            link_marker: card.link_marker,
        });
    }
}

unsafe extern "C" fn read_card_done(_payload: *mut c_void, data: *mut OcgCardData) {
    unsafe {
        setcodes::free_terminated((*data).setcodes);
        (*data).setcodes = ptr::null_mut();
    }
}

unsafe extern "C" fn read_script(
    payload: *mut c_void,
    duel: OcgDuelHandle,
    name: *const c_char,
) -> c_int {
    let name_cstr = unsafe { CStr::from_ptr(name) };
    let Ok(name_str) = name_cstr.to_str() else {
        error!("Script name is not UTF-8");
        return 0;
    };
    let Some(source) = unsafe { callbacks(payload) }.read_script(name_str) else {
        return 0;
    };
    let Ok(len) = u32::try_from(source.len()) else {
        error!(name = name_str, "Script too large to load");
        return 0;
    };
    unsafe { OCG_LoadScript(duel, source.as_ptr() as *const c_char, len, name) }
}

unsafe extern "C" fn log_handler(payload: *mut c_void, message: *const c_char, kind: c_int) {
    let message = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    unsafe { callbacks(payload) }.log(&message, EngineLogKind::from_raw(kind));
}

fn player(options: &DuelOptions) -> OcgPlayer {
    OcgPlayer {
        starting_lp: options.starting_lp,
        starting_draw_count: options.starting_draw_count,
        draw_count_per_turn: options.draw_count_per_turn,
    }
}

/// Creates duels in the native library
#[derive(Debug, Default, Clone, Copy)]
pub struct OcgEngineFactory;

impl EngineFactory for OcgEngineFactory {
    type Engine = OcgDuel;

    fn create(
        &self,
        options: &DuelOptions,
        callbacks: Arc<dyn DuelCallbacks>,
    ) -> Result<OcgDuel, String> {
        let payload: Box<Payload> = Box::new(callbacks);
        let payload_ptr = &*payload as *const Payload as *mut c_void;

        let raw_options = OcgDuelOptions {
            seed: options.seed,
            flags: options.flags,
            team1: player(options),
            team2: player(options),
            card_reader: read_card,
            payload1: payload_ptr,
            script_reader: read_script,
            payload2: payload_ptr,
            log_handler,
            payload3: payload_ptr,
            card_reader_done: read_card_done,
            payload4: payload_ptr,
            enable_unsafe_libraries: 0,
        };

        let mut handle: OcgDuelHandle = ptr::null_mut();
        let status = unsafe { OCG_CreateDuel(&mut handle, &raw_options) };
        if status != DUEL_CREATION_SUCCESS || handle.is_null() {
            return Err(format!("OCG_CreateDuel returned {}", status));
        }

        debug!("Native duel created");
        Ok(OcgDuel {
            handle,
            _payload: payload,
        })
    }
}

/// A duel owned by the native library
pub struct OcgDuel {
    handle: OcgDuelHandle,
    /// Referenced by the engine through its callback payloads
    _payload: Box<Payload>,
}

// SAFETY: a native duel has no thread affinity, and the session drives it
// from one thread at a time.
unsafe impl Send for OcgDuel {}

impl DuelEngine for OcgDuel {
    fn add_card(&mut self, card: &NewCard) {
        let info = OcgNewCardInfo {
            team: card.team,
            duelist: card.duelist,
            code: card.code,
            con: card.controller,
            loc: card.location,
            seq: card.sequence,
            pos: card.position,
        };
        unsafe { OCG_DuelNewCard(self.handle, &info) };
    }

    fn start(&mut self) {
        unsafe { OCG_StartDuel(self.handle) };
    }

    fn process(&mut self) -> DuelStatus {
        let raw = unsafe { OCG_DuelProcess(self.handle) };
        DuelStatus::from_raw(raw).unwrap_or_else(|| {
            error!(raw, "Unknown duel status, treating as ended");
            DuelStatus::Ended
        })
    }

    fn pending_output(&mut self) -> Option<&[u8]> {
        let mut len = 0u32;
        let buf = unsafe { OCG_DuelGetMessage(self.handle, &mut len) };
        if buf.is_null() || len == 0 {
            return None;
        }
        // valid until the next call into the duel, which needs `&mut self`
        Some(unsafe { std::slice::from_raw_parts(buf as *const u8, len as usize) })
    }

    fn set_response(&mut self, response: &[u8]) {
        let Ok(len) = u32::try_from(response.len()) else {
            error!(len = response.len(), "Response too large for engine");
            return;
        };
        unsafe { OCG_DuelSetResponse(self.handle, response.as_ptr() as *const c_void, len) };
    }
}

impl Drop for OcgDuel {
    fn drop(&mut self) {
        unsafe { OCG_DestroyDuel(self.handle) };
        debug!("Native duel destroyed");
    }
}
