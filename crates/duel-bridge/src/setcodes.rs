//! Zero-terminated setcode arrays handed across the engine boundary
//!
//! The engine reads setcodes until it sees a 0, and hands the pointer back
//! once it is done with the card. The allocation length is recovered from the
//! terminator, so no 0 may appear before it.

#![cfg_attr(not(feature = "ocgcore"), allow(dead_code))]

use std::ptr;

/// Leak `codes` as a zero-terminated array, skipping zero entries
pub(crate) fn leak_terminated(codes: &[u16]) -> *mut u16 {
    let mut terminated: Vec<u16> = codes.iter().copied().filter(|code| *code != 0).collect();
    terminated.push(0);
    Box::into_raw(terminated.into_boxed_slice()) as *mut u16
}

/// Length of a terminated array, terminator included
///
/// # Safety
/// `codes` must come from [`leak_terminated`] and not be freed yet.
unsafe fn terminated_len(codes: *const u16) -> usize {
    let mut len = 0;
    while unsafe { *codes.add(len) } != 0 {
        len += 1;
    }
    len + 1
}

/// Free an array from [`leak_terminated`]; null is ignored
///
/// # Safety
/// `codes` must be null or come from [`leak_terminated`], and is freed at
/// most once.
pub(crate) unsafe fn free_terminated(codes: *mut u16) {
    if codes.is_null() {
        return;
    }
    unsafe {
        let len = terminated_len(codes);
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(codes, len)));
    }
}
