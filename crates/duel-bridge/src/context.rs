//! Encode context: board knowledge the codec may query or update
//!
//! Some raw engine messages cannot be translated without knowing what is
//! already on the board. The codec asks through [`EncodeContext`]; every
//! method has an inert default so a context only overrides what it tracks.

use duel_core::{Place, location};
use std::collections::HashMap;
use tracing::debug;

/// Board queries and updates available to the codec
pub trait EncodeContext {
    /// Cards in a pile (deck, hand, grave, ...) of a controller
    fn pile_size(&self, _controller: u8, _location: u32) -> usize {
        0
    }

    /// A card moved between two places
    fn record_move(&mut self, _from: &Place, _to: &Place) {}

    /// The monster at `place` has at least one xyz material
    fn has_xyz_mat(&self, _place: &Place) -> bool {
        false
    }

    /// Where the material that was at `place` went, if it left
    fn get_xyz_left(&self, _place: &Place) -> Option<Place> {
        None
    }

    /// A material is being attached; commit it with the next flush
    fn xyz_mat_defer(&mut self, _place: &Place) {}

    /// Commit and return materials deferred since the last call
    fn take_deferred_xyz_mat(&mut self) -> Vec<Place> {
        Vec::new()
    }

    /// The material at `from` was detached to `to`
    fn xyz_left(&mut self, _from: &Place, _to: &Place) {}

    /// Reason recorded by the last match-kill message
    fn match_win_reason(&self) -> u32 {
        0
    }

    fn set_match_win_reason(&mut self, _reason: u32) {}
}

/// Context that tracks nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct InertContext;

impl EncodeContext for InertContext {}

/// Board state tracked by a session
#[derive(Debug, Default, Clone)]
pub struct BoardState {
    /// Card count per (controller, location)
    piles: HashMap<(u8, u32), usize>,
    /// Material count per (controller, monster zone sequence)
    materials: HashMap<(u8, u32), u32>,
    deferred: Vec<Place>,
    detached: HashMap<Place, Place>,
    match_win_reason: u32,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a card placed before the duel starts
    pub fn place_card(&mut self, controller: u8, location: u32) {
        *self.piles.entry((controller, location)).or_default() += 1;
    }

    /// Materials attached to the monster zone `sequence` of `controller`
    pub fn material_count(&self, controller: u8, sequence: u32) -> u32 {
        self.materials
            .get(&(controller, sequence))
            .copied()
            .unwrap_or(0)
    }
}

impl EncodeContext for BoardState {
    fn pile_size(&self, controller: u8, location: u32) -> usize {
        self.piles.get(&(controller, location)).copied().unwrap_or(0)
    }

    fn record_move(&mut self, from: &Place, to: &Place) {
        // materials are counted per host monster, not as a pile
        if !from.is_overlay() && from.location != 0 {
            if let Some(count) = self.piles.get_mut(&(from.controller, from.location)) {
                *count = count.saturating_sub(1);
            }
        }
        if !to.is_overlay() && to.location != 0 {
            *self.piles.entry((to.controller, to.location)).or_default() += 1;
        }
        // a monster leaving its zone takes no materials with it in our count
        if from.location == location::MZONE && to.location != location::MZONE {
            self.materials.remove(&(from.controller, from.sequence));
        }
    }

    fn has_xyz_mat(&self, place: &Place) -> bool {
        place.location == location::MZONE && self.material_count(place.controller, place.sequence) > 0
    }

    fn get_xyz_left(&self, place: &Place) -> Option<Place> {
        self.detached.get(place).copied()
    }

    fn xyz_mat_defer(&mut self, place: &Place) {
        self.deferred.push(*place);
    }

    fn take_deferred_xyz_mat(&mut self) -> Vec<Place> {
        let deferred = std::mem::take(&mut self.deferred);
        for place in &deferred {
            if let Some(host) = place.overlay_host() {
                *self
                    .materials
                    .entry((host.controller, host.sequence))
                    .or_default() += 1;
            }
        }
        if !deferred.is_empty() {
            debug!(count = deferred.len(), "Committed deferred xyz materials");
        }
        deferred
    }

    fn xyz_left(&mut self, from: &Place, to: &Place) {
        if let Some(host) = from.overlay_host() {
            if let Some(count) = self.materials.get_mut(&(host.controller, host.sequence)) {
                *count = count.saturating_sub(1);
            }
        }
        self.detached.insert(*from, *to);
    }

    fn match_win_reason(&self) -> u32 {
        self.match_win_reason
    }

    fn set_match_win_reason(&mut self, reason: u32) {
        self.match_win_reason = reason;
    }
}
