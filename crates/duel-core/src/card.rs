//! Cards, locations and board places

use serde::{Deserialize, Serialize};

/// Location bit flags used by the engine
pub mod location {
    pub const DECK: u32 = 0x01;
    pub const HAND: u32 = 0x02;
    pub const MZONE: u32 = 0x04;
    pub const SZONE: u32 = 0x08;
    pub const GRAVE: u32 = 0x10;
    pub const REMOVED: u32 = 0x20;
    pub const EXTRA: u32 = 0x40;
    /// Xyz material attached to a monster zone
    pub const OVERLAY: u32 = 0x80;
    pub const ONFIELD: u32 = MZONE | SZONE;
}

/// Position bit flags used by the engine
pub mod position {
    pub const FACEUP_ATTACK: u32 = 0x1;
    pub const FACEDOWN_ATTACK: u32 = 0x2;
    pub const FACEUP_DEFENSE: u32 = 0x4;
    pub const FACEDOWN_DEFENSE: u32 = 0x8;
    pub const FACEUP: u32 = FACEUP_ATTACK | FACEUP_DEFENSE;
    pub const FACEDOWN: u32 = FACEDOWN_ATTACK | FACEDOWN_DEFENSE;
    pub const ATTACK: u32 = FACEUP_ATTACK | FACEDOWN_ATTACK;
    pub const DEFENSE: u32 = FACEUP_DEFENSE | FACEDOWN_DEFENSE;
}

/// Card type bit used to recognise link monsters
pub const TYPE_LINK: u32 = 0x0400_0000;

/// A single slot on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Place {
    pub controller: u8,
    pub location: u32,
    pub sequence: u32,
    /// Material index when `location` includes the overlay bit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_sequence: Option<u32>,
}

impl Place {
    pub fn new(controller: u8, location: u32, sequence: u32) -> Self {
        Self {
            controller,
            location,
            sequence,
            overlay_sequence: None,
        }
    }

    /// True if this place is an xyz material slot
    pub fn is_overlay(&self) -> bool {
        self.location & location::OVERLAY != 0
    }

    /// Monster zone holding this material, for overlay places
    pub fn overlay_host(&self) -> Option<Place> {
        self.is_overlay()
            .then(|| Place::new(self.controller, location::MZONE, self.sequence))
    }
}

/// A card added to a duel before it starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewCard {
    /// Team owning the card (0 or 1)
    pub team: u8,
    /// Duelist within the team, for tag duels
    #[serde(default)]
    pub duelist: u8,
    /// Card passcode
    pub code: u32,
    /// Player controlling the card
    pub controller: u8,
    /// Location flag (see [`location`])
    pub location: u32,
    pub sequence: u32,
    /// Position flag (see [`position`])
    pub position: u32,
}

/// Card stats handed to the engine on request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CardData {
    pub code: u32,
    pub alias: u32,
    #[serde(default)]
    pub setcodes: Vec<u16>,
    #[serde(rename = "Type")]
    pub card_type: u32,
    pub level: u32,
    pub attribute: u32,
    pub race: u64,
    pub attack: i32,
    pub defense: i32,
    pub lscale: u32,
    pub rscale: u32,
    pub link_marker: u32,
}

impl CardData {
    /// Blank stats for an unknown card, so the engine can still run
    pub fn blank(code: u32) -> Self {
        Self {
            code,
            ..Default::default()
        }
    }

    /// Build stats from a card database `datas` row.
    ///
    /// The `level` column packs the monster level in bits 0-7, the right
    /// pendulum scale in bits 16-23 and the left scale in bits 24-31. Link
    /// monsters store their marker mask in `def`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_db_row(
        code: u32,
        alias: u32,
        setcode: u64,
        card_type: u32,
        raw_level: u32,
        attribute: u32,
        race: u64,
        attack: i32,
        defense: i32,
    ) -> Self {
        let mut data = Self {
            code,
            alias,
            setcodes: unpack_setcodes(setcode),
            card_type,
            level: raw_level & 0xFF,
            attribute,
            race,
            attack,
            defense,
            lscale: (raw_level >> 24) & 0xFF,
            rscale: (raw_level >> 16) & 0xFF,
            link_marker: 0,
        };
        if card_type & TYPE_LINK != 0 {
            data.link_marker = defense as u32;
            data.defense = 0;
        }
        data
    }
}

/// The `setcode` column packs up to four 16-bit archetype codes
fn unpack_setcodes(setcode: u64) -> Vec<u16> {
    (0..4)
        .map(|i| ((setcode >> (i * 16)) & 0xFFFF) as u16)
        .filter(|code| *code != 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pendulum_level_unpacking() {
        // level 4, left scale 8, right scale 8
        let raw_level = (8 << 24) | (8 << 16) | 4;
        let data = CardData::from_db_row(1, 0, 0, 0x1000021, raw_level, 0x10, 0x1, 1800, 800);

        assert_eq!(data.level, 4);
        assert_eq!(data.lscale, 8);
        assert_eq!(data.rscale, 8);
        assert_eq!(data.defense, 800);
        assert_eq!(data.link_marker, 0);
    }

    #[test]
    fn test_link_marker_moves_out_of_defense() {
        let data = CardData::from_db_row(2, 0, 0, TYPE_LINK | 0x1, 2, 0x20, 0x2, 1400, 0x0A0);

        assert_eq!(data.level, 2);
        assert_eq!(data.link_marker, 0x0A0);
        assert_eq!(data.defense, 0);
    }

    #[test]
    fn test_setcode_unpacking() {
        let data = CardData::from_db_row(3, 0, 0x0001_0000_00AB, 0x1, 4, 0, 0, 0, 0);
        assert_eq!(data.setcodes, vec![0x00AB, 0x0001]);
    }

    #[test]
    fn test_overlay_host() {
        let material = Place {
            controller: 1,
            location: location::MZONE | location::OVERLAY,
            sequence: 2,
            overlay_sequence: Some(0),
        };
        assert!(material.is_overlay());
        assert_eq!(material.overlay_host(), Some(Place::new(1, location::MZONE, 2)));
        assert_eq!(Place::new(0, location::HAND, 0).overlay_host(), None);
    }
}
