//! Body zones and the cyclic adjacency ring that defines valid blocks.
//!
//! A block is only meaningful as a *pair* of zones, and only some pairs are
//! legal — the ring below is the single source of truth for "adjacent".

use serde::{Deserialize, Serialize};

/// One of the targetable/blockable body zones.
///
/// Ordered around the ring; [`BattleZone::ring_index`] and
/// [`BattleZone::are_adjacent`] depend on this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleZone {
    Head,
    Neck,
    Chest,
    Ribs,
    Stomach,
    Groin,
}

const RING: [BattleZone; 6] = [
    BattleZone::Head,
    BattleZone::Neck,
    BattleZone::Chest,
    BattleZone::Ribs,
    BattleZone::Stomach,
    BattleZone::Groin,
];

impl BattleZone {
    /// Case-insensitive parse of a zone name as it appears in the wire payload.
    pub fn parse_case_insensitive(s: &str) -> Option<Self> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "head" => Some(Self::Head),
            "neck" => Some(Self::Neck),
            "chest" => Some(Self::Chest),
            "ribs" => Some(Self::Ribs),
            "stomach" => Some(Self::Stomach),
            "groin" => Some(Self::Groin),
            _ => None,
        }
    }

    fn ring_index(self) -> usize {
        RING.iter().position(|z| *z == self).expect("zone is in ring")
    }

    /// Whether two zones are neighbors on the cyclic ring — the only shape a
    /// valid block pattern may take.
    pub fn are_adjacent(a: BattleZone, b: BattleZone) -> bool {
        if a == b {
            return false;
        }
        let n = RING.len();
        let ia = a.ring_index();
        let ib = b.ring_index();
        let diff = ia.abs_diff(ib);
        diff == 1 || diff == n - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(BattleZone::parse_case_insensitive("HEAD"), Some(BattleZone::Head));
        assert_eq!(BattleZone::parse_case_insensitive("Chest"), Some(BattleZone::Chest));
        assert_eq!(BattleZone::parse_case_insensitive("nope"), None);
    }

    #[test]
    fn ring_neighbors_are_adjacent() {
        assert!(BattleZone::are_adjacent(BattleZone::Head, BattleZone::Neck));
        assert!(BattleZone::are_adjacent(BattleZone::Neck, BattleZone::Chest));
    }

    #[test]
    fn ring_wraps_around() {
        // Head is first, Groin is last — they close the ring.
        assert!(BattleZone::are_adjacent(BattleZone::Head, BattleZone::Groin));
    }

    #[test]
    fn non_adjacent_pairs_are_not_adjacent() {
        assert!(!BattleZone::are_adjacent(BattleZone::Head, BattleZone::Chest));
        assert!(!BattleZone::are_adjacent(BattleZone::Head, BattleZone::Stomach));
    }

    #[test]
    fn a_zone_is_not_adjacent_to_itself() {
        assert!(!BattleZone::are_adjacent(BattleZone::Head, BattleZone::Head));
    }

    #[test]
    fn adjacency_is_symmetric() {
        for &a in RING.iter() {
            for &b in RING.iter() {
                assert_eq!(BattleZone::are_adjacent(a, b), BattleZone::are_adjacent(b, a));
            }
        }
    }
}
