//! Battle state machine data (§3): phase, domain state, and the full record
//! persisted by the state store.

use serde::{Deserialize, Serialize};

use crate::ids::{BattleId, MatchId, PlayerId};
use crate::ruleset::Ruleset;
use crate::stats::PlayerStats;

/// Discrete battle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    ArenaOpen,
    TurnOpen,
    Resolving,
    Ended,
}

/// Why a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Normal,
    DoubleForfeit,
}

/// One side's frozen-at-init stats plus mutable current HP.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatantState {
    pub player_id: PlayerId,
    pub stats: PlayerStats,
    pub hp_max: f64,
    pub current_hp: f64,
}

impl CombatantState {
    pub fn is_dead(&self) -> bool {
        self.current_hp <= 0.0
    }
}

/// The full battle record as persisted by the state store — everything in
/// §3's "Battle" data model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleRecord {
    pub battle_id: BattleId,
    pub match_id: MatchId,
    pub ruleset: Ruleset,
    pub phase: Phase,
    pub turn_index: u64,
    /// Unix-ms deadline; meaningless when `phase` is `ArenaOpen` or `Ended`.
    pub deadline_utc_ms: i64,
    pub no_action_streak_both: u32,
    pub last_resolved_turn_index: u64,
    pub player_a: CombatantState,
    pub player_b: CombatantState,
    pub version: u64,
    pub end_reason: Option<EndReason>,
    pub winner_player_id: Option<PlayerId>,
}

impl BattleRecord {
    /// Build the initial `ArenaOpen` record for a freshly-created battle
    /// (§4.4 step 3).
    pub fn new_arena_open(
        battle_id: BattleId,
        match_id: MatchId,
        ruleset: Ruleset,
        player_a_id: PlayerId,
        player_a_stats: PlayerStats,
        player_a_hp_max: f64,
        player_b_id: PlayerId,
        player_b_stats: PlayerStats,
        player_b_hp_max: f64,
    ) -> Self {
        Self {
            battle_id,
            match_id,
            ruleset,
            phase: Phase::ArenaOpen,
            turn_index: 0,
            deadline_utc_ms: 0,
            no_action_streak_both: 0,
            last_resolved_turn_index: 0,
            player_a: CombatantState {
                player_id: player_a_id,
                stats: player_a_stats,
                hp_max: player_a_hp_max,
                current_hp: player_a_hp_max,
            },
            player_b: CombatantState {
                player_id: player_b_id,
                stats: player_b_stats,
                hp_max: player_b_hp_max,
                current_hp: player_b_hp_max,
            },
            version: 0,
            end_reason: None,
            winner_player_id: None,
        }
    }

    pub fn is_participant(&self, player_id: PlayerId) -> bool {
        self.player_a.player_id == player_id || self.player_b.player_id == player_id
    }

    /// §3 invariant check — used by tests and defensively by the store layer
    /// after deserializing a record.
    pub fn check_invariants(&self) -> bool {
        if self.last_resolved_turn_index > self.turn_index {
            return false;
        }
        match self.phase {
            Phase::TurnOpen | Phase::Resolving => {
                if self.turn_index != self.last_resolved_turn_index + 1 {
                    return false;
                }
            }
            Phase::ArenaOpen => {
                if self.turn_index != 0 || self.last_resolved_turn_index != 0 {
                    return false;
                }
            }
            Phase::Ended => {}
        }
        let hp_in_range = |hp: f64, max: f64| (0.0..=max).contains(&hp);
        hp_in_range(self.player_a.current_hp, self.player_a.hp_max)
            && hp_in_range(self.player_b.current_hp, self.player_b.hp_max)
    }
}

/// The minimal slice of domain state the turn engine (C2) operates on —
/// everything it needs to resolve one turn, nothing it shouldn't be able to
/// mutate out-of-band (ruleset, ids).
#[derive(Debug, Clone, PartialEq)]
pub struct BattleDomainState {
    pub phase: Phase,
    pub turn_index: u64,
    pub no_action_streak_both: u32,
    pub player_a: CombatantState,
    pub player_b: CombatantState,
}

impl From<&BattleRecord> for BattleDomainState {
    fn from(record: &BattleRecord) -> Self {
        Self {
            phase: record.phase,
            turn_index: record.turn_index,
            no_action_streak_both: record.no_action_streak_both,
            player_a: record.player_a,
            player_b: record.player_b,
        }
    }
}
