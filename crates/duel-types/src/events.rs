//! Turn-resolution outcomes and the notifier/integration events they drive
//! (§4.2, §4.8).

use serde::{Deserialize, Serialize};

use crate::battle::EndReason;
use crate::ids::{BattleId, MatchId, PlayerId};
use crate::zone::BattleZone;

/// Outcome of one direction's attack resolution (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackOutcome {
    NoAction,
    Dodged,
    Blocked,
    Hit,
    CriticalHit,
    CriticalBypassBlock,
    CriticalHybridBlocked,
}

impl AttackOutcome {
    /// §4.2 invariant: damage 0 ⇒ outcome is one of these three.
    pub fn implies_zero_damage(self) -> bool {
        matches!(self, Self::NoAction | Self::Dodged | Self::Blocked)
    }

    /// §4.2 invariant: any `Critical*` outcome implies damage > 0.
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            Self::CriticalHit | Self::CriticalBypassBlock | Self::CriticalHybridBlocked
        )
    }
}

/// Full record of one direction's attack (attacker → defender), for the
/// `TurnResolved` log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackResolution {
    pub attacker_id: PlayerId,
    pub defender_id: PlayerId,
    pub outcome: AttackOutcome,
    pub damage: u32,
    pub attack_zone: Option<BattleZone>,
    pub was_blocked: bool,
}

/// Events the turn engine (C2) emits for one resolved turn, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TurnEvent {
    PlayerDamaged {
        player_id: PlayerId,
        damage: u32,
        remaining_hp: f64,
        turn_index: u64,
    },
    TurnResolved {
        turn_index: u64,
        a_to_b: AttackResolution,
        b_to_a: AttackResolution,
    },
    BattleEnded {
        reason: EndReason,
        winner_player_id: Option<PlayerId>,
    },
}

/// Real-time push events (C8 notifier port), one battle group at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierEvent {
    BattleReady {
        battle_id: BattleId,
        player_a_id: PlayerId,
        player_b_id: PlayerId,
    },
    TurnOpened {
        battle_id: BattleId,
        turn_index: u64,
        deadline_utc_ms: i64,
    },
    TurnResolved {
        battle_id: BattleId,
        turn_index: u64,
        a_to_b: AttackResolution,
        b_to_a: AttackResolution,
    },
    PlayerDamaged {
        battle_id: BattleId,
        player_id: PlayerId,
        damage: u32,
        remaining_hp: f64,
        turn_index: u64,
    },
    BattleEnded {
        battle_id: BattleId,
        reason: EndReason,
        winner_player_id: Option<PlayerId>,
        ended_at_utc_ms: i64,
    },
}

/// Outbound integration event — published exactly once per battle, only
/// when the state store signals `EndedNow` (§4.8, §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleEndedIntegrationEvent {
    pub battle_id: BattleId,
    pub match_id: MatchId,
    pub reason: EndReason,
    pub winner_player_id: Option<PlayerId>,
    pub ended_at_utc_ms: i64,
    pub version: u64,
}
