//! Canonical player action types (§3, §4.7).

use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;
use crate::zone::BattleZone;

/// Why an intake pipeline (C7) normalized a submission down to `NoAction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    WrongPhase,
    WrongTurnIndex,
    DeadlinePassed,
    EmptyPayload,
    InvalidJson,
    InvalidAttackZone,
    InvalidBlockZonePrimary,
    InvalidBlockZoneSecondary,
    MissingAttackZone,
    InvalidBlockPattern,
}

/// Quality tag on a [`PlayerActionCommand`] — derived from why (or whether)
/// it was rejected (§4.7's "quality derivation" table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionQuality {
    Valid,
    NoAction,
    Invalid,
    Late,
    ProtocolViolation,
}

impl RejectReason {
    /// Map a reject reason to its quality tag per §4.7.
    pub fn quality(self) -> ActionQuality {
        match self {
            RejectReason::EmptyPayload => ActionQuality::NoAction,
            RejectReason::DeadlinePassed => ActionQuality::Late,
            RejectReason::WrongPhase | RejectReason::WrongTurnIndex => {
                ActionQuality::ProtocolViolation
            }
            RejectReason::InvalidJson
            | RejectReason::InvalidAttackZone
            | RejectReason::InvalidBlockZonePrimary
            | RejectReason::InvalidBlockZoneSecondary
            | RejectReason::MissingAttackZone
            | RejectReason::InvalidBlockPattern => ActionQuality::Invalid,
        }
    }
}

/// The canonical, always-well-formed result of the action-intake pipeline
/// (C7). This is what gets stored in the state store and fed to the turn
/// engine — never the raw wire payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerActionCommand {
    pub player_id: PlayerId,
    pub turn_index: u64,
    pub quality: ActionQuality,
    pub reject_reason: Option<RejectReason>,
    pub attack_zone: Option<BattleZone>,
    pub block_zone_primary: Option<BattleZone>,
    pub block_zone_secondary: Option<BattleZone>,
}

impl PlayerActionCommand {
    /// Build a `NoAction` command carrying the given reject reason.
    pub fn no_action(player_id: PlayerId, turn_index: u64, reason: RejectReason) -> Self {
        Self {
            player_id,
            turn_index,
            quality: reason.quality(),
            reject_reason: Some(reason),
            attack_zone: None,
            block_zone_primary: None,
            block_zone_secondary: None,
        }
    }

    /// Build a `Valid` command. Invariant: `Quality = Valid ⇒ AttackZone ≠
    /// none` is upheld by construction — callers only reach this after
    /// confirming an attack zone was parsed.
    pub fn valid(
        player_id: PlayerId,
        turn_index: u64,
        attack_zone: BattleZone,
        block_zone_primary: Option<BattleZone>,
        block_zone_secondary: Option<BattleZone>,
    ) -> Self {
        Self {
            player_id,
            turn_index,
            quality: ActionQuality::Valid,
            reject_reason: None,
            attack_zone: Some(attack_zone),
            block_zone_primary,
            block_zone_secondary,
        }
    }

    /// Whether this command should be treated as a no-op attack this turn —
    /// any quality other than `Valid`, or a `Valid` command missing its
    /// attack zone (which should never happen by construction, but the turn
    /// engine checks defensively per §4.2 step 1).
    pub fn is_no_action(&self) -> bool {
        self.quality != ActionQuality::Valid || self.attack_zone.is_none()
    }
}

/// Domain-level player action as consumed by the turn engine (C2) — the
/// subset of a [`PlayerActionCommand`] the engine actually needs, after
/// intake has already normalized it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerAction {
    pub player_id: PlayerId,
    pub turn_index: u64,
    pub attack_zone: Option<BattleZone>,
    pub block_zone_primary: Option<BattleZone>,
    pub block_zone_secondary: Option<BattleZone>,
    pub is_no_action: bool,
}

impl From<&PlayerActionCommand> for PlayerAction {
    fn from(cmd: &PlayerActionCommand) -> Self {
        Self {
            player_id: cmd.player_id,
            turn_index: cmd.turn_index,
            attack_zone: cmd.attack_zone,
            block_zone_primary: cmd.block_zone_primary,
            block_zone_secondary: cmd.block_zone_secondary,
            is_no_action: cmd.is_no_action(),
        }
    }
}
