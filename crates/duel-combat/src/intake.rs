//! Action intake pipeline (C7): turns a raw wire payload into a canonical,
//! always-well-formed `PlayerActionCommand`. No exceptions cross this
//! boundary — every invalid input normalizes to `NoAction` with a reason.

use serde::Deserialize;
use tracing::warn;

use duel_types::{BattleZone, Phase, PlayerActionCommand, PlayerId, RejectReason};

/// Canonical wire shape of an action payload (§6).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawActionPayload {
    attack_zone: Option<String>,
    block_zone_primary: Option<String>,
    block_zone_secondary: Option<String>,
}

/// Everything the intake pipeline needs to know about the battle's current
/// server-side state, without depending on the full `BattleRecord`.
#[derive(Debug, Clone, Copy)]
pub struct IntakeContext {
    pub phase: Phase,
    pub turn_index: u64,
    pub deadline_utc_ms: i64,
}

/// Small network-latency buffer added to the deadline before a late
/// submission is rejected (§4.7 step 3).
pub const LATE_SUBMISSION_GRACE_MS: i64 = 1000;

/// Normalize one raw submission into a canonical command. Never fails.
#[tracing::instrument(skip(raw_payload, ctx), fields(player_id = %player_id))]
pub fn normalize_action(
    player_id: PlayerId,
    client_turn_index: u64,
    raw_payload: &str,
    ctx: IntakeContext,
    now_utc_ms: i64,
) -> PlayerActionCommand {
    if ctx.phase != Phase::TurnOpen {
        return reject(player_id, client_turn_index, RejectReason::WrongPhase);
    }
    if client_turn_index != ctx.turn_index {
        return reject(player_id, client_turn_index, RejectReason::WrongTurnIndex);
    }
    if now_utc_ms > ctx.deadline_utc_ms + LATE_SUBMISSION_GRACE_MS {
        return reject(player_id, client_turn_index, RejectReason::DeadlinePassed);
    }
    if raw_payload.trim().is_empty() {
        return reject(player_id, client_turn_index, RejectReason::EmptyPayload);
    }

    let parsed: RawActionPayload = match serde_json::from_str(raw_payload) {
        Ok(p) => p,
        Err(err) => {
            warn!(%err, "rejecting action with unparseable payload");
            return reject(player_id, client_turn_index, RejectReason::InvalidJson);
        }
    };

    let attack_zone = match parsed.attack_zone.as_deref().map(BattleZone::parse_case_insensitive) {
        None => None,
        Some(None) => {
            return reject(player_id, client_turn_index, RejectReason::InvalidAttackZone);
        }
        Some(Some(zone)) => Some(zone),
    };

    let block_primary = match parsed
        .block_zone_primary
        .as_deref()
        .map(BattleZone::parse_case_insensitive)
    {
        None => None,
        Some(None) => {
            return reject(
                player_id,
                client_turn_index,
                RejectReason::InvalidBlockZonePrimary,
            );
        }
        Some(Some(zone)) => Some(zone),
    };

    let block_secondary = match parsed
        .block_zone_secondary
        .as_deref()
        .map(BattleZone::parse_case_insensitive)
    {
        None => None,
        Some(None) => {
            return reject(
                player_id,
                client_turn_index,
                RejectReason::InvalidBlockZoneSecondary,
            );
        }
        Some(Some(zone)) => Some(zone),
    };

    let Some(attack_zone) = attack_zone else {
        return reject(player_id, client_turn_index, RejectReason::MissingAttackZone);
    };

    match (block_primary, block_secondary) {
        (Some(a), Some(b)) if !BattleZone::are_adjacent(a, b) => {
            reject(player_id, client_turn_index, RejectReason::InvalidBlockPattern)
        }
        (Some(_), None) | (None, Some(_)) => {
            reject(player_id, client_turn_index, RejectReason::InvalidBlockPattern)
        }
        _ => PlayerActionCommand::valid(
            player_id,
            client_turn_index,
            attack_zone,
            block_primary,
            block_secondary,
        ),
    }
}

fn reject(player_id: PlayerId, turn_index: u64, reason: RejectReason) -> PlayerActionCommand {
    PlayerActionCommand::no_action(player_id, turn_index, reason)
}
