//! Turn engine (C2): deterministic resolution of one turn from
//! `(state, actionA, actionB)`. Pure — no I/O, no shared RNG state.

use duel_types::{
    AttackDirection, AttackOutcome, AttackResolution, BattleDomainState, BattleId, CombatBalance,
    CritMode, EndReason, MatchId, Phase, PlayerAction, PlayerStats, Ruleset, TurnEvent, TurnRng,
};

use crate::combat_math::{roll_chance, roll_damage, round_away_from_zero};
use crate::error::EngineError;

/// Resolve one turn. Precondition: `state.phase == Resolving` and both
/// actions carry `turn_index == state.turn_index` (§4.2).
pub fn resolve_turn(
    battle_id: BattleId,
    match_id: MatchId,
    ruleset: &Ruleset,
    state: &BattleDomainState,
    action_a: &PlayerAction,
    action_b: &PlayerAction,
) -> Result<(BattleDomainState, Vec<TurnEvent>), EngineError> {
    if state.phase != Phase::Resolving {
        return Err(EngineError::InvalidState("phase must be Resolving"));
    }
    if action_a.turn_index != state.turn_index || action_b.turn_index != state.turn_index {
        return Err(EngineError::InvalidState(
            "action turn_index must match state turn_index",
        ));
    }

    let mut rng_a_to_b = TurnRng::for_turn(
        battle_id,
        match_id,
        ruleset.seed,
        state.turn_index,
        AttackDirection::AToB,
    );
    let mut rng_b_to_a = TurnRng::for_turn(
        battle_id,
        match_id,
        ruleset.seed,
        state.turn_index,
        AttackDirection::BToA,
    );

    let a_to_b = resolve_direction(
        &mut rng_a_to_b,
        &state.player_a.stats,
        &state.player_b.stats,
        action_a,
        action_b,
        &ruleset.combat_balance,
    );
    let b_to_a = resolve_direction(
        &mut rng_b_to_a,
        &state.player_b.stats,
        &state.player_a.stats,
        action_b,
        action_a,
        &ruleset.combat_balance,
    );

    // Simultaneous: both directions computed from the pre-turn snapshot,
    // both damages applied against pre-turn HP (§4.2 "Simultaneous damage").
    let new_hp_a = (state.player_a.current_hp - b_to_a.damage as f64).max(0.0);
    let new_hp_b = (state.player_b.current_hp - a_to_b.damage as f64).max(0.0);

    let mut new_state = state.clone();
    new_state.player_a.current_hp = new_hp_a;
    new_state.player_b.current_hp = new_hp_b;

    let mut events = Vec::new();
    let both_no_action = action_a.is_no_action && action_b.is_no_action;

    if both_no_action {
        new_state.no_action_streak_both = state.no_action_streak_both + 1;
        events.push(TurnEvent::TurnResolved {
            turn_index: state.turn_index,
            a_to_b,
            b_to_a,
        });
        if new_state.no_action_streak_both >= ruleset.no_action_limit {
            new_state.phase = Phase::Ended;
            events.push(TurnEvent::BattleEnded {
                reason: EndReason::DoubleForfeit,
                winner_player_id: None,
            });
        }
        return Ok((new_state, events));
    }

    new_state.no_action_streak_both = 0;

    if a_to_b.damage > 0 {
        events.push(TurnEvent::PlayerDamaged {
            player_id: state.player_b.player_id,
            damage: a_to_b.damage,
            remaining_hp: new_hp_b,
            turn_index: state.turn_index,
        });
    }
    if b_to_a.damage > 0 {
        events.push(TurnEvent::PlayerDamaged {
            player_id: state.player_a.player_id,
            damage: b_to_a.damage,
            remaining_hp: new_hp_a,
            turn_index: state.turn_index,
        });
    }
    events.push(TurnEvent::TurnResolved {
        turn_index: state.turn_index,
        a_to_b,
        b_to_a,
    });

    let a_dead = new_hp_a <= 0.0;
    let b_dead = new_hp_b <= 0.0;
    if a_dead || b_dead {
        new_state.phase = Phase::Ended;
        let winner_player_id = match (a_dead, b_dead) {
            (true, true) => None,
            (true, false) => Some(state.player_b.player_id),
            (false, true) => Some(state.player_a.player_id),
            (false, false) => unreachable!(),
        };
        events.push(TurnEvent::BattleEnded {
            reason: EndReason::Normal,
            winner_player_id,
        });
    }

    Ok((new_state, events))
}

/// Resolve one direction's attack (attacker → defender) per §4.2's 9-step
/// ordering. The order here is authoritative and must not be reshuffled.
fn resolve_direction(
    rng: &mut TurnRng,
    attacker_stats: &PlayerStats,
    defender_stats: &PlayerStats,
    attacker_action: &PlayerAction,
    defender_action: &PlayerAction,
    balance: &CombatBalance,
) -> AttackResolution {
    let attacker_id = attacker_action.player_id;
    let defender_id = defender_action.player_id;

    if attacker_action.is_no_action {
        return AttackResolution {
            attacker_id,
            defender_id,
            outcome: AttackOutcome::NoAction,
            damage: 0,
            attack_zone: attacker_action.attack_zone,
            was_blocked: false,
        };
    }
    // By construction of PlayerAction, is_no_action == false implies an
    // attack zone is present (§3 invariant on PlayerActionCommand).
    let attack_zone = attacker_action
        .attack_zone
        .expect("non-no-action command always carries an attack zone");

    let attacker_derived = duel_types::DerivedCombatStats::derive(attacker_stats, balance);
    let defender_derived = duel_types::DerivedCombatStats::derive(defender_stats, balance);

    let zone_matched = match (
        defender_action.block_zone_primary,
        defender_action.block_zone_secondary,
    ) {
        (Some(primary), Some(secondary)) => attack_zone == primary || attack_zone == secondary,
        _ => false,
    };

    let dodge_diff = defender_derived.mf_dodge - attacker_derived.mf_anti_dodge;
    if roll_chance(rng, &balance.dodge_curve, dodge_diff) {
        return AttackResolution {
            attacker_id,
            defender_id,
            outcome: AttackOutcome::Dodged,
            damage: 0,
            attack_zone: Some(attack_zone),
            was_blocked: zone_matched,
        };
    }

    let crit_diff = attacker_derived.mf_crit - defender_derived.mf_anti_crit;
    let crit = roll_chance(rng, &balance.crit_curve, crit_diff);

    if zone_matched && !crit {
        return AttackResolution {
            attacker_id,
            defender_id,
            outcome: AttackOutcome::Blocked,
            damage: 0,
            attack_zone: Some(attack_zone),
            was_blocked: true,
        };
    }

    let mut raw_damage = roll_damage(rng, attacker_derived.damage_min, attacker_derived.damage_max);
    let outcome = if zone_matched {
        // crit is true here since the plain-block branch already returned.
        raw_damage *= balance.crit_multiplier;
        match balance.crit_mode {
            CritMode::BypassBlock => AttackOutcome::CriticalBypassBlock,
            CritMode::Hybrid => {
                raw_damage *= balance.hybrid_block_multiplier;
                AttackOutcome::CriticalHybridBlocked
            }
        }
    } else if crit {
        raw_damage *= balance.crit_multiplier;
        AttackOutcome::CriticalHit
    } else {
        AttackOutcome::Hit
    };

    let mut damage = round_away_from_zero(raw_damage);

    // §4.2 invariant: any Critical* outcome implies damage > 0. A tiny
    // spread_min (allowed down to 0.0 by CombatBalance::normalize) can
    // otherwise round a crit down to 0.
    if damage == 0 && outcome.is_critical() {
        damage = 1;
    }

    // §4.2 step 9: rounding to 0 on a non-critical path collapses to Blocked.
    if damage == 0 && !outcome.is_critical() {
        return AttackResolution {
            attacker_id,
            defender_id,
            outcome: AttackOutcome::Blocked,
            damage: 0,
            attack_zone: Some(attack_zone),
            was_blocked: zone_matched,
        };
    }

    AttackResolution {
        attacker_id,
        defender_id,
        outcome,
        damage,
        attack_zone: Some(attack_zone),
        was_blocked: zone_matched,
    }
}
