//! Pure combat math (C1): chance rolls and damage rolls layered on top of
//! `duel_types::stats::DerivedCombatStats`. No I/O, no state.

use duel_types::{ChanceCurve, TurnRng};

/// Roll a chance curve against a fresh draw from `rng`. Returns whether the
/// effect fires.
pub fn roll_chance(rng: &mut TurnRng, curve: &ChanceCurve, diff: f64) -> bool {
    let chance = curve.chance(diff);
    rng.next_f64() < chance
}

/// Uniform real-valued damage roll in `[min, max]` — no early rounding
/// (§4.1, §9's mandated rounding-location fix).
pub fn roll_damage(rng: &mut TurnRng, min: f64, max: f64) -> f64 {
    if max <= min {
        return min;
    }
    min + rng.next_f64() * (max - min)
}

/// Round a real damage value away from zero to the nearest integer, per
/// §4.2 step 8. Damage is always non-negative, so this is equivalent to a
/// ceiling for any fractional part.
pub fn round_away_from_zero(value: f64) -> u32 {
    if value <= 0.0 {
        return 0;
    }
    value.round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_types::{AttackDirection, BattleId, MatchId};

    fn curve() -> ChanceCurve {
        ChanceCurve {
            base: 0.05,
            min: 0.02,
            max: 0.35,
            scale: 0.25,
            k_base: 20.0,
        }
    }

    #[test]
    fn roll_damage_stays_in_bounds() {
        let mut rng = TurnRng::for_turn(
            BattleId::new_random(),
            MatchId::new_random(),
            1,
            1,
            AttackDirection::AToB,
        );
        for _ in 0..500 {
            let d = roll_damage(&mut rng, 3.0, 7.0);
            assert!((3.0..=7.0).contains(&d));
        }
    }

    #[test]
    fn roll_damage_degenerate_range_returns_min() {
        let mut rng = TurnRng::for_turn(
            BattleId::new_random(),
            MatchId::new_random(),
            1,
            1,
            AttackDirection::AToB,
        );
        assert_eq!(roll_damage(&mut rng, 5.0, 5.0), 5.0);
    }

    #[test]
    fn round_away_from_zero_rounds_half_up() {
        assert_eq!(round_away_from_zero(4.5), 5);
        assert_eq!(round_away_from_zero(4.4), 4);
        assert_eq!(round_away_from_zero(0.0), 0);
        assert_eq!(round_away_from_zero(-3.0), 0);
    }

    #[test]
    fn roll_chance_never_fires_above_the_curve_max_probability_over_many_draws() {
        let mut rng = TurnRng::for_turn(
            BattleId::new_random(),
            MatchId::new_random(),
            7,
            1,
            AttackDirection::AToB,
        );
        let curve = curve();
        let fires = (0..2000).filter(|_| roll_chance(&mut rng, &curve, 0.0)).count();
        // base chance at diff=0 is 0.05; over 2000 draws this should land
        // nowhere near the curve's hard max of 0.35.
        assert!((fires as f64 / 2000.0) < 0.15);
    }
}
