//! Player stats and the combat-math inputs derived from them (§4.1).

use serde::{Deserialize, Serialize};

use crate::ruleset::CombatBalance;

/// Raw stat block sourced from the external player-profile collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub strength: f64,
    pub stamina: f64,
    pub agility: f64,
    pub intellect: f64,
}

/// Stats derived from a [`PlayerStats`] + [`CombatBalance`] pair — recomputed
/// fresh for each turn's damage computation, never cached across turns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedCombatStats {
    pub hp_max: f64,
    pub damage_min: f64,
    pub damage_max: f64,
    pub mf_dodge: f64,
    pub mf_anti_dodge: f64,
    pub mf_crit: f64,
    pub mf_anti_crit: f64,
}

impl DerivedCombatStats {
    /// §4.1: `HpMax`, `BaseDamage`/spread, and the four magic-find values.
    pub fn derive(stats: &PlayerStats, balance: &CombatBalance) -> Self {
        let hp_max = balance.base_hp + stats.stamina * balance.hp_per_stamina;

        let base_damage = balance.base_weapon_damage
            + stats.strength * balance.k_str
            + stats.agility * balance.k_agi
            + stats.intellect * balance.k_int;
        let damage_min = (base_damage * balance.spread_min).floor();
        let damage_max = (base_damage * balance.spread_max).ceil();

        let mf_dodge = stats.agility * balance.mf_per_agi;
        let mf_crit = stats.intellect * balance.mf_per_int;

        Self {
            hp_max,
            damage_min,
            damage_max,
            // Dodge/anti-dodge and crit/anti-crit share the same coefficient
            // (§4.1): a player's capacity to dodge equals their capacity to
            // resist being dodged against, etc.
            mf_dodge,
            mf_anti_dodge: mf_dodge,
            mf_crit,
            mf_anti_crit: mf_crit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hp_max_combines_base_and_stamina() {
        let stats = PlayerStats {
            strength: 0.0,
            stamina: 10.0,
            agility: 0.0,
            intellect: 0.0,
        };
        let balance = CombatBalance::default();
        let derived = DerivedCombatStats::derive(&stats, &balance);
        assert_eq!(derived.hp_max, balance.base_hp + 10.0 * balance.hp_per_stamina);
    }

    #[test]
    fn damage_spread_floors_min_and_ceils_max() {
        let stats = PlayerStats {
            strength: 3.0,
            stamina: 0.0,
            agility: 0.0,
            intellect: 0.0,
        };
        let mut balance = CombatBalance::default();
        balance.base_weapon_damage = 1.0;
        balance.k_str = 1.0;
        balance.spread_min = 0.83;
        balance.spread_max = 1.17;
        // base_damage = 4.0, min = floor(4.0*0.83) = floor(3.32) = 3, max = ceil(4.0*1.17) = ceil(4.68) = 5
        let derived = DerivedCombatStats::derive(&stats, &balance);
        assert_eq!(derived.damage_min, 3.0);
        assert_eq!(derived.damage_max, 5.0);
    }

    #[test]
    fn dodge_and_anti_dodge_share_the_same_coefficient() {
        let stats = PlayerStats {
            strength: 0.0,
            stamina: 0.0,
            agility: 8.0,
            intellect: 0.0,
        };
        let balance = CombatBalance::default();
        let derived = DerivedCombatStats::derive(&stats, &balance);
        assert_eq!(derived.mf_dodge, derived.mf_anti_dodge);
    }
}
