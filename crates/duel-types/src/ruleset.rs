//! Ruleset value object — normalized once at battle initialization, then
//! frozen into state for the lifetime of the battle.

use serde::{Deserialize, Serialize};

/// Raw ruleset fields as they might arrive on a `BattleCreated` event —
/// before bounds-clamping and balance population.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesetDescriptor {
    pub version: i64,
    pub turn_seconds: Option<u32>,
    pub no_action_limit: Option<u32>,
    pub seed: i64,
    pub combat_balance: Option<CombatBalance>,
}

/// A normalized, frozen ruleset. Constructed only by [`Ruleset::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    pub version: i64,
    pub turn_seconds: u32,
    pub no_action_limit: u32,
    pub seed: i64,
    pub combat_balance: CombatBalance,
}

pub const MIN_TURN_SECONDS: u32 = 1;
pub const MAX_TURN_SECONDS: u32 = 60;
pub const DEFAULT_TURN_SECONDS: u32 = 10;

pub const MIN_NO_ACTION_LIMIT: u32 = 1;
pub const MAX_NO_ACTION_LIMIT: u32 = 10;
pub const DEFAULT_NO_ACTION_LIMIT: u32 = 3;

/// Crit-effect mode: whether a crit against a matched block bypasses the
/// block entirely or applies a reduced ("hybrid") multiplier on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritMode {
    BypassBlock,
    Hybrid,
}

/// Parameters of the dodge/crit chance curve (§4.1):
/// `raw = base + scale * diff / (|diff| + k_base)`, clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChanceCurve {
    pub base: f64,
    pub min: f64,
    pub max: f64,
    pub scale: f64,
    pub k_base: f64,
}

impl ChanceCurve {
    /// Evaluate the curve for a given magic-find differential.
    pub fn chance(&self, diff: f64) -> f64 {
        let raw = self.base + self.scale * diff / (diff.abs() + self.k_base);
        raw.clamp(self.min, self.max)
    }
}

/// Balance constants shared by every battle using a given ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatBalance {
    pub base_hp: f64,
    pub hp_per_stamina: f64,

    pub base_weapon_damage: f64,
    pub k_str: f64,
    pub k_agi: f64,
    pub k_int: f64,

    /// Lower bound multiplier on `BaseDamage` for the damage roll.
    pub spread_min: f64,
    /// Upper bound multiplier on `BaseDamage` for the damage roll.
    pub spread_max: f64,

    pub mf_per_agi: f64,
    pub mf_per_int: f64,

    pub dodge_curve: ChanceCurve,
    pub crit_curve: ChanceCurve,

    pub crit_mode: CritMode,
    pub crit_multiplier: f64,
    pub hybrid_block_multiplier: f64,
}

impl Default for CombatBalance {
    /// Reasonable defaults matching the combat-balance provider's baseline
    /// table — used whenever a `BattleCreated` event's ruleset descriptor
    /// omits balance fields.
    fn default() -> Self {
        Self {
            base_hp: 80.0,
            hp_per_stamina: 6.0,
            base_weapon_damage: 8.0,
            k_str: 1.2,
            k_agi: 0.4,
            k_int: 0.2,
            spread_min: 0.8,
            spread_max: 1.2,
            mf_per_agi: 0.5,
            mf_per_int: 0.5,
            dodge_curve: ChanceCurve {
                base: 0.05,
                min: 0.02,
                max: 0.35,
                scale: 0.25,
                k_base: 20.0,
            },
            crit_curve: ChanceCurve {
                base: 0.05,
                min: 0.02,
                max: 0.40,
                scale: 0.25,
                k_base: 20.0,
            },
            crit_mode: CritMode::BypassBlock,
            crit_multiplier: 1.5,
            hybrid_block_multiplier: 0.5,
        }
    }
}

impl CombatBalance {
    /// Clamp to the invariants §3 mandates: non-negative spreads,
    /// `spread_min < spread_max`, with no upper bound on either. Values > 1
    /// are explicitly permitted (§9 open-question resolution).
    fn normalize(mut self) -> Self {
        self.spread_min = self.spread_min.max(0.0);
        self.spread_max = self.spread_max.max(0.0);
        if self.spread_min >= self.spread_max {
            self.spread_max = self.spread_min + 0.01;
        }
        self
    }
}

impl RulesetDescriptor {
    /// Whether this descriptor is well-formed enough to normalize. §4.4
    /// step 1: a null/non-positive `turn_seconds` or `version` is rejected
    /// up front, before any clamping.
    pub fn is_valid(&self) -> bool {
        self.version > 0 && self.turn_seconds.map_or(true, |s| s > 0)
    }
}

impl Ruleset {
    /// Apply defaults, clamp bounded fields, and populate/clamp the combat
    /// balance. Idempotent: normalizing an already-normalized descriptor
    /// yields the same result (§8 property 8).
    pub fn normalize(descriptor: &RulesetDescriptor) -> Self {
        let turn_seconds = descriptor
            .turn_seconds
            .unwrap_or(DEFAULT_TURN_SECONDS)
            .clamp(MIN_TURN_SECONDS, MAX_TURN_SECONDS);
        let no_action_limit = descriptor
            .no_action_limit
            .unwrap_or(DEFAULT_NO_ACTION_LIMIT)
            .clamp(MIN_NO_ACTION_LIMIT, MAX_NO_ACTION_LIMIT);
        let combat_balance = descriptor.combat_balance.unwrap_or_default().normalize();

        Self {
            version: descriptor.version,
            turn_seconds,
            no_action_limit,
            seed: descriptor.seed,
            combat_balance,
        }
    }
}
