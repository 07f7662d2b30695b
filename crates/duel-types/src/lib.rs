//! Core types for the duel engine — zero game logic, just the shared data
//! model: ids, zones, ruleset, stats, actions, battle state, events, and the
//! deterministic RNG streams the turn engine draws from.

pub mod action;
pub mod battle;
pub mod events;
pub mod ids;
pub mod ruleset;
pub mod rng;
pub mod stats;
pub mod zone;

pub use action::{ActionQuality, PlayerAction, PlayerActionCommand, RejectReason};
pub use battle::{BattleDomainState, BattleRecord, CombatantState, EndReason, Phase};
pub use events::{AttackOutcome, AttackResolution, BattleEndedIntegrationEvent, NotifierEvent, TurnEvent};
pub use ids::{BattleId, MatchId, PlayerId};
pub use ruleset::{
    ChanceCurve, CombatBalance, CritMode, Ruleset, RulesetDescriptor, DEFAULT_NO_ACTION_LIMIT,
    DEFAULT_TURN_SECONDS, MAX_NO_ACTION_LIMIT, MAX_TURN_SECONDS, MIN_NO_ACTION_LIMIT,
    MIN_TURN_SECONDS,
};
pub use rng::{AttackDirection, TurnRng};
pub use stats::{DerivedCombatStats, PlayerStats};
pub use zone::BattleZone;
