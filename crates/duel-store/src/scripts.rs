//! Lua sources for each C3 scripted transaction, loaded at compile time.
//! One script per committing operation — mirrors the teacher's lineage
//! convention (`strata-durability`) of a single script per atomic transition,
//! expressed here as Redis `EVAL` bodies.

pub const TRY_INITIALIZE: &str = include_str!("scripts/try_initialize.lua");
pub const TRY_OPEN_TURN: &str = include_str!("scripts/try_open_turn.lua");
pub const TRY_MARK_TURN_RESOLVING: &str = include_str!("scripts/try_mark_turn_resolving.lua");
pub const MARK_TURN_RESOLVED_AND_OPEN_NEXT: &str =
    include_str!("scripts/mark_turn_resolved_and_open_next.lua");
pub const END_BATTLE_AND_MARK_RESOLVED: &str =
    include_str!("scripts/end_battle_and_mark_resolved.lua");
pub const STORE_ACTION: &str = include_str!("scripts/store_action.lua");
pub const STORE_ACTION_AND_CHECK_BOTH_SUBMITTED: &str =
    include_str!("scripts/store_action_and_check_both_submitted.lua");
pub const CLAIM_DUE_BATTLES: &str = include_str!("scripts/claim_due_battles.lua");
