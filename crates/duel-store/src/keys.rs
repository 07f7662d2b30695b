//! Redis key layout (§6 "Persisted state layout").

use duel_types::BattleId;

pub const ACTIVE_BATTLES_SET: &str = "battle:active";
pub const DEADLINE_INDEX: &str = "battle:deadlines";

pub fn state_key(battle_id: BattleId) -> String {
    format!("battle:state:{battle_id}")
}

pub fn state_key_prefix() -> &'static str {
    "battle:state:"
}

pub fn action_key(battle_id: BattleId, turn_index: u64, player_id: duel_types::PlayerId) -> String {
    format!("battle:action:{battle_id}:turn:{turn_index}:player:{player_id}")
}

pub fn lease_key_prefix() -> &'static str {
    "lock:battle:"
}

pub fn lease_key(battle_id: BattleId, turn_index: u64) -> String {
    format!("lock:battle:{battle_id}:turn:{turn_index}")
}
