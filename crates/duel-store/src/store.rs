//! The state store (C3): atomic phase machine, action storage, and the
//! deadline index, all behind scripted transactions against Redis.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use tracing::instrument;

use duel_types::{BattleId, BattleRecord, EndReason, PlayerActionCommand, PlayerId};

use crate::error::StoreError;
use crate::keys;
use crate::scripts;

/// Result of `StoreAction`/`StoreActionAndCheckBothSubmitted` (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreActionOutcome {
    Accepted,
    AlreadySubmitted,
}

/// Tri-valued result of `EndBattleAndMarkResolved` (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndBattleOutcome {
    AlreadyEnded,
    EndedNow,
    NotCommitted,
}

/// The C3 contract. Implemented by `RedisStateStore` for production and by
/// an in-memory fake in `duel-service`'s tests (§13).
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn try_initialize(
        &self,
        battle_id: BattleId,
        initial_state: &BattleRecord,
    ) -> Result<bool, StoreError>;

    async fn get_state(&self, battle_id: BattleId) -> Result<Option<BattleRecord>, StoreError>;

    async fn try_open_turn(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        deadline_utc_ms: i64,
    ) -> Result<bool, StoreError>;

    async fn try_mark_turn_resolving(
        &self,
        battle_id: BattleId,
        turn_index: u64,
    ) -> Result<bool, StoreError>;

    #[allow(clippy::too_many_arguments)]
    async fn mark_turn_resolved_and_open_next(
        &self,
        battle_id: BattleId,
        current_idx: u64,
        next_idx: u64,
        next_deadline_utc_ms: i64,
        no_action_streak_both: u32,
        hp_a: f64,
        hp_b: f64,
    ) -> Result<bool, StoreError>;

    #[allow(clippy::too_many_arguments)]
    async fn end_battle_and_mark_resolved(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        no_action_streak_both: u32,
        hp_a: f64,
        hp_b: f64,
        reason: EndReason,
        winner_player_id: Option<PlayerId>,
    ) -> Result<EndBattleOutcome, StoreError>;

    async fn store_action(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        player_id: PlayerId,
        action: &PlayerActionCommand,
    ) -> Result<StoreActionOutcome, StoreError>;

    async fn store_action_and_check_both_submitted(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        player_id: PlayerId,
        other_player_id: PlayerId,
        action: &PlayerActionCommand,
    ) -> Result<(StoreActionOutcome, bool), StoreError>;

    async fn get_actions(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        player_a: PlayerId,
        player_b: PlayerId,
    ) -> Result<(Option<PlayerActionCommand>, Option<PlayerActionCommand>), StoreError>;

    async fn claim_due_battles(
        &self,
        now_utc_ms: i64,
        limit: u32,
        lease_ttl_ms: i64,
    ) -> Result<Vec<(BattleId, u64)>, StoreError>;
}

/// Config knobs the store needs that aren't per-call (§12 `[store]`,
/// `[deadline_worker]`).
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    pub action_ttl_secs: u64,
    pub deadline_skew_delay_ms: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            action_ttl_secs: 3600,
            deadline_skew_delay_ms: 200,
        }
    }
}

pub struct RedisStateStore {
    conn: ConnectionManager,
    config: StoreConfig,
    try_initialize: Script,
    try_open_turn: Script,
    try_mark_turn_resolving: Script,
    mark_turn_resolved_and_open_next: Script,
    end_battle_and_mark_resolved: Script,
    store_action: Script,
    store_action_and_check_both_submitted: Script,
    claim_due_battles: Script,
}

impl RedisStateStore {
    pub async fn connect(redis_url: &str, config: StoreConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::with_connection(conn, config))
    }

    pub fn with_connection(conn: ConnectionManager, config: StoreConfig) -> Self {
        Self {
            conn,
            config,
            try_initialize: Script::new(scripts::TRY_INITIALIZE),
            try_open_turn: Script::new(scripts::TRY_OPEN_TURN),
            try_mark_turn_resolving: Script::new(scripts::TRY_MARK_TURN_RESOLVING),
            mark_turn_resolved_and_open_next: Script::new(scripts::MARK_TURN_RESOLVED_AND_OPEN_NEXT),
            end_battle_and_mark_resolved: Script::new(scripts::END_BATTLE_AND_MARK_RESOLVED),
            store_action: Script::new(scripts::STORE_ACTION),
            store_action_and_check_both_submitted: Script::new(
                scripts::STORE_ACTION_AND_CHECK_BOTH_SUBMITTED,
            ),
            claim_due_battles: Script::new(scripts::CLAIM_DUE_BATTLES),
        }
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    #[instrument(skip(self, initial_state), fields(battle_id = %battle_id))]
    async fn try_initialize(
        &self,
        battle_id: BattleId,
        initial_state: &BattleRecord,
    ) -> Result<bool, StoreError> {
        let payload = serde_json::to_string(initial_state).map_err(StoreError::Serialize)?;
        let mut conn = self.conn.clone();
        let created: i32 = self
            .try_initialize
            .key(keys::state_key(battle_id))
            .key(keys::ACTIVE_BATTLES_SET)
            .arg(battle_id.to_string())
            .arg(payload)
            .invoke_async(&mut conn)
            .await?;
        Ok(created == 1)
    }

    #[instrument(skip(self), fields(battle_id = %battle_id))]
    async fn get_state(&self, battle_id: BattleId) -> Result<Option<BattleRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(keys::state_key(battle_id)).await?;
        match raw {
            None => Ok(None),
            Some(raw) => {
                let record: BattleRecord =
                    serde_json::from_str(&raw).map_err(StoreError::Deserialize)?;
                if !record.check_invariants() {
                    return Err(StoreError::Corrupted {
                        battle_id: battle_id.to_string(),
                    });
                }
                Ok(Some(record))
            }
        }
    }

    #[instrument(skip(self), fields(battle_id = %battle_id, turn_index))]
    async fn try_open_turn(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        deadline_utc_ms: i64,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let success: i32 = self
            .try_open_turn
            .key(keys::state_key(battle_id))
            .key(keys::DEADLINE_INDEX)
            .arg(battle_id.to_string())
            .arg(turn_index)
            .arg(deadline_utc_ms)
            .invoke_async(&mut conn)
            .await?;
        Ok(success == 1)
    }

    #[instrument(skip(self), fields(battle_id = %battle_id, turn_index))]
    async fn try_mark_turn_resolving(
        &self,
        battle_id: BattleId,
        turn_index: u64,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let success: i32 = self
            .try_mark_turn_resolving
            .key(keys::state_key(battle_id))
            .arg(turn_index)
            .invoke_async(&mut conn)
            .await?;
        Ok(success == 1)
    }

    #[instrument(skip(self), fields(battle_id = %battle_id, current_idx, next_idx))]
    async fn mark_turn_resolved_and_open_next(
        &self,
        battle_id: BattleId,
        current_idx: u64,
        next_idx: u64,
        next_deadline_utc_ms: i64,
        no_action_streak_both: u32,
        hp_a: f64,
        hp_b: f64,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let success: i32 = self
            .mark_turn_resolved_and_open_next
            .key(keys::state_key(battle_id))
            .key(keys::DEADLINE_INDEX)
            .arg(battle_id.to_string())
            .arg(current_idx)
            .arg(next_idx)
            .arg(next_deadline_utc_ms)
            .arg(no_action_streak_both)
            .arg(hp_a)
            .arg(hp_b)
            .invoke_async(&mut conn)
            .await?;
        Ok(success == 1)
    }

    #[instrument(skip(self), fields(battle_id = %battle_id, turn_index))]
    async fn end_battle_and_mark_resolved(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        no_action_streak_both: u32,
        hp_a: f64,
        hp_b: f64,
        reason: EndReason,
        winner_player_id: Option<PlayerId>,
    ) -> Result<EndBattleOutcome, StoreError> {
        let reason_str = match reason {
            EndReason::Normal => "normal",
            EndReason::DoubleForfeit => "double_forfeit",
        };
        let winner_str = winner_player_id.map(|id| id.to_string()).unwrap_or_default();

        let mut conn = self.conn.clone();
        let outcome: i32 = self
            .end_battle_and_mark_resolved
            .key(keys::state_key(battle_id))
            .key(keys::ACTIVE_BATTLES_SET)
            .key(keys::DEADLINE_INDEX)
            .arg(battle_id.to_string())
            .arg(turn_index)
            .arg(no_action_streak_both)
            .arg(hp_a)
            .arg(hp_b)
            .arg(reason_str)
            .arg(winner_str)
            .invoke_async(&mut conn)
            .await?;
        Ok(match outcome {
            1 => EndBattleOutcome::EndedNow,
            2 => EndBattleOutcome::AlreadyEnded,
            _ => EndBattleOutcome::NotCommitted,
        })
    }

    #[instrument(skip(self, action), fields(battle_id = %battle_id, turn_index, player_id = %player_id))]
    async fn store_action(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        player_id: PlayerId,
        action: &PlayerActionCommand,
    ) -> Result<StoreActionOutcome, StoreError> {
        let payload = serde_json::to_string(action).map_err(StoreError::Serialize)?;
        let mut conn = self.conn.clone();
        let created: i32 = self
            .store_action
            .key(keys::action_key(battle_id, turn_index, player_id))
            .arg(payload)
            .arg(self.config.action_ttl_secs)
            .invoke_async(&mut conn)
            .await?;
        Ok(if created == 1 {
            StoreActionOutcome::Accepted
        } else {
            StoreActionOutcome::AlreadySubmitted
        })
    }

    #[instrument(skip(self, action), fields(battle_id = %battle_id, turn_index, player_id = %player_id))]
    async fn store_action_and_check_both_submitted(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        player_id: PlayerId,
        other_player_id: PlayerId,
        action: &PlayerActionCommand,
    ) -> Result<(StoreActionOutcome, bool), StoreError> {
        let payload = serde_json::to_string(action).map_err(StoreError::Serialize)?;
        let mut conn = self.conn.clone();
        let (stored, both_submitted): (i32, i32) = self
            .store_action_and_check_both_submitted
            .key(keys::action_key(battle_id, turn_index, player_id))
            .key(keys::action_key(battle_id, turn_index, other_player_id))
            .arg(payload)
            .arg(self.config.action_ttl_secs)
            .invoke_async(&mut conn)
            .await?;
        let outcome = if stored == 1 {
            StoreActionOutcome::Accepted
        } else {
            StoreActionOutcome::AlreadySubmitted
        };
        Ok((outcome, both_submitted == 1))
    }

    #[instrument(skip(self), fields(battle_id = %battle_id, turn_index))]
    async fn get_actions(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        player_a: PlayerId,
        player_b: PlayerId,
    ) -> Result<(Option<PlayerActionCommand>, Option<PlayerActionCommand>), StoreError> {
        let mut conn = self.conn.clone();
        let raw: Vec<Option<String>> = conn
            .mget(vec![
                keys::action_key(battle_id, turn_index, player_a),
                keys::action_key(battle_id, turn_index, player_b),
            ])
            .await?;
        let decode = |raw: &Option<String>| -> Result<Option<PlayerActionCommand>, StoreError> {
            match raw {
                None => Ok(None),
                Some(s) => Ok(serde_json::from_str(s).map_err(StoreError::Deserialize).ok()),
            }
        };
        let action_a = decode(&raw[0])?;
        let action_b = decode(&raw[1])?;
        Ok((action_a, action_b))
    }

    #[instrument(skip(self), fields(now_utc_ms, limit))]
    async fn claim_due_battles(
        &self,
        now_utc_ms: i64,
        limit: u32,
        lease_ttl_ms: i64,
    ) -> Result<Vec<(BattleId, u64)>, StoreError> {
        let mut conn = self.conn.clone();
        let flat: Vec<String> = self
            .claim_due_battles
            .key(keys::DEADLINE_INDEX)
            .arg(now_utc_ms)
            .arg(limit)
            .arg(lease_ttl_ms)
            .arg(self.config.deadline_skew_delay_ms)
            .arg(keys::state_key_prefix())
            .arg(keys::lease_key_prefix())
            .invoke_async(&mut conn)
            .await?;

        let mut claimed = Vec::with_capacity(flat.len() / 2);
        let mut iter = flat.into_iter();
        while let (Some(id), Some(turn_index)) = (iter.next(), iter.next()) {
            let Ok(battle_id) = id.parse::<BattleId>() else {
                continue;
            };
            let Ok(turn_index) = turn_index.parse::<u64>() else {
                continue;
            };
            claimed.push((battle_id, turn_index));
        }
        Ok(claimed)
    }
}
