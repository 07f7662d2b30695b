//! In-memory fakes for the ports and the state store, used by this crate's
//! own inline `#[cfg(test)]` scenario tests instead of a live Redis instance.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use duel_store::{EndBattleOutcome, StateStore, StoreActionOutcome, StoreError};
use duel_types::{
    BattleEndedIntegrationEvent, BattleId, BattleRecord, EndReason, NotifierEvent,
    PlayerActionCommand, PlayerId, PlayerStats,
};

use crate::ports::{Clock, EventPublisher, Notifier, ProfileSource};

#[derive(Default)]
struct Inner {
    records: HashMap<BattleId, BattleRecord>,
    actions: HashMap<(BattleId, u64, PlayerId), PlayerActionCommand>,
    active: HashSet<BattleId>,
    deadlines: HashMap<BattleId, i64>,
    leases: HashMap<(BattleId, u64), i64>,
}

/// A faithful, single-process re-implementation of the Lua scripts'
/// semantics, so the full C4/C5/C6 orchestration can be exercised without a
/// live Redis instance (§13).
#[derive(Default)]
pub struct InMemoryStateStore {
    inner: Mutex<Inner>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn try_initialize(
        &self,
        battle_id: BattleId,
        initial_state: &BattleRecord,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.records.contains_key(&battle_id) {
            return Ok(false);
        }
        inner.records.insert(battle_id, initial_state.clone());
        inner.active.insert(battle_id);
        Ok(true)
    }

    async fn get_state(&self, battle_id: BattleId) -> Result<Option<BattleRecord>, StoreError> {
        Ok(self.inner.lock().unwrap().records.get(&battle_id).cloned())
    }

    async fn try_open_turn(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        deadline_utc_ms: i64,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(record) = inner.records.get_mut(&battle_id) else {
            return Ok(false);
        };
        let phase_ok = matches!(
            record.phase,
            duel_types::Phase::ArenaOpen | duel_types::Phase::Resolving
        );
        if !phase_ok || record.last_resolved_turn_index != turn_index - 1 {
            return Ok(false);
        }
        record.phase = duel_types::Phase::TurnOpen;
        record.turn_index = turn_index;
        record.deadline_utc_ms = deadline_utc_ms;
        record.version += 1;
        inner.deadlines.insert(battle_id, deadline_utc_ms);
        Ok(true)
    }

    async fn try_mark_turn_resolving(
        &self,
        battle_id: BattleId,
        turn_index: u64,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(record) = inner.records.get_mut(&battle_id) else {
            return Ok(false);
        };
        if record.phase != duel_types::Phase::TurnOpen || record.turn_index != turn_index {
            return Ok(false);
        }
        record.phase = duel_types::Phase::Resolving;
        record.version += 1;
        Ok(true)
    }

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
        let mut inner = self.inner.lock().unwrap();
        let Some(record) = inner.records.get_mut(&battle_id) else {
            return Ok(false);
        };
        if record.phase != duel_types::Phase::Resolving || record.turn_index != current_idx {
            return Ok(false);
        }
        record.last_resolved_turn_index = current_idx;
        record.phase = duel_types::Phase::TurnOpen;
        record.turn_index = next_idx;
        record.deadline_utc_ms = next_deadline_utc_ms;
        record.no_action_streak_both = no_action_streak_both;
        record.player_a.current_hp = hp_a;
        record.player_b.current_hp = hp_b;
        record.version += 1;
        inner.deadlines.insert(battle_id, next_deadline_utc_ms);
        Ok(true)
    }

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
        let mut inner = self.inner.lock().unwrap();
        let Some(record) = inner.records.get_mut(&battle_id) else {
            return Ok(EndBattleOutcome::NotCommitted);
        };
        if record.phase == duel_types::Phase::Ended {
            return Ok(EndBattleOutcome::AlreadyEnded);
        }
        if record.phase != duel_types::Phase::Resolving || record.turn_index != turn_index {
            return Ok(EndBattleOutcome::NotCommitted);
        }
        record.phase = duel_types::Phase::Ended;
        record.last_resolved_turn_index = turn_index;
        record.no_action_streak_both = no_action_streak_both;
        record.player_a.current_hp = hp_a;
        record.player_b.current_hp = hp_b;
        record.end_reason = Some(reason);
        record.winner_player_id = winner_player_id;
        record.version += 1;
        inner.active.remove(&battle_id);
        inner.deadlines.remove(&battle_id);
        Ok(EndBattleOutcome::EndedNow)
    }

    async fn store_action(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        player_id: PlayerId,
        action: &PlayerActionCommand,
    ) -> Result<StoreActionOutcome, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (battle_id, turn_index, player_id);
        if inner.actions.contains_key(&key) {
            return Ok(StoreActionOutcome::AlreadySubmitted);
        }
        inner.actions.insert(key, action.clone());
        Ok(StoreActionOutcome::Accepted)
    }

    async fn store_action_and_check_both_submitted(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        player_id: PlayerId,
        other_player_id: PlayerId,
        action: &PlayerActionCommand,
    ) -> Result<(StoreActionOutcome, bool), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (battle_id, turn_index, player_id);
        let outcome = if inner.actions.contains_key(&key) {
            StoreActionOutcome::AlreadySubmitted
        } else {
            inner.actions.insert(key, action.clone());
            StoreActionOutcome::Accepted
        };
        let both_submitted = inner
            .actions
            .contains_key(&(battle_id, turn_index, other_player_id));
        Ok((outcome, both_submitted))
    }

    async fn get_actions(
        &self,
        battle_id: BattleId,
        turn_index: u64,
        player_a: PlayerId,
        player_b: PlayerId,
    ) -> Result<(Option<PlayerActionCommand>, Option<PlayerActionCommand>), StoreError> {
        let inner = self.inner.lock().unwrap();
        let a = inner.actions.get(&(battle_id, turn_index, player_a)).cloned();
        let b = inner.actions.get(&(battle_id, turn_index, player_b)).cloned();
        Ok((a, b))
    }

    async fn claim_due_battles(
        &self,
        now_utc_ms: i64,
        limit: u32,
        lease_ttl_ms: i64,
    ) -> Result<Vec<(BattleId, u64)>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let due: Vec<BattleId> = inner
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now_utc_ms)
            .take(limit as usize)
            .map(|(id, _)| *id)
            .collect();

        let mut claimed = Vec::new();
        for battle_id in due {
            let Some(record) = inner.records.get(&battle_id).cloned() else {
                inner.deadlines.remove(&battle_id);
                continue;
            };
            if record.phase == duel_types::Phase::Ended {
                inner.deadlines.remove(&battle_id);
                continue;
            }
            if record.deadline_utc_ms > now_utc_ms {
                inner.deadlines.insert(battle_id, record.deadline_utc_ms);
                continue;
            }
            if record.phase != duel_types::Phase::TurnOpen {
                inner.deadlines.insert(battle_id, now_utc_ms + 200);
                continue;
            }
            let lease_key = (battle_id, record.turn_index);
            let lease_expired = inner
                .leases
                .get(&lease_key)
                .map(|expiry| *expiry <= now_utc_ms)
                .unwrap_or(true);
            if lease_expired {
                inner.leases.insert(lease_key, now_utc_ms + lease_ttl_ms);
                inner.deadlines.insert(battle_id, now_utc_ms + lease_ttl_ms);
                claimed.push((battle_id, record.turn_index));
            }
        }
        Ok(claimed)
    }
}

/// `Notifier` spy recording every push for assertion.
#[derive(Default)]
pub struct FakeNotifier {
    events: Mutex<Vec<(BattleId, NotifierEvent)>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(BattleId, NotifierEvent)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn push(&self, battle_id: BattleId, event: NotifierEvent) {
        self.events.lock().unwrap().push((battle_id, event));
    }
}

/// `EventPublisher` spy recording every publish for assertion.
#[derive(Default)]
pub struct FakeEventPublisher {
    events: Mutex<Vec<BattleEndedIntegrationEvent>>,
}

impl FakeEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BattleEndedIntegrationEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for FakeEventPublisher {
    async fn publish_battle_ended(&self, event: BattleEndedIntegrationEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// `ProfileSource` backed by a fixed table, or a single stats value for
/// every player.
pub enum FakeProfileSource {
    Fixed(PlayerStats),
    Empty,
}

impl FakeProfileSource {
    pub fn with_stats(stats: PlayerStats) -> Self {
        Self::Fixed(stats)
    }

    pub fn empty() -> Self {
        Self::Empty
    }
}

#[async_trait]
impl ProfileSource for FakeProfileSource {
    async fn get_stats(&self, _player_id: PlayerId) -> Option<PlayerStats> {
        match self {
            Self::Fixed(stats) => Some(*stats),
            Self::Empty => None,
        }
    }
}

/// `Clock` driven manually by tests, advanced explicitly between steps.
pub struct FakeClock {
    now_ms: AtomicI64,
}

impl FakeClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_utc_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
