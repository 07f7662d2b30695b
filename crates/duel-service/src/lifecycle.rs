//! Lifecycle service (C4): turns an inbound `BattleCreated` into initialized
//! state plus an opened Turn 1, grounded on the teacher's two-step
//! `create_solo_game` + `place_initial_tiles` init flow (build state, then
//! perform the first mutating transition).

use std::sync::Arc;

use tracing::{info, instrument, warn};

use duel_types::{BattleId, BattleRecord, MatchId, NotifierEvent, PlayerId, RulesetDescriptor};

use crate::error::ServiceError;
use crate::ports::{BalanceProvider, Clock, Notifier, ProfileSource};

/// Inbound integration event consumed by `HandleBattleCreated` (§6).
/// Delivery is at-least-once; this handler is idempotent.
#[derive(Debug, Clone)]
pub struct BattleCreatedEvent {
    pub battle_id: BattleId,
    pub match_id: MatchId,
    pub player_a_id: PlayerId,
    pub player_b_id: PlayerId,
    pub ruleset: RulesetDescriptor,
}

pub struct LifecycleService {
    store: Arc<dyn duel_store::StateStore>,
    notifier: Arc<dyn Notifier>,
    profiles: Arc<dyn ProfileSource>,
    clock: Arc<dyn Clock>,
    balance_provider: Arc<dyn BalanceProvider>,
}

impl LifecycleService {
    pub fn new(
        store: Arc<dyn duel_store::StateStore>,
        notifier: Arc<dyn Notifier>,
        profiles: Arc<dyn ProfileSource>,
        clock: Arc<dyn Clock>,
        balance_provider: Arc<dyn BalanceProvider>,
    ) -> Self {
        Self {
            store,
            notifier,
            profiles,
            clock,
            balance_provider,
        }
    }

    /// §4.4. Every step is safe to retry; notifications fire only on the
    /// turn that actually opens Turn 1.
    #[instrument(skip(self, event), fields(battle_id = %event.battle_id))]
    pub async fn handle_battle_created(&self, event: BattleCreatedEvent) -> Result<(), ServiceError> {
        let mut descriptor = event.ruleset.clone();
        if !descriptor.is_valid() {
            warn!("rejecting battle-created event with an invalid ruleset descriptor");
            return Ok(());
        }
        if descriptor.combat_balance.is_none() {
            descriptor.combat_balance = Some(self.balance_provider.default_combat_balance());
        }
        let ruleset = duel_types::Ruleset::normalize(&descriptor);

        let Some(stats_a) = self.profiles.get_stats(event.player_a_id).await else {
            warn!(player_id = %event.player_a_id, "missing player profile, dropping battle-created event");
            return Ok(());
        };
        let Some(stats_b) = self.profiles.get_stats(event.player_b_id).await else {
            warn!(player_id = %event.player_b_id, "missing player profile, dropping battle-created event");
            return Ok(());
        };

        let balance = ruleset.combat_balance;
        let hp_a = duel_types::DerivedCombatStats::derive(&stats_a, &balance).hp_max;
        let hp_b = duel_types::DerivedCombatStats::derive(&stats_b, &balance).hp_max;

        let initial_state = BattleRecord::new_arena_open(
            event.battle_id,
            event.match_id,
            ruleset.clone(),
            event.player_a_id,
            stats_a,
            hp_a,
            event.player_b_id,
            stats_b,
            hp_b,
        );

        // Idempotent: a redelivery still falls through to TryOpenTurn below.
        self.store.try_initialize(event.battle_id, &initial_state).await?;

        let deadline = self.clock.now_utc_ms() + i64::from(ruleset.turn_seconds) * 1000;
        let opened = self.store.try_open_turn(event.battle_id, 1, deadline).await?;
        if !opened {
            info!("turn 1 already open or battle already past arena-open; nothing to emit");
            return Ok(());
        }

        let state = self
            .store
            .get_state(event.battle_id)
            .await?
            .ok_or(ServiceError::BattleNotFound(event.battle_id))?;

        self.notifier
            .push(
                event.battle_id,
                NotifierEvent::BattleReady {
                    battle_id: event.battle_id,
                    player_a_id: event.player_a_id,
                    player_b_id: event.player_b_id,
                },
            )
            .await;
        self.notifier
            .push(
                event.battle_id,
                NotifierEvent::TurnOpened {
                    battle_id: event.battle_id,
                    turn_index: state.turn_index,
                    deadline_utc_ms: state.deadline_utc_ms,
                },
            )
            .await;

        info!(turn_index = state.turn_index, "battle ready, turn 1 opened");
        Ok(())
    }
}
