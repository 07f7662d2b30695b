//! Turn service (C5): submission intake, early resolution on both-submitted,
//! and the full resolve path shared with the deadline worker. Grounded on
//! the teacher's `GameSession::apply_action` shape — validate, mutate via
//! the engine, re-render an update — generalized to the store's CAS
//! transitions instead of in-process mutation.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use duel_combat::intake::{normalize_action, IntakeContext};
use duel_store::{EndBattleOutcome, StateStore};
use duel_types::{
    BattleDomainState, BattleEndedIntegrationEvent, BattleId, NotifierEvent, Phase, PlayerAction,
    PlayerActionCommand, PlayerId, RejectReason, TurnEvent,
};

use crate::error::ServiceError;
use crate::ports::{Clock, EventPublisher, Notifier};

pub struct TurnService {
    store: Arc<dyn StateStore>,
    notifier: Arc<dyn Notifier>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl TurnService {
    pub fn new(
        store: Arc<dyn StateStore>,
        notifier: Arc<dyn Notifier>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            publisher,
            clock,
        }
    }

    /// §4.5 `SubmitAction`. Fire-and-forget from the transport's
    /// perspective: protocol errors and duplicate submissions never
    /// propagate as errors, only genuine lookup failures do.
    #[instrument(skip(self, raw_payload), fields(battle_id = %battle_id, player_id = %player_id))]
    pub async fn submit_action(
        &self,
        battle_id: BattleId,
        player_id: PlayerId,
        client_turn_index: u64,
        raw_payload: &str,
    ) -> Result<(), ServiceError> {
        let state = self
            .store
            .get_state(battle_id)
            .await?
            .ok_or(ServiceError::BattleNotFound(battle_id))?;

        if !state.is_participant(player_id) {
            return Err(ServiceError::NotParticipant {
                battle_id,
                player_id,
            });
        }

        let ctx = IntakeContext {
            phase: state.phase,
            turn_index: state.turn_index,
            deadline_utc_ms: state.deadline_utc_ms,
        };
        let command = normalize_action(
            player_id,
            client_turn_index,
            raw_payload,
            ctx,
            self.clock.now_utc_ms(),
        );

        let other_player_id = if player_id == state.player_a.player_id {
            state.player_b.player_id
        } else {
            state.player_a.player_id
        };

        let (outcome, both_submitted) = self
            .store
            .store_action_and_check_both_submitted(
                battle_id,
                state.turn_index,
                player_id,
                other_player_id,
                &command,
            )
            .await?;

        if outcome == duel_store::StoreActionOutcome::Accepted && both_submitted {
            self.resolve_turn(battle_id, state.turn_index).await?;
        }
        Ok(())
    }

    /// §4.5 `ResolveTurn`. Called both from early resolution (both submitted)
    /// and from the deadline worker (C6), which passes the turn index it
    /// claimed. Idempotent: returns `false` when there is nothing left for
    /// this caller to do, including when `turn_index` no longer matches the
    /// battle's currently open turn (a stale deadline claim, §8 S4).
    #[instrument(skip(self), fields(battle_id = %battle_id, turn_index))]
    pub async fn resolve_turn(&self, battle_id: BattleId, turn_index: u64) -> Result<bool, ServiceError> {
        let Some(state) = self.store.get_state(battle_id).await? else {
            warn!("resolve_turn invoked for a battle with no state");
            return Ok(false);
        };

        if state.turn_index != turn_index {
            info!("claimed turn index no longer matches the open turn, skipping stale claim");
            return Ok(false);
        }
        if state.turn_index <= state.last_resolved_turn_index {
            return Ok(false);
        }
        if state.phase != Phase::TurnOpen {
            return Ok(false);
        }

        if !self
            .store
            .try_mark_turn_resolving(battle_id, state.turn_index)
            .await?
        {
            info!("lost the race to mark this turn resolving");
            return Ok(false);
        }

        let state = self
            .store
            .get_state(battle_id)
            .await?
            .ok_or(ServiceError::BattleNotFound(battle_id))?;
        let (stored_a, stored_b) = self
            .store
            .get_actions(
                battle_id,
                state.turn_index,
                state.player_a.player_id,
                state.player_b.player_id,
            )
            .await?;

        let action_a = to_domain_action(state.player_a.player_id, state.turn_index, stored_a);
        let action_b = to_domain_action(state.player_b.player_id, state.turn_index, stored_b);

        let domain_state = BattleDomainState::from(&state);
        let (new_domain_state, events) = duel_combat::resolve_turn(
            battle_id,
            state.match_id,
            &state.ruleset,
            &domain_state,
            &action_a,
            &action_b,
        )?;

        let battle_ended = events.iter().find_map(|e| match e {
            TurnEvent::BattleEnded {
                reason,
                winner_player_id,
            } => Some((*reason, *winner_player_id)),
            _ => None,
        });

        if let Some((reason, winner_player_id)) = battle_ended {
            let outcome = self
                .store
                .end_battle_and_mark_resolved(
                    battle_id,
                    state.turn_index,
                    new_domain_state.no_action_streak_both,
                    new_domain_state.player_a.current_hp,
                    new_domain_state.player_b.current_hp,
                    reason,
                    winner_player_id,
                )
                .await?;

            match outcome {
                EndBattleOutcome::EndedNow => {
                    let ended_at_utc_ms = self.clock.now_utc_ms();
                    self.notifier
                        .push(
                            battle_id,
                            NotifierEvent::BattleEnded {
                                battle_id,
                                reason,
                                winner_player_id,
                                ended_at_utc_ms,
                            },
                        )
                        .await;
                    self.publisher
                        .publish_battle_ended(BattleEndedIntegrationEvent {
                            battle_id,
                            match_id: state.match_id,
                            reason,
                            winner_player_id,
                            ended_at_utc_ms,
                            version: state.version + 1,
                        })
                        .await;
                    info!(?reason, "battle ended");
                }
                EndBattleOutcome::AlreadyEnded => {
                    info!("battle already ended by another resolver, suppressing duplicate emission");
                }
                EndBattleOutcome::NotCommitted => {
                    error!("end_battle_and_mark_resolved did not commit after a winning resolve");
                    return Ok(false);
                }
            }
            return Ok(true);
        }

        let next_deadline_utc_ms =
            self.clock.now_utc_ms() + i64::from(state.ruleset.turn_seconds) * 1000;
        let committed = self
            .store
            .mark_turn_resolved_and_open_next(
                battle_id,
                state.turn_index,
                state.turn_index + 1,
                next_deadline_utc_ms,
                new_domain_state.no_action_streak_both,
                new_domain_state.player_a.current_hp,
                new_domain_state.player_b.current_hp,
            )
            .await?;
        if !committed {
            error!("mark_turn_resolved_and_open_next did not commit after a winning resolve");
            return Ok(false);
        }

        if let Some(TurnEvent::TurnResolved {
            turn_index,
            a_to_b,
            b_to_a,
        }) = events.iter().find(|e| matches!(e, TurnEvent::TurnResolved { .. }))
        {
            self.notifier
                .push(
                    battle_id,
                    NotifierEvent::TurnResolved {
                        battle_id,
                        turn_index: *turn_index,
                        a_to_b: *a_to_b,
                        b_to_a: *b_to_a,
                    },
                )
                .await;
        }
        for event in &events {
            if let TurnEvent::PlayerDamaged {
                player_id,
                damage,
                remaining_hp,
                turn_index,
            } = event
            {
                self.notifier
                    .push(
                        battle_id,
                        NotifierEvent::PlayerDamaged {
                            battle_id,
                            player_id: *player_id,
                            damage: *damage,
                            remaining_hp: *remaining_hp,
                            turn_index: *turn_index,
                        },
                    )
                    .await;
            }
        }
        self.notifier
            .push(
                battle_id,
                NotifierEvent::TurnOpened {
                    battle_id,
                    turn_index: state.turn_index + 1,
                    deadline_utc_ms: next_deadline_utc_ms,
                },
            )
            .await;

        info!(turn_index = state.turn_index, "turn resolved");
        Ok(true)
    }
}

/// §4.5 step 4: stored entries are already canonical, but a missing,
/// corrupted, or legacy entry falls back to `NoAction` rather than failing.
fn to_domain_action(
    player_id: PlayerId,
    turn_index: u64,
    stored: Option<PlayerActionCommand>,
) -> PlayerAction {
    let command = stored
        .unwrap_or_else(|| PlayerActionCommand::no_action(player_id, turn_index, RejectReason::EmptyPayload));
    PlayerAction::from(&command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeClock, FakeEventPublisher, FakeNotifier, InMemoryStateStore};
    use duel_types::{BattleRecord, ChanceCurve, MatchId, PlayerStats, Ruleset, RulesetDescriptor};

    fn deterministic_ruleset(seed: i64) -> Ruleset {
        let mut ruleset = Ruleset::normalize(&RulesetDescriptor {
            version: 1,
            turn_seconds: Some(10),
            no_action_limit: Some(3),
            seed,
            combat_balance: None,
        });
        let never = ChanceCurve {
            base: 0.0,
            min: 0.0,
            max: 0.0,
            scale: 0.0,
            k_base: 1.0,
        };
        ruleset.combat_balance.dodge_curve = never;
        ruleset.combat_balance.crit_curve = never;
        ruleset.combat_balance.spread_min = 1.0;
        ruleset.combat_balance.spread_max = 1.0;
        ruleset
    }

    fn make_stats() -> PlayerStats {
        PlayerStats {
            strength: 10.0,
            stamina: 10.0,
            agility: 10.0,
            intellect: 10.0,
        }
    }

    async fn seed_battle(
        store: &InMemoryStateStore,
        ruleset: &Ruleset,
        a: PlayerId,
        b: PlayerId,
    ) -> BattleId {
        let battle_id = BattleId::new_random();
        let record = BattleRecord::new_arena_open(
            battle_id,
            MatchId::new_random(),
            ruleset.clone(),
            a,
            make_stats(),
            100.0,
            b,
            make_stats(),
            100.0,
        );
        store.try_initialize(battle_id, &record).await.unwrap();
        store.try_open_turn(battle_id, 1, 10_000).await.unwrap();
        battle_id
    }

    fn make_service(
        store: Arc<InMemoryStateStore>,
        notifier: Arc<FakeNotifier>,
        publisher: Arc<FakeEventPublisher>,
        clock: Arc<FakeClock>,
    ) -> TurnService {
        TurnService::new(store, notifier, publisher, clock)
    }

    #[tokio::test]
    async fn both_players_submitting_triggers_early_resolution() {
        let store = Arc::new(InMemoryStateStore::new());
        let notifier = Arc::new(FakeNotifier::new());
        let publisher = Arc::new(FakeEventPublisher::new());
        let clock = Arc::new(FakeClock::new(0));
        let ruleset = deterministic_ruleset(42);

        let a = PlayerId::new_random();
        let b = PlayerId::new_random();
        let battle_id = seed_battle(&store, &ruleset, a, b).await;

        let service = make_service(store.clone(), notifier.clone(), publisher.clone(), clock);

        service
            .submit_action(battle_id, a, 1, r#"{"attackZone":"head"}"#)
            .await
            .unwrap();
        service
            .submit_action(battle_id, b, 1, r#"{"attackZone":"chest"}"#)
            .await
            .unwrap();

        let state = store.get_state(battle_id).await.unwrap().unwrap();
        assert_eq!(state.last_resolved_turn_index, 1);
        assert!(notifier
            .events()
            .iter()
            .any(|(_, e)| matches!(e, NotifierEvent::TurnResolved { .. })));
    }

    #[tokio::test]
    async fn stale_deadline_claim_after_early_resolution_is_a_no_op() {
        let store = Arc::new(InMemoryStateStore::new());
        let notifier = Arc::new(FakeNotifier::new());
        let publisher = Arc::new(FakeEventPublisher::new());
        let clock = Arc::new(FakeClock::new(0));
        let ruleset = deterministic_ruleset(7);

        let a = PlayerId::new_random();
        let b = PlayerId::new_random();
        let battle_id = seed_battle(&store, &ruleset, a, b).await;

        let service = make_service(store.clone(), notifier, publisher, clock);
        service
            .submit_action(battle_id, a, 1, r#"{"attackZone":"head"}"#)
            .await
            .unwrap();
        service
            .submit_action(battle_id, b, 1, r#"{"attackZone":"chest"}"#)
            .await
            .unwrap();

        // Both players submitting already resolved turn 1 and opened turn 2.
        // A deadline-worker claim that was queued for turn 1 before that
        // happened must observe it's stale and do nothing.
        let state = store.get_state(battle_id).await.unwrap().unwrap();
        assert_eq!(state.last_resolved_turn_index, 1);
        assert_eq!(state.turn_index, 2);

        let resolved_again = service.resolve_turn(battle_id, 1).await.unwrap();
        assert!(!resolved_again);
        let state_after = store.get_state(battle_id).await.unwrap().unwrap();
        assert_eq!(state_after.turn_index, 2);
        assert_eq!(state_after.last_resolved_turn_index, 1);
    }

    #[tokio::test]
    async fn submit_action_from_non_participant_is_rejected() {
        let store = Arc::new(InMemoryStateStore::new());
        let notifier = Arc::new(FakeNotifier::new());
        let publisher = Arc::new(FakeEventPublisher::new());
        let clock = Arc::new(FakeClock::new(0));
        let ruleset = deterministic_ruleset(1);

        let a = PlayerId::new_random();
        let b = PlayerId::new_random();
        let battle_id = seed_battle(&store, &ruleset, a, b).await;

        let service = make_service(store, notifier, publisher, clock);
        let stranger = PlayerId::new_random();
        let result = service
            .submit_action(battle_id, stranger, 1, r#"{"attackZone":"head"}"#)
            .await;
        assert!(matches!(result, Err(ServiceError::NotParticipant { .. })));
    }

    #[tokio::test]
    async fn lethal_turn_ends_battle_and_publishes_once() {
        let store = Arc::new(InMemoryStateStore::new());
        let notifier = Arc::new(FakeNotifier::new());
        let publisher = Arc::new(FakeEventPublisher::new());
        let clock = Arc::new(FakeClock::new(0));
        let mut ruleset = deterministic_ruleset(99);
        ruleset.combat_balance.base_weapon_damage = 1000.0;

        let a = PlayerId::new_random();
        let b = PlayerId::new_random();
        let battle_id = BattleId::new_random();
        let record = BattleRecord::new_arena_open(
            battle_id,
            MatchId::new_random(),
            ruleset.clone(),
            a,
            make_stats(),
            100.0,
            b,
            make_stats(),
            100.0,
        );
        store.try_initialize(battle_id, &record).await.unwrap();
        store.try_open_turn(battle_id, 1, 10_000).await.unwrap();

        let service = make_service(store.clone(), notifier.clone(), publisher.clone(), clock);
        service
            .submit_action(battle_id, a, 1, r#"{"attackZone":"head"}"#)
            .await
            .unwrap();
        service
            .submit_action(battle_id, b, 1, r#"{"attackZone":"chest"}"#)
            .await
            .unwrap();

        let state = store.get_state(battle_id).await.unwrap().unwrap();
        assert_eq!(state.phase, Phase::Ended);
        assert_eq!(publisher.events().len(), 1);
        assert_eq!(
            notifier
                .events()
                .iter()
                .filter(|(_, e)| matches!(e, NotifierEvent::BattleEnded { .. }))
                .count(),
            1
        );
    }
}
