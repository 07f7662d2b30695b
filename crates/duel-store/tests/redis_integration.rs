//! Integration tests against a live Redis instance. Ignored by default —
//! run with `REDIS_URL=redis://127.0.0.1/ cargo test -- --ignored`.

use duel_types::{
    BattleId, BattleRecord, MatchId, PlayerActionCommand, PlayerId, PlayerStats, RejectReason,
    Ruleset, RulesetDescriptor,
};

use duel_store::{RedisStateStore, StateStore, StoreActionOutcome, StoreConfig};

fn redis_url() -> Option<String> {
    std::env::var("REDIS_URL").ok()
}

fn make_stats() -> PlayerStats {
    PlayerStats {
        strength: 10.0,
        stamina: 10.0,
        agility: 10.0,
        intellect: 10.0,
    }
}

fn make_ruleset() -> Ruleset {
    Ruleset::normalize(&RulesetDescriptor {
        version: 1,
        turn_seconds: Some(10),
        no_action_limit: Some(3),
        seed: 42,
        combat_balance: None,
    })
}

#[tokio::test]
#[ignore]
async fn try_initialize_is_idempotent_and_adds_to_active_set() {
    let Some(url) = redis_url() else { return };
    let store = RedisStateStore::connect(&url, StoreConfig::default())
        .await
        .expect("connect");

    let battle_id = BattleId::new_random();
    let record = BattleRecord::new_arena_open(
        battle_id,
        MatchId::new_random(),
        make_ruleset(),
        PlayerId::new_random(),
        make_stats(),
        100.0,
        PlayerId::new_random(),
        make_stats(),
        100.0,
    );

    assert!(store.try_initialize(battle_id, &record).await.unwrap());
    assert!(!store.try_initialize(battle_id, &record).await.unwrap());

    let fetched = store.get_state(battle_id).await.unwrap().unwrap();
    assert_eq!(fetched.battle_id, battle_id);
}

#[tokio::test]
#[ignore]
async fn store_action_rejects_a_second_submission_for_the_same_turn() {
    let Some(url) = redis_url() else { return };
    let store = RedisStateStore::connect(&url, StoreConfig::default())
        .await
        .expect("connect");

    let battle_id = BattleId::new_random();
    let player_id = PlayerId::new_random();
    let action = PlayerActionCommand::no_action(player_id, 1, RejectReason::EmptyPayload);

    let first = store
        .store_action(battle_id, 1, player_id, &action)
        .await
        .unwrap();
    assert_eq!(first, StoreActionOutcome::Accepted);

    let second = store
        .store_action(battle_id, 1, player_id, &action)
        .await
        .unwrap();
    assert_eq!(second, StoreActionOutcome::AlreadySubmitted);
}

#[tokio::test]
#[ignore]
async fn claim_due_battles_only_returns_battles_past_their_deadline() {
    let Some(url) = redis_url() else { return };
    let store = RedisStateStore::connect(&url, StoreConfig::default())
        .await
        .expect("connect");

    let battle_id = BattleId::new_random();
    let record = BattleRecord::new_arena_open(
        battle_id,
        MatchId::new_random(),
        make_ruleset(),
        PlayerId::new_random(),
        make_stats(),
        100.0,
        PlayerId::new_random(),
        make_stats(),
        100.0,
    );
    store.try_initialize(battle_id, &record).await.unwrap();
    store.try_open_turn(battle_id, 1, 1_000).await.unwrap();

    let claimed = store.claim_due_battles(2_000, 10, 5_000).await.unwrap();
    assert!(claimed.iter().any(|(id, idx)| *id == battle_id && *idx == 1));

    let claimed_again = store.claim_due_battles(2_000, 10, 5_000).await.unwrap();
    assert!(!claimed_again.iter().any(|(id, _)| *id == battle_id));
}
