//! Capability ports (§4.8, §9): interfaces the core consumes but does not
//! implement. Production adapters (websocket fan-out, a real profile
//! service, a system clock) live in `tools/duel-server`; tests use the fakes
//! in `duel_service::test_support`.

use async_trait::async_trait;

use duel_types::{BattleEndedIntegrationEvent, BattleId, CombatBalance, NotifierEvent, PlayerId, PlayerStats};

/// Real-time push to the clients of one battle (§4.8). Best-effort: a failed
/// push is the adapter's problem to log, not the core's to retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn push(&self, battle_id: BattleId, event: NotifierEvent);
}

/// Integration bus publisher (§4.8). `PublishBattleEnded` is called exactly
/// once per battle, only when the state store reports `EndedNow`.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_battle_ended(&self, event: BattleEndedIntegrationEvent);
}

/// Player-profile lookup (§4.4 step 2), out of scope per §1. `None` means
/// "no profile", which the lifecycle service treats as a handled, non-retried
/// failure.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn get_stats(&self, player_id: PlayerId) -> Option<PlayerStats>;
}

/// Wall clock, abstracted so tests can drive deadlines deterministically.
pub trait Clock: Send + Sync {
    fn now_utc_ms(&self) -> i64;
}

/// Source of the `CombatBalance` defaults used when a `BattleCreated`
/// event's ruleset descriptor omits balance fields (§4.4 step 1, §12).
pub trait BalanceProvider: Send + Sync {
    fn default_combat_balance(&self) -> CombatBalance;
}

/// `Clock` backed by the actual system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc_ms(&self) -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is after the unix epoch")
            .as_millis() as i64
    }
}

/// `BalanceProvider` that always hands back the configured default table.
#[derive(Debug, Clone)]
pub struct StaticBalanceProvider {
    balance: CombatBalance,
}

impl StaticBalanceProvider {
    pub fn new(balance: CombatBalance) -> Self {
        Self { balance }
    }
}

impl Default for StaticBalanceProvider {
    fn default() -> Self {
        Self::new(CombatBalance::default())
    }
}

impl BalanceProvider for StaticBalanceProvider {
    fn default_combat_balance(&self) -> CombatBalance {
        self.balance
    }
}
