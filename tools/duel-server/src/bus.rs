//! Stand-in for the out-of-scope integration bus (§1, §4.8). Logs what a
//! real outbox publisher would send; no actual message transport.

use async_trait::async_trait;
use tracing::info;

use duel_service::ports::EventPublisher;
use duel_types::BattleEndedIntegrationEvent;

pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish_battle_ended(&self, event: BattleEndedIntegrationEvent) {
        info!(
            battle_id = %event.battle_id,
            match_id = %event.match_id,
            reason = ?event.reason,
            winner_player_id = ?event.winner_player_id,
            version = event.version,
            "publishing BattleEnded integration event"
        );
    }
}
