//! Deadline worker (C6): a single long-lived task per process that drains
//! due battles from the state store's deadline index and drives them
//! through the turn service. No teacher analogue — the teacher has no
//! background scheduler — built in the ambient tokio polling-loop idiom
//! seen elsewhere in the pack.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use duel_store::StateStore;

use crate::config::DeadlineWorkerConfig;
use crate::ports::Clock;
use crate::turn_service::TurnService;

pub struct DeadlineWorker {
    store: Arc<dyn StateStore>,
    turn_service: Arc<TurnService>,
    clock: Arc<dyn Clock>,
    config: DeadlineWorkerConfig,
}

impl DeadlineWorker {
    pub fn new(
        store: Arc<dyn StateStore>,
        turn_service: Arc<TurnService>,
        clock: Arc<dyn Clock>,
        config: DeadlineWorkerConfig,
    ) -> Self {
        Self {
            store,
            turn_service,
            clock,
            config,
        }
    }

    /// Runs until `shutdown` fires, draining the in-flight batch before
    /// exiting (§5 "Cancellation").
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut idle_delay_ms = self.config.idle_delay_min_ms;
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("deadline worker shutting down");
                        return;
                    }
                }
                _ = tokio::time::sleep(Duration::from_millis(idle_delay_ms)) => {}
            }
            if *shutdown.borrow() {
                return;
            }

            match self.tick().await {
                Ok(claimed) if claimed > 0 => {
                    idle_delay_ms = self.config.backlog_delay_ms;
                }
                Ok(_) => {
                    idle_delay_ms = (idle_delay_ms * 2).min(self.config.idle_delay_max_ms);
                }
                Err(err) => {
                    warn!(%err, "deadline worker tick failed, backing off");
                    idle_delay_ms = self.config.error_delay_ms;
                }
            }
        }
    }

    /// One scan-and-resolve pass. Returns the number of battles claimed.
    #[instrument(skip(self))]
    async fn tick(&self) -> Result<usize, duel_store::StoreError> {
        let now = self.clock.now_utc_ms();
        let claimed = self
            .store
            .claim_due_battles(now, self.config.batch_size, self.config.lease_ttl_ms)
            .await?;

        if !claimed.is_empty() {
            info!(count = claimed.len(), "claimed due battles");
        }

        for (battle_id, turn_index) in &claimed {
            if let Err(err) = self.turn_service.resolve_turn(*battle_id, *turn_index).await {
                warn!(battle_id = %battle_id, %err, "resolve_turn failed for a claimed battle, leaving it for lease expiry");
            }
        }

        Ok(claimed.len())
    }
}
