//! Stand-in for the out-of-scope player-profile service (§1, §4.4 step 2).
//! Real profile sourcing is an external collaborator; this adapter hands
//! back a fixed stat block so the server is runnable standalone.

use async_trait::async_trait;

use duel_service::ports::ProfileSource;
use duel_types::{PlayerId, PlayerStats};

pub struct ConfigProfileSource {
    default_stats: PlayerStats,
}

impl ConfigProfileSource {
    pub fn new(default_stats: PlayerStats) -> Self {
        Self { default_stats }
    }
}

#[async_trait]
impl ProfileSource for ConfigProfileSource {
    async fn get_stats(&self, _player_id: PlayerId) -> Option<PlayerStats> {
        Some(self.default_stats)
    }
}
