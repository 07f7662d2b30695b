//! Error type for the service layer (§7, §11).

use thiserror::Error;

use duel_combat::EngineError;
use duel_store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("battle {0} not found")]
    BattleNotFound(duel_types::BattleId),

    #[error("player {player_id} is not a participant in battle {battle_id}")]
    NotParticipant {
        battle_id: duel_types::BattleId,
        player_id: duel_types::PlayerId,
    },

    #[error("invalid state transition attempted: {0}")]
    InvalidState(&'static str),

    #[error("turn engine error: {0}")]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
