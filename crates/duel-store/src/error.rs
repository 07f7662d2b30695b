//! Error type for the state store (§11). One structured enum per layer,
//! following this lineage's per-crate error convention.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to deserialize state: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// A state record that exists but does not deserialize into a well-formed
    /// `BattleRecord`, or fails its own invariant check (§3). Authoritative
    /// state is never partially trusted — this is always fatal for the
    /// battle in question.
    #[error("battle {battle_id} has a corrupted state record")]
    Corrupted { battle_id: String },
}
