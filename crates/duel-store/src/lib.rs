//! The state store (C3): the single source of truth for battle phase,
//! combatant HP, and submitted actions, with every committing transition
//! expressed as one atomic Redis script (§4.3).

pub mod error;
pub mod keys;
pub mod scripts;
pub mod store;

pub use error::StoreError;
pub use store::{EndBattleOutcome, RedisStateStore, StateStore, StoreActionOutcome, StoreConfig};
