//! Deterministic combat math and turn resolution for the duel battle engine.
//!
//! This crate is pure and synchronous: no I/O, no clock, no shared state.
//! Everything here is a function of its explicit inputs.

pub mod combat_math;
pub mod error;
pub mod intake;
pub mod turn_engine;

pub use error::EngineError;
pub use intake::{normalize_action, IntakeContext};
pub use turn_engine::resolve_turn;
