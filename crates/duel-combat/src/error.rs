//! Error type for the turn engine (§11). The engine's only fallible path is
//! being invoked out of precondition — everything else is pure computation.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("turn engine invoked outside its precondition: {0}")]
    InvalidState(&'static str),
}
