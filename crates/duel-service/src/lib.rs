//! Battle orchestration (C4, C5, C6): translates inbound lifecycle events
//! and client submissions into the state store's scripted transitions, and
//! drains due deadlines in the background.

pub mod config;
pub mod deadline_worker;
pub mod error;
pub mod lifecycle;
pub mod ports;
#[cfg(test)]
pub mod test_support;
pub mod turn_service;

pub use config::AppConfig;
pub use deadline_worker::DeadlineWorker;
pub use error::ServiceError;
pub use lifecycle::{BattleCreatedEvent, LifecycleService};
pub use turn_service::TurnService;
