//! Layered configuration (§12): an optional TOML file deserialized via
//! `serde`, then overridden field-by-field by environment variables — the
//! same two-tier pattern as the teacher's `PORT` env override in
//! `mk-server::main`, generalized to every knob §6 enumerates.

use serde::Deserialize;
use thiserror::Error;

use duel_types::CombatBalance;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3030".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSectionConfig {
    pub redis_url: String,
    pub action_ttl_secs: u64,
}

impl Default for StoreSectionConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1/".to_string(),
            action_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DeadlineWorkerConfig {
    pub batch_size: u32,
    pub lease_ttl_ms: i64,
    pub idle_delay_min_ms: u64,
    pub idle_delay_max_ms: u64,
    pub backlog_delay_ms: u64,
    pub error_delay_ms: u64,
    pub deadline_skew_delay_ms: i64,
}

impl Default for DeadlineWorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            lease_ttl_ms: 4_000,
            idle_delay_min_ms: 200,
            idle_delay_max_ms: 1_000,
            backlog_delay_ms: 30,
            error_delay_ms: 200,
            deadline_skew_delay_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RulesetDefaultsConfig {
    pub turn_seconds: u32,
    pub no_action_limit: u32,
}

impl Default for RulesetDefaultsConfig {
    fn default() -> Self {
        Self {
            turn_seconds: duel_types::DEFAULT_TURN_SECONDS,
            no_action_limit: duel_types::DEFAULT_NO_ACTION_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreSectionConfig,
    pub deadline_worker: DeadlineWorkerConfig,
    pub ruleset_defaults: RulesetDefaultsConfig,
    pub combat_balance: CombatBalance,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreSectionConfig::default(),
            deadline_worker: DeadlineWorkerConfig::default(),
            ruleset_defaults: RulesetDefaultsConfig::default(),
            combat_balance: CombatBalance::default(),
        }
    }
}

impl AppConfig {
    /// Load from an optional TOML file at `path`, then apply environment
    /// overrides. Missing file is not an error — defaults apply.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Generalizes `mk-server::main`'s single `PORT` override to every
    /// top-level knob, keyed `DUEL_<SECTION>_<FIELD>`.
    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("DUEL_SERVER_BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Ok(url) = std::env::var("DUEL_STORE_REDIS_URL") {
            self.store.redis_url = url;
        }
        if let Ok(ttl) = std::env::var("DUEL_STORE_ACTION_TTL_SECS") {
            if let Ok(ttl) = ttl.parse() {
                self.store.action_ttl_secs = ttl;
            }
        }
        if let Ok(batch) = std::env::var("DUEL_DEADLINE_WORKER_BATCH_SIZE") {
            if let Ok(batch) = batch.parse() {
                self.deadline_worker.batch_size = batch;
            }
        }
        if let Ok(lease) = std::env::var("DUEL_DEADLINE_WORKER_LEASE_TTL_MS") {
            if let Ok(lease) = lease.parse() {
                self.deadline_worker.lease_ttl_ms = lease;
            }
        }
    }
}
