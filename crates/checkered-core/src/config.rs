//! Session configuration.
//!
//! Every tuning constant lives in a per-component config struct with a
//! `Default`. A JSON file only needs to name the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use checkered_logic::clock::ClockConfig;
use checkered_logic::inventory::InventoryConfig;
use checkered_logic::possession::PossessionConfig;
use checkered_logic::route::RouteConfig;
use checkered_logic::sanity::SanityConfig;
use checkered_logic::world::Location;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub sanity: SanityConfig,
    pub inventory: InventoryConfig,
    pub possession: PossessionConfig,
    pub route: RouteConfig,
    pub clock: ClockConfig,
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Largest tick the session will simulate in one step, in seconds.
    pub max_delta: f32,
    /// Debug switch for the possession trigger.
    pub possession_enabled: bool,
    /// NPCs within this distance count as company.
    pub company_radius: f32,
    /// Townsfolk generated by `GameSession::populate_town`.
    pub population: u32,
    pub start_location: Location,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sanity: SanityConfig::default(),
            inventory: InventoryConfig::default(),
            possession: PossessionConfig::default(),
            route: RouteConfig::default(),
            clock: ClockConfig::default(),
            seed: None,
            max_delta: 0.1,
            possession_enabled: true,
            company_radius: 10.0,
            population: 24,
            start_location: Location::Streets,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
