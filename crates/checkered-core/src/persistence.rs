//! Save/Load functionality for persisting session state
//!
//! Uses bincode for compact binary saves and serde_json for a readable
//! export of the same [`SaveData`]. Townsfolk are flattened into records and
//! respawned into a fresh `hecs` world on load.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use checkered_logic::clock::GameClock;
use checkered_logic::crafting::CraftingSnapshot;
use checkered_logic::health::HealthModel;
use checkered_logic::possession::PossessionMemory;
use checkered_logic::route::RouteScoring;
use checkered_logic::sanity::ResourceState;
use checkered_logic::spatial::Vec3;
use checkered_logic::world::Location;

use crate::town::NpcRecord;

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    /// Seconds since the session started
    pub sim_time: f64,
    pub location: Location,
    pub player_position: Vec3,
    pub resources: ResourceState,
    pub crafting: CraftingSnapshot,
    pub possession: PossessionMemory,
    pub route: RouteScoring,
    pub health: HealthModel,
    pub clock: GameClock,
    pub npcs: Vec<NpcRecord>,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

fn check_version(data: SaveData) -> Result<SaveData, SaveError> {
    if data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: data.version,
        });
    }
    Ok(data)
}

/// Write a binary save
pub fn save_session<W: Write>(writer: W, data: &SaveData) -> Result<(), SaveError> {
    bincode::serialize_into(writer, data)?;
    log::info!("Session saved at t={:.1}s ({} NPCs)", data.sim_time, data.npcs.len());
    Ok(())
}

/// Read a binary save
pub fn load_session<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let data: SaveData = bincode::deserialize_from(reader)?;
    let data = check_version(data)?;
    log::info!("Session loaded at t={:.1}s", data.sim_time);
    Ok(data)
}

pub fn to_json(data: &SaveData) -> Result<String, SaveError> {
    Ok(serde_json::to_string_pretty(data)?)
}

pub fn from_json(json: &str) -> Result<SaveData, SaveError> {
    check_version(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::engine::GameSession;
    use checkered_logic::population::NpcPopulation;
    use checkered_logic::possession::PlayerInput;

    fn played_session() -> GameSession {
        let mut session = GameSession::new(SessionConfig {
            seed: Some(5),
            ..Default::default()
        });
        let ids = session.populate_town();
        session.town.mark_dead(ids[0]);
        session.set_location(Location::Park);
        for _ in 0..50 {
            session.update(0.1, &PlayerInput::default());
        }
        session.crafting.craft("cloth_rag", Some("wooden_stick"), None);
        session.possession.memory.history.insert(Location::Bar, 2);
        session
    }

    #[test]
    fn test_save_load_roundtrip() {
        let session = played_session();

        let mut save_buffer = Vec::new();
        session.save(&mut save_buffer).expect("Save failed");

        let mut loaded = GameSession::default();
        loaded.load(&save_buffer[..]).expect("Load failed");

        assert!((loaded.sim_time() - session.sim_time()).abs() < 1e-9);
        assert_eq!(loaded.location, Location::Park);
        assert_eq!(loaded.resources.sanity, session.resources.sanity);
        assert_eq!(loaded.crafting.snapshot(), session.crafting.snapshot());
        assert_eq!(loaded.possession.memory, session.possession.memory);
        assert_eq!(loaded.health, session.health);
        assert_eq!(loaded.town.records(), session.town.records());
        assert_eq!(loaded.town.alive_count(), 23);
    }

    #[test]
    fn test_json_roundtrip() {
        let session = played_session();
        let json = session.to_json().expect("Export failed");
        assert!(json.contains("\"version\": 1"));

        let mut loaded = GameSession::default();
        loaded.load_json(&json).expect("Import failed");
        assert_eq!(loaded.route.counters, session.route.counters);
        assert_eq!(loaded.clock.day, session.clock.day);
        assert_eq!(loaded.town.records(), session.town.records());
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut data = played_session().snapshot();
        data.version = 99;
        let mut buffer = Vec::new();
        save_session(&mut buffer, &data).unwrap();

        let err = load_session(&buffer[..]).unwrap_err();
        assert!(matches!(
            err,
            SaveError::VersionMismatch { expected: 1, found: 99 }
        ));
    }

    #[test]
    fn test_truncated_save_is_an_error() {
        let mut buffer = Vec::new();
        played_session().save(&mut buffer).unwrap();
        buffer.truncate(buffer.len() / 2);
        assert!(GameSession::default().load(&buffer[..]).is_err());
    }
}
