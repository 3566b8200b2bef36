//! Boundary to the town's NPC population.
//!
//! The simulation core never owns NPCs. It reads them through
//! [`NpcPopulation`] and reports deaths back through the same trait.

use serde::{Deserialize, Serialize};

use crate::spatial::Vec3;
use crate::world::Relationship;

/// Stable NPC identifier.
pub type NpcId = u32;

/// Read-only view of one NPC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NpcView {
    pub id: NpcId,
    pub position: Vec3,
    pub is_alive: bool,
    pub relationship: Relationship,
}

/// Query/command surface the core needs from the NPC population.
pub trait NpcPopulation {
    /// Living NPCs within `radius` of `position`.
    fn nearby_npcs(&self, position: Vec3, radius: f32) -> Vec<NpcView>;

    /// Look up a single NPC regardless of distance.
    fn npc(&self, id: NpcId) -> Option<NpcView>;

    /// Mark an NPC dead. Returns false if the id is unknown or already dead.
    fn mark_dead(&mut self, id: NpcId) -> bool;
}

/// Plain `Vec`-backed population, used by tests and the headless harness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticPopulation {
    pub npcs: Vec<NpcView>,
}

impl StaticPopulation {
    pub fn new(npcs: Vec<NpcView>) -> Self {
        Self { npcs }
    }

    pub fn alive_count(&self) -> usize {
        self.npcs.iter().filter(|n| n.is_alive).count()
    }
}

impl NpcPopulation for StaticPopulation {
    fn nearby_npcs(&self, position: Vec3, radius: f32) -> Vec<NpcView> {
        let r2 = radius * radius;
        self.npcs
            .iter()
            .filter(|n| n.is_alive && n.position.distance_squared(&position) <= r2)
            .copied()
            .collect()
    }

    fn npc(&self, id: NpcId) -> Option<NpcView> {
        self.npcs.iter().find(|n| n.id == id).copied()
    }

    fn mark_dead(&mut self, id: NpcId) -> bool {
        match self.npcs.iter_mut().find(|n| n.id == id && n.is_alive) {
            Some(npc) => {
                npc.is_alive = false;
                true
            }
            None => false,
        }
    }
}
