//! The town's population, stored in a `hecs` world.
//!
//! [`Town`] is the production implementation of [`NpcPopulation`]: the
//! possession core reads townsfolk through it and reports deaths back.

use std::collections::HashMap;

use hecs::{Entity, World};
use rand::Rng;
use serde::{Deserialize, Serialize};

use checkered_logic::population::{NpcId, NpcPopulation, NpcView};
use checkered_logic::spatial::Vec3;
use checkered_logic::world::{Location, Relationship};

use crate::components::{Alive, Disposition, Npc, Position};

/// Half-width of the square the town is laid out in.
const TOWN_EXTENT: f32 = 40.0;

/// Flat, serializable copy of one townsperson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcRecord {
    pub npc: Npc,
    pub position: Position,
    pub disposition: Disposition,
    pub alive: bool,
}

pub struct Town {
    pub world: World,
    index: HashMap<NpcId, Entity>,
    next_id: NpcId,
}

impl Town {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    /// Add a living townsperson. Returns the new id.
    pub fn spawn_npc(
        &mut self,
        name: impl Into<String>,
        home: Location,
        position: Vec3,
        disposition: i32,
    ) -> NpcId {
        let id = self.next_id;
        self.next_id += 1;
        let entity = self.world.spawn((
            Npc {
                id,
                name: name.into(),
                home,
            },
            Position(position),
            Disposition::new(disposition),
            Alive,
        ));
        self.index.insert(id, entity);
        id
    }

    /// Scatter `count` randomly named townsfolk across the town.
    pub fn populate(&mut self, count: u32, rng: &mut impl Rng) -> Vec<NpcId> {
        (0..count)
            .map(|_| {
                let name = format!(
                    "{} {}",
                    GIVEN_NAMES[rng.gen_range(0..GIVEN_NAMES.len())],
                    FAMILY_NAMES[rng.gen_range(0..FAMILY_NAMES.len())]
                );
                let home = Location::ALL[rng.gen_range(0..Location::ALL.len())];
                let position = Vec3::flat(
                    rng.gen_range(-TOWN_EXTENT..TOWN_EXTENT),
                    rng.gen_range(-TOWN_EXTENT..TOWN_EXTENT),
                );
                let disposition = rng.gen_range(-30..40);
                self.spawn_npc(name, home, position, disposition)
            })
            .collect()
    }

    fn view(&self, entity: Entity) -> Option<NpcView> {
        let mut query = self
            .world
            .query_one::<(&Npc, &Position, &Disposition, Option<&Alive>)>(entity)
            .ok()?;
        let (npc, position, disposition, alive) = query.get()?;
        Some(NpcView {
            id: npc.id,
            position: position.0,
            is_alive: alive.is_some(),
            relationship: disposition.relationship,
        })
    }

    pub fn name(&self, id: NpcId) -> Option<String> {
        let entity = *self.index.get(&id)?;
        self.world.get::<&Npc>(entity).ok().map(|npc| npc.name.clone())
    }

    /// Shift how an NPC feels about the protagonist. Returns the new band,
    /// or `None` for unknown or dead NPCs.
    pub fn modify_relationship(&mut self, id: NpcId, delta: i32) -> Option<Relationship> {
        let entity = *self.index.get(&id)?;
        let (disposition, _) = self
            .world
            .query_one_mut::<(&mut Disposition, &Alive)>(entity)
            .ok()?;
        disposition.adjust(delta);
        Some(disposition.relationship)
    }

    /// Move an NPC. False for unknown ids.
    pub fn set_position(&mut self, id: NpcId, position: Vec3) -> bool {
        let Some(&entity) = self.index.get(&id) else {
            return false;
        };
        match self.world.query_one_mut::<&mut Position>(entity) {
            Ok(current) => {
                current.0 = position;
                true
            }
            Err(_) => false,
        }
    }

    pub fn npc_count(&self) -> usize {
        self.index.len()
    }

    pub fn alive_count(&self) -> usize {
        self.world.query::<(&Npc, &Alive)>().iter().count()
    }

    /// Every townsperson, ordered by id.
    pub fn records(&self) -> Vec<NpcRecord> {
        let mut records: Vec<NpcRecord> = self
            .world
            .query::<(&Npc, &Position, &Disposition, Option<&Alive>)>()
            .iter()
            .map(|(_, (npc, position, disposition, alive))| NpcRecord {
                npc: npc.clone(),
                position: *position,
                disposition: *disposition,
                alive: alive.is_some(),
            })
            .collect();
        records.sort_by_key(|r| r.npc.id);
        records
    }

    /// Rebuild a town from saved records, keeping their ids.
    pub fn from_records(records: Vec<NpcRecord>) -> Self {
        let mut town = Self::new();
        for record in records {
            let id = record.npc.id;
            let entity = if record.alive {
                town.world
                    .spawn((record.npc, record.position, record.disposition, Alive))
            } else {
                town.world
                    .spawn((record.npc, record.position, record.disposition))
            };
            town.index.insert(id, entity);
            town.next_id = town.next_id.max(id + 1);
        }
        town
    }
}

impl Default for Town {
    fn default() -> Self {
        Self::new()
    }
}

impl NpcPopulation for Town {
    fn nearby_npcs(&self, position: Vec3, radius: f32) -> Vec<NpcView> {
        let r2 = radius * radius;
        let mut nearby: Vec<NpcView> = self
            .world
            .query::<(&Npc, &Position, &Disposition, &Alive)>()
            .iter()
            .filter(|(_, (_, pos, _, _))| pos.0.distance_squared(&position) <= r2)
            .map(|(_, (npc, pos, disposition, _))| NpcView {
                id: npc.id,
                position: pos.0,
                is_alive: true,
                relationship: disposition.relationship,
            })
            .collect();
        // Archetype iteration order is not stable across spawns
        nearby.sort_by_key(|n| n.id);
        nearby
    }

    fn npc(&self, id: NpcId) -> Option<NpcView> {
        let entity = *self.index.get(&id)?;
        self.view(entity)
    }

    fn mark_dead(&mut self, id: NpcId) -> bool {
        let Some(&entity) = self.index.get(&id) else {
            return false;
        };
        match self.world.remove_one::<Alive>(entity) {
            Ok(_) => {
                log::debug!("NPC {} died", id);
                true
            }
            Err(_) => false,
        }
    }
}

static GIVEN_NAMES: &[&str] = &[
    "Agnes", "Arthur", "Beatrice", "Clyde", "Dolores", "Earl", "Edith", "Floyd",
    "Gladys", "Harold", "Irene", "Jasper", "June", "Leon", "Mabel", "Marvin",
    "Nora", "Otis", "Pearl", "Ray", "Ruth", "Stan", "Thelma", "Walt",
];

static FAMILY_NAMES: &[&str] = &[
    "Abernathy", "Baker", "Callahan", "Dunn", "Ellison", "Fisk", "Garrity",
    "Holloway", "Ingram", "Jessup", "Kowalski", "Lindqvist", "Mercer", "Nash",
    "Okafor", "Pruitt", "Quinlan", "Reyes", "Sutter", "Thorne",
];
