//! Game session - main entry point for running the simulation

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use checkered_logic::clock::GameClock;
use checkered_logic::crafting::{CraftingEngine, Crafted};
use checkered_logic::health::{BodyPart, HealthEffect, HealthModel};
use checkered_logic::items::WorldObject;
use checkered_logic::population::{NpcId, NpcPopulation};
use checkered_logic::possession::{
    PlayerInput, PossessionCore, PossessionStart, PossessionStatus, TriggerContext,
};
use checkered_logic::route::{BehaviorEvent, Route, RouteScoring};
use checkered_logic::sanity::{ResourceState, SanityAction, SanityContext};
use checkered_logic::spatial::Vec3;
use checkered_logic::world::{Location, Relationship, TimeOfDay};

use crate::config::SessionConfig;
use crate::events::{EventBus, GameEvent};
use crate::persistence::{SaveData, SaveError, SAVE_VERSION};
use crate::town::Town;

/// Which loop the session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Playing,
    Possession,
}

/// Everything the HUD draws in one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub sim_time: f64,
    pub day: u32,
    pub time: String,
    pub period: TimeOfDay,
    pub location: Location,
    pub mode: GameMode,
    pub sanity: f32,
    pub comfort: f32,
    pub overall_health: f32,
    pub possession: PossessionStatus,
    pub primary_route: Option<Route>,
    pub alive_npcs: usize,
    pub inventory_slots: usize,
}

/// One playthrough: the town, the protagonist's state and the tick that
/// drives them.
pub struct GameSession {
    pub config: SessionConfig,
    pub town: Town,
    pub resources: ResourceState,
    pub crafting: CraftingEngine,
    pub possession: PossessionCore,
    pub route: RouteScoring,
    pub health: HealthModel,
    pub clock: GameClock,
    pub events: EventBus,
    pub player_position: Vec3,
    pub location: Location,
    /// Seconds of simulation since the session started
    sim_time: f64,
    mode: GameMode,
    rng: StdRng,
}

impl GameSession {
    /// Fresh session with the starting inventory and an empty town.
    pub fn new(config: SessionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            town: Town::new(),
            resources: ResourceState::new(config.sanity.clone()),
            crafting: CraftingEngine::with_starting_inventory(&config.inventory),
            possession: PossessionCore::new(config.possession.clone()),
            route: RouteScoring::new(config.route.clone()),
            health: HealthModel::new(),
            clock: GameClock::new(config.clock.clone()),
            events: EventBus::new(),
            player_position: Vec3::ZERO,
            location: config.start_location,
            sim_time: 0.0,
            mode: GameMode::Playing,
            rng,
            config,
        }
    }

    /// Generate `config.population` random townsfolk.
    pub fn populate_town(&mut self) -> Vec<NpcId> {
        let ids = self.town.populate(self.config.population, &mut self.rng);
        log::info!("Town populated with {} NPCs", ids.len());
        ids
    }

    /// Advance the session by `delta_seconds`, clamped to `max_delta`.
    pub fn update(&mut self, delta_seconds: f32, input: &PlayerInput) {
        let dt = if delta_seconds.is_finite() {
            delta_seconds.clamp(0.0, self.config.max_delta)
        } else {
            0.0
        };
        self.sim_time += dt as f64;

        let clock_events = self.clock.update(dt);
        self.events.publish_all(clock_events.into_iter().map(GameEvent::Clock));
        let health_events = self.health.update(dt);
        self.events.publish_all(health_events.into_iter().map(GameEvent::Health));

        match self.mode {
            GameMode::Playing => self.update_playing(dt, input),
            GameMode::Possession => self.update_possession(dt, input),
        }
    }

    fn update_playing(&mut self, dt: f32, input: &PlayerInput) {
        self.player_position = input.position;

        let ctx = SanityContext {
            now: self.sim_time,
            location: self.location,
            time_of_day: self.clock.period,
            nearby_npcs: self
                .town
                .nearby_npcs(self.player_position, self.config.company_radius),
        };
        let sanity_events = self.resources.update(dt, &ctx, &mut self.rng);
        self.events.publish_all(sanity_events.into_iter().map(GameEvent::Sanity));

        if !self.config.possession_enabled {
            return;
        }
        let trigger = TriggerContext {
            now: self.sim_time,
            day: self.clock.day,
            location: self.location,
        };
        if self
            .possession
            .check_trigger(&trigger, &self.resources, &mut self.rng)
        {
            self.start_possession();
        }
    }

    fn update_possession(&mut self, dt: f32, input: &PlayerInput) {
        self.player_position = input.position;
        let difficulty = self.resources.phantom_difficulty_modifier();
        let events = self
            .possession
            .update(dt, input, &mut self.town, difficulty, &mut self.rng);
        self.events.publish_all(events.into_iter().map(GameEvent::Possession));

        if self.possession.is_complete() {
            self.finish_possession();
        }
    }

    /// Start an episode now, springing any traps the player carries.
    /// False if one is already running.
    pub fn start_possession(&mut self) -> bool {
        let started = self.possession.start(PossessionStart {
            location: self.location,
            applied_traps: self.crafting.applied_traps().to_vec(),
        });
        if !started {
            return false;
        }
        self.crafting.clear_applied_traps();
        self.mode = GameMode::Possession;
        self.events.publish(GameEvent::PossessionStarted {
            location: self.location,
        });
        true
    }

    /// Debug hook: cut the running episode short and settle its aftermath.
    pub fn force_end_possession(&mut self) -> bool {
        if !self.possession.force_end() {
            return false;
        }
        self.finish_possession();
        true
    }

    fn finish_possession(&mut self) {
        let Some(aftermath) = self.possession.aftermath(self.sim_time, &mut self.rng) else {
            return;
        };

        for _ in &aftermath.killed_npc_ids {
            if let Some(route) = self.route.record_npc_death() {
                self.events.publish(GameEvent::RouteLocked(route));
            }
        }

        if let Some(phantom) = &aftermath.remaining_phantom {
            self.player_position = phantom.position;
            self.events.publish(GameEvent::PhantomLingers {
                position: phantom.position,
            });
        }

        for effect in &aftermath.trap_effects_for_player {
            let health_events = self
                .health
                .apply_effect(HealthEffect::from_combat(effect, BodyPart::Torso));
            self.events.publish_all(health_events.into_iter().map(GameEvent::Health));
        }

        let sanity_events = self.resources.on_possession_end(aftermath.outcome());
        self.events.publish_all(sanity_events.into_iter().map(GameEvent::Sanity));

        self.events.publish(GameEvent::PossessionEnded {
            npcs_killed: aftermath.killed_npc_ids.len(),
            phantoms_killed: aftermath.phantoms_killed,
            phantoms_escaped: aftermath.phantoms_escaped,
        });
        self.mode = GameMode::Playing;
    }

    /// Craft from the inventory. Successful crafts count toward the tech
    /// route; gory results cost sanity.
    pub fn craft(
        &mut self,
        first: &str,
        second: Option<&str>,
        world_object: Option<WorldObject>,
    ) -> Option<Crafted> {
        let crafted = self.crafting.craft(first, second, world_object)?;

        let mut behaviors = vec![BehaviorEvent::CraftingAttempt];
        if crafted.newly_discovered {
            behaviors.push(BehaviorEvent::UniqueRecipe);
        }
        self.track(&behaviors);

        if crafted.item.gory {
            self.perform_action(SanityAction::CraftedGory);
        }

        self.events.publish(GameEvent::Crafted {
            item_id: crafted.item.id.clone(),
            name: crafted.item.name.clone(),
            recipe_id: crafted.recipe_id.clone(),
            newly_discovered: crafted.newly_discovered,
        });
        Some(crafted)
    }

    /// Strap a placeable item from the inventory onto the protagonist.
    pub fn apply_trap(&mut self, item_id: &str) -> bool {
        self.crafting.apply_trap_to_self(item_id)
    }

    /// Talk to an NPC. Returns the NPC's new relationship band.
    pub fn talk_to(&mut self, npc: NpcId, helpful: bool) -> Option<Relationship> {
        let relationship = self.town.modify_relationship(npc, if helpful { 5 } else { 1 })?;
        if let Some(route) = self.route.record_dialogue(helpful) {
            self.events.publish(GameEvent::RouteLocked(route));
        }
        if helpful {
            self.perform_action(SanityAction::HelpedNpc);
        }
        Some(relationship)
    }

    /// Any non-dialogue interaction with an NPC, good or bad.
    pub fn interact(&mut self, npc: NpcId, positive: bool) -> Option<Relationship> {
        let relationship = self
            .town
            .modify_relationship(npc, if positive { 10 } else { -10 })?;
        self.route.record_npc_interaction(positive);
        Some(relationship)
    }

    pub fn record_exploration(&mut self, location: Location, duration: f32) {
        self.route.record_exploration(location, duration);
    }

    /// Feed raw behavior events to route scoring.
    pub fn track(&mut self, behaviors: &[BehaviorEvent]) {
        if let Some(route) = self.route.track(behaviors) {
            self.events.publish(GameEvent::RouteLocked(route));
        }
    }

    pub fn perform_action(&mut self, action: SanityAction) {
        let events = self.resources.on_action_performed(action);
        self.events.publish_all(events.into_iter().map(GameEvent::Sanity));
    }

    /// Walk into another area of town.
    pub fn set_location(&mut self, location: Location) {
        if location != self.location {
            log::debug!("Moved to {}", location.name());
            self.location = location;
        }
    }

    pub fn sleep(&mut self) {
        let events = self.clock.sleep();
        self.events.publish_all(events.into_iter().map(GameEvent::Clock));
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            sim_time: self.sim_time,
            day: self.clock.day,
            time: self.clock.time_string(),
            period: self.clock.period,
            location: self.location,
            mode: self.mode,
            sanity: self.resources.sanity,
            comfort: self.resources.comfort,
            overall_health: self.health.overall_health(),
            possession: self.possession.status(),
            primary_route: self.route.primary_route,
            alive_npcs: self.town.alive_count(),
            inventory_slots: self.crafting.inventory().len(),
        }
    }

    /// Persistable state. A running episode is not captured; only what
    /// outlives it (memory, history, cooldown) is.
    pub fn snapshot(&self) -> SaveData {
        if self.mode == GameMode::Possession {
            log::warn!("Saving mid-possession; the episode itself is not saved");
        }
        SaveData {
            version: SAVE_VERSION,
            sim_time: self.sim_time,
            location: self.location,
            player_position: self.player_position,
            resources: self.resources.clone(),
            crafting: self.crafting.snapshot(),
            possession: self.possession.memory.clone(),
            route: self.route.clone(),
            health: self.health.clone(),
            clock: self.clock.clone(),
            npcs: self.town.records(),
        }
    }

    /// Replace session state with a loaded snapshot. Tuning comes from this
    /// session's config, not the save.
    pub fn restore(&mut self, data: SaveData) {
        self.sim_time = data.sim_time;
        self.location = data.location;
        self.player_position = data.player_position;

        self.resources = data.resources;
        self.resources.config = self.config.sanity.clone();
        self.crafting.restore(data.crafting);
        self.possession = PossessionCore::new(self.config.possession.clone());
        self.possession.memory = data.possession;
        self.route = data.route;
        self.route.config = self.config.route.clone();
        self.health = data.health;
        self.clock = data.clock;
        self.town = Town::from_records(data.npcs);
        self.mode = GameMode::Playing;
    }

    /// Save session state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        crate::persistence::save_session(writer, &self.snapshot())
    }

    /// Load session state from a reader
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let data = crate::persistence::load_session(reader)?;
        self.restore(data);
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        crate::persistence::to_json(&self.snapshot())
    }

    pub fn load_json(&mut self, json: &str) -> Result<(), SaveError> {
        let data = crate::persistence::from_json(json)?;
        self.restore(data);
        Ok(())
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkered_logic::possession::Phase;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn seeded() -> GameSession {
        GameSession::new(SessionConfig {
            seed: Some(11),
            ..Default::default()
        })
    }

    #[test]
    fn test_session_creation() {
        let session = seeded();
        assert_eq!(session.mode(), GameMode::Playing);
        assert_eq!(session.sim_time(), 0.0);
        assert_eq!(session.crafting.item_count("cloth_rag"), 3);
        assert_eq!(session.town.npc_count(), 0);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut session = seeded();
        session.update(5.0, &PlayerInput::default());
        assert!((session.sim_time() - 0.1).abs() < 1e-6);
        session.update(f32::NAN, &PlayerInput::default());
        session.update(-1.0, &PlayerInput::default());
        assert!((session.sim_time() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_disabled_trigger_never_possesses() {
        let mut session = GameSession::new(SessionConfig {
            seed: Some(3),
            possession_enabled: false,
            ..Default::default()
        });
        session.possession.config.base_chance = 10.0;
        session.possession.config.grace_period = 0.0;
        for _ in 0..100 {
            session.update(0.1, &PlayerInput::default());
        }
        assert_eq!(session.mode(), GameMode::Playing);
    }

    #[test]
    fn test_forced_trigger_runs_full_episode() {
        let mut session = seeded();
        // Large enough that every roll hits regardless of modifiers
        session.possession.config.base_chance = 10.0;
        session.possession.config.grace_period = 0.0;
        session.town.spawn_npc("Earl", Location::Streets, Vec3::flat(3.0, 0.0), 0);

        let ended = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&ended);
        session.events.subscribe(Box::new(move |event| {
            if matches!(event, GameEvent::PossessionEnded { .. }) {
                *counter.borrow_mut() += 1;
            }
        }));

        session.update(0.1, &PlayerInput::default());
        assert_eq!(session.mode(), GameMode::Possession);
        assert_eq!(session.possession.phase(), Phase::Warning);

        // Warning 5 s + episode at most 45 s + one tick for cleanup
        for _ in 0..520 {
            session.update(0.1, &PlayerInput::default());
            if session.mode() == GameMode::Playing {
                break;
            }
        }
        assert_eq!(session.mode(), GameMode::Playing);
        assert_eq!(*ended.borrow(), 1);
        assert!(session.resources.sanity < 100.0);
        assert_eq!(session.resources.comfort, 0.0);
        assert_eq!(session.possession.memory.last_possession_time, Some(session.sim_time()));
    }

    #[test]
    fn test_traps_move_from_inventory_to_player() {
        let mut session = seeded();
        assert!(session.crafting.give("spike_trap", 1));
        assert!(session.apply_trap("spike_trap"));
        assert!(session.start_possession());
        assert!(session.crafting.applied_traps().is_empty());
        assert!(!session.start_possession());

        assert!(session.force_end_possession());
        assert_eq!(session.mode(), GameMode::Playing);
        assert_eq!(session.health.part(BodyPart::Torso).unwrap().health, 75.0);
        assert!(!session.force_end_possession());
    }

    #[test]
    fn test_craft_feeds_route_and_sanity() {
        let mut session = seeded();
        assert!(session.crafting.give("blood_vial", 1));
        assert!(session.crafting.give("candle", 1));
        let crafted = session.craft("blood_vial", Some("candle"), None).unwrap();
        assert_eq!(crafted.recipe_id.as_deref(), Some("blood_ritual"));
        assert_eq!(session.route.counters.crafting_attempts, 1);
        assert_eq!(session.route.counters.unique_recipes, 1);
        assert!((session.resources.sanity - 92.0).abs() < 1e-4);

        assert!(session.craft("blood_vial", Some("candle"), None).is_none());
        assert_eq!(session.route.counters.crafting_attempts, 1);
    }

    #[test]
    fn test_social_hooks() {
        let mut session = seeded();
        let npc = session.town.spawn_npc("Pearl", Location::Park, Vec3::ZERO, 16);
        assert_eq!(session.talk_to(npc, true), Some(Relationship::Friendly));
        assert_eq!(session.route.counters.helpful_actions, 1);
        assert_eq!(session.interact(npc, false), Some(Relationship::Neutral));
        assert_eq!(session.route.personality.negative_interactions, 1);
        assert_eq!(session.talk_to(999, true), None);
    }

    #[test]
    fn test_hud_snapshot() {
        let mut session = seeded();
        session.populate_town();
        session.set_location(Location::Bar);
        let hud = session.hud();
        assert_eq!(hud.day, 1);
        assert_eq!(hud.time, "06:00");
        assert_eq!(hud.location, Location::Bar);
        assert_eq!(hud.alive_npcs, 24);
        assert_eq!(hud.possession.phase, Phase::None);
    }
}
