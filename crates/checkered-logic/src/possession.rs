//! Possession: the per-tick trigger roll and the combat episode.
//!
//! An episode walks `None -> Warning -> Active -> Ending -> None`. During
//! `Active`, phantoms spawn around the player and hunt nearby NPCs while the
//! player tries to cut them down. [`PossessionCore::aftermath`] closes the
//! episode, stamps the cooldown and hands back what happened.
//!
//! The core holds no render handles. Spawns, moves, hits and despawns are
//! queued as [`PhantomIntent`]s for a presentation adapter to drain.

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::items::{Item, TrapEffect};
use crate::population::{NpcId, NpcPopulation};
use crate::sanity::{PossessionOutcome, ResourceState};
use crate::spatial::Vec3;
use crate::world::Location;

/// Possession tuning. Times in seconds, distances in world units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PossessionConfig {
    pub warning_duration: f32,
    pub max_duration: f32,
    /// No possession before this much session time has passed.
    pub grace_period: f64,
    pub base_cooldown: f32,
    /// Cooldown is re-rolled in `base ± variance` after every episode.
    pub cooldown_variance: f32,
    /// Per-tick trigger probability before modifiers.
    pub base_chance: f64,
    pub high_comfort_threshold: f32,
    pub max_phantoms: u32,
    pub phantom_health: f32,
    /// Scaled by the sanity difficulty modifier.
    pub phantom_speed: f32,
    pub targeting_radius: f32,
    pub kill_range: f32,
    pub spawn_distance_min: f32,
    pub spawn_distance_spread: f32,
    pub attack_speed: f32,
    pub attack_range: f32,
    pub attack_damage: f32,
    /// Distance in front of the player the attack is centered on.
    pub attack_reach: f32,
    pub knockback: f32,
    pub continuous_damage_factor: f32,
}

impl Default for PossessionConfig {
    fn default() -> Self {
        Self {
            warning_duration: 5.0,
            max_duration: 45.0,
            grace_period: 300.0,
            base_cooldown: 180.0,
            cooldown_variance: 60.0,
            base_chance: 0.0002,
            high_comfort_threshold: 70.0,
            max_phantoms: 4,
            phantom_health: 100.0,
            phantom_speed: 2.5,
            targeting_radius: 50.0,
            kill_range: 1.5,
            spawn_distance_min: 8.0,
            spawn_distance_spread: 5.0,
            attack_speed: 0.4,
            attack_range: 2.5,
            attack_damage: 25.0,
            attack_reach: 1.5,
            knockback: 1.0,
            continuous_damage_factor: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    None,
    Warning,
    Active,
    Ending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Slow,
    Stun,
    Damage,
}

/// A combat effect produced by an applied trap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    /// Speed multiplier, stun seconds or damage amount.
    pub value: f32,
    /// `None` lasts for the whole episode.
    pub duration: Option<f32>,
    pub continuous: bool,
}

impl Effect {
    /// Combat effects of one trap. Alert and fire traps have none.
    pub fn from_trap(trap: &Item) -> Vec<Effect> {
        trap.trap_effects
            .iter()
            .filter_map(|effect| match effect {
                TrapEffect::Slow => Some(Effect {
                    kind: EffectKind::Slow,
                    value: 0.5,
                    duration: None,
                    continuous: false,
                }),
                TrapEffect::Stun => Some(Effect {
                    kind: EffectKind::Stun,
                    value: 3.0,
                    duration: Some(5.0),
                    continuous: false,
                }),
                TrapEffect::Damage => Some(Effect {
                    kind: EffectKind::Damage,
                    value: trap.damage.unwrap_or(15.0),
                    duration: None,
                    continuous: trap.continuous,
                }),
                TrapEffect::Alert | TrapEffect::Fire => None,
            })
            .collect()
    }
}

pub type PhantomId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phantom {
    pub id: PhantomId,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub target: Option<NpcId>,
    pub position: Vec3,
    pub effects: Vec<Effect>,
    pub stun_timer: f32,
}

impl Phantom {
    fn new(id: PhantomId, health: f32, speed: f32, position: Vec3, target: Option<NpcId>) -> Self {
        Self {
            id,
            health,
            max_health: health,
            speed,
            target,
            position,
            effects: Vec::new(),
            stun_timer: 0.0,
        }
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_timer > 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect.kind {
            EffectKind::Slow => self.speed *= effect.value,
            EffectKind::Stun => self.stun_timer = self.stun_timer.max(effect.value),
            EffectKind::Damage if !effect.continuous => self.take_damage(effect.value),
            EffectKind::Damage => {}
        }
        self.effects.push(effect);
    }
}

/// Per-tick player input relevant to combat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Attack button went down this tick.
    pub attack_pressed: bool,
    pub position: Vec3,
    pub facing: Vec3,
}

/// Everything `start` needs.
#[derive(Debug, Clone)]
pub struct PossessionStart {
    pub location: Location,
    pub applied_traps: Vec<Item>,
}

/// Inputs to the trigger roll besides the resource state.
#[derive(Debug, Clone, Copy)]
pub struct TriggerContext {
    /// Session time in seconds.
    pub now: f64,
    pub day: u32,
    pub location: Location,
}

/// State that outlives an episode and is saved with the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PossessionMemory {
    pub last_possession_time: Option<f64>,
    pub current_cooldown: f32,
    /// Episodes started per location.
    pub history: BTreeMap<Location, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PossessionEvent {
    PhaseChanged { from: Phase, to: Phase },
    PhantomsSpawned(u32),
    NpcKilled { npc: NpcId, by: PhantomId },
    PhantomKilled(PhantomId),
    PlayerAttacked { hits: usize },
}

/// Scene-graph work for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PhantomIntent {
    Spawned { id: PhantomId, position: Vec3 },
    Moved { id: PhantomId, position: Vec3, facing: Vec3 },
    Hit { id: PhantomId, health: f32 },
    Despawned { id: PhantomId },
}

/// HUD snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PossessionStatus {
    pub phase: Phase,
    pub warning_progress: f32,
    pub duration: f32,
    pub max_duration: f32,
    pub phantom_count: usize,
    pub phantoms_killed: u32,
    pub npcs_killed: usize,
}

/// Report handed back when an episode closes.
///
/// `phantoms_killed + phantoms_escaped + remaining_phantom` always equals
/// `phantoms_spawned`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aftermath {
    pub location: Location,
    pub killed_npc_ids: Vec<NpcId>,
    pub phantoms_spawned: u32,
    pub phantoms_killed: u32,
    /// Phantoms dropped by a forced end or left behind by a timeout.
    pub phantoms_escaped: u32,
    /// Survivor of a timeout; lingers in the world at its position.
    pub remaining_phantom: Option<Phantom>,
    pub trap_effects_for_player: Vec<Effect>,
    pub duration: f32,
}

impl Aftermath {
    pub fn outcome(&self) -> PossessionOutcome {
        PossessionOutcome {
            npcs_killed: self.killed_npc_ids.len(),
            phantoms_killed: self.phantoms_killed,
        }
    }
}

pub struct PossessionCore {
    pub config: PossessionConfig,
    pub memory: PossessionMemory,
    phase: Phase,
    complete: bool,
    location: Location,
    warning_progress: f32,
    current_duration: f32,
    attack_cooldown: f32,
    phantoms: Vec<Phantom>,
    next_phantom_id: PhantomId,
    phantoms_spawned: u32,
    phantoms_killed: u32,
    phantoms_escaped: u32,
    killed_npc_ids: Vec<NpcId>,
    remaining_phantom: Option<Phantom>,
    trap_effects_on_phantoms: Vec<Effect>,
    trap_effects_on_player: Vec<Effect>,
    intents: Vec<PhantomIntent>,
}

impl PossessionCore {
    pub fn new(config: PossessionConfig) -> Self {
        let memory = PossessionMemory {
            last_possession_time: None,
            current_cooldown: config.base_cooldown,
            history: BTreeMap::new(),
        };
        Self {
            config,
            memory,
            phase: Phase::None,
            complete: false,
            location: Location::Streets,
            warning_progress: 0.0,
            current_duration: 0.0,
            attack_cooldown: 0.0,
            phantoms: Vec::new(),
            next_phantom_id: 0,
            phantoms_spawned: 0,
            phantoms_killed: 0,
            phantoms_escaped: 0,
            killed_npc_ids: Vec::new(),
            remaining_phantom: None,
            trap_effects_on_phantoms: Vec::new(),
            trap_effects_on_player: Vec::new(),
            intents: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != Phase::None
    }

    /// Ending cleanup has run; the caller should collect the aftermath.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn phantoms(&self) -> &[Phantom] {
        &self.phantoms
    }

    pub fn warning_progress(&self) -> f32 {
        self.warning_progress
    }

    /// Per-tick trigger probability with every modifier applied.
    pub fn trigger_chance(&self, resources: &ResourceState, location: Location, day: u32) -> f64 {
        let sanity = resources.sanity;
        let comfort = resources.comfort;
        let mut chance = self.config.base_chance * resources.possession_chance_modifier() as f64;

        if comfort > self.config.high_comfort_threshold {
            chance *= 1.3 + ((comfort - self.config.high_comfort_threshold) / 60.0) as f64;
        }

        let count = self.memory.history.get(&location).copied().unwrap_or(0);
        if count > 0 {
            if sanity < 50.0 {
                chance *= 1.0 + count as f64 * 0.15;
            } else if sanity > 70.0 {
                chance *= (1.0 - count as f64 * 0.1).max(0.5);
            }
        }

        chance * (1.0 + day as f64 / 100.0)
    }

    /// Seconds until the grace period and cooldown both allow a trigger.
    pub fn time_until_possible(&self, now: f64) -> f64 {
        if now < self.config.grace_period {
            return self.config.grace_period - now;
        }
        if let Some(last) = self.memory.last_possession_time {
            let since = now - last;
            let cooldown = self.memory.current_cooldown as f64;
            if since < cooldown {
                return cooldown - since;
            }
        }
        0.0
    }

    /// Bernoulli roll for this tick. Always false mid-episode, during the
    /// grace period or while cooling down.
    pub fn check_trigger(
        &self,
        ctx: &TriggerContext,
        resources: &ResourceState,
        rng: &mut impl Rng,
    ) -> bool {
        if self.phase != Phase::None || self.time_until_possible(ctx.now) > 0.0 {
            return false;
        }
        let chance = self.trigger_chance(resources, ctx.location, ctx.day);
        let hit = rng.gen::<f64>() < chance;
        if hit {
            log::info!(
                "Possession triggered at {} (chance {:.6})",
                ctx.location.name(),
                chance
            );
        }
        hit
    }

    /// Begin the warning phase. Returns false if an episode is already running.
    pub fn start(&mut self, start: PossessionStart) -> bool {
        if self.phase != Phase::None {
            return false;
        }
        log::info!("Possession starting at {}", start.location.name());

        self.phase = Phase::Warning;
        self.complete = false;
        self.location = start.location;
        self.warning_progress = 0.0;
        self.current_duration = 0.0;
        self.attack_cooldown = 0.0;
        self.phantoms.clear();
        self.phantoms_spawned = 0;
        self.phantoms_killed = 0;
        self.phantoms_escaped = 0;
        self.killed_npc_ids.clear();
        self.remaining_phantom = None;

        // The same list goes to both sides: a sprung trap hits whoever is closest.
        let effects: Vec<Effect> = start.applied_traps.iter().flat_map(Effect::from_trap).collect();
        self.trap_effects_on_phantoms = effects.clone();
        self.trap_effects_on_player = effects;

        *self.memory.history.entry(start.location).or_insert(0) += 1;
        true
    }

    pub fn update<P: NpcPopulation>(
        &mut self,
        delta_seconds: f32,
        input: &PlayerInput,
        population: &mut P,
        difficulty: f32,
        rng: &mut impl Rng,
    ) -> Vec<PossessionEvent> {
        let mut events = Vec::new();
        match self.phase {
            Phase::None => {}
            Phase::Warning => {
                self.update_warning(delta_seconds, input, population, difficulty, rng, &mut events)
            }
            Phase::Active => self.update_active(delta_seconds, input, population, &mut events),
            Phase::Ending => self.finish_ending(),
        }
        events
    }

    fn set_phase(&mut self, to: Phase, events: &mut Vec<PossessionEvent>) {
        let from = self.phase;
        self.phase = to;
        events.push(PossessionEvent::PhaseChanged { from, to });
    }

    fn update_warning<P: NpcPopulation>(
        &mut self,
        delta_seconds: f32,
        input: &PlayerInput,
        population: &P,
        difficulty: f32,
        rng: &mut impl Rng,
        events: &mut Vec<PossessionEvent>,
    ) {
        if self.config.warning_duration > 0.0 {
            self.warning_progress += delta_seconds / self.config.warning_duration;
        } else {
            self.warning_progress = 1.0;
        }
        if self.warning_progress >= 1.0 {
            self.warning_progress = 1.0;
            self.set_phase(Phase::Active, events);
            self.spawn_phantoms(input.position, population, difficulty, rng);
            events.push(PossessionEvent::PhantomsSpawned(self.phantoms_spawned));
            log::info!("Possession active, {} phantoms spawned", self.phantoms_spawned);
        }
    }

    fn spawn_phantoms<P: NpcPopulation>(
        &mut self,
        player: Vec3,
        population: &P,
        difficulty: f32,
        rng: &mut impl Rng,
    ) {
        let cfg = &self.config;
        let rolled = (2.0 + rng.gen::<f32>() * 2.0 * difficulty).ceil().max(0.0) as u32;
        let count = rolled.min(cfg.max_phantoms);
        let targets = population.nearby_npcs(player, cfg.targeting_radius);
        let slots = cfg.max_phantoms.max(1) as f32;

        for i in 0..count {
            let target = if targets.is_empty() {
                None
            } else {
                Some(targets[i as usize % targets.len()].id)
            };
            let angle = (i as f32 / slots) * TAU + rng.gen::<f32>() * 0.5;
            let distance = cfg.spawn_distance_min + rng.gen::<f32>() * cfg.spawn_distance_spread;
            let position = Vec3::new(
                player.x + angle.cos() * distance,
                0.0,
                player.z + angle.sin() * distance,
            );

            let mut phantom = Phantom::new(
                self.next_phantom_id,
                cfg.phantom_health,
                cfg.phantom_speed * difficulty,
                position,
                target,
            );
            self.next_phantom_id += 1;
            for effect in &self.trap_effects_on_phantoms {
                phantom.apply_effect(*effect);
            }
            self.intents.push(PhantomIntent::Spawned {
                id: phantom.id,
                position,
            });
            self.phantoms.push(phantom);
        }
        self.phantoms_spawned = count;
    }

    fn update_active<P: NpcPopulation>(
        &mut self,
        delta_seconds: f32,
        input: &PlayerInput,
        population: &mut P,
        events: &mut Vec<PossessionEvent>,
    ) {
        self.current_duration += delta_seconds;
        self.attack_cooldown = (self.attack_cooldown - delta_seconds).max(0.0);
        self.remove_dead(events);

        let mut phantoms = std::mem::take(&mut self.phantoms);
        for phantom in &mut phantoms {
            self.tick_phantom(phantom, delta_seconds, population, events);
        }
        self.phantoms = phantoms;
        self.remove_dead(events);

        if input.attack_pressed && self.attack_cooldown <= 0.0 {
            let hits = self.perform_attack(input);
            events.push(PossessionEvent::PlayerAttacked { hits });
            self.remove_dead(events);
        }

        if self.phantoms.is_empty() {
            log::info!("All phantoms defeated");
            self.set_phase(Phase::Ending, events);
        } else if self.current_duration >= self.config.max_duration {
            log::info!("Possession timed out with {} phantoms left", self.phantoms.len());
            self.remaining_phantom = self.phantoms.first().cloned();
            self.phantoms_escaped += self.phantoms.len() as u32 - 1;
            self.set_phase(Phase::Ending, events);
        }
    }

    fn tick_phantom<P: NpcPopulation>(
        &mut self,
        phantom: &mut Phantom,
        delta_seconds: f32,
        population: &mut P,
        events: &mut Vec<PossessionEvent>,
    ) {
        if phantom.is_dead() {
            return;
        }
        if phantom.is_stunned() {
            phantom.stun_timer = (phantom.stun_timer - delta_seconds).max(0.0);
            return;
        }

        let tick_damage: f32 = phantom
            .effects
            .iter()
            .filter(|e| e.kind == EffectKind::Damage && e.continuous)
            .map(|e| e.value * delta_seconds * self.config.continuous_damage_factor)
            .sum();
        if tick_damage > 0.0 {
            phantom.take_damage(tick_damage);
            if phantom.is_dead() {
                return;
            }
        }

        let target = phantom
            .target
            .and_then(|id| population.npc(id))
            .filter(|npc| npc.is_alive);
        let Some(target) = target else {
            phantom.target = find_new_target(
                &*population,
                phantom.position,
                self.config.targeting_radius,
                &self.killed_npc_ids,
            );
            return;
        };

        let step = phantom.speed * delta_seconds;
        let facing = (target.position - phantom.position).normalize();
        phantom.position = phantom.position.move_toward(&target.position, step);
        self.intents.push(PhantomIntent::Moved {
            id: phantom.id,
            position: phantom.position,
            facing,
        });

        if phantom.position.distance(&target.position) < self.config.kill_range {
            if population.mark_dead(target.id) {
                log::debug!("Phantom {} killed NPC {}", phantom.id, target.id);
                self.killed_npc_ids.push(target.id);
                events.push(PossessionEvent::NpcKilled {
                    npc: target.id,
                    by: phantom.id,
                });
            }
            phantom.target = find_new_target(
                &*population,
                phantom.position,
                self.config.targeting_radius,
                &self.killed_npc_ids,
            );
        }
    }

    fn perform_attack(&mut self, input: &PlayerInput) -> usize {
        self.attack_cooldown = self.config.attack_speed;
        let point = input
            .position
            .add_scaled(input.facing.normalize(), self.config.attack_reach);

        let mut hits = 0;
        for phantom in &mut self.phantoms {
            if phantom.position.distance(&point) >= self.config.attack_range {
                continue;
            }
            phantom.take_damage(self.config.attack_damage);
            let away = (phantom.position - input.position).normalize();
            phantom.position = phantom.position.add_scaled(away, self.config.knockback);
            self.intents.push(PhantomIntent::Hit {
                id: phantom.id,
                health: phantom.health,
            });
            hits += 1;
        }
        hits
    }

    fn remove_dead(&mut self, events: &mut Vec<PossessionEvent>) {
        let (dead, alive): (Vec<Phantom>, Vec<Phantom>) =
            std::mem::take(&mut self.phantoms)
                .into_iter()
                .partition(Phantom::is_dead);
        for phantom in dead {
            self.phantoms_killed += 1;
            self.intents.push(PhantomIntent::Despawned { id: phantom.id });
            events.push(PossessionEvent::PhantomKilled(phantom.id));
        }
        self.phantoms = alive;
    }

    fn finish_ending(&mut self) {
        for phantom in self.phantoms.drain(..) {
            self.intents.push(PhantomIntent::Despawned { id: phantom.id });
        }
        self.complete = true;
    }

    /// Debug hook: end the episode now. Live phantoms count as escaped.
    /// Returns false if there was nothing to end.
    pub fn force_end(&mut self) -> bool {
        if self.phase == Phase::None || self.complete {
            return false;
        }
        if self.phase != Phase::Ending {
            self.phantoms_escaped += self.phantoms.len() as u32;
            log::info!("Possession force-ended in {:?}", self.phase);
            self.phase = Phase::Ending;
        }
        self.finish_ending();
        true
    }

    /// Close a completed episode: stamp the cooldown, clear trap state and
    /// return to `None`. `None` if there is no completed episode to close.
    pub fn aftermath(&mut self, now: f64, rng: &mut impl Rng) -> Option<Aftermath> {
        if self.phase == Phase::None || !self.complete {
            return None;
        }

        self.memory.last_possession_time = Some(now);
        self.memory.current_cooldown = self.config.base_cooldown
            + (rng.gen::<f32>() - 0.5) * 2.0 * self.config.cooldown_variance;

        let aftermath = Aftermath {
            location: self.location,
            killed_npc_ids: std::mem::take(&mut self.killed_npc_ids),
            phantoms_spawned: self.phantoms_spawned,
            phantoms_killed: self.phantoms_killed,
            phantoms_escaped: self.phantoms_escaped,
            remaining_phantom: self.remaining_phantom.take(),
            trap_effects_for_player: std::mem::take(&mut self.trap_effects_on_player),
            duration: self.current_duration,
        };
        self.trap_effects_on_phantoms.clear();
        self.phase = Phase::None;
        self.complete = false;

        log::info!(
            "Possession over: {} NPCs lost, {} phantoms killed, next cooldown {:.0}s",
            aftermath.killed_npc_ids.len(),
            aftermath.phantoms_killed,
            self.memory.current_cooldown
        );
        Some(aftermath)
    }

    pub fn status(&self) -> PossessionStatus {
        PossessionStatus {
            phase: self.phase,
            warning_progress: self.warning_progress,
            duration: self.current_duration,
            max_duration: self.config.max_duration,
            phantom_count: self.phantoms.len(),
            phantoms_killed: self.phantoms_killed,
            npcs_killed: self.killed_npc_ids.len(),
        }
    }

    /// Hand queued presentation intents to the caller.
    pub fn drain_intents(&mut self) -> Vec<PhantomIntent> {
        std::mem::take(&mut self.intents)
    }
}

impl Default for PossessionCore {
    fn default() -> Self {
        Self::new(PossessionConfig::default())
    }
}

/// Nearest living NPC not already killed this episode.
fn find_new_target<P: NpcPopulation + ?Sized>(
    population: &P,
    from: Vec3,
    radius: f32,
    killed: &[NpcId],
) -> Option<NpcId> {
    population
        .nearby_npcs(from, radius)
        .into_iter()
        .filter(|npc| npc.is_alive && !killed.contains(&npc.id))
        .min_by(|a, b| {
            a.position
                .distance_squared(&from)
                .total_cmp(&b.position.distance_squared(&from))
        })
        .map(|npc| npc.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::{NpcView, StaticPopulation};
    use crate::world::Relationship;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn npc(id: NpcId, x: f32, z: f32) -> NpcView {
        NpcView {
            id,
            position: Vec3::flat(x, z),
            is_alive: true,
            relationship: Relationship::Neutral,
        }
    }

    fn begin(core: &mut PossessionCore, traps: Vec<Item>) {
        assert!(core.start(PossessionStart {
            location: Location::Park,
            applied_traps: traps,
        }));
    }

    /// Tick until the phase changes or `max_ticks` run out.
    fn run_until_phase_changes(
        core: &mut PossessionCore,
        pop: &mut StaticPopulation,
        input: &PlayerInput,
        rng: &mut StdRng,
        max_ticks: usize,
    ) {
        let start = core.phase();
        for _ in 0..max_ticks {
            core.update(0.1, input, pop, 1.0, rng);
            if core.phase() != start {
                return;
            }
        }
    }

    #[test]
    fn test_trigger_blocked_during_grace_period() {
        let core = PossessionCore::default();
        let mut resources = ResourceState::default();
        resources.sanity = 0.0;
        resources.comfort = 100.0;
        let mut rng = StdRng::seed_from_u64(1);
        let ctx = TriggerContext {
            now: 100.0,
            day: 70,
            location: Location::Park,
        };
        for _ in 0..10_000 {
            assert!(!core.check_trigger(&ctx, &resources, &mut rng));
        }
    }

    #[test]
    fn test_trigger_chance_modifiers() {
        let mut core = PossessionCore::default();
        let mut resources = ResourceState::default();
        resources.sanity = 60.0;
        resources.comfort = 0.0;
        let base = core.trigger_chance(&resources, Location::Park, 0);
        assert!((base - 0.0002).abs() < 1e-12);

        resources.comfort = 100.0;
        let comfy = core.trigger_chance(&resources, Location::Park, 0);
        assert!((comfy - 0.0002 * 1.8).abs() < 1e-9);

        resources.comfort = 0.0;
        resources.sanity = 20.0;
        core.memory.history.insert(Location::Park, 2);
        let haunted = core.trigger_chance(&resources, Location::Park, 50);
        assert!((haunted - 0.0002 * 1.5 * 1.3 * 1.5).abs() < 1e-9);

        resources.sanity = 90.0;
        core.memory.history.insert(Location::Park, 10);
        let calm = core.trigger_chance(&resources, Location::Park, 0);
        assert!((calm - 0.0002 * 0.8 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_start_rejected_mid_episode() {
        let mut core = PossessionCore::default();
        begin(&mut core, Vec::new());
        assert!(!core.start(PossessionStart {
            location: Location::Bar,
            applied_traps: Vec::new(),
        }));
        assert_eq!(core.memory.history.get(&Location::Park), Some(&1));
        assert_eq!(core.memory.history.get(&Location::Bar), None);
    }

    #[test]
    fn test_warning_then_spawn() {
        let mut core = PossessionCore::default();
        let mut pop = StaticPopulation::new(vec![npc(1, 20.0, 0.0), npc(2, -20.0, 0.0)]);
        let mut rng = StdRng::seed_from_u64(7);
        begin(&mut core, Vec::new());

        let input = PlayerInput::default();
        core.update(2.5, &input, &mut pop, 1.0, &mut rng);
        assert_eq!(core.phase(), Phase::Warning);
        assert!((core.warning_progress() - 0.5).abs() < 1e-6);

        let events = core.update(2.5, &input, &mut pop, 1.0, &mut rng);
        assert_eq!(core.phase(), Phase::Active);
        assert!(events.contains(&PossessionEvent::PhaseChanged {
            from: Phase::Warning,
            to: Phase::Active,
        }));
        let count = core.phantoms().len();
        assert!((2..=4).contains(&count));
        for phantom in core.phantoms() {
            let dist = phantom.position.distance(&Vec3::ZERO);
            assert!((8.0 - 1e-3..=13.0 + 1e-3).contains(&dist));
            assert!(phantom.target.is_some());
        }
        let spawned = core
            .drain_intents()
            .iter()
            .filter(|i| matches!(i, PhantomIntent::Spawned { .. }))
            .count();
        assert_eq!(spawned, count);
    }

    #[test]
    fn test_phantoms_hunt_npcs() {
        let mut core = PossessionCore::default();
        let mut pop = StaticPopulation::new(vec![npc(1, 0.0, 0.0)]);
        let mut rng = StdRng::seed_from_u64(3);
        begin(&mut core, Vec::new());
        let input = PlayerInput {
            position: Vec3::flat(1.0, 1.0),
            ..Default::default()
        };
        core.update(5.0, &input, &mut pop, 1.0, &mut rng);
        assert_eq!(core.phase(), Phase::Active);

        for _ in 0..100 {
            core.update(0.1, &input, &mut pop, 1.0, &mut rng);
        }
        assert_eq!(pop.alive_count(), 0);
        assert_eq!(core.status().npcs_killed, 1);
        assert!(core.phantoms().iter().all(|p| p.target.is_none()));
    }

    #[test]
    fn test_targetless_phantoms_idle() {
        let mut core = PossessionCore::default();
        let mut pop = StaticPopulation::default();
        let mut rng = StdRng::seed_from_u64(11);
        begin(&mut core, Vec::new());
        let input = PlayerInput::default();
        core.update(5.0, &input, &mut pop, 1.0, &mut rng);
        let before: Vec<Vec3> = core.phantoms().iter().map(|p| p.position).collect();
        for _ in 0..20 {
            core.update(0.1, &input, &mut pop, 1.0, &mut rng);
        }
        let after: Vec<Vec3> = core.phantoms().iter().map(|p| p.position).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_attack_hits_and_respects_cooldown() {
        let mut core = PossessionCore::default();
        let mut pop = StaticPopulation::default();
        let mut rng = StdRng::seed_from_u64(5);
        begin(&mut core, Vec::new());
        let idle = PlayerInput::default();
        core.update(5.0, &idle, &mut pop, 1.0, &mut rng);

        // Walk the player next to the first phantom and swing at it
        let target = core.phantoms()[0].position;
        let position = target.add_scaled(Vec3::flat(-1.0, 0.0), 1.5);
        let swing = PlayerInput {
            attack_pressed: true,
            position,
            facing: Vec3::flat(1.0, 0.0),
        };
        let events = core.update(0.01, &swing, &mut pop, 1.0, &mut rng);
        assert!(events.contains(&PossessionEvent::PlayerAttacked { hits: 1 }));
        assert_eq!(core.phantoms()[0].health, 75.0);
        // Knocked back one unit along +x
        assert!((core.phantoms()[0].position.x - (target.x + 1.0)).abs() < 1e-4);

        // Still cooling down
        let events = core.update(0.01, &swing, &mut pop, 1.0, &mut rng);
        assert!(!events
            .iter()
            .any(|e| matches!(e, PossessionEvent::PlayerAttacked { .. })));
    }

    #[test]
    fn test_trap_effects_applied_at_spawn() {
        let catalog = crate::items::ItemCatalog::builtin();
        let restraint = catalog.get("restraint_trap").unwrap().clone();
        let electric = catalog.get("electric_trap").unwrap().clone();
        let spikes = catalog.get("spike_trap").unwrap().clone();

        let mut core = PossessionCore::default();
        let mut pop = StaticPopulation::default();
        let mut rng = StdRng::seed_from_u64(9);
        begin(&mut core, vec![restraint, electric, spikes]);
        core.update(5.0, &PlayerInput::default(), &mut pop, 1.0, &mut rng);

        for phantom in core.phantoms() {
            assert!((phantom.speed - 1.25).abs() < 1e-6);
            assert!(phantom.is_stunned());
            assert_eq!(phantom.health, 75.0);
        }
    }

    #[test]
    fn test_timeout_leaves_one_remaining_phantom() {
        let mut core = PossessionCore::default();
        let mut pop = StaticPopulation::default();
        let mut rng = StdRng::seed_from_u64(21);
        let input = PlayerInput::default();
        begin(&mut core, Vec::new());
        core.update(5.0, &input, &mut pop, 1.0, &mut rng);
        let spawned = core.phantoms().len() as u32;

        run_until_phase_changes(&mut core, &mut pop, &input, &mut rng, 500);
        assert_eq!(core.phase(), Phase::Ending);
        assert!(core.status().duration >= 45.0);

        core.update(0.1, &input, &mut pop, 1.0, &mut rng);
        assert!(core.is_complete());
        let aftermath = core.aftermath(400.0, &mut rng).unwrap();
        assert!(aftermath.remaining_phantom.is_some());
        assert_eq!(aftermath.phantoms_killed, 0);
        assert_eq!(aftermath.phantoms_escaped + 1, spawned);
        assert_eq!(core.phase(), Phase::None);
    }

    #[test]
    fn test_force_end_is_idempotent() {
        let mut core = PossessionCore::default();
        let mut pop = StaticPopulation::default();
        let mut rng = StdRng::seed_from_u64(2);
        assert!(!core.force_end());

        begin(&mut core, Vec::new());
        core.update(5.0, &PlayerInput::default(), &mut pop, 1.0, &mut rng);
        let spawned = core.phantoms().len() as u32;
        assert!(core.force_end());
        assert!(!core.force_end());
        assert!(core.phantoms().is_empty());

        let aftermath = core.aftermath(500.0, &mut rng).unwrap();
        assert_eq!(aftermath.phantoms_escaped, spawned);
        let cooldown = core.memory.current_cooldown;
        assert!((120.0..=240.0).contains(&cooldown));

        // Nothing left to close; the cooldown stamp is not repeated
        assert!(core.aftermath(900.0, &mut rng).is_none());
        assert_eq!(core.memory.last_possession_time, Some(500.0));
    }

    #[test]
    fn test_cooldown_blocks_trigger() {
        let mut core = PossessionCore::default();
        core.memory.last_possession_time = Some(400.0);
        core.memory.current_cooldown = 180.0;
        assert!((core.time_until_possible(500.0) - 80.0).abs() < 1e-9);
        assert_eq!(core.time_until_possible(600.0), 0.0);
        assert!((core.time_until_possible(10.0) - 290.0).abs() < 1e-9);
    }

    #[test]
    fn test_trap_effects_from_trap_kinds() {
        let alarm = Item::new("tripwire_alarm", "Tripwire Alarm", "")
            .with_trap(&[TrapEffect::Alert]);
        assert!(Effect::from_trap(&alarm).is_empty());

        let shock = Item::new("shock_restraint", "Shock Restraint", "")
            .with_trap(&[TrapEffect::Slow, TrapEffect::Stun, TrapEffect::Damage])
            .with_damage(10.0);
        let effects = Effect::from_trap(&shock);
        assert_eq!(effects.len(), 3);
        assert_eq!(effects[2].value, 10.0);

        let bare = Item::new("x", "X", "").with_trap(&[TrapEffect::Damage]);
        assert_eq!(Effect::from_trap(&bare)[0].value, 15.0);
    }
}
