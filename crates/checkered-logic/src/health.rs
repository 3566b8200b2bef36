//! The protagonist's body.
//!
//! She cannot die: damage that takes a vital part or organ to its lethal
//! threshold regenerates the whole body on the spot. The left eye is gone
//! for good and never comes back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::possession::{Effect, EffectKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Head,
    LeftEye,
    RightEye,
    Torso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

impl BodyPart {
    pub const ALL: [BodyPart; 8] = [
        BodyPart::Head,
        BodyPart::LeftEye,
        BodyPart::RightEye,
        BodyPart::Torso,
        BodyPart::LeftArm,
        BodyPart::RightArm,
        BodyPart::LeftLeg,
        BodyPart::RightLeg,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Organ {
    Heart,
    Lungs,
    Liver,
    Stomach,
    Intestines,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartHealth {
    pub health: f32,
    pub max_health: f32,
    /// At or below this, a vital part is lethal.
    pub lethal_threshold: f32,
    pub vital: bool,
    pub missing: bool,
}

impl PartHealth {
    fn new(lethal_threshold: f32, vital: bool) -> Self {
        Self {
            health: 100.0,
            max_health: 100.0,
            lethal_threshold,
            vital,
            missing: false,
        }
    }

    fn is_lethal(&self) -> bool {
        self.vital && self.health <= self.lethal_threshold
    }

    fn ratio(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartStatus {
    Healthy,
    Damaged,
    Critical,
    Crippled,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthEffectKind {
    Damage,
    Heal,
    Slow,
    Stun,
    Buff,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthEffect {
    pub kind: HealthEffectKind,
    pub part: BodyPart,
    pub value: f32,
    /// Seconds left; `None` lasts until cleared by regeneration.
    pub remaining: Option<f32>,
    /// Damage per second while active instead of a single hit.
    pub continuous: bool,
}

impl HealthEffect {
    /// Body-side version of a trap's combat effect.
    pub fn from_combat(effect: &Effect, part: BodyPart) -> Self {
        let (kind, remaining) = match effect.kind {
            EffectKind::Slow => (HealthEffectKind::Slow, effect.duration),
            EffectKind::Stun => (HealthEffectKind::Stun, Some(effect.duration.unwrap_or(0.0))),
            EffectKind::Damage => (HealthEffectKind::Damage, Some(effect.duration.unwrap_or(0.0))),
        };
        Self {
            kind,
            part,
            value: effect.value,
            remaining,
            continuous: effect.continuous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HealthEvent {
    PartDamaged { part: BodyPart, amount: f32, health: f32 },
    LethalDamage,
    Regenerated,
    LimbCrippled(BodyPart),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthModel {
    pub parts: BTreeMap<BodyPart, PartHealth>,
    pub organs: BTreeMap<Organ, PartHealth>,
    pub effects: Vec<HealthEffect>,
    /// Health per minute for damaged, non-missing parts.
    pub regeneration_rate: f32,
    pub has_regenerated: bool,
}

impl HealthModel {
    pub fn new() -> Self {
        let mut parts = BTreeMap::new();
        parts.insert(BodyPart::Head, PartHealth::new(0.0, true));
        parts.insert(
            BodyPart::LeftEye,
            PartHealth {
                health: 0.0,
                missing: true,
                ..PartHealth::new(0.0, false)
            },
        );
        parts.insert(BodyPart::RightEye, PartHealth::new(0.0, false));
        parts.insert(BodyPart::Torso, PartHealth::new(20.0, true));
        for limb in [BodyPart::LeftArm, BodyPart::RightArm, BodyPart::LeftLeg, BodyPart::RightLeg] {
            parts.insert(limb, PartHealth::new(0.0, false));
        }

        let organs = BTreeMap::from([
            (Organ::Heart, PartHealth::new(30.0, true)),
            (Organ::Lungs, PartHealth::new(20.0, true)),
            (Organ::Liver, PartHealth::new(10.0, true)),
            (Organ::Stomach, PartHealth::new(0.0, false)),
            (Organ::Intestines, PartHealth::new(0.0, false)),
        ]);

        Self {
            parts,
            organs,
            effects: Vec::new(),
            regeneration_rate: 0.5,
            has_regenerated: false,
        }
    }

    pub fn part(&self, part: BodyPart) -> Option<&PartHealth> {
        self.parts.get(&part)
    }

    pub fn update(&mut self, delta_seconds: f32) -> Vec<HealthEvent> {
        let mut events = Vec::new();

        let mut ticks = Vec::new();
        self.effects.retain_mut(|effect| {
            if effect.kind == HealthEffectKind::Damage && effect.continuous {
                ticks.push((effect.part, effect.value * delta_seconds));
            }
            match effect.remaining.as_mut() {
                Some(remaining) => {
                    *remaining -= delta_seconds;
                    *remaining > 0.0
                }
                None => true,
            }
        });
        for (part, amount) in ticks {
            events.extend(self.take_damage(part, amount));
        }

        let regen = self.regeneration_rate * delta_seconds / 60.0;
        for part in self.parts.values_mut() {
            if !part.missing && part.health > 0.0 && part.health < part.max_health {
                part.health = (part.health + regen).min(part.max_health);
            }
        }
        events
    }

    /// Damage a body part. Missing parts ignore damage.
    pub fn take_damage(&mut self, part: BodyPart, amount: f32) -> Vec<HealthEvent> {
        let mut events = Vec::new();
        let Some(state) = self.parts.get_mut(&part) else {
            return events;
        };
        if state.missing || !amount.is_finite() {
            return events;
        }
        state.health = (state.health - amount.max(0.0)).max(0.0);
        events.push(HealthEvent::PartDamaged {
            part,
            amount,
            health: state.health,
        });

        if self.is_lethal() {
            events.push(HealthEvent::LethalDamage);
            self.regenerate();
            events.push(HealthEvent::Regenerated);
        }

        if let Some(state) = self.parts.get(&part) {
            if state.health <= 0.0 && !state.vital {
                log::debug!("{:?} has been crippled", part);
                events.push(HealthEvent::LimbCrippled(part));
            }
        }
        events
    }

    /// Damage an internal organ.
    pub fn damage_organ(&mut self, organ: Organ, amount: f32) -> Vec<HealthEvent> {
        let mut events = Vec::new();
        let Some(state) = self.organs.get_mut(&organ) else {
            return events;
        };
        if !amount.is_finite() {
            return events;
        }
        state.health = (state.health - amount.max(0.0)).max(0.0);
        if self.is_lethal() {
            events.push(HealthEvent::LethalDamage);
            self.regenerate();
            events.push(HealthEvent::Regenerated);
        }
        events
    }

    pub fn heal_part(&mut self, part: BodyPart, amount: f32) -> bool {
        match self.parts.get_mut(&part) {
            Some(state) if !state.missing => {
                state.health = (state.health + amount.max(0.0)).min(state.max_health);
                true
            }
            _ => false,
        }
    }

    pub fn apply_effect(&mut self, effect: HealthEffect) -> Vec<HealthEvent> {
        self.effects.push(effect);
        match effect.kind {
            HealthEffectKind::Damage if !effect.continuous => self.take_damage(effect.part, effect.value),
            HealthEffectKind::Heal => {
                self.heal_part(effect.part, effect.value);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn is_lethal(&self) -> bool {
        self.parts.values().any(PartHealth::is_lethal) || self.organs.values().any(PartHealth::is_lethal)
    }

    /// Restore everything but the left eye and drop all non-buff effects.
    fn regenerate(&mut self) {
        log::info!("Lethal damage, regenerating");
        for (name, part) in self.parts.iter_mut() {
            if *name != BodyPart::LeftEye {
                part.health = part.max_health;
                part.missing = false;
            }
        }
        for organ in self.organs.values_mut() {
            organ.health = organ.max_health;
        }
        self.effects.retain(|e| e.kind == HealthEffectKind::Buff);
        self.has_regenerated = true;
    }

    /// Percentage over all non-missing parts.
    pub fn overall_health(&self) -> f32 {
        let (health, max) = self
            .parts
            .values()
            .filter(|p| !p.missing)
            .fold((0.0, 0.0), |(h, m), p| (h + p.health, m + p.max_health));
        if max > 0.0 {
            health / max * 100.0
        } else {
            0.0
        }
    }

    pub fn part_status(&self, part: BodyPart) -> Option<PartStatus> {
        let state = self.parts.get(&part)?;
        Some(if state.missing {
            PartStatus::Missing
        } else if state.health <= 0.0 {
            PartStatus::Crippled
        } else if state.health < 30.0 {
            PartStatus::Critical
        } else if state.health < 60.0 {
            PartStatus::Damaged
        } else {
            PartStatus::Healthy
        })
    }

    fn health_of(&self, part: BodyPart) -> f32 {
        self.parts.get(&part).map(|p| p.health).unwrap_or(0.0)
    }

    pub fn can_use_arms(&self) -> bool {
        self.health_of(BodyPart::LeftArm) > 0.0 || self.health_of(BodyPart::RightArm) > 0.0
    }

    pub fn can_walk(&self) -> bool {
        self.health_of(BodyPart::LeftLeg) > 20.0 || self.health_of(BodyPart::RightLeg) > 20.0
    }

    pub fn can_see(&self) -> bool {
        self.health_of(BodyPart::RightEye) > 0.0
    }

    /// Walking speed multiplier, never below 0.2.
    pub fn movement_modifier(&self) -> f32 {
        let leg = |p: BodyPart| self.parts.get(&p).map(PartHealth::ratio).unwrap_or(0.0);
        let legs = (leg(BodyPart::LeftLeg) + leg(BodyPart::RightLeg)) / 2.0;
        let slow: f32 = self
            .effects
            .iter()
            .filter(|e| e.kind == HealthEffectKind::Slow)
            .map(|e| e.value)
            .product();
        (legs * slow).max(0.2)
    }
}

impl Default for HealthModel {
    fn default() -> Self {
        Self::new()
    }
}
