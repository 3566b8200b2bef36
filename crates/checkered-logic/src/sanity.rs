//! Sanity and comfort, the protagonist's two psychological resources.
//!
//! Sanity decays slowly and is nudged by company, time of day and location.
//! Comfort builds in familiar places and drains elsewhere. Sanity feeds the
//! possession trigger and phantom difficulty through two step functions;
//! possession outcomes feed back through [`ResourceState::on_possession_end`].

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::population::NpcView;
use crate::world::{Location, TimeOfDay};

/// Tuning for [`ResourceState`]. Rates are per minute of game time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanityConfig {
    pub max_sanity: f32,
    pub max_comfort: f32,
    pub sanity_decay_rate: f32,
    pub night_decay_rate: f32,
    pub friendly_sanity_bonus: f32,
    pub unsettling_sanity_penalty: f32,
    /// Multiplied by a location's comfort value.
    pub location_sanity_factor: f32,
    pub comfort_gain_rate: f32,
    pub comfort_decay_rate: f32,
    /// Seconds in a location before the dwell bonus applies.
    pub dwell_threshold: f32,
    pub dwell_comfort_bonus: f32,
    pub friendly_comfort_bonus: f32,
    pub low_sanity_threshold: f32,
    pub critical_sanity_threshold: f32,
    pub high_comfort_threshold: f32,
    /// Sanity above which a long stay marks the location safe.
    pub safe_sanity_threshold: f32,
    /// Seconds of dwell before a location can be marked safe.
    pub safe_dwell_time: f32,
    /// Per-tick chance of losing safe status while sanity is low.
    pub safe_revoke_chance: f64,
    /// Minimum seconds between sanity cues.
    pub cue_interval: f32,
    pub possession_base_loss: f32,
    pub possession_loss_per_death: f32,
    /// Loss multiplier when more phantoms died than townsfolk.
    pub decisive_win_factor: f32,
    pub possession_comfort_loss: f32,
}

impl Default for SanityConfig {
    fn default() -> Self {
        Self {
            max_sanity: 100.0,
            max_comfort: 100.0,
            sanity_decay_rate: 0.5,
            night_decay_rate: 0.2,
            friendly_sanity_bonus: 0.1,
            unsettling_sanity_penalty: 0.15,
            location_sanity_factor: 0.01,
            comfort_gain_rate: 1.0,
            comfort_decay_rate: 0.3,
            dwell_threshold: 60.0,
            dwell_comfort_bonus: 0.5,
            friendly_comfort_bonus: 0.2,
            low_sanity_threshold: 30.0,
            critical_sanity_threshold: 15.0,
            high_comfort_threshold: 70.0,
            safe_sanity_threshold: 70.0,
            safe_dwell_time: 120.0,
            safe_revoke_chance: 0.01,
            cue_interval: 10.0,
            possession_base_loss: 10.0,
            possession_loss_per_death: 5.0,
            decisive_win_factor: 0.7,
            possession_comfort_loss: 30.0,
        }
    }
}

/// Per-tick environmental input.
#[derive(Debug, Clone)]
pub struct SanityContext {
    /// Current game time in seconds; drives the cue cooldown.
    pub now: f64,
    pub location: Location,
    pub time_of_day: TimeOfDay,
    /// NPCs near the protagonist (only `relationship` is read).
    pub nearby_npcs: Vec<NpcView>,
}

/// Severity of an ambient sanity cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CueLevel {
    Low,
    Critical,
}

/// Notifications produced by sanity/comfort mutations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SanityEvent {
    SanityChanged { old: f32, new: f32 },
    ComfortChanged { old: f32, new: f32 },
    /// Sanity dropped below the low threshold.
    LowSanity,
    /// Sanity dropped below the critical threshold.
    CriticalSanity,
    Cue(CueLevel),
}

/// One-off actions with an immediate sanity cost or reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SanityAction {
    KilledNpc,
    HelpedNpc,
    CraftedGory,
    FoundSafePlace,
    WitnessedDeath,
    MadeFriend,
    BetrayedFriend,
}

impl SanityAction {
    pub fn sanity_delta(self) -> f32 {
        match self {
            SanityAction::KilledNpc => -15.0,
            SanityAction::HelpedNpc => 5.0,
            SanityAction::CraftedGory => -8.0,
            SanityAction::FoundSafePlace => 3.0,
            SanityAction::WitnessedDeath => -10.0,
            SanityAction::MadeFriend => 10.0,
            SanityAction::BetrayedFriend => -20.0,
        }
    }
}

/// What [`ResourceState::on_possession_end`] needs to know about an episode.
#[derive(Debug, Clone, Copy, Default)]
pub struct PossessionOutcome {
    pub npcs_killed: usize,
    pub phantoms_killed: u32,
}

/// The sanity/comfort resource model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(skip)]
    pub config: SanityConfig,
    pub sanity: f32,
    pub comfort: f32,
    pub current_location: Location,
    pub time_in_location: f32,
    pub safe_locations: BTreeSet<Location>,
    /// Game time of the last cue; `None` until the first fires.
    pub last_cue_time: Option<f64>,
}

impl ResourceState {
    pub fn new(config: SanityConfig) -> Self {
        Self {
            sanity: config.max_sanity,
            comfort: 0.0,
            current_location: Location::Streets,
            time_in_location: 0.0,
            safe_locations: BTreeSet::new(),
            last_cue_time: None,
            config,
        }
    }

    /// Advance one tick. Returns every notification the tick produced.
    pub fn update(
        &mut self,
        delta_seconds: f32,
        ctx: &SanityContext,
        rng: &mut impl Rng,
    ) -> Vec<SanityEvent> {
        let mut events = Vec::new();
        let minutes = delta_seconds.max(0.0) / 60.0;

        if ctx.location != self.current_location {
            self.current_location = ctx.location;
            self.time_in_location = 0.0;
        } else {
            self.time_in_location += delta_seconds.max(0.0);
        }

        let (supportive, unsettling) = count_company(&ctx.nearby_npcs);
        let cfg = &self.config;

        let mut sanity_delta = -cfg.sanity_decay_rate * minutes;
        if ctx.time_of_day.is_night() {
            sanity_delta -= cfg.night_decay_rate * minutes;
        }
        sanity_delta += supportive as f32 * cfg.friendly_sanity_bonus * minutes;
        sanity_delta -= unsettling as f32 * cfg.unsettling_sanity_penalty * minutes;
        let location_value = ctx.location.comfort_value();
        if location_value > 0.0 {
            sanity_delta += location_value * cfg.location_sanity_factor * minutes;
        }

        let mut comfort_delta = if location_value > 0.0 {
            cfg.comfort_gain_rate * minutes
        } else {
            -cfg.comfort_decay_rate * minutes
        };
        if self.time_in_location > cfg.dwell_threshold {
            comfort_delta += cfg.dwell_comfort_bonus * minutes;
        }
        comfort_delta += supportive as f32 * cfg.friendly_comfort_bonus * minutes;

        events.extend(self.modify_sanity(sanity_delta));
        events.extend(self.modify_comfort(comfort_delta));
        events.extend(self.check_for_cue(ctx.now));
        self.update_safe_locations(rng);

        events
    }

    /// Apply a sanity delta, clamped to [0, max]. Reports threshold crossings.
    pub fn modify_sanity(&mut self, amount: f32) -> Vec<SanityEvent> {
        let mut events = Vec::new();
        if !amount.is_finite() {
            return events;
        }
        let old = self.sanity;
        self.sanity = (self.sanity + amount).clamp(0.0, self.config.max_sanity);

        if self.sanity != old {
            events.push(SanityEvent::SanityChanged { old, new: self.sanity });
        }
        if old >= self.config.low_sanity_threshold && self.sanity < self.config.low_sanity_threshold {
            log::debug!("sanity dropped below low threshold ({:.1})", self.sanity);
            events.push(SanityEvent::LowSanity);
        }
        if old >= self.config.critical_sanity_threshold
            && self.sanity < self.config.critical_sanity_threshold
        {
            log::debug!("sanity dropped below critical threshold ({:.1})", self.sanity);
            events.push(SanityEvent::CriticalSanity);
        }
        events
    }

    /// Apply a comfort delta, clamped to [0, max].
    pub fn modify_comfort(&mut self, amount: f32) -> Vec<SanityEvent> {
        if !amount.is_finite() {
            return Vec::new();
        }
        let old = self.comfort;
        self.comfort = (self.comfort + amount).clamp(0.0, self.config.max_comfort);
        if self.comfort != old {
            vec![SanityEvent::ComfortChanged { old, new: self.comfort }]
        } else {
            Vec::new()
        }
    }

    fn check_for_cue(&mut self, now: f64) -> Option<SanityEvent> {
        if let Some(last) = self.last_cue_time {
            if now - last < self.config.cue_interval as f64 {
                return None;
            }
        }
        let level = if self.sanity < self.config.critical_sanity_threshold {
            CueLevel::Critical
        } else if self.sanity < self.config.low_sanity_threshold {
            CueLevel::Low
        } else {
            return None;
        };
        self.last_cue_time = Some(now);
        Some(SanityEvent::Cue(level))
    }

    fn update_safe_locations(&mut self, rng: &mut impl Rng) {
        if self.sanity > self.config.safe_sanity_threshold
            && self.time_in_location > self.config.safe_dwell_time
            && self.safe_locations.insert(self.current_location)
        {
            log::debug!("{} is now a safe location", self.current_location.name());
        }

        if self.sanity < self.config.low_sanity_threshold
            && rng.gen_bool(self.config.safe_revoke_chance.clamp(0.0, 1.0))
        {
            self.safe_locations.remove(&self.current_location);
        }
    }

    pub fn is_location_safe(&self, location: Location) -> bool {
        self.safe_locations.contains(&location)
    }

    pub fn is_comfort_high(&self) -> bool {
        self.comfort > self.config.high_comfort_threshold
    }

    /// Multiplier on the per-tick possession chance. Higher sanity, lower chance.
    pub fn possession_chance_modifier(&self) -> f32 {
        possession_chance_modifier(self.sanity)
    }

    /// Multiplier on phantom count and speed. Lower sanity, nastier phantoms.
    pub fn phantom_difficulty_modifier(&self) -> f32 {
        phantom_difficulty_modifier(self.sanity)
    }

    /// Settle the cost of a possession episode.
    pub fn on_possession_end(&mut self, outcome: PossessionOutcome) -> Vec<SanityEvent> {
        let cfg = &self.config;
        let mut loss =
            cfg.possession_base_loss + outcome.npcs_killed as f32 * cfg.possession_loss_per_death;
        if outcome.phantoms_killed as usize > outcome.npcs_killed {
            loss *= cfg.decisive_win_factor;
        }
        let comfort_loss = cfg.possession_comfort_loss;

        let mut events = self.modify_sanity(-loss);
        events.extend(self.modify_comfort(-comfort_loss));
        events
    }

    pub fn on_action_performed(&mut self, action: SanityAction) -> Vec<SanityEvent> {
        self.modify_sanity(action.sanity_delta())
    }
}

impl Default for ResourceState {
    fn default() -> Self {
        Self::new(SanityConfig::default())
    }
}

fn count_company(npcs: &[NpcView]) -> (usize, usize) {
    npcs.iter().fold((0, 0), |(good, bad), npc| match npc.relationship {
        r if r.is_supportive() => (good + 1, bad),
        r if r.is_unsettling() => (good, bad + 1),
        _ => (good, bad),
    })
}

/// Step function used by the trigger: 0.8 / 1.0 / 1.2 / 1.5.
pub fn possession_chance_modifier(sanity: f32) -> f32 {
    if sanity > 70.0 {
        0.8
    } else if sanity > 50.0 {
        1.0
    } else if sanity > 30.0 {
        1.2
    } else {
        1.5
    }
}

/// Step function used at phantom spawn: 0.5 / 0.75 / 1.0 / 1.5.
pub fn phantom_difficulty_modifier(sanity: f32) -> f32 {
    if sanity > 70.0 {
        0.5
    } else if sanity > 50.0 {
        0.75
    } else if sanity > 30.0 {
        1.0
    } else {
        1.5
    }
}
