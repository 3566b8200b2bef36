//! Playstyle classification.
//!
//! Four route scores are recomputed from cumulative behavior counters with
//! closed-form weighted sums, so the same counters always give the same
//! scores. The first time any score reaches the lock threshold the leading
//! route is locked in and the scores freeze.

use serde::{Deserialize, Serialize};

use crate::world::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Pacifist,
    Insanity,
    Criminal,
    Tech,
}

impl Route {
    pub const ALL: [Route; 4] = [Route::Pacifist, Route::Insanity, Route::Criminal, Route::Tech];

    pub fn name(self) -> &'static str {
        match self {
            Route::Pacifist => "pacifist",
            Route::Insanity => "insanity",
            Route::Criminal => "criminal",
            Route::Tech => "tech",
        }
    }
}

/// Narrative branch derived once from how the player explores and treats people.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Good,
    Bad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub lock_threshold: f32,
    pub initial_score: f32,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            lock_threshold: 70.0,
            initial_score: 50.0,
        }
    }
}

/// One observed behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorEvent {
    DialogueStarted,
    FriendMade,
    ViolenceAvoided,
    HelpfulAction,
    ChaosAction,
    RandomChoice,
    Trolling,
    CombatInitiated,
    NpcDeath,
    IllegalAction,
    Intimidation,
    CraftingAttempt,
    UniqueRecipe,
    BaseBuilding,
    ContractCompleted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorCounters {
    // pacifist
    pub dialogue_count: u32,
    pub friends_made: u32,
    pub violence_avoided: u32,
    pub helpful_actions: u32,
    // insanity
    pub chaos_actions: u32,
    pub random_choices: u32,
    pub trolling_actions: u32,
    // criminal
    pub combat_initiated: u32,
    pub npc_deaths: u32,
    pub illegal_actions: u32,
    pub intimidations: u32,
    // tech
    pub crafting_attempts: u32,
    pub unique_recipes: u32,
    pub base_building: u32,
    pub contracts_completed: u32,
}

impl BehaviorCounters {
    pub fn record(&mut self, event: BehaviorEvent) {
        let counter = match event {
            BehaviorEvent::DialogueStarted => &mut self.dialogue_count,
            BehaviorEvent::FriendMade => &mut self.friends_made,
            BehaviorEvent::ViolenceAvoided => &mut self.violence_avoided,
            BehaviorEvent::HelpfulAction => &mut self.helpful_actions,
            BehaviorEvent::ChaosAction => &mut self.chaos_actions,
            BehaviorEvent::RandomChoice => &mut self.random_choices,
            BehaviorEvent::Trolling => &mut self.trolling_actions,
            BehaviorEvent::CombatInitiated => &mut self.combat_initiated,
            BehaviorEvent::NpcDeath => &mut self.npc_deaths,
            BehaviorEvent::IllegalAction => &mut self.illegal_actions,
            BehaviorEvent::Intimidation => &mut self.intimidations,
            BehaviorEvent::CraftingAttempt => &mut self.crafting_attempts,
            BehaviorEvent::UniqueRecipe => &mut self.unique_recipes,
            BehaviorEvent::BaseBuilding => &mut self.base_building,
            BehaviorEvent::ContractCompleted => &mut self.contracts_completed,
        };
        *counter = counter.saturating_add(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteScores {
    pub pacifist: f32,
    pub insanity: f32,
    pub criminal: f32,
    pub tech: f32,
}

impl RouteScores {
    pub fn uniform(score: f32) -> Self {
        Self {
            pacifist: score,
            insanity: score,
            criminal: score,
            tech: score,
        }
    }

    pub fn get(&self, route: Route) -> f32 {
        match route {
            Route::Pacifist => self.pacifist,
            Route::Insanity => self.insanity,
            Route::Criminal => self.criminal,
            Route::Tech => self.tech,
        }
    }

    /// Highest-scoring route. Ties go to the earlier route in [`Route::ALL`].
    pub fn leader(&self) -> (Route, f32) {
        Route::ALL
            .iter()
            .map(|&r| (r, self.get(r)))
            .fold((Route::Pacifist, f32::MIN), |best, next| {
                if next.1 > best.1 {
                    next
                } else {
                    best
                }
            })
    }
}

/// Closed-form scores for a counter snapshot, each clamped to [0, 100].
pub fn compute_scores(c: &BehaviorCounters) -> RouteScores {
    let n = |v: u32| v as f32;
    let clamp = |v: f32| v.clamp(0.0, 100.0);
    RouteScores {
        pacifist: clamp(
            30.0 + n(c.dialogue_count) * 2.0
                + n(c.friends_made) * 10.0
                + n(c.violence_avoided) * 5.0
                + n(c.helpful_actions) * 5.0
                - n(c.combat_initiated) * 10.0
                - n(c.npc_deaths) * 20.0,
        ),
        insanity: clamp(
            30.0 + n(c.chaos_actions) * 5.0 + n(c.random_choices) * 3.0 + n(c.trolling_actions) * 5.0,
        ),
        criminal: clamp(
            20.0 + n(c.combat_initiated) * 5.0
                + n(c.npc_deaths) * 15.0
                + n(c.illegal_actions) * 10.0
                + n(c.intimidations) * 5.0,
        ),
        tech: clamp(
            20.0 + n(c.crafting_attempts) * 2.0
                + n(c.unique_recipes) * 10.0
                + n(c.base_building) * 15.0
                + n(c.contracts_completed) * 20.0,
        ),
    }
}

/// Exploration and interaction signals behind the personality branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalityTally {
    pub exploration: Vec<(Location, f32)>,
    pub positive_interactions: u32,
    pub negative_interactions: u32,
    pub time_spent_exploring: f32,
}

impl PersonalityTally {
    /// (good, bad) weights given the number of fights the player started.
    pub fn scores(&self, combat_initiated: u32) -> (i64, i64) {
        let mut good: i64 = 0;
        let mut bad: i64 = 0;
        for (location, _) in &self.exploration {
            match location {
                Location::Park | Location::Shop => good += 2,
                Location::Forest | Location::Streets => bad += 1,
                _ => {}
            }
        }
        good += 3 * self.positive_interactions as i64;
        bad += 3 * self.negative_interactions as i64;
        if self.time_spent_exploring > 300.0 {
            good += 5;
        }
        good -= 5 * combat_initiated as i64;
        bad += 5 * combat_initiated as i64;
        (good, bad)
    }
}

/// Per-route tuning applied by content systems.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyModifiers {
    pub dialogue_difficulty: f32,
    pub sanity_pressure: f32,
    pub combat_difficulty: f32,
    pub crafting_complexity: f32,
    pub police_aggression: f32,
    pub contract_rewards: f32,
}

impl Default for DifficultyModifiers {
    fn default() -> Self {
        Self {
            dialogue_difficulty: 1.0,
            sanity_pressure: 1.0,
            combat_difficulty: 1.0,
            crafting_complexity: 1.0,
            police_aggression: 1.0,
            contract_rewards: 1.0,
        }
    }
}

impl DifficultyModifiers {
    pub fn for_route(route: Option<Route>) -> Self {
        let base = Self::default();
        match route {
            None | Some(Route::Insanity) => base,
            Some(Route::Pacifist) => Self {
                dialogue_difficulty: 1.5,
                sanity_pressure: 1.3,
                combat_difficulty: 0.8,
                ..base
            },
            Some(Route::Criminal) => Self {
                dialogue_difficulty: 0.8,
                sanity_pressure: 0.8,
                combat_difficulty: 1.5,
                police_aggression: 1.5,
                ..base
            },
            Some(Route::Tech) => Self {
                combat_difficulty: 0.8,
                crafting_complexity: 1.5,
                contract_rewards: 1.5,
                ..base
            },
        }
    }
}

/// How the companion talks and reacts on each route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompanionPersona {
    pub demeanor: &'static str,
    pub speech_style: &'static str,
    pub reactions: &'static str,
}

impl CompanionPersona {
    pub fn for_route(route: Option<Route>) -> Self {
        let (demeanor, speech_style, reactions) = match route {
            None => ("neutral", "reserved", "measured"),
            Some(Route::Pacifist) => ("gentle", "thoughtful", "empathetic"),
            Some(Route::Insanity) => ("unpredictable", "erratic", "whimsical"),
            Some(Route::Criminal) => ("intimidating", "blunt", "aggressive"),
            Some(Route::Tech) => ("analytical", "technical", "logical"),
        };
        Self {
            demeanor,
            speech_style,
            reactions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteScoring {
    #[serde(skip)]
    pub config: RouteConfig,
    pub scores: RouteScores,
    pub counters: BehaviorCounters,
    pub primary_route: Option<Route>,
    pub locked: bool,
    pub personality: PersonalityTally,
    pub personality_result: Option<Personality>,
}

impl RouteScoring {
    pub fn new(config: RouteConfig) -> Self {
        Self {
            scores: RouteScores::uniform(config.initial_score),
            counters: BehaviorCounters::default(),
            primary_route: None,
            locked: false,
            personality: PersonalityTally::default(),
            personality_result: None,
            config,
        }
    }

    /// Record behaviors and rescore. Returns the route if this call locked it.
    pub fn track(&mut self, events: &[BehaviorEvent]) -> Option<Route> {
        for &event in events {
            self.counters.record(event);
        }
        if self.locked {
            return None;
        }
        self.scores = compute_scores(&self.counters);
        self.check_lock()
    }

    fn check_lock(&mut self) -> Option<Route> {
        let (route, score) = self.scores.leader();
        if score < self.config.lock_threshold {
            return None;
        }
        self.primary_route = Some(route);
        self.locked = true;
        log::info!("Route locked: {} (score {:.0})", route.name(), score);
        Some(route)
    }

    pub fn record_npc_death(&mut self) -> Option<Route> {
        self.track(&[BehaviorEvent::NpcDeath])
    }

    pub fn record_combat(&mut self) -> Option<Route> {
        self.track(&[BehaviorEvent::CombatInitiated])
    }

    pub fn record_crafting(&mut self) -> Option<Route> {
        self.track(&[BehaviorEvent::CraftingAttempt])
    }

    pub fn record_dialogue(&mut self, helpful: bool) -> Option<Route> {
        if helpful {
            self.track(&[BehaviorEvent::DialogueStarted, BehaviorEvent::HelpfulAction])
        } else {
            self.track(&[BehaviorEvent::DialogueStarted])
        }
    }

    pub fn record_exploration(&mut self, location: Location, duration: f32) {
        let duration = duration.max(0.0);
        self.personality.exploration.push((location, duration));
        self.personality.time_spent_exploring += duration;
    }

    pub fn record_npc_interaction(&mut self, positive: bool) {
        if positive {
            self.personality.positive_interactions += 1;
        } else {
            self.personality.negative_interactions += 1;
        }
    }

    /// Good or bad, decided on first call and fixed afterward.
    pub fn determine_personality(&mut self) -> Personality {
        if let Some(result) = self.personality_result {
            return result;
        }
        let (good, bad) = self.personality.scores(self.counters.combat_initiated);
        let result = if good >= bad {
            Personality::Good
        } else {
            Personality::Bad
        };
        log::info!("Personality determined: {:?} (good {}, bad {})", result, good, bad);
        self.personality_result = Some(result);
        result
    }

    pub fn difficulty_modifiers(&self) -> DifficultyModifiers {
        DifficultyModifiers::for_route(self.primary_route)
    }

    pub fn companion_persona(&self) -> CompanionPersona {
        CompanionPersona::for_route(self.primary_route)
    }
}

impl Default for RouteScoring {
    fn default() -> Self {
        Self::new(RouteConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_scores() {
        let scoring = RouteScoring::default();
        assert_eq!(scoring.scores, RouteScores::uniform(50.0));
        assert!(scoring.primary_route.is_none());
    }

    #[test]
    fn test_compute_scores_baseline() {
        let scores = compute_scores(&BehaviorCounters::default());
        assert_eq!(scores.pacifist, 30.0);
        assert_eq!(scores.insanity, 30.0);
        assert_eq!(scores.criminal, 20.0);
        assert_eq!(scores.tech, 20.0);
    }

    #[test]
    fn test_scores_clamp() {
        let counters = BehaviorCounters {
            npc_deaths: 10,
            ..Default::default()
        };
        let scores = compute_scores(&counters);
        assert_eq!(scores.pacifist, 0.0);
        assert_eq!(scores.criminal, 100.0);
    }

    #[test]
    fn test_route_locks_on_threshold() {
        let mut scoring = RouteScoring::default();
        // criminal: 20 + 15 * 3 = 65, then + 5 from combat = 70
        for _ in 0..3 {
            assert_eq!(scoring.record_npc_death(), None);
        }
        assert_eq!(scoring.record_combat(), Some(Route::Criminal));
        assert!(scoring.locked);
        assert_eq!(scoring.scores.criminal, 70.0);
    }

    #[test]
    fn test_locked_scores_freeze() {
        let mut scoring = RouteScoring::default();
        for _ in 0..4 {
            scoring.record_npc_death();
        }
        assert!(scoring.locked);
        let frozen = scoring.scores;
        for _ in 0..20 {
            scoring.record_crafting();
            scoring.track(&[BehaviorEvent::FriendMade]);
        }
        assert_eq!(scoring.scores, frozen);
        assert_eq!(scoring.primary_route, Some(Route::Criminal));
        assert_eq!(scoring.counters.crafting_attempts, 20);
    }

    #[test]
    fn test_personality_is_cached() {
        let mut scoring = RouteScoring::default();
        scoring.record_exploration(Location::Park, 400.0);
        scoring.record_npc_interaction(true);
        assert_eq!(scoring.determine_personality(), Personality::Good);

        for _ in 0..10 {
            scoring.record_npc_interaction(false);
            scoring.record_combat();
        }
        assert_eq!(scoring.determine_personality(), Personality::Good);
    }

    #[test]
    fn test_personality_bad() {
        let mut scoring = RouteScoring::default();
        scoring.record_exploration(Location::Forest, 10.0);
        scoring.record_npc_interaction(false);
        assert_eq!(scoring.determine_personality(), Personality::Bad);
    }

    #[test]
    fn test_modifiers_and_persona() {
        let mut scoring = RouteScoring::default();
        assert_eq!(scoring.difficulty_modifiers(), DifficultyModifiers::default());
        assert_eq!(scoring.companion_persona().demeanor, "neutral");

        scoring.track(&[BehaviorEvent::ContractCompleted; 3]);
        assert_eq!(scoring.primary_route, Some(Route::Tech));
        let mods = scoring.difficulty_modifiers();
        assert_eq!(mods.crafting_complexity, 1.5);
        assert_eq!(mods.combat_difficulty, 0.8);
        assert_eq!(scoring.companion_persona().speech_style, "technical");
    }

    #[test]
    fn test_leader_tie_prefers_earlier_route() {
        let scores = RouteScores::uniform(80.0);
        assert_eq!(scores.leader(), (Route::Pacifist, 80.0));
    }
}
