//! Pure simulation logic for Checkered.
//!
//! Everything here is plain data in, plain data out: no ECS, no I/O, no
//! clocks. Randomness is always passed in as `&mut impl Rng` so callers (and
//! tests) control the seed.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`clock`] | In-game calendar, day and time-of-day transitions |
//! | [`crafting`] | Inventory-backed crafting with recipe and procedural fallback |
//! | [`health`] | Body parts, organs, lethal-damage regeneration |
//! | [`inventory`] | Bounded slot inventory with stacking |
//! | [`items`] | Item model, attribute vocabulary, built-in item catalog |
//! | [`population`] | Read/kill boundary to the town's NPCs |
//! | [`possession`] | Possession trigger roll and combat episode state machine |
//! | [`recipes`] | Static recipe table, unordered input matching |
//! | [`route`] | Behavior counters, route scores and personality branch |
//! | [`sanity`] | Sanity/comfort resource model and its modifiers |
//! | [`spatial`] | Minimal vector math |
//! | [`world`] | Locations, time-of-day periods, relationships |

pub mod clock;
pub mod crafting;
pub mod health;
pub mod inventory;
pub mod items;
pub mod population;
pub mod possession;
pub mod recipes;
pub mod route;
pub mod sanity;
pub mod spatial;
pub mod world;
