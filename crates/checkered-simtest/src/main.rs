//! Checkered Headless Simulation Harness
//!
//! Runs a seeded session with a scripted protagonist and validates the
//! static data, the session loop and save/load along the way.
//! Runs entirely in-process: no rendering, no input devices.
//!
//! Usage:
//!   cargo run -p checkered-simtest
//!   cargo run -p checkered-simtest -- --verbose --seconds 900 --seed 7
//!   cargo run -p checkered-simtest -- --config session.json

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use checkered_core::prelude::*;
use checkered_logic::items::{starting_inventory, ItemCatalog};
use checkered_logic::population::NpcPopulation;
use checkered_logic::possession::Phase;
use checkered_logic::recipes::RecipeBook;
use checkered_logic::route::Route;
use checkered_logic::spatial::Vec3;
use checkered_logic::world::Location;
use serde::Serialize;

const TICK: f32 = 0.1;
const DEFAULT_SECONDS: f32 = 600.0;
const DEFAULT_SEED: u64 = 1;
/// Scripted protagonist changes location this often, in seconds.
const WANDER_INTERVAL: f32 = 45.0;
const WALK_SPEED: f32 = 4.0;

// ── Arguments ───────────────────────────────────────────────────────────

struct Args {
    verbose: bool,
    seconds: f32,
    seed: Option<u64>,
    config: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        verbose: false,
        seconds: DEFAULT_SECONDS,
        seed: None,
        config: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--verbose" | "-v" => args.verbose = true,
            "--seconds" => {
                let value = iter.next().ok_or("--seconds needs a value")?;
                args.seconds = value
                    .parse()
                    .map_err(|_| format!("invalid --seconds: {}", value))?;
            }
            "--seed" => {
                let value = iter.next().ok_or("--seed needs a value")?;
                args.seed = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid --seed: {}", value))?,
                );
            }
            "--config" => {
                args.config = Some(iter.next().ok_or("--config needs a path")?);
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(args)
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

/// Printed as JSON once the run is over.
#[derive(Debug, Serialize)]
struct RunSummary {
    seed: u64,
    seconds: f32,
    hud: HudSnapshot,
    episodes: usize,
    npcs_killed: usize,
    phantoms_killed: u32,
    phantoms_escaped: u32,
    crafts: usize,
    locked_route: Option<Route>,
    events: BTreeMap<&'static str, usize>,
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("usage: checkered-simtest [--verbose] [--seconds N] [--seed N] [--config PATH]");
            std::process::exit(2);
        }
    };

    let level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = match &args.config {
        Some(path) => match SessionConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => SessionConfig::default(),
    };
    let seed = args.seed.or(config.seed).unwrap_or(DEFAULT_SEED);
    config.seed = Some(seed);

    println!("=== Checkered Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Static item and recipe tables
    results.extend(validate_static_data(args.verbose));

    // 2. Scripted session run
    let (run_results, summary) = run_session(config.clone(), args.seconds, args.verbose);
    results.extend(run_results);

    // 3. Crafting through the session
    results.extend(validate_session_crafting(config.clone(), args.verbose));

    // 4. Save/load
    results.extend(validate_persistence(config, args.verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!();
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to encode summary: {}", e),
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Static Data ──────────────────────────────────────────────────────

fn validate_static_data(verbose: bool) -> Vec<TestResult> {
    println!("--- Items & Recipes ---");
    let mut results = Vec::new();
    let catalog = ItemCatalog::builtin();
    let recipes = RecipeBook::builtin();

    results.push(check(
        "catalog_not_empty",
        catalog.len() >= 20,
        format!("{} items, {} recipes", catalog.len(), recipes.len()),
    ));

    let mut missing = Vec::new();
    for recipe in recipes.iter() {
        for id in recipe.inputs.iter().chain(recipe.requires_additional.iter()) {
            if catalog.get(id).is_none() {
                missing.push(format!("{} needs {}", recipe.id, id));
            }
        }
        if recipe.custom_item.is_none() && catalog.get(&recipe.output).is_none() {
            missing.push(format!("{} makes undefined {}", recipe.id, recipe.output));
        }
    }
    results.push(check(
        "recipe_items_exist",
        missing.is_empty(),
        if missing.is_empty() {
            "every recipe input is cataloged and every output defined".to_string()
        } else {
            missing.join(", ")
        },
    ));

    let arity_ok = recipes
        .iter()
        .all(|r| (1..=2).contains(&r.inputs.len()));
    results.push(check(
        "recipe_arity",
        arity_ok,
        "recipes take one or two inputs",
    ));

    let mut seen = BTreeSet::new();
    let duplicates: Vec<_> = recipes
        .iter()
        .filter(|r| !seen.insert(r.id.clone()))
        .map(|r| r.id.clone())
        .collect();
    results.push(check(
        "recipe_ids_unique",
        duplicates.is_empty(),
        format!("{} duplicate ids", duplicates.len()),
    ));

    let unknown_start: Vec<_> = starting_inventory()
        .into_iter()
        .filter(|(id, _)| catalog.get(id).is_none())
        .map(|(id, _)| id)
        .collect();
    results.push(check(
        "starting_kit_known",
        unknown_start.is_empty(),
        format!("{} unknown starting items", unknown_start.len()),
    ));

    if verbose {
        for recipe in recipes.iter() {
            println!(
                "    {:<20} {:?} -> {}",
                recipe.id, recipe.inputs, recipe.output_name
            );
        }
    }

    results
}

// ── 2. Session Run ──────────────────────────────────────────────────────

#[derive(Default)]
struct Tally {
    by_kind: BTreeMap<&'static str, usize>,
    lifecycle: Vec<bool>,
    npcs_killed: usize,
    phantoms_killed: u32,
    phantoms_escaped: u32,
    crafts: usize,
}

fn event_kind(event: &GameEvent) -> &'static str {
    match event {
        GameEvent::Sanity(_) => "sanity",
        GameEvent::Clock(_) => "clock",
        GameEvent::Health(_) => "health",
        GameEvent::Possession(_) => "possession",
        GameEvent::PossessionStarted { .. } => "possession_started",
        GameEvent::PossessionEnded { .. } => "possession_ended",
        GameEvent::PhantomLingers { .. } => "phantom_lingers",
        GameEvent::Crafted { .. } => "crafted",
        GameEvent::RouteLocked(_) => "route_locked",
    }
}

fn record(tally: &mut Tally, event: &GameEvent) {
    *tally.by_kind.entry(event_kind(event)).or_default() += 1;
    match event {
        GameEvent::PossessionStarted { .. } => tally.lifecycle.push(true),
        GameEvent::PossessionEnded {
            npcs_killed,
            phantoms_killed,
            phantoms_escaped,
        } => {
            tally.lifecycle.push(false);
            log::info!(
                "Episode {} over: {} townsfolk lost, {} phantoms killed, {} escaped",
                tally.lifecycle.len() / 2,
                npcs_killed,
                phantoms_killed,
                phantoms_escaped
            );
            tally.npcs_killed += npcs_killed;
            tally.phantoms_killed += phantoms_killed;
            tally.phantoms_escaped += phantoms_escaped;
        }
        GameEvent::Crafted { name, .. } => {
            log::info!("Crafted {}", name);
            tally.crafts += 1;
        }
        GameEvent::RouteLocked(route) => log::info!("Route locked: {:?}", route),
        _ => {}
    }
}

/// Scripted protagonist: wanders between locations while playing, chases
/// and swings at the nearest phantom while possessed.
fn scripted_input(session: &GameSession, tick: u64) -> PlayerInput {
    let position = session.player_position;
    if session.mode() != GameMode::Possession || session.possession.phase() != Phase::Active {
        return PlayerInput {
            position,
            ..Default::default()
        };
    }

    let nearest = session.possession.phantoms().iter().min_by(|a, b| {
        a.position
            .distance_squared(&position)
            .total_cmp(&b.position.distance_squared(&position))
    });
    match nearest {
        Some(phantom) => PlayerInput {
            attack_pressed: tick % 5 == 0,
            position: position.move_toward(&phantom.position, WALK_SPEED * TICK),
            facing: (phantom.position - position).normalize(),
        },
        None => PlayerInput {
            position,
            ..Default::default()
        },
    }
}

fn run_session(config: SessionConfig, seconds: f32, verbose: bool) -> (Vec<TestResult>, RunSummary) {
    println!("--- Session Run ---");
    let mut results = Vec::new();
    let seed = config.seed.unwrap_or(DEFAULT_SEED);

    let mut session = GameSession::new(config);
    let population = session.populate_town().len();

    let tally = Rc::new(RefCell::new(Tally::default()));
    let sink = Rc::clone(&tally);
    session
        .events
        .subscribe(Box::new(move |event| record(&mut sink.borrow_mut(), event)));

    let ticks = (seconds / TICK).ceil() as u64;
    let wander_ticks = ((WANDER_INTERVAL / TICK) as u64).max(1);
    let mut out_of_range = 0usize;
    let mut stop = 0usize;

    for tick in 0..ticks {
        if session.mode() == GameMode::Playing && tick > 0 && tick % wander_ticks == 0 {
            let previous = session.location;
            stop = (stop + 1) % Location::ALL.len();
            session.record_exploration(previous, WANDER_INTERVAL);
            session.set_location(Location::ALL[stop]);
            session.player_position = Vec3::flat(stop as f32 * 4.0, 0.0);

            // Chat with whoever is close, then tinker with the kit
            let nearby: Vec<_> = session
                .town
                .nearby_npcs(session.player_position, session.config.company_radius)
                .into_iter()
                .map(|npc| npc.id)
                .collect();
            if let Some(&id) = nearby.first() {
                session.talk_to(id, stop % 2 == 0);
            }
            if session.craft("wooden_stick", Some("cloth_rag"), None).is_none() {
                log::debug!("t={:.0}s: nothing left to craft torches from", session.sim_time());
            }
        }

        let input = scripted_input(&session, tick);
        session.update(TICK, &input);

        let r = &session.resources;
        if !(0.0..=100.0).contains(&r.sanity) || !(0.0..=100.0).contains(&r.comfort) {
            out_of_range += 1;
        }
    }

    let tally = tally.borrow();
    results.push(check(
        "resources_in_range",
        out_of_range == 0,
        format!("{} ticks with sanity or comfort out of range", out_of_range),
    ));

    let alternating = tally
        .lifecycle
        .iter()
        .enumerate()
        .all(|(i, started)| *started == (i % 2 == 0));
    let episodes = tally.lifecycle.iter().filter(|s| **s).count();
    results.push(check(
        "episodes_alternate",
        alternating,
        format!("{} episodes started", episodes),
    ));

    let alive = session.town.alive_count();
    results.push(check(
        "npc_deaths_conserved",
        alive + tally.npcs_killed == population,
        format!(
            "{} alive + {} killed of {} townsfolk",
            alive, tally.npcs_killed, population
        ),
    ));

    results.push(check(
        "route_counts_deaths",
        session.route.counters.npc_deaths as usize == tally.npcs_killed,
        format!("{} deaths tracked", session.route.counters.npc_deaths),
    ));

    let hud = session.hud();
    if verbose {
        println!(
            "    day {} {} at {:?}: sanity {:.1}, comfort {:.1}, health {:.1}",
            hud.day, hud.time, hud.location, hud.sanity, hud.comfort, hud.overall_health
        );
    }

    let summary = RunSummary {
        seed,
        seconds,
        hud,
        episodes,
        npcs_killed: tally.npcs_killed,
        phantoms_killed: tally.phantoms_killed,
        phantoms_escaped: tally.phantoms_escaped,
        crafts: tally.crafts,
        locked_route: session.route.primary_route,
        events: tally.by_kind.clone(),
    };
    (results, summary)
}

// ── 3. Session Crafting ─────────────────────────────────────────────────

fn validate_session_crafting(config: SessionConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Session Crafting ---");
    let mut results = Vec::new();
    let mut session = GameSession::new(config);

    let torch = session.craft("wooden_stick", Some("cloth_rag"), None);
    results.push(check(
        "torch_from_starting_kit",
        torch.as_ref().map(|c| c.item.id.as_str()) == Some("torch"),
        format!("{:?}", torch.as_ref().map(|c| &c.item.name)),
    ));
    results.push(check(
        "craft_counts_for_route",
        session.route.counters.crafting_attempts >= 1,
        format!("{} crafting attempts", session.route.counters.crafting_attempts),
    ));

    let bogus = session.craft("no_such_item", None, None);
    results.push(check(
        "unknown_input_rejected",
        bogus.is_none(),
        "crafting from a missing item fails",
    ));

    if verbose {
        for recipe in session.crafting.discovered_recipes() {
            println!("    discovered {}", recipe);
        }
    }

    results
}

// ── 4. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(config: SessionConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Save / Load ---");
    let mut results = Vec::new();

    let mut session = GameSession::new(config.clone());
    session.populate_town();
    for _ in 0..300 {
        session.update(TICK, &PlayerInput::default());
    }
    // Saves always resume in Playing
    session.force_end_possession();

    let mut buffer = Vec::new();
    match session.save(&mut buffer) {
        Ok(()) => {
            let mut loaded = GameSession::new(config.clone());
            let outcome = loaded.load(&buffer[..]);
            // Episode-local status is not saved
            let mut restored = loaded.hud();
            restored.possession = session.hud().possession;
            results.push(check(
                "bincode_roundtrip",
                outcome.is_ok() && restored == session.hud(),
                format!("{} bytes", buffer.len()),
            ));
        }
        Err(e) => results.push(check("bincode_roundtrip", false, e.to_string())),
    }

    match session.to_json() {
        Ok(json) => {
            let mut loaded = GameSession::new(config);
            let outcome = loaded.load_json(&json);
            results.push(check(
                "json_roundtrip",
                outcome.is_ok() && loaded.town.records() == session.town.records(),
                format!("{} chars", json.len()),
            ));
            if verbose {
                println!("    JSON save is {} lines", json.lines().count());
            }
        }
        Err(e) => results.push(check("json_roundtrip", false, e.to_string())),
    }

    results
}
