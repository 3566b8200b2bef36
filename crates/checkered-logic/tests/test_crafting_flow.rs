//! Integration tests for crafting from the starting kit.
//!
//! Exercises: starting inventory → recipe and procedural crafts → inventory
//! bounds → sanity and route side effects the caller wires up.

use checkered_logic::crafting::CraftingEngine;
use checkered_logic::inventory::InventoryConfig;
use checkered_logic::items::{ItemCatalog, WorldObject};
use checkered_logic::recipes::RecipeBook;
use checkered_logic::route::RouteScoring;
use checkered_logic::sanity::{ResourceState, SanityAction};

// ── Helpers ────────────────────────────────────────────────────────────

fn engine_with_capacity(capacity: usize) -> CraftingEngine {
    CraftingEngine::new(
        &InventoryConfig { capacity },
        ItemCatalog::builtin(),
        RecipeBook::builtin(),
    )
}

// ── Flows ──────────────────────────────────────────────────────────────

#[test]
fn starting_kit_makes_two_torches() {
    let mut crafting = CraftingEngine::with_starting_inventory(&InventoryConfig::default());
    assert_eq!(crafting.item_count("wooden_stick"), 2);
    assert_eq!(crafting.item_count("cloth_rag"), 3);

    let first = crafting.craft("cloth_rag", Some("wooden_stick"), None).unwrap();
    assert_eq!(first.recipe_id.as_deref(), Some("torch"));
    assert!(first.newly_discovered);
    assert_eq!(first.item.damage, Some(8.0));

    let second = crafting.craft("wooden_stick", Some("cloth_rag"), None).unwrap();
    assert!(!second.newly_discovered);

    assert_eq!(crafting.item_count("torch"), 2);
    assert_eq!(crafting.item_count("wooden_stick"), 0);
    assert_eq!(crafting.item_count("cloth_rag"), 1);
    assert!(crafting.craft("wooden_stick", Some("cloth_rag"), None).is_none());
    assert_eq!(crafting.craft_count(), 2);
}

#[test]
fn molotov_from_bottle_and_gasoline() {
    let mut crafting = engine_with_capacity(2);
    assert!(crafting.give("glass_bottle", 1));
    assert!(crafting.give("gasoline", 1));
    assert!(crafting.inventory().is_full());

    // Inputs free their slots before the output lands
    let crafted = crafting.craft("gasoline", Some("glass_bottle"), None).unwrap();
    assert_eq!(crafted.recipe_id.as_deref(), Some("molotov_1"));
    assert_eq!(crafted.item.id, "molotov_cocktail");
    assert_eq!(crafted.item.crafted_from, vec!["gasoline", "glass_bottle"]);
    assert_eq!(crafting.inventory().len(), 1);
    assert!(crafting.discovered_recipes().contains("molotov_1"));
}

#[test]
fn full_inventory_rejects_craft_untouched() {
    let mut crafting = engine_with_capacity(2);
    assert!(crafting.give("cloth_rag", 2));
    assert!(crafting.give("wooden_stick", 2));
    let before = crafting.snapshot();

    assert!(crafting.craft("cloth_rag", Some("wooden_stick"), None).is_none());
    assert_eq!(crafting.snapshot(), before);
}

#[test]
fn preview_then_craft_agree() {
    let mut crafting = engine_with_capacity(10);
    assert!(crafting.give("knife", 1));
    assert!(crafting.give("rope", 1));
    let before = crafting.snapshot();

    let preview = crafting.preview_craft("knife", Some("rope"), None).unwrap();
    assert!(!preview.is_known_recipe);
    assert_eq!(crafting.snapshot(), before);

    let crafted = crafting.craft("knife", Some("rope"), None).unwrap();
    assert!(crafted.recipe_id.is_none());
    assert!(crafted.item.procedural);
    assert_eq!(crafted.item.name, preview.name);
    assert_eq!(crafted.item.attributes, preview.predicted_attributes);
}

#[test]
fn campfire_lights_a_lone_rag() {
    let mut crafting = engine_with_capacity(10);
    assert!(crafting.give("cloth_rag", 1));
    let crafted = crafting
        .craft("cloth_rag", None, Some(WorldObject::Campfire))
        .unwrap();
    assert_eq!(crafted.item.name, "Modified Cloth Rag");
    assert!(crafted.item.has(checkered_logic::items::Attribute::Burning));
    assert!(!crafting.has_item("cloth_rag"));
}

#[test]
fn gory_craft_costs_sanity_and_counts_for_tech() {
    let mut crafting = engine_with_capacity(10);
    let mut resources = ResourceState::default();
    let mut routes = RouteScoring::default();
    assert!(crafting.give("blood_vial", 1));
    assert!(crafting.give("candle", 1));

    let crafted = crafting.craft("candle", Some("blood_vial"), None).unwrap();
    assert!(crafted.item.gory);
    if crafted.item.gory {
        resources.on_action_performed(SanityAction::CraftedGory);
    }
    routes.record_crafting();

    assert_eq!(resources.sanity, 92.0);
    assert_eq!(routes.counters.crafting_attempts, 1);
    assert!(!routes.locked);
}
