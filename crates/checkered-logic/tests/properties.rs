//! Property tests for the bounded, order-independent parts of the logic crate.

use std::collections::HashMap;

use checkered_logic::crafting::{combine_attributes, CraftingEngine};
use checkered_logic::inventory::{Inventory, InventoryConfig};
use checkered_logic::items::{Item, ItemCatalog, WorldObject};
use checkered_logic::recipes::RecipeBook;
use checkered_logic::route::{compute_scores, BehaviorCounters, BehaviorEvent, RouteScoring};
use checkered_logic::sanity::ResourceState;
use proptest::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

const ITEM_IDS: &[&str] = &[
    "glass_bottle", "gasoline", "cloth_rag", "alcohol", "knife", "wooden_stick",
    "wooden_board", "nails", "rope", "brick", "battery", "wire", "metal_pipe",
    "metal_can", "chain", "duct_tape", "bandage", "medicine", "matches", "lighter",
    "newspaper", "water", "bucket", "jar", "glass_shard", "chemicals",
];

const WORLD_OBJECTS: &[Option<WorldObject>] = &[
    None,
    Some(WorldObject::Campfire),
    Some(WorldObject::Floor),
    Some(WorldObject::Puddle),
    Some(WorldObject::ElectricalOutlet),
];

const BEHAVIORS: &[BehaviorEvent] = &[
    BehaviorEvent::DialogueStarted,
    BehaviorEvent::FriendMade,
    BehaviorEvent::ViolenceAvoided,
    BehaviorEvent::HelpfulAction,
    BehaviorEvent::ChaosAction,
    BehaviorEvent::RandomChoice,
    BehaviorEvent::Trolling,
    BehaviorEvent::CombatInitiated,
    BehaviorEvent::NpcDeath,
    BehaviorEvent::IllegalAction,
    BehaviorEvent::Intimidation,
    BehaviorEvent::CraftingAttempt,
    BehaviorEvent::UniqueRecipe,
    BehaviorEvent::BaseBuilding,
    BehaviorEvent::ContractCompleted,
];

/// Three flavours of item: big stacks, small stacks, and unique.
fn test_item(kind: usize, quantity: u32) -> Item {
    let item = match kind % 3 {
        0 => Item::new("pebble", "Pebble", ""),
        1 => Item::new("flare", "Flare", "").with_stack(5),
        _ => Item::new("locket", "Locket", "").unique(),
    };
    item.with_quantity(quantity)
}

#[derive(Debug, Clone)]
enum InventoryOp {
    Add { kind: usize, quantity: u32 },
    Remove { kind: usize, quantity: u32 },
}

fn inventory_op() -> impl Strategy<Value = InventoryOp> {
    prop_oneof![
        (0usize..3, 1u32..150).prop_map(|(kind, quantity)| InventoryOp::Add { kind, quantity }),
        (0usize..3, 1u32..60).prop_map(|(kind, quantity)| InventoryOp::Remove { kind, quantity }),
    ]
}

// ── Properties ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn sanity_and_comfort_stay_in_range(deltas in prop::collection::vec(-500.0f32..500.0, 1..60)) {
        let mut state = ResourceState::default();
        for delta in deltas {
            state.modify_sanity(delta);
            state.modify_comfort(-delta * 0.7);
            prop_assert!((0.0..=100.0).contains(&state.sanity));
            prop_assert!((0.0..=100.0).contains(&state.comfort));
        }
    }

    #[test]
    fn inventory_never_exceeds_bounds(
        capacity in 1usize..12,
        ops in prop::collection::vec(inventory_op(), 1..80),
    ) {
        let mut inventory = Inventory::new(&InventoryConfig { capacity });
        let mut expected: HashMap<String, u32> = HashMap::new();

        for op in ops {
            match op {
                InventoryOp::Add { kind, quantity } => {
                    let item = test_item(kind, quantity);
                    let id = item.id.clone();
                    if inventory.add_item(item) {
                        *expected.entry(id).or_insert(0) += quantity;
                    }
                }
                InventoryOp::Remove { kind, quantity } => {
                    let id = test_item(kind, 1).id;
                    let held = expected.get(&id).copied().unwrap_or(0);
                    let removed = inventory.remove_item(&id, quantity);
                    prop_assert_eq!(removed, held >= quantity);
                    if removed {
                        expected.insert(id, held - quantity);
                    }
                }
            }

            prop_assert!(inventory.len() <= capacity);
            for slot in inventory.items() {
                prop_assert!(slot.quantity >= 1);
                prop_assert!(slot.quantity <= slot.max_stack.max(1));
            }
            for (id, count) in &expected {
                prop_assert_eq!(inventory.item_count(id), *count);
            }
        }
    }

    #[test]
    fn recipe_lookup_ignores_input_order(
        a in 0..ITEM_IDS.len(),
        b in 0..ITEM_IDS.len(),
        object in 0..WORLD_OBJECTS.len(),
    ) {
        let book = RecipeBook::builtin();
        let object = WORLD_OBJECTS[object];
        let forward = book.find(ITEM_IDS[a], Some(ITEM_IDS[b]), object).map(|r| r.id.clone());
        let backward = book.find(ITEM_IDS[b], Some(ITEM_IDS[a]), object).map(|r| r.id.clone());
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn craft_preview_ignores_input_order(a in 0..ITEM_IDS.len(), b in 0..ITEM_IDS.len()) {
        let mut engine = CraftingEngine::new(
            &InventoryConfig::default(),
            ItemCatalog::builtin(),
            RecipeBook::builtin(),
        );
        // One at a time so unique items end up with two copies as well
        for id in [ITEM_IDS[a], ITEM_IDS[a], ITEM_IDS[b], ITEM_IDS[b]] {
            prop_assert!(engine.give(id, 1));
        }

        let forward = engine.preview_craft(ITEM_IDS[a], Some(ITEM_IDS[b]), None).unwrap();
        let backward = engine.preview_craft(ITEM_IDS[b], Some(ITEM_IDS[a]), None).unwrap();
        prop_assert_eq!(forward.is_known_recipe, backward.is_known_recipe);
        prop_assert_eq!(forward.predicted_attributes, backward.predicted_attributes);
    }

    #[test]
    fn attribute_combination_is_symmetric(a in 0..ITEM_IDS.len(), b in 0..ITEM_IDS.len()) {
        let catalog = ItemCatalog::builtin();
        let first = &catalog.get(ITEM_IDS[a]).unwrap().attributes;
        let second = &catalog.get(ITEM_IDS[b]).unwrap().attributes;
        prop_assert_eq!(combine_attributes(first, second), combine_attributes(second, first));
    }

    #[test]
    fn route_scores_are_bounded_and_repeatable(
        events in prop::collection::vec(0..BEHAVIORS.len(), 0..120),
    ) {
        let mut counters = BehaviorCounters::default();
        for i in events {
            counters.record(BEHAVIORS[i]);
        }
        let first = compute_scores(&counters);
        let second = compute_scores(&counters);
        prop_assert_eq!(first, second);
        for score in [first.pacifist, first.insanity, first.criminal, first.tech] {
            prop_assert!((0.0..=100.0).contains(&score));
        }
    }

    #[test]
    fn locked_route_never_changes(
        events in prop::collection::vec(0..BEHAVIORS.len(), 1..200),
    ) {
        let mut scoring = RouteScoring::default();
        let mut locked_at = None;
        for i in events {
            let newly_locked = scoring.track(&[BEHAVIORS[i]]);
            match locked_at {
                None => {
                    if let Some(route) = newly_locked {
                        locked_at = Some((route, scoring.scores));
                    }
                }
                Some((route, scores)) => {
                    prop_assert!(newly_locked.is_none());
                    prop_assert_eq!(scoring.primary_route, Some(route));
                    prop_assert_eq!(scoring.scores, scores);
                }
            }
        }
        prop_assert_eq!(scoring.locked, locked_at.is_some());
    }
}
