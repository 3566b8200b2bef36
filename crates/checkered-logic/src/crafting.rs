//! Inventory and crafting engine.
//!
//! Combines one or two held items (optionally on a world object) into a new
//! item. A recipe from the [`RecipeBook`] wins when one matches; otherwise a
//! procedural item is synthesized from the union of the inputs' attributes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::inventory::{Inventory, InventoryConfig};
use crate::items::{starting_inventory, Attribute, Item, ItemCatalog, WorldObject};
use crate::recipes::{Recipe, RecipeBook};

/// Union two attribute sets and apply the interaction rules.
pub fn combine_attributes(a: &BTreeSet<Attribute>, b: &BTreeSet<Attribute>) -> BTreeSet<Attribute> {
    let mut combined: BTreeSet<Attribute> = a.union(b).copied().collect();

    if combined.contains(&Attribute::Flammable) && combined.contains(&Attribute::FireSource) {
        combined.remove(&Attribute::Flammable);
        combined.insert(Attribute::Burning);
    }
    if combined.contains(&Attribute::Container) && combined.contains(&Attribute::Liquid) {
        combined.insert(Attribute::FilledContainer);
    }
    if combined.contains(&Attribute::Sharp) && combined.contains(&Attribute::Handle) {
        combined.insert(Attribute::Weapon);
    }
    if combined.contains(&Attribute::Rope) && combined.contains(&Attribute::Heavy) {
        combined.insert(Attribute::TrapComponent);
    }
    if combined.contains(&Attribute::Metal)
        && combined.contains(&Attribute::Conductive)
        && combined.contains(&Attribute::Electronic)
    {
        combined.insert(Attribute::TrapComponent);
    }

    combined
}

/// Which naming template a procedural combination uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameTemplate {
    Modified,
    FilledWith,
    Weapon,
    Burning,
    TrapDevice,
    Pair,
}

impl NameTemplate {
    fn select(has_second: bool, attributes: &BTreeSet<Attribute>) -> Self {
        if !has_second {
            NameTemplate::Modified
        } else if attributes.contains(&Attribute::FilledContainer) {
            NameTemplate::FilledWith
        } else if attributes.contains(&Attribute::Weapon) {
            NameTemplate::Weapon
        } else if attributes.contains(&Attribute::Burning) {
            NameTemplate::Burning
        } else if attributes.contains(&Attribute::TrapComponent) {
            NameTemplate::TrapDevice
        } else {
            NameTemplate::Pair
        }
    }

    fn render(self, first: &str, second: &str) -> String {
        match self {
            NameTemplate::Modified => format!("Modified {}", first),
            NameTemplate::FilledWith => format!("{} with {}", first, second),
            NameTemplate::Weapon => format!("{}-{} Weapon", first, second),
            NameTemplate::Burning => format!("Burning {}", first),
            NameTemplate::TrapDevice => format!("{} Trap Device", first),
            NameTemplate::Pair => format!("{} & {}", first, second),
        }
    }
}

fn procedural_name(first: &Item, second: Option<&Item>, attributes: &BTreeSet<Attribute>) -> String {
    let second_name = second.map(|i| i.name.as_str()).unwrap_or_default();
    NameTemplate::select(second.is_some(), attributes).render(&first.name, second_name)
}

fn procedural_description(first: &Item, second: Option<&Item>, attributes: &BTreeSet<Attribute>) -> String {
    let tags: Vec<&str> = attributes.iter().map(|a| a.tag()).collect();
    match second {
        Some(second) => format!(
            "A combination of {} and {}. [{}]",
            first.name,
            second.name,
            tags.join(", ")
        ),
        None => format!("A combination of {}. [{}]", first.name, tags.join(", ")),
    }
}

/// Outcome shown to the player before committing a craft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftPreview {
    pub name: String,
    pub description: String,
    pub is_known_recipe: bool,
    pub predicted_attributes: BTreeSet<Attribute>,
}

/// A committed craft.
#[derive(Debug, Clone, PartialEq)]
pub struct Crafted {
    pub item: Item,
    /// Recipe used, `None` for procedural combinations.
    pub recipe_id: Option<String>,
    /// First time this recipe was used this session.
    pub newly_discovered: bool,
}

enum Resolution<'a> {
    Recipe(&'a Recipe),
    Procedural(BTreeSet<Attribute>),
}

/// Persistable crafting state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CraftingSnapshot {
    pub inventory: Inventory,
    pub discovered_recipes: BTreeSet<String>,
    pub applied_traps: Vec<Item>,
    pub craft_count: u32,
    pub next_crafted_id: u64,
}

pub struct CraftingEngine {
    catalog: ItemCatalog,
    recipes: RecipeBook,
    inventory: Inventory,
    discovered_recipes: BTreeSet<String>,
    applied_traps: Vec<Item>,
    craft_count: u32,
    next_crafted_id: u64,
}

impl CraftingEngine {
    pub fn new(config: &InventoryConfig, catalog: ItemCatalog, recipes: RecipeBook) -> Self {
        Self {
            catalog,
            recipes,
            inventory: Inventory::new(config),
            discovered_recipes: BTreeSet::new(),
            applied_traps: Vec::new(),
            craft_count: 0,
            next_crafted_id: 1,
        }
    }

    /// Built-in catalog and recipes, stocked with the starting items.
    pub fn with_starting_inventory(config: &InventoryConfig) -> Self {
        let mut engine = Self::new(config, ItemCatalog::builtin(), RecipeBook::builtin());
        for (id, quantity) in starting_inventory() {
            engine.give(id, quantity);
        }
        engine
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn recipes(&self) -> &RecipeBook {
        &self.recipes
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn add_item(&mut self, item: Item) -> bool {
        self.inventory.add_item(item)
    }

    /// Add `quantity` of a catalog item. False if unknown or no room.
    pub fn give(&mut self, id: &str, quantity: u32) -> bool {
        let Some(mut item) = self.catalog.get(id).cloned() else {
            log::warn!("Unknown item id: {}", id);
            return false;
        };
        item.quantity = quantity.max(1);
        self.inventory.add_item(item)
    }

    pub fn remove_item(&mut self, id: &str, quantity: u32) -> bool {
        self.inventory.remove_item(id, quantity)
    }

    pub fn get_item(&self, id: &str) -> Option<&Item> {
        self.inventory.get_item(id)
    }

    pub fn has_item(&self, id: &str) -> bool {
        self.inventory.has_item(id)
    }

    pub fn item_count(&self, id: &str) -> u32 {
        self.inventory.item_count(id)
    }

    pub fn craft_count(&self) -> u32 {
        self.craft_count
    }

    pub fn discovered_recipes(&self) -> &BTreeSet<String> {
        &self.discovered_recipes
    }

    /// Held inputs for a craft, or `None` if any is missing. Using the same
    /// id twice needs two of it.
    fn inputs(&self, first_id: &str, second_id: Option<&str>) -> Option<(Item, Option<Item>)> {
        let first = self.inventory.get_item(first_id)?.clone();
        let second = match second_id {
            Some(id) => {
                if id == first_id && self.inventory.item_count(id) < 2 {
                    return None;
                }
                Some(self.inventory.get_item(id)?.clone())
            }
            None => None,
        };
        Some((first, second))
    }

    fn resolve(
        &self,
        first: &Item,
        second: Option<&Item>,
        world_object: Option<WorldObject>,
    ) -> Resolution<'_> {
        if let Some(recipe) = self
            .recipes
            .find(&first.id, second.map(|i| i.id.as_str()), world_object)
        {
            return Resolution::Recipe(recipe);
        }

        let other: BTreeSet<Attribute> = match (second, world_object) {
            (Some(item), _) => item.attributes.clone(),
            (None, Some(object)) => object.attributes().iter().copied().collect(),
            (None, None) => BTreeSet::new(),
        };
        Resolution::Procedural(combine_attributes(&first.attributes, &other))
    }

    fn recipe_output(&self, recipe: &Recipe, first: &Item, second: Option<&Item>) -> Item {
        let mut item = Item::new(
            recipe.output.clone(),
            recipe.output_name.clone(),
            recipe.output_description.clone(),
        );
        if let Some(custom) = &recipe.custom_item {
            item.attributes = custom.attributes.iter().copied().collect();
            item.damage = custom.damage;
            item.heal_amount = custom.heal_amount;
            item.can_be_placed = custom.can_be_placed;
            item.trap_effects = custom.trap_effects.clone();
            item.continuous = custom.continuous;
            item.area_effect = custom.area_effect;
            item.gory = custom.gory;
        } else if let Some(base) = self.catalog.get(&recipe.output) {
            item.attributes = base.attributes.clone();
            item.damage = base.damage;
            item.heal_amount = base.heal_amount;
            item.can_be_placed = base.can_be_placed;
            item.trap_effects = base.trap_effects.clone();
            item.continuous = base.continuous;
            item.area_effect = base.area_effect;
            item.gory = base.gory;
        }
        item.stackable = false;
        item.max_stack = 1;
        item.crafted_from = std::iter::once(first.id.clone())
            .chain(second.map(|i| i.id.clone()))
            .collect();
        item
    }

    fn procedural_output(
        &self,
        attributes: BTreeSet<Attribute>,
        first: &Item,
        second: Option<&Item>,
    ) -> Item {
        let mut item = Item::new(
            format!("crafted_{}", self.next_crafted_id),
            procedural_name(first, second, &attributes),
            procedural_description(first, second, &attributes),
        );
        item.attributes = attributes;
        item.procedural = true;
        item.stackable = false;
        item.max_stack = 1;
        item.crafted_from = std::iter::once(first.id.clone())
            .chain(second.map(|i| i.id.clone()))
            .collect();
        item
    }

    /// Combine held items. Consumes one of each input and stores the result.
    /// Returns `None`, with the inventory untouched, if an input is missing
    /// or the result does not fit.
    pub fn craft(
        &mut self,
        first_id: &str,
        second_id: Option<&str>,
        world_object: Option<WorldObject>,
    ) -> Option<Crafted> {
        let Some((first, second)) = self.inputs(first_id, second_id) else {
            log::debug!("Craft failed: missing input {} / {:?}", first_id, second_id);
            return None;
        };

        let (item, recipe_id) = match self.resolve(&first, second.as_ref(), world_object) {
            Resolution::Recipe(recipe) => (
                self.recipe_output(recipe, &first, second.as_ref()),
                Some(recipe.id.clone()),
            ),
            Resolution::Procedural(attributes) => {
                (self.procedural_output(attributes, &first, second.as_ref()), None)
            }
        };

        let mut next = self.inventory.clone();
        next.remove_item(&first.id, 1);
        if let Some(second) = &second {
            next.remove_item(&second.id, 1);
        }
        if !next.add_item(item.clone()) {
            log::debug!("Craft failed: no room for {}", item.name);
            return None;
        }
        self.inventory = next;
        self.craft_count += 1;

        let newly_discovered = match &recipe_id {
            Some(id) => self.discovered_recipes.insert(id.clone()),
            None => {
                self.next_crafted_id += 1;
                false
            }
        };
        log::info!(
            "Crafted {} ({})",
            item.name,
            recipe_id.as_deref().unwrap_or("procedural")
        );

        Some(Crafted {
            item,
            recipe_id,
            newly_discovered,
        })
    }

    /// What `craft` would produce, without touching any state.
    pub fn preview_craft(
        &self,
        first_id: &str,
        second_id: Option<&str>,
        world_object: Option<WorldObject>,
    ) -> Option<CraftPreview> {
        let (first, second) = self.inputs(first_id, second_id)?;

        let preview = match self.resolve(&first, second.as_ref(), world_object) {
            Resolution::Recipe(recipe) => {
                let output = self.recipe_output(recipe, &first, second.as_ref());
                CraftPreview {
                    name: recipe.output_name.clone(),
                    description: recipe.output_description.clone(),
                    is_known_recipe: self.discovered_recipes.contains(&recipe.id),
                    predicted_attributes: output.attributes,
                }
            }
            Resolution::Procedural(attributes) => CraftPreview {
                name: procedural_name(&first, second.as_ref(), &attributes),
                description: "Unknown combination - try it!".to_string(),
                is_known_recipe: false,
                predicted_attributes: attributes,
            },
        };
        Some(preview)
    }

    /// Move one placeable item from the inventory onto the player, to spring
    /// during the next possession.
    pub fn apply_trap_to_self(&mut self, id: &str) -> bool {
        let Some(item) = self.inventory.get_item(id) else {
            return false;
        };
        if !item.can_be_placed {
            log::debug!("{} cannot be placed", item.name);
            return false;
        }
        let trap = Item {
            quantity: 1,
            ..item.clone()
        };
        self.inventory.remove_item(id, 1);
        log::info!("Applied trap to self: {}", trap.name);
        self.applied_traps.push(trap);
        true
    }

    pub fn applied_traps(&self) -> &[Item] {
        &self.applied_traps
    }

    pub fn clear_applied_traps(&mut self) {
        self.applied_traps.clear();
    }

    pub fn snapshot(&self) -> CraftingSnapshot {
        CraftingSnapshot {
            inventory: self.inventory.clone(),
            discovered_recipes: self.discovered_recipes.clone(),
            applied_traps: self.applied_traps.clone(),
            craft_count: self.craft_count,
            next_crafted_id: self.next_crafted_id,
        }
    }

    pub fn restore(&mut self, snapshot: CraftingSnapshot) {
        self.inventory = snapshot.inventory;
        self.discovered_recipes = snapshot.discovered_recipes;
        self.applied_traps = snapshot.applied_traps;
        self.craft_count = snapshot.craft_count;
        self.next_crafted_id = snapshot.next_crafted_id.max(1);
    }
}
