//! Static recipe table.
//!
//! Lookup is by the unordered set of input ids. Table order is significant:
//! the first recipe whose inputs match and whose world-object requirement (if
//! any) is satisfied wins.

use serde::{Deserialize, Serialize};

use crate::items::{Attribute, ItemId, TrapEffect, WorldObject};

/// Overrides that replace the base catalog definition of a recipe's output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomItem {
    pub attributes: Vec<Attribute>,
    pub damage: Option<f32>,
    pub heal_amount: Option<f32>,
    pub can_be_placed: bool,
    pub trap_effects: Vec<TrapEffect>,
    pub continuous: bool,
    pub area_effect: bool,
    pub gory: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    /// One or two input ids, order-independent.
    pub inputs: Vec<ItemId>,
    /// Named by the recipe but not consumed.
    pub requires_additional: Option<ItemId>,
    pub requires_world_object: Option<WorldObject>,
    pub output: ItemId,
    pub output_name: String,
    pub output_description: String,
    pub custom_item: Option<CustomItem>,
}

impl Recipe {
    pub fn new(id: &str, inputs: &[&str], output: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            requires_additional: None,
            requires_world_object: None,
            output: output.to_string(),
            output_name: name.to_string(),
            output_description: description.to_string(),
            custom_item: None,
        }
    }

    fn requires(mut self, item: &str) -> Self {
        self.requires_additional = Some(item.to_string());
        self
    }

    fn on(mut self, object: WorldObject) -> Self {
        self.requires_world_object = Some(object);
        self
    }

    fn custom(mut self, custom: CustomItem) -> Self {
        self.custom_item = Some(custom);
        self
    }

    /// True if the recipe's inputs are exactly `first` (+ `second`), in any order.
    pub fn matches_inputs(&self, first: &str, second: Option<&str>) -> bool {
        let mut given: Vec<&str> = std::iter::once(first).chain(second).collect();
        given.sort_unstable();
        let mut wanted: Vec<&str> = self.inputs.iter().map(String::as_str).collect();
        wanted.sort_unstable();
        given == wanted
    }

    /// The world-object requirement, if any, is met by `object`.
    pub fn accepts_world_object(&self, object: Option<WorldObject>) -> bool {
        match self.requires_world_object {
            Some(required) => object == Some(required),
            None => true,
        }
    }
}

/// Ordered collection of recipes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeBook {
    recipes: Vec<Recipe>,
}

impl RecipeBook {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_recipes())
    }

    /// First recipe in table order matching the inputs and world object.
    pub fn find(
        &self,
        first: &str,
        second: Option<&str>,
        world_object: Option<WorldObject>,
    ) -> Option<&Recipe> {
        self.recipes
            .iter()
            .find(|r| r.matches_inputs(first, second) && r.accepts_world_object(world_object))
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

fn builtin_recipes() -> Vec<Recipe> {
    use Attribute::*;

    vec![
        Recipe::new(
            "molotov_1",
            &["glass_bottle", "gasoline"],
            "molotov_cocktail",
            "Molotov Cocktail",
            "Glass bottle filled with gasoline. Add a rag to complete.",
        ),
        Recipe::new(
            "molotov_2",
            &["glass_bottle", "alcohol"],
            "molotov_cocktail",
            "Alcohol Molotov",
            "An improvised incendiary using alcohol.",
        )
        .requires("cloth_rag"),
        // Weapons
        Recipe::new(
            "nail_bat",
            &["wooden_board", "nails"],
            "nail_bat",
            "Nail Bat",
            "A wooden board with nails hammered through it. Brutal.",
        ),
        Recipe::new(
            "glass_knife",
            &["glass_shard", "duct_tape"],
            "glass_knife",
            "Glass Shiv",
            "A glass shard wrapped with tape for a handle.",
        )
        .custom(CustomItem {
            attributes: vec![Sharp, Glass, Handle, Weapon],
            damage: Some(18.0),
            ..Default::default()
        }),
        Recipe::new(
            "pipe_mace",
            &["metal_pipe", "chain"],
            "pipe_mace",
            "Chain Mace",
            "A pipe with chain wrapped around the end.",
        )
        .custom(CustomItem {
            attributes: vec![Blunt, Metal, Heavy, Weapon],
            damage: Some(20.0),
            ..Default::default()
        }),
        Recipe::new(
            "torch",
            &["wooden_stick", "cloth_rag"],
            "torch",
            "Makeshift Torch",
            "A stick with an oil-soaked rag. Light it up.",
        )
        .requires("oil")
        .custom(CustomItem {
            attributes: vec![Wood, Flammable, Handle, Luminous],
            damage: Some(8.0),
            ..Default::default()
        }),
        // Traps
        Recipe::new(
            "restraint_trap",
            &["rope", "zip_ties"],
            "restraint_trap",
            "Leg Restraint",
            "A trap that binds legs together, slowing movement.",
        ),
        Recipe::new(
            "restraint_trap_2",
            &["chain", "metal_pipe"],
            "restraint_trap",
            "Chain Restraint",
            "Heavy chains that severely limit mobility.",
        ),
        Recipe::new(
            "spike_trap",
            &["wooden_board", "nails"],
            "spike_trap",
            "Nail Board Trap",
            "A board of nails placed on the ground.",
        )
        .on(WorldObject::Floor),
        Recipe::new(
            "spike_trap_2",
            &["metal_sheet", "glass_shard"],
            "spike_trap",
            "Glass Spike Trap",
            "Sharpened metal with glass shards attached.",
        ),
        Recipe::new(
            "electric_trap",
            &["battery", "wire"],
            "electric_trap",
            "Shock Wire",
            "Electrified wire that stuns on contact.",
        ),
        Recipe::new(
            "electric_trap_2",
            &["battery", "chain"],
            "electric_trap",
            "Electric Chain",
            "An electrified chain trap.",
        ),
        Recipe::new(
            "tripwire",
            &["wire", "alarm_clock"],
            "tripwire_alarm",
            "Tripwire Alarm",
            "A wire that triggers an alarm when tripped.",
        )
        .custom(CustomItem {
            attributes: vec![TrapComponent, Mechanical],
            can_be_placed: true,
            trap_effects: vec![TrapEffect::Alert],
            ..Default::default()
        }),
        // Explosives
        Recipe::new(
            "pipe_bomb",
            &["metal_pipe", "chemicals"],
            "pipe_bomb",
            "Pipe Bomb",
            "A crude but effective explosive device.",
        )
        .requires("battery"),
        Recipe::new(
            "smoke_bomb",
            &["metal_can", "chemicals"],
            "smoke_bomb",
            "Smoke Bomb",
            "Creates a thick cloud of smoke when ignited.",
        ),
        // Healing
        Recipe::new(
            "medkit",
            &["bandage", "alcohol"],
            "medkit",
            "Improvised Medkit",
            "Basic first aid supplies bundled together.",
        ),
        Recipe::new(
            "medkit_2",
            &["bandage", "medicine"],
            "medkit",
            "Medicine Kit",
            "Bandages combined with pain medication.",
        ),
        Recipe::new(
            "splint",
            &["wooden_stick", "bandage"],
            "splint",
            "Makeshift Splint",
            "For immobilizing broken limbs.",
        )
        .custom(CustomItem {
            attributes: vec![Healing, Wood],
            heal_amount: Some(30.0),
            ..Default::default()
        }),
        // Light and utility
        Recipe::new(
            "lantern",
            &["jar", "candle"],
            "lantern",
            "Jar Lantern",
            "A protected light source.",
        )
        .custom(CustomItem {
            attributes: vec![Luminous, Glass, Handle],
            ..Default::default()
        }),
        Recipe::new(
            "oil_lantern",
            &["metal_can", "oil"],
            "oil_lantern",
            "Oil Lantern",
            "A longer-lasting light source.",
        )
        .requires("cloth_rag")
        .custom(CustomItem {
            attributes: vec![Luminous, Metal, Handle, Flammable],
            ..Default::default()
        }),
        Recipe::new(
            "lockpick",
            &["wire", "screwdriver"],
            "lockpick",
            "Improvised Lockpick",
            "For opening locked doors.",
        )
        .custom(CustomItem {
            attributes: vec![Metal, Mechanical],
            ..Default::default()
        }),
        // Filled containers. Shadowed by molotov_1 for the same inputs.
        Recipe::new(
            "bottle_gasoline",
            &["glass_bottle", "gasoline"],
            "bottle_gasoline",
            "Bottle of Gasoline",
            "A glass bottle filled with gasoline.",
        )
        .custom(CustomItem {
            attributes: vec![Container, Glass, Flammable, Liquid, FilledContainer],
            ..Default::default()
        }),
        Recipe::new(
            "bottle_water",
            &["glass_bottle", "water"],
            "bottle_water",
            "Bottle of Water",
            "Clean drinking water.",
        )
        .custom(CustomItem {
            attributes: vec![Container, Glass, Liquid, FilledContainer],
            ..Default::default()
        }),
        Recipe::new(
            "bottle_acid",
            &["glass_bottle", "acid"],
            "bottle_acid",
            "Bottle of Acid",
            "Handle with extreme care.",
        )
        .custom(CustomItem {
            attributes: vec![Container, Glass, Toxic, Liquid, FilledContainer],
            damage: Some(30.0),
            ..Default::default()
        }),
        // Gory
        Recipe::new(
            "blood_ritual",
            &["blood_vial", "candle"],
            "blood_candle",
            "Blood Candle",
            "A candle infused with blood. Unsettling.",
        )
        .custom(CustomItem {
            attributes: vec![BodyPart, Luminous, Flammable],
            gory: true,
            ..Default::default()
        }),
        Recipe::new(
            "finger_necklace",
            &["finger", "rope"],
            "finger_necklace",
            "Gruesome Necklace",
            "A necklace made of fingers. Why would you make this?",
        )
        .custom(CustomItem {
            attributes: vec![BodyPart, Rope],
            gory: true,
            ..Default::default()
        }),
        // Multi-step
        Recipe::new(
            "advanced_trap",
            &["electric_trap", "restraint_trap"],
            "shock_restraint",
            "Shock Restraint System",
            "Binds and continuously shocks the victim.",
        )
        .custom(CustomItem {
            attributes: vec![TrapComponent, Electronic, Rope],
            can_be_placed: true,
            trap_effects: vec![TrapEffect::Slow, TrapEffect::Stun, TrapEffect::Damage],
            damage: Some(10.0),
            continuous: true,
            ..Default::default()
        }),
        Recipe::new(
            "fire_trap",
            &["molotov_cocktail", "tripwire_alarm"],
            "fire_trap",
            "Tripwire Fire Trap",
            "Ignites when triggered.",
        )
        .custom(CustomItem {
            attributes: vec![TrapComponent, Explosive, Flammable],
            can_be_placed: true,
            trap_effects: vec![TrapEffect::Fire],
            damage: Some(40.0),
            area_effect: true,
            ..Default::default()
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_size() {
        assert_eq!(RecipeBook::builtin().len(), 27);
    }

    #[test]
    fn test_lookup_is_order_independent() {
        let book = RecipeBook::builtin();
        let a = book.find("glass_bottle", Some("gasoline"), None).unwrap();
        let b = book.find("gasoline", Some("glass_bottle"), None).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_first_match_wins_for_item_only_conflicts() {
        let book = RecipeBook::builtin();
        let recipe = book.find("glass_bottle", Some("gasoline"), None).unwrap();
        assert_eq!(recipe.id, "molotov_1");
    }

    #[test]
    fn test_world_object_requirement() {
        let book = RecipeBook::builtin();
        // Without a floor, the object-free recipe matches
        let bare = book.find("wooden_board", Some("nails"), None).unwrap();
        assert_eq!(bare.id, "nail_bat");
        // The object-free recipe is earlier in the table, so it still wins on a floor
        let on_floor = book.find("nails", Some("wooden_board"), Some(WorldObject::Floor)).unwrap();
        assert_eq!(on_floor.id, "nail_bat");
    }

    #[test]
    fn test_world_object_only_recipe_skipped_without_object() {
        let book = RecipeBook::new(vec![
            Recipe::new("placed", &["a", "b"], "x", "X", "").on(WorldObject::Floor),
            Recipe::new("loose", &["a", "b"], "y", "Y", ""),
        ]);
        assert_eq!(book.find("a", Some("b"), None).unwrap().id, "loose");
        assert_eq!(book.find("b", Some("a"), Some(WorldObject::Floor)).unwrap().id, "placed");
        assert_eq!(book.find("a", Some("b"), Some(WorldObject::Wall)).unwrap().id, "loose");
    }

    #[test]
    fn test_single_input_does_not_match_pair() {
        let book = RecipeBook::builtin();
        assert!(book.find("glass_bottle", None, None).is_none());
        assert!(book.find("glass_bottle", Some("glass_bottle"), None).is_none());
    }
}
