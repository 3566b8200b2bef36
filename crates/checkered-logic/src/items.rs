//! Item model and the built-in item catalog.
//!
//! Items carry a closed set of [`Attribute`] tags; the procedural crafting
//! fallback works entirely on those tags. Defaults for optional fields are
//! filled once by [`Item::new`], never at read sites.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Item identifier (content id, e.g. `"glass_bottle"`).
pub type ItemId = String;

/// Default stack limit for stackable items that do not name one.
pub const DEFAULT_MAX_STACK: u32 = 99;

/// Closed vocabulary of item properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Flammable,
    Container,
    Liquid,
    Sharp,
    Blunt,
    Handle,
    Rope,
    Heavy,
    Conductive,
    Insulating,
    Explosive,
    Toxic,
    Healing,
    FireSource,
    Burning,
    FilledContainer,
    Weapon,
    TrapComponent,
    Food,
    Cloth,
    Metal,
    Wood,
    Glass,
    Electronic,
    Sticky,
    Slippery,
    Cold,
    Mechanical,
    Luminous,
    BodyPart,
}

impl Attribute {
    pub fn description(self) -> &'static str {
        match self {
            Attribute::Flammable => "Can catch fire",
            Attribute::Container => "Can hold liquids",
            Attribute::Liquid => "Is a liquid substance",
            Attribute::Sharp => "Can cut or pierce",
            Attribute::Blunt => "Can bash or crush",
            Attribute::Handle => "Has a grip for holding",
            Attribute::Rope => "Can bind or tie",
            Attribute::Heavy => "Weighs a lot",
            Attribute::Conductive => "Conducts electricity",
            Attribute::Insulating => "Blocks electricity",
            Attribute::Explosive => "Can explode",
            Attribute::Toxic => "Poisonous substance",
            Attribute::Healing => "Can restore health",
            Attribute::FireSource => "Produces fire",
            Attribute::Burning => "Currently on fire",
            Attribute::FilledContainer => "Contains a liquid",
            Attribute::Weapon => "Can be used to attack",
            Attribute::TrapComponent => "Can be used in traps",
            Attribute::Food => "Can be consumed",
            Attribute::Cloth => "Made of fabric",
            Attribute::Metal => "Made of metal",
            Attribute::Wood => "Made of wood",
            Attribute::Glass => "Made of glass, fragile",
            Attribute::Electronic => "Contains electronics",
            Attribute::Sticky => "Adheres to surfaces",
            Attribute::Slippery => "Reduces friction",
            Attribute::Cold => "Very cold",
            Attribute::Mechanical => "Has moving parts",
            Attribute::Luminous => "Emits light",
            Attribute::BodyPart => "Biological material",
        }
    }

    /// Tag as written in item descriptions.
    pub fn tag(self) -> &'static str {
        match self {
            Attribute::Flammable => "flammable",
            Attribute::Container => "container",
            Attribute::Liquid => "liquid",
            Attribute::Sharp => "sharp",
            Attribute::Blunt => "blunt",
            Attribute::Handle => "handle",
            Attribute::Rope => "rope",
            Attribute::Heavy => "heavy",
            Attribute::Conductive => "conductive",
            Attribute::Insulating => "insulating",
            Attribute::Explosive => "explosive",
            Attribute::Toxic => "toxic",
            Attribute::Healing => "healing",
            Attribute::FireSource => "fire_source",
            Attribute::Burning => "burning",
            Attribute::FilledContainer => "filled_container",
            Attribute::Weapon => "weapon",
            Attribute::TrapComponent => "trap_component",
            Attribute::Food => "food",
            Attribute::Cloth => "cloth",
            Attribute::Metal => "metal",
            Attribute::Wood => "wood",
            Attribute::Glass => "glass",
            Attribute::Electronic => "electronic",
            Attribute::Sticky => "sticky",
            Attribute::Slippery => "slippery",
            Attribute::Cold => "cold",
            Attribute::Mechanical => "mechanical",
            Attribute::Luminous => "luminous",
            Attribute::BodyPart => "body_part",
        }
    }
}

/// What a placed trap does when it springs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapEffect {
    Slow,
    Stun,
    Damage,
    Alert,
    Fire,
}

/// An inventory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub attributes: BTreeSet<Attribute>,
    pub quantity: u32,
    pub stackable: bool,
    pub max_stack: u32,
    pub damage: Option<f32>,
    pub heal_amount: Option<f32>,
    pub trap_effects: Vec<TrapEffect>,
    /// Trap damage ticks over time instead of landing once.
    pub continuous: bool,
    pub can_be_placed: bool,
    pub area_effect: bool,
    /// Made from body parts; crafting one costs sanity.
    pub gory: bool,
    /// Synthesized by the attribute-combination fallback.
    pub procedural: bool,
    /// Input ids this item was crafted from.
    pub crafted_from: Vec<ItemId>,
}

impl Item {
    /// A single stackable item with no attributes and the default stack limit.
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            attributes: BTreeSet::new(),
            quantity: 1,
            stackable: true,
            max_stack: DEFAULT_MAX_STACK,
            damage: None,
            heal_amount: None,
            trap_effects: Vec::new(),
            continuous: false,
            can_be_placed: false,
            area_effect: false,
            gory: false,
            procedural: false,
            crafted_from: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: &[Attribute]) -> Self {
        self.attributes = attributes.iter().copied().collect();
        self
    }

    pub fn with_stack(mut self, max_stack: u32) -> Self {
        self.stackable = true;
        self.max_stack = max_stack.max(1);
        self
    }

    pub fn unique(mut self) -> Self {
        self.stackable = false;
        self.max_stack = 1;
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity.max(1);
        self
    }

    pub fn with_damage(mut self, damage: f32) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn with_heal(mut self, amount: f32) -> Self {
        self.heal_amount = Some(amount);
        self
    }

    pub fn with_trap(mut self, effects: &[TrapEffect]) -> Self {
        self.trap_effects = effects.to_vec();
        self.can_be_placed = true;
        self
    }

    pub fn area(mut self) -> Self {
        self.area_effect = true;
        self
    }

    pub fn gory(mut self) -> Self {
        self.gory = true;
        self
    }

    pub fn has(&self, attribute: Attribute) -> bool {
        self.attributes.contains(&attribute)
    }

    /// Room left in this stack.
    pub fn stack_space(&self) -> u32 {
        if self.stackable {
            self.max_stack.saturating_sub(self.quantity)
        } else {
            0
        }
    }
}

/// Objects in the world that take part in crafting without being picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldObject {
    Puddle,
    OilSpill,
    Campfire,
    ElectricalOutlet,
    Floor,
    Wall,
    Tree,
    Dumpster,
}

impl WorldObject {
    pub fn name(self) -> &'static str {
        match self {
            WorldObject::Puddle => "Water Puddle",
            WorldObject::OilSpill => "Oil Spill",
            WorldObject::Campfire => "Campfire",
            WorldObject::ElectricalOutlet => "Electrical Outlet",
            WorldObject::Floor => "Floor",
            WorldObject::Wall => "Wall",
            WorldObject::Tree => "Tree",
            WorldObject::Dumpster => "Dumpster",
        }
    }

    pub fn attributes(self) -> &'static [Attribute] {
        match self {
            WorldObject::Puddle => &[Attribute::Liquid],
            WorldObject::OilSpill => &[Attribute::Liquid, Attribute::Slippery, Attribute::Flammable],
            WorldObject::Campfire => &[Attribute::FireSource, Attribute::Burning],
            WorldObject::ElectricalOutlet => &[Attribute::Electronic, Attribute::Conductive],
            WorldObject::Floor | WorldObject::Wall => &[],
            WorldObject::Tree => &[Attribute::Wood, Attribute::Flammable],
            WorldObject::Dumpster => &[Attribute::Container, Attribute::Metal],
        }
    }
}

/// Read-only lookup of base item definitions.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: HashMap<ItemId, Item>,
}

impl ItemCatalog {
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.id.clone(), i)).collect(),
        }
    }

    /// The town's salvage: every item that can be found or crafted.
    pub fn builtin() -> Self {
        Self::new(builtin_items())
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Items a new game starts with.
pub fn starting_inventory() -> Vec<(&'static str, u32)> {
    vec![
        ("cloth_rag", 3),
        ("matches", 1),
        ("wooden_stick", 2),
        ("bandage", 2),
        ("newspaper", 1),
    ]
}

fn builtin_items() -> Vec<Item> {
    use Attribute::*;

    vec![
        // Containers
        Item::new("glass_bottle", "Glass Bottle", "An empty glass bottle. Can hold liquids.")
            .with_attributes(&[Container, Glass])
            .with_stack(5),
        Item::new("metal_can", "Metal Can", "A sturdy metal container.")
            .with_attributes(&[Container, Metal])
            .with_stack(10),
        Item::new("bucket", "Bucket", "A large bucket for carrying things.")
            .with_attributes(&[Container, Metal, Handle])
            .unique(),
        Item::new("jar", "Glass Jar", "A jar with a lid.")
            .with_attributes(&[Container, Glass])
            .with_stack(5),
        // Liquids
        Item::new("gasoline", "Gasoline", "Highly flammable fuel.")
            .with_attributes(&[Liquid, Flammable, Toxic])
            .unique(),
        Item::new("water", "Water", "Clean drinking water.")
            .with_attributes(&[Liquid])
            .unique(),
        Item::new("oil", "Motor Oil", "Slippery lubricant.")
            .with_attributes(&[Liquid, Flammable, Slippery])
            .unique(),
        Item::new("alcohol", "Rubbing Alcohol", "Disinfectant, also flammable.")
            .with_attributes(&[Liquid, Flammable, Healing])
            .unique(),
        Item::new("acid", "Battery Acid", "Corrosive and dangerous.")
            .with_attributes(&[Liquid, Toxic, Conductive])
            .unique(),
        Item::new("chemicals", "Cleaning Chemicals", "Various household chemicals.")
            .with_attributes(&[Toxic, Liquid])
            .unique(),
        // Tools
        Item::new("knife", "Kitchen Knife", "A sharp kitchen knife.")
            .with_attributes(&[Sharp, Handle, Metal])
            .with_damage(15.0)
            .unique(),
        Item::new("hammer", "Hammer", "A sturdy claw hammer.")
            .with_attributes(&[Blunt, Handle, Metal, Heavy])
            .with_damage(12.0)
            .unique(),
        Item::new("screwdriver", "Screwdriver", "A flathead screwdriver.")
            .with_attributes(&[Sharp, Handle, Metal, Conductive])
            .with_damage(8.0)
            .unique(),
        Item::new("wrench", "Wrench", "An adjustable wrench.")
            .with_attributes(&[Blunt, Handle, Metal, Heavy])
            .with_damage(10.0)
            .unique(),
        Item::new("scissors", "Scissors", "Sharp cutting scissors.")
            .with_attributes(&[Sharp, Handle, Metal])
            .with_damage(8.0)
            .unique(),
        Item::new("crowbar", "Crowbar", "Heavy iron crowbar.")
            .with_attributes(&[Blunt, Sharp, Handle, Metal, Heavy])
            .with_damage(18.0)
            .unique(),
        // Binding
        Item::new("rope", "Rope", "Strong hemp rope, about 10 meters.")
            .with_attributes(&[Rope, Cloth])
            .with_stack(3),
        Item::new("duct_tape", "Duct Tape", "Industrial strength tape.")
            .with_attributes(&[Sticky, Rope, Cloth])
            .with_stack(5),
        Item::new("zip_ties", "Zip Ties", "Plastic cable ties.")
            .with_attributes(&[Rope])
            .with_stack(20),
        Item::new("chain", "Metal Chain", "Heavy metal chain.")
            .with_attributes(&[Rope, Metal, Heavy, Conductive])
            .unique(),
        Item::new("wire", "Copper Wire", "Coil of copper wire.")
            .with_attributes(&[Rope, Metal, Conductive])
            .with_stack(5),
        // Fire
        Item::new("matches", "Matches", "A box of matches.")
            .with_attributes(&[FireSource, Flammable])
            .with_stack(10),
        Item::new("lighter", "Lighter", "A disposable lighter.")
            .with_attributes(&[FireSource, Flammable])
            .unique(),
        Item::new("candle", "Candle", "A wax candle.")
            .with_attributes(&[Flammable, Luminous])
            .with_stack(10),
        // Cloth
        Item::new("cloth_rag", "Cloth Rag", "A piece of torn cloth.")
            .with_attributes(&[Cloth, Flammable])
            .with_stack(10),
        Item::new("bandage", "Bandage", "Medical bandage wrap.")
            .with_attributes(&[Cloth, Healing])
            .with_heal(15.0)
            .with_stack(10),
        Item::new("blanket", "Blanket", "A wool blanket.")
            .with_attributes(&[Cloth, Insulating, Flammable])
            .unique(),
        // Electronics
        Item::new("battery", "Battery", "A 9V battery.")
            .with_attributes(&[Electronic, Conductive])
            .with_stack(10),
        Item::new("flashlight", "Flashlight", "A handheld flashlight.")
            .with_attributes(&[Electronic, Luminous, Handle, Blunt])
            .unique(),
        Item::new("radio", "Portable Radio", "A small transistor radio.")
            .with_attributes(&[Electronic, Mechanical])
            .unique(),
        Item::new("alarm_clock", "Alarm Clock", "A wind-up alarm clock.")
            .with_attributes(&[Mechanical, Metal])
            .unique(),
        // Wood
        Item::new("wooden_board", "Wooden Board", "A sturdy wooden plank.")
            .with_attributes(&[Wood, Blunt, Flammable])
            .with_damage(8.0)
            .with_stack(5),
        Item::new("wooden_stick", "Wooden Stick", "A thick wooden stick.")
            .with_attributes(&[Wood, Blunt, Handle, Flammable])
            .with_damage(6.0)
            .with_stack(10),
        // Metal
        Item::new("nails", "Box of Nails", "Assorted metal nails.")
            .with_attributes(&[Metal, Sharp])
            .with_stack(20),
        Item::new("metal_pipe", "Metal Pipe", "A section of steel pipe.")
            .with_attributes(&[Metal, Blunt, Heavy, Handle])
            .with_damage(14.0)
            .unique(),
        Item::new("metal_sheet", "Metal Sheet", "A thin sheet of metal.")
            .with_attributes(&[Metal, Sharp])
            .with_stack(3),
        // Consumables
        Item::new("canned_food", "Canned Food", "A can of preserved food.")
            .with_attributes(&[Food, Metal, Container])
            .with_stack(10),
        Item::new("medicine", "Medicine Bottle", "Pain relievers.")
            .with_attributes(&[Healing, Container])
            .with_heal(25.0)
            .with_stack(5),
        Item::new("energy_drink", "Energy Drink", "Caffeine boost.")
            .with_attributes(&[Food, Liquid, Container])
            .with_stack(5),
        // Misc
        Item::new("brick", "Brick", "A heavy clay brick.")
            .with_attributes(&[Blunt, Heavy])
            .with_damage(10.0)
            .with_stack(5),
        Item::new("glass_shard", "Glass Shard", "A sharp piece of broken glass.")
            .with_attributes(&[Glass, Sharp])
            .with_damage(12.0)
            .with_stack(10),
        Item::new("newspaper", "Newspaper", "Today's local paper.")
            .with_attributes(&[Flammable])
            .with_stack(10),
        Item::new("plastic_bag", "Plastic Bag", "A large plastic bag.")
            .with_attributes(&[Container])
            .with_stack(10),
        Item::new("mirror_shard", "Mirror Shard", "A piece of broken mirror.")
            .with_attributes(&[Glass, Sharp, Luminous])
            .with_stack(5),
        // Crafted outputs
        Item::new("molotov_cocktail", "Molotov Cocktail", "An improvised incendiary device.")
            .with_attributes(&[Explosive, Flammable, Glass])
            .with_damage(40.0)
            .area()
            .unique(),
        Item::new("nail_bat", "Nail Bat", "A wooden board studded with nails.")
            .with_attributes(&[Wood, Sharp, Blunt, Weapon])
            .with_damage(22.0)
            .unique(),
        Item::new("pipe_bomb", "Pipe Bomb", "A crude explosive device.")
            .with_attributes(&[Explosive, Metal])
            .with_damage(60.0)
            .area()
            .unique(),
        Item::new("restraint_trap", "Restraint Trap", "A trap that binds the victim.")
            .with_attributes(&[TrapComponent, Rope])
            .with_trap(&[TrapEffect::Slow])
            .unique(),
        Item::new("electric_trap", "Electric Trap", "A trap that shocks the victim.")
            .with_attributes(&[TrapComponent, Electronic, Conductive])
            .with_trap(&[TrapEffect::Stun])
            .with_damage(15.0)
            .unique(),
        Item::new("spike_trap", "Spike Trap", "A trap with sharp spikes.")
            .with_attributes(&[TrapComponent, Sharp, Metal])
            .with_trap(&[TrapEffect::Damage])
            .with_damage(25.0)
            .unique(),
        Item::new("smoke_bomb", "Smoke Bomb", "Creates a cloud of smoke.")
            .with_attributes(&[Explosive, Toxic])
            .area()
            .with_stack(3),
        Item::new("medkit", "Improvised Medkit", "A makeshift first aid kit.")
            .with_attributes(&[Healing])
            .with_heal(50.0)
            .unique(),
        // Body parts
        Item::new("finger", "Severed Finger", "A human finger.")
            .with_attributes(&[BodyPart])
            .gory()
            .with_stack(10),
        Item::new("blood_vial", "Vial of Blood", "Fresh blood in a vial.")
            .with_attributes(&[BodyPart, Liquid, Container])
            .gory()
            .with_stack(5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_defaults() {
        let item = Item::new("thing", "Thing", "");
        assert!(item.stackable);
        assert_eq!(item.max_stack, DEFAULT_MAX_STACK);
        assert_eq!(item.quantity, 1);
        assert!(!item.can_be_placed);
    }

    #[test]
    fn test_builtin_catalog_lookup() {
        let catalog = ItemCatalog::builtin();
        let bottle = catalog.get("glass_bottle").unwrap();
        assert!(bottle.has(Attribute::Container));
        assert_eq!(bottle.max_stack, 5);
        assert!(catalog.get("nonexistent").is_none());
        assert!(catalog.len() > 40);
    }

    #[test]
    fn test_traps_are_placeable() {
        let catalog = ItemCatalog::builtin();
        for id in ["restraint_trap", "electric_trap", "spike_trap"] {
            let trap = catalog.get(id).unwrap();
            assert!(trap.can_be_placed, "{} should be placeable", id);
            assert!(!trap.trap_effects.is_empty());
        }
    }

    #[test]
    fn test_starting_inventory_exists_in_catalog() {
        let catalog = ItemCatalog::builtin();
        for (id, _) in starting_inventory() {
            assert!(catalog.get(id).is_some(), "missing {}", id);
        }
    }

    #[test]
    fn test_attribute_serializes_snake_case() {
        let json = serde_json::to_string(&Attribute::FireSource).unwrap();
        assert_eq!(json, "\"fire_source\"");
    }
}
