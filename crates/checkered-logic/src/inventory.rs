//! Bounded slot inventory with stacking.

use serde::{Deserialize, Serialize};

use crate::items::Item;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Maximum number of slots.
    pub capacity: usize,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self { capacity: 40 }
    }
}

/// Ordered list of item slots. A slot never holds more than its `max_stack`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub capacity: usize,
    slots: Vec<Item>,
}

impl Inventory {
    pub fn new(config: &InventoryConfig) -> Self {
        Self {
            capacity: config.capacity,
            slots: Vec::new(),
        }
    }

    /// Add an item, topping up partial stacks of the same id before opening
    /// new slots. Returns false, leaving the inventory untouched, if the whole
    /// quantity does not fit.
    pub fn add_item(&mut self, item: Item) -> bool {
        let quantity = item.quantity.max(1);

        // One slot per unit
        if !item.stackable {
            if self.slots.len() + quantity as usize > self.capacity {
                log::debug!("Inventory full, cannot add {} x{}", item.name, quantity);
                return false;
            }
            let single = Item { quantity: 1, ..item };
            self.slots
                .extend(std::iter::repeat(single).take(quantity as usize));
            return true;
        }

        let max_stack = item.max_stack.max(1);
        let stack_room: u32 = self
            .slots
            .iter()
            .filter(|s| s.id == item.id && s.stackable)
            .map(|s| s.stack_space())
            .sum();
        let overflow = quantity.saturating_sub(stack_room);
        let new_slots = overflow.div_ceil(max_stack) as usize;
        if self.slots.len() + new_slots > self.capacity {
            log::debug!("Inventory full, cannot add {} x{}", item.name, quantity);
            return false;
        }

        let mut remaining = quantity;
        for slot in self.slots.iter_mut().filter(|s| s.id == item.id && s.stackable) {
            if remaining == 0 {
                break;
            }
            let moved = remaining.min(slot.stack_space());
            slot.quantity += moved;
            remaining -= moved;
        }
        while remaining > 0 {
            let take = remaining.min(max_stack);
            self.slots.push(Item {
                quantity: take,
                max_stack,
                ..item.clone()
            });
            remaining -= take;
        }
        true
    }

    /// Remove `quantity` of an item, draining the last matching slot first.
    /// Returns false when fewer than `quantity` are held.
    pub fn remove_item(&mut self, id: &str, quantity: u32) -> bool {
        if quantity == 0 || self.item_count(id) < quantity {
            return false;
        }
        let mut remaining = quantity;
        while remaining > 0 {
            let Some(index) = self.slots.iter().rposition(|s| s.id == id) else {
                break;
            };
            let slot = &mut self.slots[index];
            if slot.quantity > remaining {
                slot.quantity -= remaining;
                remaining = 0;
            } else {
                remaining -= slot.quantity;
                self.slots.remove(index);
            }
        }
        true
    }

    pub fn get_item(&self, id: &str) -> Option<&Item> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub fn has_item(&self, id: &str) -> bool {
        self.get_item(id).is_some()
    }

    /// Total quantity across all slots with this id.
    pub fn item_count(&self, id: &str) -> u32 {
        self.slots.iter().filter(|s| s.id == id).map(|s| s.quantity).sum()
    }

    pub fn items(&self) -> &[Item] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }
}
