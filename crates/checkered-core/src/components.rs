//! ECS components for townsfolk.
//!
//! Components are pure data attached to NPC entities in the [`Town`](crate::town::Town)
//! world. Behavior lives in the town and session code.

use serde::{Deserialize, Serialize};

use checkered_logic::population::NpcId;
use checkered_logic::spatial::Vec3;
use checkered_logic::world::{Location, Relationship};

/// Identity of a townsperson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    pub id: NpcId,
    pub name: String,
    /// Where they spend most of the day.
    pub home: Location,
}

/// World-space position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec3);

/// How the townsperson feels about the protagonist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposition {
    /// Raw value in [-100, 100].
    pub value: i32,
    pub relationship: Relationship,
}

impl Disposition {
    pub fn new(value: i32) -> Self {
        let value = value.clamp(-100, 100);
        Self {
            value,
            relationship: Relationship::from_value(value),
        }
    }

    /// Shift the raw value and re-band the relationship.
    pub fn adjust(&mut self, delta: i32) {
        *self = Self::new(self.value.saturating_add(delta));
    }
}

impl Default for Disposition {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Marker: present while the townsperson is alive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alive;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_bands() {
        assert_eq!(Disposition::new(60).relationship, Relationship::Trusted);
        assert_eq!(Disposition::new(-30).relationship, Relationship::Fearful);
        assert_eq!(Disposition::default().relationship, Relationship::Neutral);
    }

    #[test]
    fn test_disposition_adjust_clamps() {
        let mut d = Disposition::new(90);
        d.adjust(50);
        assert_eq!(d.value, 100);
        d.adjust(-250);
        assert_eq!(d.value, -100);
        assert_eq!(d.relationship, Relationship::Hostile);
    }
}
