//! Town vocabulary: locations, time-of-day periods and NPC relationships.
//!
//! Closed enums with total mapping functions. Adding a location means the
//! compiler points at every table that needs a value for it.

use serde::{Deserialize, Serialize};

/// Named areas of the town.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Bar,
    Park,
    Shop,
    House1,
    House2,
    House3,
    School,
    Streets,
    Forest,
}

impl Location {
    pub const ALL: [Location; 9] = [
        Location::Bar,
        Location::Park,
        Location::Shop,
        Location::House1,
        Location::House2,
        Location::House3,
        Location::School,
        Location::Streets,
        Location::Forest,
    ];

    /// How comfortable the protagonist feels here. Positive values raise
    /// comfort and give a small sanity bonus; zero or below drains comfort.
    pub fn comfort_value(self) -> f32 {
        match self {
            Location::Bar => 15.0,
            Location::Park => 5.0,
            Location::Shop => 3.0,
            Location::House1 | Location::House2 | Location::House3 => 10.0,
            Location::School => -5.0,
            Location::Streets => 0.0,
            Location::Forest => -10.0,
        }
    }

    pub fn is_comfortable(self) -> bool {
        self.comfort_value() > 0.0
    }

    pub fn name(self) -> &'static str {
        match self {
            Location::Bar => "Bar",
            Location::Park => "Park",
            Location::Shop => "Shop",
            Location::House1 => "House 1",
            Location::House2 => "House 2",
            Location::House3 => "House 3",
            Location::School => "School",
            Location::Streets => "Streets",
            Location::Forest => "Forest",
        }
    }
}

/// Period of the in-game day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    /// Midnight to dawn
    Night,
    Morning,
    Afternoon,
    Evening,
    /// Late evening until midnight
    LateNight,
}

impl TimeOfDay {
    /// Period for a normalized time of day in [0, 1).
    pub fn from_normalized(t: f32) -> Self {
        let t = t.rem_euclid(1.0);
        if t < 0.25 {
            TimeOfDay::Night
        } else if t < 0.42 {
            TimeOfDay::Morning
        } else if t < 0.67 {
            TimeOfDay::Afternoon
        } else if t < 0.83 {
            TimeOfDay::Evening
        } else {
            TimeOfDay::LateNight
        }
    }

    /// Normalized time at which this period begins.
    pub fn start(self) -> f32 {
        match self {
            TimeOfDay::Night => 0.0,
            TimeOfDay::Morning => 0.25,
            TimeOfDay::Afternoon => 0.42,
            TimeOfDay::Evening => 0.67,
            TimeOfDay::LateNight => 0.83,
        }
    }

    pub fn is_night(self) -> bool {
        matches!(self, TimeOfDay::Night | TimeOfDay::LateNight)
    }

    pub fn name(self) -> &'static str {
        match self {
            TimeOfDay::Night | TimeOfDay::LateNight => "Night",
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
        }
    }
}

/// How an NPC feels about the protagonist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Hostile,
    Fearful,
    Suspicious,
    #[default]
    Neutral,
    Friendly,
    Trusted,
}

impl Relationship {
    /// Band a raw relationship value.
    pub fn from_value(value: i32) -> Self {
        if value > 50 {
            Relationship::Trusted
        } else if value > 20 {
            Relationship::Friendly
        } else if value < -50 {
            Relationship::Hostile
        } else if value < -20 {
            Relationship::Fearful
        } else {
            Relationship::Neutral
        }
    }

    /// Company that steadies the protagonist.
    pub fn is_supportive(self) -> bool {
        matches!(self, Relationship::Friendly | Relationship::Trusted)
    }

    /// Company that unsettles the protagonist.
    pub fn is_unsettling(self) -> bool {
        matches!(self, Relationship::Suspicious | Relationship::Fearful)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_comfort_values() {
        assert_eq!(Location::Bar.comfort_value(), 15.0);
        assert_eq!(Location::Streets.comfort_value(), 0.0);
        assert!(Location::House2.is_comfortable());
        assert!(!Location::Streets.is_comfortable());
        assert!(!Location::Forest.is_comfortable());
    }

    #[test]
    fn test_time_of_day_bands() {
        assert_eq!(TimeOfDay::from_normalized(0.1), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_normalized(0.25), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_normalized(0.5), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_normalized(0.7), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_normalized(0.9), TimeOfDay::LateNight);
        assert!(TimeOfDay::LateNight.is_night());
        assert!(!TimeOfDay::Evening.is_night());
    }

    #[test]
    fn test_relationship_banding() {
        assert_eq!(Relationship::from_value(0), Relationship::Neutral);
        assert_eq!(Relationship::from_value(21), Relationship::Friendly);
        assert_eq!(Relationship::from_value(51), Relationship::Trusted);
        assert_eq!(Relationship::from_value(-21), Relationship::Fearful);
        assert_eq!(Relationship::from_value(-51), Relationship::Hostile);
    }

    #[test]
    fn test_relationship_classes() {
        assert!(Relationship::Trusted.is_supportive());
        assert!(Relationship::Suspicious.is_unsettling());
        assert!(!Relationship::Hostile.is_unsettling());
        assert!(!Relationship::Neutral.is_supportive());
    }
}
