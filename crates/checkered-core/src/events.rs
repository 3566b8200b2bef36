//! Typed session events and the observer registry that delivers them.

use serde::{Deserialize, Serialize};

use checkered_logic::clock::ClockEvent;
use checkered_logic::health::HealthEvent;
use checkered_logic::possession::PossessionEvent;
use checkered_logic::route::Route;
use checkered_logic::sanity::SanityEvent;
use checkered_logic::spatial::Vec3;
use checkered_logic::world::Location;

/// Everything a presentation layer can react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sanity(SanityEvent),
    Clock(ClockEvent),
    Health(HealthEvent),
    Possession(PossessionEvent),
    PossessionStarted {
        location: Location,
    },
    PossessionEnded {
        npcs_killed: usize,
        phantoms_killed: u32,
        phantoms_escaped: u32,
    },
    /// A phantom outlived the episode; the protagonist wakes up where it stood.
    PhantomLingers {
        position: Vec3,
    },
    Crafted {
        item_id: String,
        name: String,
        recipe_id: Option<String>,
        newly_discovered: bool,
    },
    RouteLocked(Route),
}

pub type Subscriber = Box<dyn FnMut(&GameEvent)>;

/// Ordered list of observers. Events are delivered synchronously, in
/// subscription order.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    published: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscribers.push(subscriber);
    }

    pub fn publish(&mut self, event: GameEvent) {
        self.published += 1;
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }

    pub fn publish_all(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    /// Total events published since creation.
    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_subscribers_see_events_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        for tag in ["a", "b"] {
            let seen = Rc::clone(&seen);
            bus.subscribe(Box::new(move |event| {
                if let GameEvent::RouteLocked(route) = event {
                    seen.borrow_mut().push((tag, *route));
                }
            }));
        }

        bus.publish(GameEvent::RouteLocked(Route::Tech));
        bus.publish(GameEvent::Clock(ClockEvent::DayChanged(2)));

        assert_eq!(
            *seen.borrow(),
            vec![("a", Route::Tech), ("b", Route::Tech)]
        );
        assert_eq!(bus.published(), 2);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let mut bus = EventBus::new();
        bus.publish_all(vec![GameEvent::Sanity(SanityEvent::LowSanity)]);
        assert_eq!(bus.published(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
