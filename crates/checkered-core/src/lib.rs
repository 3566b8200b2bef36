//! Checkered Core - session engine
//!
//! Owns one playthrough: a `hecs` world of townsfolk, the protagonist's
//! resources, inventory, body and route, and the possession episode that can
//! interrupt play at any time. All rules live in `checkered_logic`; this crate
//! wires them into a single tick, dispatches typed events to observers and
//! saves/loads the result.
//!
//! # Example
//!
//! ```rust,no_run
//! use checkered_core::prelude::*;
//!
//! let mut session = GameSession::new(SessionConfig::default());
//! session.populate_town();
//!
//! loop {
//!     session.update(1.0 / 60.0, &PlayerInput::default());
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod events;
pub mod persistence;
pub mod town;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{ConfigError, SessionConfig};
    pub use crate::engine::{GameMode, GameSession, HudSnapshot};
    pub use crate::events::{EventBus, GameEvent};
    pub use crate::persistence::SaveError;
    pub use crate::town::Town;
    pub use checkered_logic::possession::PlayerInput;
}
