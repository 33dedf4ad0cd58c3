//! Game-flow state machine and its command surface.

pub mod command;
pub mod events;
mod game;

pub use command::Command;
pub use events::{EventHook, GameEvent, NullSink, SnapshotSink};
pub use game::{GameEngine, GamePhase};
