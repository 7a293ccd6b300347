//! Space Invaders engine: a shared world of individually locked entities,
//! driven by a handful of worker threads and a mode state machine.

pub mod audio;
pub mod compute;
pub mod config;
pub mod entities;
pub mod error;
pub mod highscore;
pub mod mode;
pub mod pacing;
pub mod peer;
pub mod pipeline;
pub mod slot;
pub mod timer;
pub mod workers;
pub mod world;

pub use error::GameError;
pub use mode::{Mode, ModeRequest};
pub use world::World;
