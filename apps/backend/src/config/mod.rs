//! Environment-driven configuration.

mod game;

pub use game::GameConfig;
