//! Service layer: the engine facade the transport talks to.

pub mod engine;

pub use engine::{ActionOutcome, ActionRequest, GameEngine};
