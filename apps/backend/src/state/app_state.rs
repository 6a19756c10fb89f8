use std::sync::Arc;

use crate::services::GameEngine;

/// Application state shared by all handlers.
///
/// Handlers hold the engine facade only; round internals never escape the
/// service layer.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GameEngine>,
}

impl AppState {
    pub fn new(engine: Arc<GameEngine>) -> Self {
        Self { engine }
    }
}
