//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use backend::config::GameConfig;
use backend::events::{EventSink, MemorySink};
use backend::infra::{Clock, ManualClock};
use backend::services::{ActionRequest, GameEngine};
use backend::state::AppState;

/// Engine on a manual clock with a buffering sink: time moves only when the
/// test says so, and every emitted event is available for assertions.
pub struct TestEngine {
    pub clock: Arc<ManualClock>,
    pub sink: Arc<MemorySink>,
    pub engine: Arc<GameEngine>,
}

pub fn engine_with(num_players: usize, duration_ms: u64) -> TestEngine {
    let clock = Arc::new(ManualClock::starting_at(0));
    let sink = Arc::new(MemorySink::new());
    let config = GameConfig {
        port: 0,
        num_players,
        duration_ms,
    };
    let engine = Arc::new(GameEngine::new(
        &config,
        Arc::clone(&clock) as Arc<dyn Clock>,
        Arc::clone(&sink) as Arc<dyn EventSink>,
    ));
    TestEngine {
        clock,
        sink,
        engine,
    }
}

pub fn app_state(test_engine: &TestEngine) -> AppState {
    AppState::new(Arc::clone(&test_engine.engine))
}

pub fn join_all(engine: &GameEngine, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|name| engine.join(name).expect("join").to_string())
        .collect()
}

pub fn order(player_id: &str, order_type: &str, suit: &str, price: i64) -> ActionRequest {
    ActionRequest {
        player_id: Some(player_id.to_string()),
        action_type: Some("order".to_string()),
        order_type: Some(order_type.to_string()),
        suit: Some(suit.to_string()),
        price: Some(serde_json::json!(price)),
    }
}

pub fn cancel(player_id: &str, order_type: &str, suit: &str, price: i64) -> ActionRequest {
    ActionRequest {
        player_id: Some(player_id.to_string()),
        action_type: Some("cancel".to_string()),
        order_type: Some(order_type.to_string()),
        suit: Some(suit.to_string()),
        price: Some(serde_json::json!(price)),
    }
}
