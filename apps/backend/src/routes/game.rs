//! Game HTTP routes: the thin adapter over the engine facade.
//!
//! Handlers parse, delegate, and serialize. All admission logic lives in
//! the engine; every rejection surfaces as HTTP 400 `{"error": msg}`.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::domain::OrderOutcome;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::ValidatedJson;
use crate::services::{ActionOutcome, ActionRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct JoinBody {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StateQuery {
    player_id: Option<String>,
}

/// POST /join — body `{"name": string}`, success `{"player_id": string}`.
async fn join(
    app_state: web::Data<AppState>,
    body: ValidatedJson<JoinBody>,
) -> Result<HttpResponse, AppError> {
    let name = body.name.as_deref().unwrap_or("");
    let player_id = app_state.engine.join(name)?;
    Ok(HttpResponse::Ok().json(json!({ "player_id": player_id })))
}

/// GET /state?player_id=… — the caller's snapshot of the round.
async fn game_state(
    app_state: web::Data<AppState>,
    query: web::Query<StateQuery>,
) -> Result<HttpResponse, AppError> {
    let player_id = query.player_id.as_deref().unwrap_or("");
    if player_id.is_empty() {
        return Err(AppError::rejected(
            ErrorCode::InvalidPlayerId,
            "Invalid or missing player_id",
        ));
    }
    let snapshot = app_state.engine.state_for(player_id)?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// POST /action — order submission or bulk cancel.
async fn action(
    app_state: web::Data<AppState>,
    body: ValidatedJson<ActionRequest>,
) -> Result<HttpResponse, AppError> {
    let outcome = app_state.engine.submit_action(&body)?;
    let payload = match outcome {
        ActionOutcome::Order(OrderOutcome::Rested(order_id)) => json!({ "order_id": order_id }),
        ActionOutcome::Order(OrderOutcome::Traded(trade)) => json!({ "trade": trade }),
        ActionOutcome::Canceled(order_ids) => json!({ "canceled": order_ids }),
    };
    Ok(HttpResponse::Ok().json(payload))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/join", web::post().to(join))
        .route("/state", web::get().to(game_state))
        .route("/action", web::post().to(action));
}
