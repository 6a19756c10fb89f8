//! HTTP surface tests: routes, wire shapes, and error bodies.

mod support;

use actix_web::{test, web, App};
use backend::middleware::{RequestTrace, StructuredLogger};
use backend::routes;
use serde_json::{json, Value};

macro_rules! test_app {
    ($te:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestTrace)
                .wrap(StructuredLogger)
                .app_data(web::Data::new(support::app_state(&$te)))
                .configure(routes::configure),
        )
        .await
    };
}

macro_rules! post_json {
    ($app:expr, $uri:expr, $body:expr) => {{
        let req = test::TestRequest::post()
            .uri($uri)
            .set_json($body)
            .to_request();
        let resp = test::call_service(&$app, req).await;
        let status = resp.status().as_u16();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

macro_rules! get_json {
    ($app:expr, $uri:expr) => {{
        let req = test::TestRequest::get().uri($uri).to_request();
        let resp = test::call_service(&$app, req).await;
        let status = resp.status().as_u16();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

#[actix_web::test]
async fn join_fills_the_lobby_and_then_rejects() {
    let te = support::engine_with(4, 240_000);
    let app = test_app!(te);

    let (status, body) = post_json!(app, "/join", json!({}));
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Name is required");

    let mut ids = Vec::new();
    for name in ["a", "b", "c", "d"] {
        let (status, body) = post_json!(app, "/join", json!({ "name": name }));
        assert_eq!(status, 200);
        let pid = body["player_id"].as_str().expect("player_id").to_string();
        assert_eq!(pid.len(), 32);
        ids.push(pid);
    }

    let (status, body) = post_json!(app, "/join", json!({ "name": "late" }));
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Cannot join right now");
}

#[actix_web::test]
async fn state_snapshot_has_the_wire_shape() {
    let te = support::engine_with(4, 240_000);
    let app = test_app!(te);
    let ids = support::join_all(&te.engine, &["a", "b", "c", "d"]);

    let (status, body) = get_json!(app, &format!("/state?player_id={}", ids[0]));
    assert_eq!(status, 200);
    assert_eq!(body["state"], "trading");
    assert_eq!(body["time_left"], 240);
    assert_eq!(body["pot"], 200);
    assert_eq!(body["trades"], json!([]));

    let hand = body["hand"].as_object().expect("hand map");
    assert_eq!(hand.len(), 4);
    let held: u64 = hand.values().map(|v| v.as_u64().unwrap()).sum();
    assert_eq!(held, 10);

    let market = body["market"].as_object().expect("market map");
    assert_eq!(market.len(), 4);
    for suit in ["spades", "clubs", "hearts", "diamonds"] {
        assert!(market[suit]["highest_bid"].is_null());
        assert!(market[suit]["lowest_ask"].is_null());
    }

    let balances = body["balances"].as_object().expect("balances");
    assert_eq!(balances.len(), 4);
    for balance in balances.values() {
        assert_eq!(balance.as_i64().unwrap(), 300);
    }
    assert!(body.get("results").is_none());
    assert!(body.get("hands").is_none());
}

#[actix_web::test]
async fn state_requires_a_known_player_id() {
    let te = support::engine_with(4, 240_000);
    let app = test_app!(te);

    let (status, body) = get_json!(app, "/state");
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Invalid or missing player_id");

    let (status, body) = get_json!(app, "/state?player_id=deadbeef");
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Invalid or missing player_id");
}

#[actix_web::test]
async fn actions_rest_improve_and_cancel_over_http() {
    let te = support::engine_with(4, 240_000);
    let app = test_app!(te);
    let ids = support::join_all(&te.engine, &["a", "b", "c", "d"]);

    let bid = |pid: &str, price: i64| {
        json!({
            "player_id": pid,
            "action_type": "order",
            "order_type": "buy",
            "suit": "spades",
            "price": price,
        })
    };

    let (status, body) = post_json!(app, "/action", bid(&ids[0], 5));
    assert_eq!(status, 200);
    assert!(body["order_id"].is_string());

    let (status, body) = post_json!(app, "/action", bid(&ids[0], 5));
    assert_eq!(status, 400);
    assert_eq!(body["error"], "duplicate order");

    let (status, body) = post_json!(app, "/action", bid(&ids[1], 5));
    assert_eq!(status, 400);
    assert_eq!(body["error"], "not improving");

    let (status, body) = post_json!(app, "/action", bid(&ids[1], 6));
    assert_eq!(status, 200);
    let improved_id = body["order_id"].as_str().unwrap().to_string();

    let (_, body) = get_json!(app, &format!("/state?player_id={}", ids[0]));
    let best = &body["market"]["spades"]["highest_bid"];
    assert_eq!(best["price"], 6);
    assert_eq!(best["player_id"], ids[1].as_str());

    let (status, body) = post_json!(
        app,
        "/action",
        json!({
            "player_id": ids[1],
            "action_type": "cancel",
            "order_type": "both",
            "suit": "all",
            "price": -1,
        })
    );
    assert_eq!(status, 200);
    assert_eq!(body["canceled"], json!([improved_id]));
}

#[actix_web::test]
async fn action_schema_errors_use_the_wire_messages() {
    let te = support::engine_with(4, 240_000);
    let app = test_app!(te);
    let ids = support::join_all(&te.engine, &["a", "b", "c", "d"]);

    let base = |extra: Value| {
        let mut body = json!({
            "player_id": ids[0],
            "action_type": "order",
            "order_type": "buy",
            "suit": "spades",
            "price": 5,
        });
        body.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        body
    };

    let cases = [
        (base(json!({"action_type": "trade"})), "Invalid action type"),
        (base(json!({"order_type": "borrow"})), "Invalid order_type"),
        (base(json!({"suit": "stars"})), "Invalid suit"),
        (base(json!({"price": 0})), "Price must be a positive integer"),
        (
            base(json!({"price": "ten"})),
            "Price must be a positive integer",
        ),
        (
            base(
                json!({"action_type": "cancel", "order_type": "both", "suit": "all", "price": -2}),
            ),
            "Price must be a non-negative integer or -1",
        ),
        (base(json!({"player_id": "nobody"})), "Invalid player_id"),
    ];
    for (body, expected) in cases {
        let (status, response) = post_json!(app, "/action", body);
        assert_eq!(status, 400);
        assert_eq!(response["error"], expected);
    }
}

#[actix_web::test]
async fn actions_require_the_trading_phase() {
    let te = support::engine_with(4, 240_000);
    let app = test_app!(te);
    let pid = te.engine.join("solo").unwrap().to_string();

    let (status, body) = post_json!(
        app,
        "/action",
        json!({
            "player_id": pid,
            "action_type": "order",
            "order_type": "buy",
            "suit": "spades",
            "price": 5,
        })
    );
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Trading not active");
}

#[actix_web::test]
async fn errors_carry_only_the_error_key() {
    let te = support::engine_with(4, 240_000);
    let app = test_app!(te);

    let req = test::TestRequest::post()
        .uri("/join")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let body: Value = test::read_body_json(resp).await;
    let object = body.as_object().expect("error object");
    assert_eq!(object.len(), 1);
    assert!(object.contains_key("error"));
}

#[actix_web::test]
async fn successful_responses_carry_a_trace_header() {
    let te = support::engine_with(4, 240_000);
    let app = test_app!(te);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 200);
    let trace = resp.headers().get("x-trace-id").expect("trace header");
    assert!(!trace.to_str().unwrap().is_empty());
}

#[actix_web::test]
async fn health_reports_status_and_phase() {
    let te = support::engine_with(4, 240_000);
    let app = test_app!(te);

    let (status, body) = get_json!(app, "/health");
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["phase"], "waiting");
}
