use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use backend::config::GameConfig;
use backend::events::TracingSink;
use backend::infra::SystemClock;
use backend::middleware::{RequestTrace, StructuredLogger};
use backend::routes;
use backend::services::GameEngine;
use backend::state::AppState;
use backend::telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables before anything reads them.
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let config = match GameConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    };

    let engine = Arc::new(GameEngine::new(
        &config,
        Arc::new(SystemClock::new()),
        Arc::new(TracingSink),
    ));
    // Rounds must complete even when no client is polling.
    actix_web::rt::spawn(Arc::clone(&engine).run_deadline_watcher());

    let app_state = AppState::new(engine);
    let port = config.port;
    tracing::info!(
        port,
        num_players = config.num_players,
        duration_ms = config.duration_ms,
        "starting figgie backend"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(RequestTrace)
            .wrap(StructuredLogger)
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
