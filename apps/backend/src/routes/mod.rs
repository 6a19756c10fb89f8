use actix_web::web;

pub mod game;
pub mod health;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure_routes);
    cfg.configure(game::configure_routes);
}
