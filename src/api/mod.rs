mod chain;
mod form;
mod health;
mod mining;
pub mod models;
mod tx;

use actix_web::web::ServiceConfig;

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(form::index)
        .service(health::health_check)
        .service(tx::add_transaction)
        .service(mining::mine_block)
        .service(chain::get_chain)
        .service(chain::validate_chain);
}
