mod api;
mod blockchain;
mod config;
mod error;
mod transaction;

use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenvy::dotenv;
use log::info;

use api::AppState;
use blockchain::{ChainStore, Ledger};
use config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env();
    let ledger = Ledger::open(ChainStore::new(&config.chain_file)).map_err(std::io::Error::other)?;
    info!(
        "ledger ready: {} blocks, next block #{}",
        ledger.len(),
        ledger.next_index()
    );

    println!(
        "⛓️ Starting ledger API at http://{}:{}",
        config.host, config.port
    );

    let state = web::Data::new(AppState::new(ledger));

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
