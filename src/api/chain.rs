use actix_web::{HttpResponse, Responder, get, web};
use log::info;

use super::models::{AppState, ChainResponse, ValidResponse};

/// Get the full blockchain.
#[get("/get_chain")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ChainResponse {
        chain: ledger.chain(),
        length: ledger.len(),
    })
}

/// Validate the whole chain.
#[get("/valid")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let (valid, length) = {
        let ledger = state.ledger.lock().expect("mutex poisoned");
        (ledger.is_valid_chain(), ledger.len())
    };
    info!("validated chain of {} blocks: valid={}", length, valid);

    let message = if valid {
        "The Blockchain is valid."
    } else {
        "The Blockchain is not valid."
    };
    HttpResponse::Ok().json(ValidResponse { message, valid })
}
