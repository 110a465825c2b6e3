use actix_web::{HttpResponse, Responder, get, web};
use serde_json::json;

use super::models::AppState;

/// Liveness probe; also reports the current chain height and pending count.
#[get("/health/")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let (height, pending) = {
        let ledger = state.ledger.lock().expect("mutex poisoned");
        (ledger.len(), ledger.pending().len())
    };
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "height": height,
        "pending": pending,
    }))
}
