use actix_web::{HttpResponse, Responder, get};

const ADD_TRANSACTION_PAGE: &str = include_str!("../../templates/add_transaction.html");

/// Transaction submission form.
#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(ADD_TRANSACTION_PAGE)
}
