use actix_web::{HttpResponse, Responder, post, web};
use log::{debug, warn};
use thiserror::Error;

use super::models::{AddTransactionForm, AppState, MessageResponse};

/// Rejections of a submitted transaction form. The messages are the
/// response bodies clients see.
#[derive(Debug, Error, PartialEq)]
pub enum TxInputError {
    #[error("Transaction data is incomplete.")]
    Incomplete,
    #[error("Invalid amount format.")]
    InvalidAmount,
}

/// A form that passed boundary validation.
#[derive(Debug, PartialEq)]
pub struct NewTransaction {
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
}

/// Require non-empty sender, receiver and amount, and a finite numeric amount.
pub fn parse_form(form: AddTransactionForm) -> Result<NewTransaction, TxInputError> {
    let non_empty = |field: Option<String>| field.filter(|v| !v.is_empty());
    let (Some(sender), Some(receiver), Some(amount)) = (
        non_empty(form.sender),
        non_empty(form.receiver),
        non_empty(form.amount),
    ) else {
        return Err(TxInputError::Incomplete);
    };

    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|_| TxInputError::InvalidAmount)?;
    if !amount.is_finite() {
        return Err(TxInputError::InvalidAmount);
    }

    Ok(NewTransaction {
        sender,
        receiver,
        amount,
    })
}

/// Queue a transaction for the next mined block.
#[post("/add_transaction")]
pub async fn add_transaction(
    state: web::Data<AppState>,
    form: web::Form<AddTransactionForm>,
) -> impl Responder {
    let tx = match parse_form(form.into_inner()) {
        Ok(tx) => tx,
        Err(e) => {
            warn!("POST /add_transaction - rejected: {}", e);
            return HttpResponse::BadRequest().json(MessageResponse::new(e.to_string()));
        }
    };

    let (index, pending) = {
        let mut ledger = state.ledger.lock().expect("mutex poisoned");
        let index = ledger.add_transaction(tx.sender, tx.receiver, tx.amount);
        (index, ledger.pending().len())
    };
    debug!(
        "POST /add_transaction - queued for block #{} (pending={})",
        index, pending
    );

    HttpResponse::Created().json(MessageResponse::new(format!(
        "Transaction will be added to Block {index}"
    )))
}
