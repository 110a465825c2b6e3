use std::time::Instant;

use actix_web::{HttpResponse, Responder, get, web};
use log::{debug, error, info};

use super::models::{AppState, MessageResponse, MineResponse};
use crate::blockchain::{Block, pow};
use crate::error::Result;

/// Mine a block holding every pending transaction.
///
/// The proof search runs on the blocking pool without the ledger lock,
/// so transactions can still be queued while it runs; the ledger is
/// locked again only to seal the block.
#[get("/mine_block")]
pub async fn mine_block(state: web::Data<AppState>) -> impl Responder {
    match web::block(move || mine(&state)).await {
        Ok(Ok(block)) => HttpResponse::Ok().json(MineResponse::from(block)),
        Ok(Err(e)) => {
            error!("MINER - failed to seal block: {}", e);
            HttpResponse::InternalServerError().json(MessageResponse::new(e.to_string()))
        }
        Err(e) => {
            error!("MINER - worker failed: {}", e);
            HttpResponse::InternalServerError().json(MessageResponse::new("mining worker failed"))
        }
    }
}

fn mine(state: &AppState) -> Result<Block> {
    // Only miners move the tip, so holding this keeps the target fresh.
    let _miner = state.miner.lock().expect("mutex poisoned");

    let target = {
        let ledger = state.ledger.lock().expect("mutex poisoned");
        ledger.mining_target()?
    };

    let t0 = Instant::now();
    let proof = pow::solve(target.previous_proof);
    debug!(
        "MINER - found proof {} for block #{} in {} ms",
        proof,
        target.index,
        t0.elapsed().as_millis()
    );

    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    let block = ledger.seal_block(&target, proof)?.clone();
    info!(
        "MINER - sealed block #{} (proof={}, txs={})",
        block.index,
        block.proof,
        block.transactions.len()
    );
    Ok(block)
}
