use actix_web::{HttpResponse, Responder, get, web};
use log::{error, info};

use super::models::{AddMinerResponse, AppState, ErrorResponse};

/// Register a new miner and start it hashing against the current tip.
#[get("/addMiner")]
pub async fn add_miner(state: web::Data<AppState>) -> impl Responder {
    match state.ledger.register_miner() {
        Ok(id) => {
            info!("GET /addMiner - miner {} started", id);
            HttpResponse::Ok().json(AddMinerResponse {
                message: "miner added",
                id,
            })
        }
        Err(e) => {
            error!("GET /addMiner - could not start worker: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                message: e.to_string(),
            })
        }
    }
}

/// Snapshot of every block and every miner's balance.
#[get("/getBlockChainInfo")]
pub async fn get_blockchain_info(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.ledger.snapshot())
}
