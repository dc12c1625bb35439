mod chain;
mod health;
pub mod models;
mod network;
mod stats;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(network::add_miner)
        .service(network::get_blockchain_info)
        .service(
            web::scope("/api/v1")
                .service(health::health_check)
                .service(chain::validate_chain)
                .service(stats::get_stats),
        );
}
