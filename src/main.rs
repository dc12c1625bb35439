mod api;
mod blockchain;
mod config;
mod miner;

use std::io;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{error, info};
use std::env;

use api::AppState;
use blockchain::ChainLedger;
use config::NetworkConfig;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NetworkConfig::from_env().map_err(|e| {
        error!("invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);

    let ledger = Arc::new(ChainLedger::new(&config));
    for _ in 0..config.miner_count {
        ledger.register_miner()?;
    }
    info!(
        "{} miners started at difficulty {} (window {} blocks, target {}s/block, reward {})",
        config.miner_count,
        config.initial_difficulty,
        config.adjust_window,
        config.target_block_time_secs,
        config.block_reward
    );

    println!("⛏️ Starting mining network API at http://{host}:{port}");

    let state = web::Data::new(AppState::new(ledger));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
