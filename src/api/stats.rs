use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};
use crate::blockchain::block::effective_bits;

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let ledger = &state.ledger;
    let snap = ledger.snapshot();
    let height = snap.blocks.len();

    let last_interval_secs = match snap.blocks.as_slice() {
        [.., older, newer] => Some((newer.timestamp() - older.timestamp()).max(0)),
        _ => None,
    };

    let retarget = ledger.retarget();
    HttpResponse::Ok().json(StatsResponse {
        height,
        difficulty: snap.difficulty,
        effective_bits: effective_bits(snap.difficulty),
        target_block_time_secs: retarget.target_block_time_secs,
        adjust_window: retarget.window,
        last_interval_secs,
        miners: snap.miners.len(),
        block_reward: ledger.block_reward(),
        total_rewards: snap.miners.iter().map(|m| m.balance).sum(),
    })
}
