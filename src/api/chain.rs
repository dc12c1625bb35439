use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, ValidateResponse};

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = &state.ledger;
    HttpResponse::Ok().json(ValidateResponse {
        valid: ledger.is_valid_chain(),
        length: ledger.len(),
        difficulty: ledger.difficulty(),
    })
}
