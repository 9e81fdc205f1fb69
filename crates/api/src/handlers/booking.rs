use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use classbook_core::models::{
    ledger::{TopUpRequest, TopUpResponse},
    slot::{
        BookClassRequest, BookClassResponse, CancelBookingRequest, CancelBookingResponse,
        FinishClassRequest, FinishClassResponse,
    },
};
use uuid::Uuid;

use crate::{handlers::slot_response, middleware::error_handling::AppError, ApiState};

#[axum::debug_handler]
pub async fn book_class(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BookClassRequest>,
) -> Result<Json<BookClassResponse>, AppError> {
    let outcome = classbook_db::coordinator::book_slot(
        &state.db_pool,
        &state.policy,
        id,
        payload.student_id,
    )
    .await?;

    Ok(Json(BookClassResponse {
        slot: slot_response(outcome.slot),
        balance: outcome.balance,
    }))
}

#[axum::debug_handler]
pub async fn finish_class(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FinishClassRequest>,
) -> Result<Json<FinishClassResponse>, AppError> {
    let outcome = classbook_db::coordinator::finish_slot(
        &state.db_pool,
        &state.policy,
        id,
        payload.requester,
    )
    .await?;

    Ok(Json(FinishClassResponse {
        slot: slot_response(outcome.slot),
        payout: outcome.payout,
        balance: outcome.balance,
    }))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelBookingRequest>,
) -> Result<Json<CancelBookingResponse>, AppError> {
    let outcome = classbook_db::coordinator::cancel_booking(
        &state.db_pool,
        &state.policy,
        id,
        payload.requester,
    )
    .await?;

    Ok(Json(CancelBookingResponse {
        slot: slot_response(outcome.slot),
        refund: outcome.refund,
    }))
}

#[axum::debug_handler]
pub async fn top_up(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<TopUpRequest>,
) -> Result<Json<TopUpResponse>, AppError> {
    let outcome = classbook_db::coordinator::top_up(
        &state.db_pool,
        &state.policy,
        payload.user_id,
        payload.amount,
    )
    .await?;

    Ok(Json(TopUpResponse {
        user_id: payload.user_id,
        amount: outcome.transaction.amount,
        balance: outcome.balance,
        transaction_id: outcome.transaction.id,
    }))
}
