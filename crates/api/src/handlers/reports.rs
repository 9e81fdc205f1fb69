//! # Report Handlers
//!
//! Read-side projections over the catalog and the ledger: balances,
//! transaction history, and the per-user credit summary. The summary
//! endpoint fans out its balance and history reads concurrently and joins
//! before combining; the bucketing itself is a pure function in
//! `classbook-core`, so no ordering is required between the parallel reads.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use classbook_core::{
    errors::BookingError,
    models::{
        ledger::{BalanceResponse, CreditTransaction, HistoryResponse},
        report::{summarize_monthly, summarize_yearly, CreditSummaryResponse},
    },
};
use uuid::Uuid;

use crate::{middleware::error_handling::AppError, ApiState};

/// Query parameters for the transaction history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Inclusive start date
    pub from: Option<NaiveDate>,
    /// Inclusive end date
    pub to: Option<NaiveDate>,
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap())
        .and_utc()
}

#[axum::debug_handler]
pub async fn get_balance(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = classbook_db::repositories::ledger::get_balance(&state.db_pool, user_id)
        .await
        .map_err(BookingError::Database)?;

    Ok(Json(BalanceResponse { user_id, balance }))
}

#[axum::debug_handler]
pub async fn get_history(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let transactions = classbook_db::repositories::ledger::history(
        &state.db_pool,
        user_id,
        query.from.map(day_start),
        query.to.map(day_end),
    )
    .await
    .map_err(BookingError::Database)?;

    Ok(Json(HistoryResponse {
        user_id,
        transactions: transactions.into_iter().map(CreditTransaction::from).collect(),
    }))
}

#[axum::debug_handler]
pub async fn get_summary(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<CreditSummaryResponse>, AppError> {
    // Concurrent fan-out over the two reads, joined before combining
    let (balance, transactions) = tokio::try_join!(
        classbook_db::repositories::ledger::get_balance(&state.db_pool, user_id),
        classbook_db::repositories::ledger::history(&state.db_pool, user_id, None, None),
    )
    .map_err(BookingError::Database)?;

    let transactions: Vec<CreditTransaction> = transactions
        .into_iter()
        .map(CreditTransaction::from)
        .collect();

    Ok(Json(CreditSummaryResponse {
        user_id,
        balance,
        monthly: summarize_monthly(&transactions),
        yearly: summarize_yearly(&transactions),
    }))
}
