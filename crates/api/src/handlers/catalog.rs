use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use classbook_core::{
    errors::BookingError,
    models::slot::{
        ClassListResponse, ClassSlotResponse, CreateClassSlotRequest, DeleteClassResponse,
        UpdateClassSlotRequest,
    },
};
use uuid::Uuid;

use crate::{handlers::slot_response, middleware::error_handling::AppError, ApiState};

/// Query parameters for deleting a class slot
#[derive(Debug, Deserialize)]
pub struct DeleteClassQuery {
    /// Must be the slot's creator
    pub requester: Uuid,
}

#[axum::debug_handler]
pub async fn create_class(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateClassSlotRequest>,
) -> Result<Json<ClassSlotResponse>, AppError> {
    let created =
        classbook_db::coordinator::create_class_slot(&state.db_pool, &state.policy, &payload)
            .await?;

    Ok(Json(slot_response(created)))
}

#[axum::debug_handler]
pub async fn update_class(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClassSlotRequest>,
) -> Result<Json<ClassSlotResponse>, AppError> {
    let updated =
        classbook_db::coordinator::edit_class_slot(&state.db_pool, &state.policy, id, &payload)
            .await?;

    Ok(Json(slot_response(updated)))
}

#[axum::debug_handler]
pub async fn delete_class(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteClassQuery>,
) -> Result<Json<DeleteClassResponse>, AppError> {
    let outcome = classbook_db::coordinator::delete_class_slot(
        &state.db_pool,
        &state.policy,
        id,
        query.requester,
    )
    .await?;

    Ok(Json(DeleteClassResponse {
        id: outcome.id,
        refunded: outcome.refunded,
    }))
}

#[axum::debug_handler]
pub async fn get_class(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClassSlotResponse>, AppError> {
    let slot = classbook_db::repositories::class_slot::get_class_slot(&state.db_pool, id)
        .await
        .map_err(BookingError::Database)?
        .ok_or_else(|| BookingError::NotFound(format!("class slot {} not found", id)))?;

    Ok(Json(slot_response(slot)))
}

#[axum::debug_handler]
pub async fn list_by_date(
    State(state): State<Arc<ApiState>>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<ClassListResponse>, AppError> {
    let slots = classbook_db::repositories::class_slot::list_by_date(&state.db_pool, date)
        .await
        .map_err(BookingError::Database)?;

    Ok(Json(ClassListResponse {
        classes: slots.into_iter().map(slot_response).collect(),
    }))
}

#[axum::debug_handler]
pub async fn list_by_coach(
    State(state): State<Arc<ApiState>>,
    Path(coach_id): Path<Uuid>,
) -> Result<Json<ClassListResponse>, AppError> {
    let slots = classbook_db::repositories::class_slot::list_by_coach(&state.db_pool, coach_id)
        .await
        .map_err(BookingError::Database)?;

    Ok(Json(ClassListResponse {
        classes: slots.into_iter().map(slot_response).collect(),
    }))
}
