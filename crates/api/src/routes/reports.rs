use axum::{
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/credits/:user_id/balance",
            get(handlers::reports::get_balance),
        )
        .route(
            "/api/credits/:user_id/history",
            get(handlers::reports::get_history),
        )
        .route(
            "/api/credits/:user_id/summary",
            get(handlers::reports::get_summary),
        )
}
