use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/classes", post(handlers::catalog::create_class))
        .route("/api/classes/:id", get(handlers::catalog::get_class))
        .route("/api/classes/:id", put(handlers::catalog::update_class))
        .route("/api/classes/:id", delete(handlers::catalog::delete_class))
        .route(
            "/api/classes/by-date/:date",
            get(handlers::catalog::list_by_date),
        )
        .route(
            "/api/classes/by-coach/:coach_id",
            get(handlers::catalog::list_by_coach),
        )
}
