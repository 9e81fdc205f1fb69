use axum::{
    routing::post,
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/classes/:id/book", post(handlers::booking::book_class))
        .route(
            "/api/classes/:id/finish",
            post(handlers::booking::finish_class),
        )
        .route(
            "/api/classes/:id/cancel",
            post(handlers::booking::cancel_booking),
        )
        .route("/api/credits/topup", post(handlers::booking::top_up))
}
