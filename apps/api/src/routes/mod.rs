pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::history::handlers as history;
use crate::state::AppState;
use crate::tailoring::handlers as tailoring;

pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Tailoring API
        .route("/api/v1/tailor", post(tailoring::handle_tailor))
        .route("/api/v1/highlight", post(tailoring::handle_highlight))
        .route(
            "/api/v1/resumes/extract",
            post(tailoring::handle_extract_resume).layer(DefaultBodyLimit::max(max_upload)),
        )
        // History API
        .route(
            "/api/v1/history",
            get(history::handle_list).post(history::handle_save),
        )
        .route(
            "/api/v1/history/:id",
            get(history::handle_get)
                .patch(history::handle_update)
                .delete(history::handle_delete),
        )
        .route("/api/v1/history/:id/export", get(history::handle_export))
        .with_state(state)
}
