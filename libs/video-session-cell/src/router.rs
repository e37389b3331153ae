// libs/video-session-cell/src/router.rs
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::VideoSessionCellState;

pub fn session_routes(state: VideoSessionCellState) -> Router {
    // Every session operation acts on protected health data
    let protected_routes = Router::new()
        // Appointment integration
        .route(
            "/appointments/{appointment_id}/start",
            post(handlers::start_session),
        )
        .route(
            "/appointments/{appointment_id}/active",
            get(handlers::get_active_session),
        )
        // Session management
        .route("/{session_id}", get(handlers::get_session))
        .route("/{session_id}/join", post(handlers::join_session))
        .route("/{session_id}/end", post(handlers::end_session))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
