// libs/payment-cell/src/router.rs
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::PaymentCellState;

pub fn payment_routes(state: PaymentCellState) -> Router {
    // All payment operations require authentication
    let protected_routes = Router::new()
        .route("/{appointment_id}/settle", post(handlers::settle_payment))
        .route("/{appointment_id}", get(handlers::get_payment_history))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
