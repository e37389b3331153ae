use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use appointment_cell::{appointment_routes, AppointmentCellState};
use doctor_cell::{doctor_routes, DoctorCellState};
use payment_cell::{payment_routes, PaymentCellState};
use shared_config::AppConfig;
use shared_events::EventPublisher;
use shared_storage::MemoryStore;
use video_session_cell::{session_routes, VideoSessionCellState};

/// Wires every cell onto one router. The cells share the same store and
/// event publisher, so an appointment booked through one route is visible
/// to all the others.
pub fn create_router(
    config: Arc<AppConfig>,
    store: Arc<MemoryStore>,
    events: Arc<dyn EventPublisher>,
) -> Router {
    let doctors = DoctorCellState {
        config: config.clone(),
        directory: store.clone(),
        appointments: store.clone(),
    };
    let appointments = AppointmentCellState {
        config: config.clone(),
        appointments: store.clone(),
        directory: store.clone(),
        events: events.clone(),
    };
    let payments = PaymentCellState {
        config: config.clone(),
        appointments: store.clone(),
        payments: store.clone(),
        directory: store.clone(),
        events: events.clone(),
    };
    let sessions = VideoSessionCellState {
        config,
        appointments: store.clone(),
        sessions: store,
        events,
    };

    Router::new()
        .route("/", get(|| async { "AccessHealth API is running!" }))
        .route("/health", get(health_check))
        .nest("/api/doctors", doctor_routes(doctors))
        .nest("/api/appointments", appointment_routes(appointments))
        .nest("/api/payments", payment_routes(payments))
        .nest("/api/sessions", session_routes(sessions))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "accesshealth-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
