pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

use std::sync::Arc;

use shared_config::AppConfig;
use shared_events::EventPublisher;
use shared_storage::{AppointmentRepository, ProviderDirectory};

/// Handles shared by every route in the appointment cell.
#[derive(Clone)]
pub struct AppointmentCellState {
    pub config: Arc<AppConfig>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub directory: Arc<dyn ProviderDirectory>,
    pub events: Arc<dyn EventPublisher>,
}

pub use models::AppointmentError;
pub use router::appointment_routes;
pub use services::booking::BookingService;
