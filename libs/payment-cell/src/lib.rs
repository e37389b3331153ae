pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

use std::sync::Arc;

use shared_config::AppConfig;
use shared_events::EventPublisher;
use shared_storage::{AppointmentRepository, PaymentRepository, ProviderDirectory};

/// Handles shared by every route in the payment cell.
#[derive(Clone)]
pub struct PaymentCellState {
    pub config: Arc<AppConfig>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub directory: Arc<dyn ProviderDirectory>,
    pub events: Arc<dyn EventPublisher>,
}

pub use models::PaymentError;
pub use router::payment_routes;
pub use services::gate::PaymentGateService;
