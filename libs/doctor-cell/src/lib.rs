pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

use std::sync::Arc;

use shared_config::AppConfig;
use shared_storage::{AppointmentRepository, ProviderDirectory};

/// Handles shared by every route in the doctor cell.
#[derive(Clone)]
pub struct DoctorCellState {
    pub config: Arc<AppConfig>,
    pub directory: Arc<dyn ProviderDirectory>,
    pub appointments: Arc<dyn AppointmentRepository>,
}

// Re-export the pieces other cells reach for
pub use models::{AvailableSlot, DoctorError};
pub use router::doctor_routes;
pub use services::availability::{AvailabilityService, SLOT_INTERVAL_MINUTES};
pub use services::directory::DirectoryService;
