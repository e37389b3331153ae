//! # Video Session Cell
//!
//! Video consultation sessions that run in lock-step with the appointment
//! state machine: a session can only start for a confirmed (paid) virtual
//! appointment inside its join window, starting it moves the appointment to
//! `in_progress`, and ending it is what completes the appointment.
//!
//! ## Architecture
//!
//! The cell follows the established cell layout:
//!
//! ```text
//! +---------------------------------------------------+
//! |                Video Session Cell                 |
//! +---------------------------------------------------+
//! |  handlers.rs  |  HTTP endpoint handlers           |
//! |  router.rs    |  Route definitions                |
//! |  models.rs    |  DTOs and error types             |
//! |  services/    |  Session lifecycle logic          |
//! +---------------------------------------------------+
//! ```
//!
//! ## API Endpoints
//!
//! - `POST /appointments/{appointment_id}/start` - Open the room and move
//!   the appointment to `in_progress`
//! - `GET /appointments/{appointment_id}/active` - The currently running
//!   session for an appointment, if any
//! - `GET /{session_id}` - Session details
//! - `POST /{session_id}/join` - Record a participant entering the room
//! - `POST /{session_id}/end` - Close the room and complete the appointment
//!
//! ## Lifecycle invariants
//!
//! - At most one non-concluded session exists per appointment; racing start
//!   calls converge on the session that won the insert.
//! - The room opens fifteen minutes before the scheduled instant; earlier
//!   start attempts are refused with the opening time.
//! - Ending an already ended session is a no-op that returns the session as
//!   it concluded, so disconnect-retry loops on clients stay harmless.

pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

use std::sync::Arc;

use shared_config::AppConfig;
use shared_events::EventPublisher;
use shared_storage::{AppointmentRepository, SessionRepository};

/// Handles shared by every route in the video session cell.
#[derive(Clone)]
pub struct VideoSessionCellState {
    pub config: Arc<AppConfig>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub events: Arc<dyn EventPublisher>,
}

pub use models::SessionError;
pub use router::session_routes;
pub use services::session::{SessionLifecycleService, JOIN_WINDOW_MINUTES};
