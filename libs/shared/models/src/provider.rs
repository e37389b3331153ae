use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// PROVIDER DIRECTORY MODELS
// ==============================================================================

/// Directory entry for a doctor. Profile and display-name data live with the
/// profile collaborator; the scheduling core only needs the fee and the
/// bookability flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    pub consultation_fee: f64,
    pub currency: String,
    pub is_verified: bool,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One recurring weekly interval during which a doctor accepts bookings.
/// `day_of_week` follows the calendar convention 0 = Sunday .. 6 = Saturday;
/// clock values are wall-clock times interpreted as UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_enabled: bool,
}

impl AvailabilityWindow {
    pub fn overlaps(&self, other: &AvailabilityWindow) -> bool {
        self.day_of_week == other.day_of_week
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}
