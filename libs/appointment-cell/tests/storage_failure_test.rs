// libs/appointment-cell/tests/storage_failure_test.rs
//
// Service behaviour when the storage backend is down, using a mocked
// repository in place of the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mockall::mock;
use uuid::Uuid;

use appointment_cell::models::BookAppointmentRequest;
use appointment_cell::services::booking::BookingService;
use appointment_cell::{AppointmentCellState, AppointmentError};
use shared_events::BroadcastPublisher;
use shared_models::appointment::{Appointment, AppointmentStatus, AppointmentType};
use shared_models::provider::Doctor;
use shared_storage::{AppointmentRepository, MemoryStore, ProviderDirectory, StorageError};
use shared_utils::test_utils::{TestConfig, TestUser};

mock! {
    Appointments {}

    #[async_trait]
    impl AppointmentRepository for Appointments {
        async fn create_if_slot_free(
            &self,
            appointment: Appointment,
        ) -> Result<Appointment, StorageError>;

        async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StorageError>;

        async fn list_for_doctor_between(
            &self,
            doctor_id: Uuid,
            from: DateTime<Utc>,
            until: DateTime<Utc>,
        ) -> Result<Vec<Appointment>, StorageError>;

        async fn list_involving(&self, user_id: Uuid) -> Result<Vec<Appointment>, StorageError>;

        async fn transition_status(
            &self,
            id: Uuid,
            expected: &[AppointmentStatus],
            next: AppointmentStatus,
            now: DateTime<Utc>,
        ) -> Result<Appointment, StorageError>;
    }
}

fn yesterday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
}

#[tokio::test]
async fn booking_reports_storage_outage() {
    let mut appointments = MockAppointments::new();
    appointments
        .expect_create_if_slot_free()
        .returning(|_| Err(StorageError::Unavailable("store offline".to_string())));

    let directory = Arc::new(MemoryStore::new());
    let doctor_id = Uuid::new_v4();
    directory
        .register_doctor(Doctor {
            id: doctor_id,
            specialty: None,
            consultation_fee: 40.0,
            currency: "USD".to_string(),
            is_verified: true,
            is_available: true,
            created_at: yesterday(),
            updated_at: yesterday(),
        })
        .await
        .unwrap();

    let state = AppointmentCellState {
        config: TestConfig::default().to_arc(),
        appointments: Arc::new(appointments),
        directory,
        events: Arc::new(BroadcastPublisher::new(4)),
    };

    let user = TestUser::patient().to_auth_user();
    let request = BookAppointmentRequest {
        patient_id: user.id,
        doctor_id,
        appointment_date: monday_morning(),
        appointment_type: AppointmentType::Virtual,
        duration_minutes: None,
        notes: None,
    };

    let err = BookingService::new(&state)
        .book_appointment(&user, request, yesterday())
        .await
        .unwrap_err();
    assert!(matches!(err, AppointmentError::Unavailable(_)));
}

#[tokio::test]
async fn cancel_reports_storage_outage() {
    let user = TestUser::patient().to_auth_user();
    let appointment_id = Uuid::new_v4();
    let existing = Appointment {
        id: appointment_id,
        patient_id: user.id,
        doctor_id: Uuid::new_v4(),
        appointment_date: monday_morning(),
        duration_minutes: 30,
        appointment_type: AppointmentType::Virtual,
        status: AppointmentStatus::Scheduled,
        notes: None,
        reminder_sent: false,
        created_at: yesterday(),
        updated_at: yesterday(),
    };

    let mut appointments = MockAppointments::new();
    let fetched = existing.clone();
    appointments
        .expect_get()
        .returning(move |_| Ok(Some(fetched.clone())));
    appointments
        .expect_transition_status()
        .returning(|_, _, _, _| Err(StorageError::Unavailable("store offline".to_string())));

    let state = AppointmentCellState {
        config: TestConfig::default().to_arc(),
        appointments: Arc::new(appointments),
        directory: Arc::new(MemoryStore::new()),
        events: Arc::new(BroadcastPublisher::new(4)),
    };

    let err = BookingService::new(&state)
        .cancel_appointment(&user, appointment_id, Default::default(), yesterday())
        .await
        .unwrap_err();
    assert!(matches!(err, AppointmentError::Unavailable(_)));
}
