// libs/video-session-cell/src/services/session.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use tracing::{info, warn};
use uuid::Uuid;

use shared_events::{EventPublisher, TransitionEvent};
use shared_models::appointment::{Appointment, AppointmentStatus, AppointmentType};
use shared_models::auth::AuthUser;
use shared_models::session::{ParticipantRole, SessionParticipant, SessionStatus, VideoSession};
use shared_storage::{AppointmentRepository, SessionRepository, StorageError};

use crate::models::SessionError;
use crate::VideoSessionCellState;

/// How long before the scheduled instant the room opens.
pub const JOIN_WINDOW_MINUTES: i64 = 15;

/// Session lifecycle management service.
/// Owns the coupling between sessions and the appointment state machine.
pub struct SessionLifecycleService {
    appointments: Arc<dyn AppointmentRepository>,
    sessions: Arc<dyn SessionRepository>,
    events: Arc<dyn EventPublisher>,
}

impl SessionLifecycleService {
    pub fn new(state: &VideoSessionCellState) -> Self {
        Self {
            appointments: state.appointments.clone(),
            sessions: state.sessions.clone(),
            events: state.events.clone(),
        }
    }

    /// Opens the consultation room for a confirmed virtual appointment and
    /// moves the appointment to `in_progress`.
    ///
    /// Calling start against an appointment that is already in progress
    /// returns the running session, so a client reconnecting after a drop
    /// does not error out.
    pub async fn start_session(
        &self,
        requester: &AuthUser,
        appointment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<VideoSession, SessionError> {
        let appointment = self
            .appointments
            .get(appointment_id)
            .await?
            .ok_or(SessionError::AppointmentNotFound)?;

        self.authorize(&appointment, requester)?;

        if appointment.appointment_type != AppointmentType::Virtual {
            return Err(SessionError::NotVirtual);
        }

        match appointment.status {
            AppointmentStatus::Confirmed => {}
            AppointmentStatus::InProgress => {
                // Already running: hand back the live session.
                return self
                    .sessions
                    .find_active_for_appointment(appointment_id)
                    .await?
                    .ok_or(SessionError::Contested);
            }
            status => {
                return Err(SessionError::InvalidAppointmentState { status });
            }
        }

        let earliest = appointment.appointment_date - Duration::minutes(JOIN_WINDOW_MINUTES);
        if now < earliest {
            return Err(SessionError::TooEarly { earliest });
        }

        let session = self.build_session(&appointment, requester.id, now);
        let stored = match self.sessions.insert(session).await {
            Ok(stored) => stored,
            // Someone else opened the room first; converge on their session.
            Err(StorageError::SessionExists(_)) => {
                info!(
                    "Start for appointment {} lost the race; returning the open session",
                    appointment_id
                );
                return self
                    .sessions
                    .find_active_for_appointment(appointment_id)
                    .await?
                    .ok_or(SessionError::Contested);
            }
            Err(other) => return Err(other.into()),
        };

        match self
            .appointments
            .transition_status(
                appointment_id,
                &[AppointmentStatus::Confirmed],
                AppointmentStatus::InProgress,
                now,
            )
            .await
        {
            Ok(_) => {}
            Err(StorageError::AppointmentPrecondition {
                found: AppointmentStatus::InProgress,
                ..
            }) => {}
            Err(StorageError::AppointmentPrecondition { found, .. }) => {
                // The appointment moved somewhere else mid-start. Close the
                // room we just opened and report the state.
                warn!(
                    "Appointment {} is {} mid-start; closing session {}",
                    appointment_id, found, stored.id
                );
                if let Err(close_err) = self.sessions.conclude(stored.id, now).await {
                    warn!("Could not close session {}: {}", stored.id, close_err);
                }
                return Err(SessionError::InvalidAppointmentState { status: found });
            }
            Err(other) => return Err(other.into()),
        }

        self.events
            .publish(TransitionEvent::SessionStarted {
                appointment_id,
                session_id: stored.id,
                occurred_at: now,
            })
            .await;

        info!(
            "Session {} started for appointment {} by {}",
            stored.id, appointment_id, requester.id
        );
        Ok(stored)
    }

    /// Records a participant entering the room. The first join instant per
    /// participant sticks; rejoining changes nothing.
    pub async fn join_session(
        &self,
        requester: &AuthUser,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<VideoSession, SessionError> {
        let session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or(SessionError::SessionNotFound)?;

        if !session.is_participant(requester.id) {
            return Err(SessionError::NotAllowed(
                "Only participants can join this session".to_string(),
            ));
        }
        if session.status != SessionStatus::Active {
            return Err(SessionError::SessionConcluded {
                status: session.status,
            });
        }

        let joined = self.sessions.mark_joined(session_id, requester.id, now).await?;

        self.events
            .publish(TransitionEvent::SessionJoined {
                session_id,
                user_id: requester.id,
                occurred_at: now,
            })
            .await;

        Ok(joined)
    }

    /// Closes the room and completes the appointment. Ending a session that
    /// has already ended returns it unchanged.
    pub async fn end_session(
        &self,
        requester: &AuthUser,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<VideoSession, SessionError> {
        let session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or(SessionError::SessionNotFound)?;

        if !session.is_participant(requester.id) && !requester.is_admin() {
            return Err(SessionError::NotAllowed(
                "Only participants can end this session".to_string(),
            ));
        }

        if session.status.is_concluded() {
            return Ok(session);
        }

        let concluded = match self.sessions.conclude(session_id, now).await {
            Ok(concluded) => concluded,
            // A racing end call got there first; return what it left.
            Err(StorageError::SessionPrecondition { .. }) => {
                return self
                    .sessions
                    .get(session_id)
                    .await?
                    .ok_or(SessionError::SessionNotFound);
            }
            Err(other) => return Err(other.into()),
        };

        match self
            .appointments
            .transition_status(
                session.appointment_id,
                &[AppointmentStatus::InProgress],
                AppointmentStatus::Completed,
                now,
            )
            .await
        {
            Ok(_) => {}
            Err(StorageError::AppointmentPrecondition {
                found: AppointmentStatus::Completed,
                ..
            }) => {}
            Err(StorageError::AppointmentPrecondition { found, .. }) => {
                warn!(
                    "Session {} ended but appointment {} is {}",
                    session_id, session.appointment_id, found
                );
            }
            Err(other) => return Err(other.into()),
        }

        self.events
            .publish(TransitionEvent::SessionEnded {
                appointment_id: session.appointment_id,
                session_id,
                duration_seconds: concluded.duration_seconds.unwrap_or(0),
                occurred_at: now,
            })
            .await;
        self.events
            .publish(TransitionEvent::AppointmentCompleted {
                appointment_id: session.appointment_id,
                occurred_at: now,
            })
            .await;

        info!(
            "Session {} ended for appointment {} ({}s)",
            session_id,
            session.appointment_id,
            concluded.duration_seconds.unwrap_or(0)
        );
        Ok(concluded)
    }

    pub async fn get_session(
        &self,
        requester: &AuthUser,
        session_id: Uuid,
    ) -> Result<VideoSession, SessionError> {
        let session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or(SessionError::SessionNotFound)?;

        if !session.is_participant(requester.id) && !requester.is_admin() {
            return Err(SessionError::NotAllowed(
                "Only participants can view this session".to_string(),
            ));
        }

        Ok(session)
    }

    /// The running session for an appointment, if one exists. Clients use
    /// this to re-enter the room after losing their session handle.
    pub async fn active_for_appointment(
        &self,
        requester: &AuthUser,
        appointment_id: Uuid,
    ) -> Result<Option<VideoSession>, SessionError> {
        let appointment = self
            .appointments
            .get(appointment_id)
            .await?
            .ok_or(SessionError::AppointmentNotFound)?;

        self.authorize(&appointment, requester)?;

        Ok(self.sessions.find_active_for_appointment(appointment_id).await?)
    }

    fn authorize(
        &self,
        appointment: &Appointment,
        requester: &AuthUser,
    ) -> Result<(), SessionError> {
        if !appointment.is_participant(requester.id) && !requester.is_admin() {
            return Err(SessionError::NotAllowed(
                "Only participants can use this appointment's session".to_string(),
            ));
        }
        Ok(())
    }

    fn build_session(
        &self,
        appointment: &Appointment,
        starter: Uuid,
        now: DateTime<Utc>,
    ) -> VideoSession {
        let joined = |user_id: Uuid| {
            if user_id == starter {
                Some(now)
            } else {
                None
            }
        };

        VideoSession {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            session_id: session_token(),
            room_reference: format!(
                "https://meet.accesshealth.app/room/{}",
                appointment.id
            ),
            status: SessionStatus::Active,
            started_at: Some(now),
            ended_at: None,
            duration_seconds: None,
            participants: vec![
                SessionParticipant {
                    user_id: appointment.patient_id,
                    role: ParticipantRole::Patient,
                    joined_at: joined(appointment.patient_id),
                },
                SessionParticipant {
                    user_id: appointment.doctor_id,
                    role: ParticipantRole::Doctor,
                    joined_at: joined(appointment.doctor_id),
                },
            ],
            created_at: now,
            updated_at: now,
        }
    }
}

fn session_token() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("session_{}", suffix)
}
