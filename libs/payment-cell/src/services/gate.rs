// libs/payment-cell/src/services/gate.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use shared_events::{EventPublisher, TransitionEvent};
use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::auth::AuthUser;
use shared_models::payment::{Payment, PaymentStatus};
use shared_storage::{
    AppointmentRepository, PaymentRepository, ProviderDirectory, StorageError,
};

use crate::models::{PaymentError, PaymentSettlement, SettlePaymentRequest};
use crate::PaymentCellState;

/// The payment gate: confirmation is reachable only through a recorded,
/// successful charge. Failed charges are kept for the audit trail and leave
/// the appointment bookable-but-unconfirmed.
pub struct PaymentGateService {
    appointments: Arc<dyn AppointmentRepository>,
    payments: Arc<dyn PaymentRepository>,
    directory: Arc<dyn ProviderDirectory>,
    events: Arc<dyn EventPublisher>,
}

impl PaymentGateService {
    pub fn new(state: &PaymentCellState) -> Self {
        Self {
            appointments: state.appointments.clone(),
            payments: state.payments.clone(),
            directory: state.directory.clone(),
            events: state.events.clone(),
        }
    }

    /// Records the outcome of one charge attempt and, on success, moves the
    /// appointment from scheduled to confirmed.
    ///
    /// Replaying a successful settlement against an already confirmed
    /// appointment returns the payment on file instead of charging twice.
    pub async fn settle(
        &self,
        requester: &AuthUser,
        appointment_id: Uuid,
        request: SettlePaymentRequest,
        now: DateTime<Utc>,
    ) -> Result<PaymentSettlement, PaymentError> {
        let appointment = self
            .appointments
            .get(appointment_id)
            .await?
            .ok_or(PaymentError::AppointmentNotFound)?;

        // **Step 1: Authorization** - the paying side settles, admins may
        // settle on a patient's behalf.
        if requester.id != appointment.patient_id && !requester.is_admin() {
            return Err(PaymentError::NotAllowed(
                "Only the patient can settle this appointment".to_string(),
            ));
        }

        // **Step 2: Outcome sanity** - the collaborator reports terminal
        // outcomes only; anything in flight has no business here.
        if !request.outcome.is_settled() {
            return Err(PaymentError::UnsettledOutcome(request.outcome));
        }

        // **Step 3: Gate state**
        match appointment.status {
            AppointmentStatus::Scheduled => {}
            AppointmentStatus::Confirmed if request.outcome == PaymentStatus::Completed => {
                if let Some(existing) = self.payments.completed_payment_for(appointment_id).await? {
                    info!(
                        "Appointment {} already confirmed; returning payment {} on file",
                        appointment_id, existing.id
                    );
                    return Ok(PaymentSettlement {
                        payment: existing,
                        appointment,
                    });
                }
                // Confirmed with no charge on file: fall through and record
                // the attempt so the books balance.
            }
            status => {
                return Err(PaymentError::GateClosed { status });
            }
        }

        // **Step 4: Price the visit**
        let doctor = self
            .directory
            .get_doctor(appointment.doctor_id)
            .await?
            .ok_or(PaymentError::DoctorNotFound)?;

        // **Step 5: Record the attempt**
        let transaction_id = match request.outcome {
            PaymentStatus::Completed => Some(
                request
                    .transaction_id
                    .clone()
                    .unwrap_or_else(|| format!("txn_{}", Uuid::new_v4().simple())),
            ),
            _ => request.transaction_id.clone(),
        };

        let payment = Payment {
            id: Uuid::new_v4(),
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            appointment_id,
            amount: doctor.consultation_fee,
            currency: doctor.currency.clone(),
            payment_method: request.payment_method,
            payment_status: request.outcome,
            transaction_id,
            payment_provider: Some(request.payment_method.provider().to_string()),
            metadata: settlement_metadata(&request),
            created_at: now,
        };

        let recorded = self.payments.record(payment).await?;
        info!(
            "Recorded {} payment {} for appointment {} ({} {})",
            recorded.payment_status, recorded.id, appointment_id, recorded.amount, recorded.currency
        );

        self.events
            .publish(TransitionEvent::PaymentRecorded {
                appointment_id,
                payment_id: recorded.id,
                payment_status: recorded.payment_status,
                occurred_at: now,
            })
            .await;

        // **Step 6: Move the appointment when the charge went through**
        if recorded.payment_status != PaymentStatus::Completed {
            info!(
                "Charge for appointment {} failed; appointment stays scheduled",
                appointment_id
            );
            return Ok(PaymentSettlement {
                payment: recorded,
                appointment,
            });
        }

        let confirmed = match self
            .appointments
            .transition_status(
                appointment_id,
                &[AppointmentStatus::Scheduled],
                AppointmentStatus::Confirmed,
                now,
            )
            .await
        {
            Ok(confirmed) => {
                self.events
                    .publish(TransitionEvent::AppointmentConfirmed {
                        appointment_id,
                        occurred_at: now,
                    })
                    .await;
                confirmed
            }
            // Another settle confirmed it first; the charge is recorded, the
            // gate outcome is the same.
            Err(StorageError::AppointmentPrecondition {
                found: AppointmentStatus::Confirmed,
                ..
            }) => self
                .appointments
                .get(appointment_id)
                .await?
                .ok_or(PaymentError::AppointmentNotFound)?,
            Err(StorageError::AppointmentPrecondition { found, .. }) => {
                warn!(
                    "Appointment {} moved to {} mid-settlement; payment {} kept for reconciliation",
                    appointment_id, found, recorded.id
                );
                return Err(PaymentError::GateClosed { status: found });
            }
            Err(other) => return Err(other.into()),
        };

        info!("Appointment {} confirmed by payment {}", appointment_id, recorded.id);
        Ok(PaymentSettlement {
            payment: recorded,
            appointment: confirmed,
        })
    }

    /// Payment attempts for one appointment, newest first.
    pub async fn history(
        &self,
        requester: &AuthUser,
        appointment_id: Uuid,
    ) -> Result<Vec<Payment>, PaymentError> {
        let appointment = self
            .appointments
            .get(appointment_id)
            .await?
            .ok_or(PaymentError::AppointmentNotFound)?;

        if !appointment.is_participant(requester.id) && !requester.is_admin() {
            return Err(PaymentError::NotAllowed(
                "Only participants can view payments for this appointment".to_string(),
            ));
        }

        Ok(self.payments.list_for_appointment(appointment_id).await?)
    }
}

fn settlement_metadata(request: &SettlePaymentRequest) -> Value {
    let mut metadata = serde_json::Map::new();
    if let Some(last_four) = &request.card_last_four {
        metadata.insert("card_last_four".to_string(), json!(last_four));
    }
    if let Some(provider) = &request.insurance_provider {
        metadata.insert("insurance_provider".to_string(), json!(provider));
    }
    if let Some(policy) = &request.policy_number {
        metadata.insert("policy_number".to_string(), json!(policy));
    }
    Value::Object(metadata)
}
