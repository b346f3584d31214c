//! SMS notification for admin appointment actions.

use serde::Serialize;

use crate::backend::{unique_id, Messaging};
use crate::datetime::format_date_time;
use crate::models::{Appointment, FormType};

/// Result of the notification step of an update. A failed send never undoes
/// the persisted status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum NotificationStatus {
    Sent {
        #[serde(rename = "messageId")]
        message_id: String,
    },
    Failed {
        reason: String,
    },
    /// Transition without a message template.
    Skipped,
}

impl NotificationStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, NotificationStatus::Sent { .. })
    }
}

/// Message body for a transition, built from the updated record.
pub fn message_for(transition: FormType, appointment: &Appointment) -> Option<String> {
    match transition {
        FormType::Schedule => {
            let when = format_date_time(&appointment.schedule).date_time;
            let physician = appointment
                .primary_physician
                .trim_start_matches("Dr. ")
                .trim();
            Some(format!(
                "Hi, it's CarePulse. Your appointment has been scheduled for {when} with Dr. {physician}."
            ))
        }
        FormType::Cancel => {
            let reason = appointment.cancellation_reason.as_deref().unwrap_or_default();
            Some(format!(
                "Hi, it's CarePulse. We regret to inform you that your appointment has been cancelled for the following reason: {reason}."
            ))
        }
        FormType::Create => None,
    }
}

/// Send the transition's message to the owning user. Exactly one SMS is
/// attempted per call; failures are logged and reported, not propagated.
pub async fn dispatch(
    messaging: &dyn Messaging,
    user_id: &str,
    transition: FormType,
    appointment: &Appointment,
) -> NotificationStatus {
    let Some(content) = message_for(transition, appointment) else {
        return NotificationStatus::Skipped;
    };

    let message_id = unique_id();
    match messaging
        .create_sms(&message_id, &content, &[], &[user_id.to_string()])
        .await
    {
        Ok(sent) => {
            tracing::info!(
                appointment_id = %appointment.id,
                message_id = %sent.id,
                transition = %transition,
                "Appointment SMS sent"
            );
            NotificationStatus::Sent { message_id: sent.id }
        }
        Err(e) => {
            tracing::warn!(
                appointment_id = %appointment.id,
                transition = %transition,
                error = %e,
                "Appointment SMS failed"
            );
            NotificationStatus::Failed {
                reason: e.to_string(),
            }
        }
    }
}
