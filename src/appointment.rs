//! Appointment lifecycle: patient requests, admin schedule/cancel actions
//! and the dashboard read.
//!
//! States: `pending` on create, then `scheduled` or `cancelled` by an admin.
//! Updates are not idempotent: every call persists, notifies and
//! revalidates again.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::{encode, unique_id, DocumentStore, Messaging, Query};
use crate::dashboard::{summarize, DashboardSummary};
use crate::error::CareError;
use crate::forms::{appointment_schema, values_from};
use crate::models::{Appointment, AppointmentPatch, AppointmentStatus, FormType, NewAppointment};
use crate::notification::{self, NotificationStatus};
use crate::revalidate::{Revalidator, ADMIN_PATH};

// ─── Requests ─────────────────────────────────────────────────────────────────

/// Patient request for a new appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointment {
    pub user_id: String,
    /// Patient document id.
    pub patient: String,
    pub primary_physician: String,
    pub schedule: DateTime<Utc>,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Admin action on an existing appointment. `status` in the patch is
/// ignored; it is always derived from `transition`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointment {
    #[serde(default)]
    pub appointment_id: String,
    /// Recipient of the notification; defaults to the appointment's owner.
    #[serde(default)]
    pub user_id: Option<String>,
    pub transition: FormType,
    #[serde(flatten)]
    pub patch: AppointmentPatch,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub appointment: Appointment,
    pub notification: NotificationStatus,
}

// ─── Service ──────────────────────────────────────────────────────────────────

/// Documents requested per page when reading the whole collection.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

pub struct AppointmentService {
    store: Arc<dyn DocumentStore>,
    messaging: Arc<dyn Messaging>,
    revalidator: Arc<dyn Revalidator>,
    collection: String,
    page_size: u32,
}

impl AppointmentService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        messaging: Arc<dyn Messaging>,
        revalidator: Arc<dyn Revalidator>,
        collection: &str,
    ) -> Self {
        Self {
            store,
            messaging,
            revalidator,
            collection: collection.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Persist a new request. The stored status is always `pending`.
    pub async fn create(&self, request: CreateAppointment) -> Result<Appointment, CareError> {
        appointment_schema(FormType::Create).validate(&values_from(&request))?;

        let new = NewAppointment {
            user_id: request.user_id,
            patient: request.patient,
            primary_physician: request.primary_physician,
            schedule: request.schedule,
            reason: request.reason,
            note: request.note.filter(|n| !n.trim().is_empty()),
            status: AppointmentStatus::Pending,
        };

        let document = self
            .store
            .create_document(&self.collection, &unique_id(), encode(&new)?)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to create appointment"))?;
        let appointment: Appointment = document.decode()?;

        tracing::info!(
            appointment_id = %appointment.id,
            physician = %appointment.primary_physician,
            "Appointment requested"
        );
        Ok(appointment)
    }

    pub async fn get(&self, appointment_id: &str) -> Result<Appointment, CareError> {
        let document = self
            .store
            .get_document(&self.collection, appointment_id)
            .await
            .inspect_err(|e| tracing::error!(appointment_id, error = %e, "Failed to fetch appointment"))?
            .ok_or_else(|| CareError::NotFound(format!("Appointment {appointment_id}")))?;
        Ok(document.decode()?)
    }

    /// Every appointment, newest first, with status counts. The collection
    /// is read page by page, each page resuming after the last id seen.
    pub async fn recent(&self) -> Result<DashboardSummary, CareError> {
        let mut appointments: Vec<Appointment> = Vec::new();
        let total = loop {
            let mut queries = vec![Query::order_desc("$createdAt"), Query::Limit(self.page_size)];
            if let Some(last) = appointments.last() {
                queries.push(Query::cursor_after(&last.id));
            }
            let page = self
                .store
                .list_documents(&self.collection, &queries)
                .await
                .inspect_err(|e| tracing::error!(error = %e, "Failed to list appointments"))?;

            let fetched = page.documents.len();
            for document in &page.documents {
                appointments.push(document.decode()?);
            }
            if fetched < self.page_size as usize || appointments.len() as u64 >= page.total {
                break page.total;
            }
        };

        tracing::debug!(count = appointments.len(), total, "Listed appointments");
        Ok(summarize(appointments, total))
    }

    /// Apply an admin transition: validate, persist with the derived status,
    /// notify the owner, then revalidate the admin view.
    ///
    /// A missing appointment fails with `NotFound` before anything is sent.
    /// A failed SMS does not undo the write; it is reported in the outcome.
    pub async fn update(&self, request: UpdateAppointment) -> Result<UpdateOutcome, CareError> {
        let transition = request.transition;
        appointment_schema(transition).validate(&values_from(&request.patch))?;

        let mut patch = request.patch;
        patch.status = Some(transition.resulting_status());

        let document = self
            .store
            .update_document(&self.collection, &request.appointment_id, encode(&patch)?)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    appointment_id = %request.appointment_id,
                    error = %e,
                    "Failed to update appointment"
                )
            })?;
        let Some(document) = document else {
            tracing::warn!(appointment_id = %request.appointment_id, "Update target does not exist");
            return Err(CareError::NotFound(format!(
                "Appointment {}",
                request.appointment_id
            )));
        };
        let appointment: Appointment = document.decode()?;

        let recipient = request
            .user_id
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| appointment.user_id.clone());
        let notification =
            notification::dispatch(self.messaging.as_ref(), &recipient, transition, &appointment)
                .await;

        self.revalidator.revalidate(ADMIN_PATH);

        tracing::info!(
            appointment_id = %appointment.id,
            status = %appointment.status,
            "Appointment updated"
        );
        Ok(UpdateOutcome {
            appointment,
            notification,
        })
    }
}
