use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

/// Appointment document as stored in the appointment collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub patient: PatientRef,
    pub primary_physician: String,
    pub schedule: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub note: Option<String>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}

/// The `patient` attribute is a relationship: the store returns either the
/// bare document id or the expanded patient document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatientRef {
    Id(String),
    Expanded(Box<PatientSummary>),
}

impl PatientRef {
    pub fn id(&self) -> &str {
        match self {
            PatientRef::Id(id) => id,
            PatientRef::Expanded(p) => &p.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            PatientRef::Id(_) => None,
            PatientRef::Expanded(p) => Some(&p.name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Attributes written when a patient requests an appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub user_id: String,
    pub patient: String,
    pub primary_physician: String,
    pub schedule: DateTime<Utc>,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub status: AppointmentStatus,
}

/// Attributes written by an admin schedule/cancel action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_physician: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_store_document_with_bare_patient_id() {
        let doc = json!({
            "$id": "appt-1",
            "$createdAt": "2024-01-01T09:00:00.000+00:00",
            "userId": "user-1",
            "patient": "patient-1",
            "primaryPhysician": "John Green",
            "schedule": "2024-01-02T10:00:00.000+00:00",
            "reason": "Checkup",
            "note": null,
            "status": "pending",
            "cancellationReason": null
        });
        let appt: Appointment = serde_json::from_value(doc).unwrap();
        assert_eq!(appt.patient.id(), "patient-1");
        assert_eq!(appt.patient.name(), None);
        assert_eq!(appt.status, AppointmentStatus::Pending);
    }

    #[test]
    fn decodes_expanded_patient_relationship() {
        let doc = json!({
            "$id": "appt-2",
            "$createdAt": "2024-01-01T09:00:00.000+00:00",
            "userId": "user-1",
            "patient": { "$id": "patient-9", "name": "Jane Doe", "email": "jane@example.com" },
            "primaryPhysician": "Leila Cameron",
            "schedule": "2024-01-02T10:00:00.000+00:00",
            "status": "scheduled"
        });
        let appt: Appointment = serde_json::from_value(doc).unwrap();
        assert_eq!(appt.patient.id(), "patient-9");
        assert_eq!(appt.patient.name(), Some("Jane Doe"));
        assert_eq!(appt.reason, "");
    }

    #[test]
    fn patch_omits_unset_fields() {
        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Cancelled),
            cancellation_reason: Some("Patient unavailable".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            value,
            json!({ "status": "cancelled", "cancellationReason": "Patient unavailable" })
        );
    }
}
