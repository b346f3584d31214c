use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::Gender;

/// Identification documents accepted at registration.
pub const IDENTIFICATION_TYPES: &[&str] = &[
    "Birth Certificate",
    "Driver's License",
    "Medical Insurance Card/Policy",
    "Military ID Card",
    "National Identity Card",
    "Passport",
    "Resident Alien Card (Green Card)",
    "Social Security Card",
    "State ID Card",
    "Student ID Card",
    "Voter ID Card",
];

/// Intake fields collected in the second registration step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientIntake {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: DateTime<Utc>,
    pub gender: Gender,
    pub address: String,
    pub occupation: String,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
    pub primary_physician: String,
    pub insurance_provider: String,
    pub insurance_policy_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_medication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_medical_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past_medical_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification_number: Option<String>,
    /// Reference to an already uploaded identification file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification_document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification_document_url: Option<String>,
    pub privacy_consent: bool,
    pub treatment_consent: bool,
    pub disclosure_consent: bool,
}

/// Patient document as written to the patient collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub user_id: String,
    #[serde(flatten)]
    pub intake: PatientIntake,
}

/// Stored patient document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    #[serde(flatten)]
    pub intake: PatientIntake,
}
