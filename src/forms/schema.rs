//! Schema Registry: one explicit field table per form variant.
//!
//! Which fields a form shows, and which rules apply to them, is decided
//! here and nowhere else. Renderers and services only ever see the
//! resulting `FormSchema`.

use serde::{Deserialize, Serialize};

use super::rules::{FieldRule, FieldValue, FormValues, Pattern, ValidationErrors};
use crate::models::{FormType, Gender, DOCTORS, IDENTIFICATION_TYPES};

// ═══════════════════════════════════════════════════════════
// Descriptors
// ═══════════════════════════════════════════════════════════

/// Widget kind tag. Unrecognised tags decode to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Input,
    #[serde(rename = "textarea")]
    TextArea,
    PhoneInput,
    DatePicker,
    Select,
    Checkbox,
    /// Rendering is delegated to a custom function registered by the form.
    Skeleton,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub kind: FieldKind,
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub rule: FieldRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(default)]
    pub show_time_select: bool,
    /// Appointment form types the field is shown for; empty means every one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visible_for: Vec<FormType>,
}

impl FieldDescriptor {
    pub fn new(kind: FieldKind, name: &str, label: &str, rule: FieldRule) -> Self {
        Self {
            kind,
            name: name.to_string(),
            label: label.to_string(),
            placeholder: None,
            rule,
            icon: None,
            options: Vec::new(),
            date_format: None,
            show_time_select: false,
            visible_for: Vec::new(),
        }
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn date_format(mut self, format: &str, show_time_select: bool) -> Self {
        self.date_format = Some(format.to_string());
        self.show_time_select = show_time_select;
        self
    }

    pub fn visible_for(mut self, form_types: &[FormType]) -> Self {
        self.visible_for = form_types.to_vec();
        self
    }

    pub fn is_visible(&self, form_type: FormType) -> bool {
        self.visible_for.is_empty() || self.visible_for.contains(&form_type)
    }

    /// Check one value against this field's rule.
    pub fn check(&self, value: &FieldValue) -> Result<(), String> {
        self.rule.check(&self.label_or_name(), value)
    }

    fn label_or_name(&self) -> String {
        if self.label.is_empty() {
            self.name.clone()
        } else {
            self.label.clone()
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Schemas
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormVariant {
    UserSignup,
    PatientRegistration,
    AppointmentCreate,
    AppointmentSchedule,
    AppointmentCancel,
}

impl From<FormType> for FormVariant {
    fn from(form_type: FormType) -> Self {
        match form_type {
            FormType::Create => FormVariant::AppointmentCreate,
            FormType::Schedule => FormVariant::AppointmentSchedule,
            FormType::Cancel => FormVariant::AppointmentCancel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub variant: FormVariant,
    pub submit_label: String,
    pub fields: Vec<FieldDescriptor>,
}

impl FormSchema {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate a single field. Names outside the schema always pass.
    pub fn validate_field(&self, name: &str, value: &FieldValue) -> Result<(), String> {
        match self.field(name) {
            Some(field) => field.check(value),
            None => Ok(()),
        }
    }

    /// Validate every field of the schema; all failures are collected.
    pub fn validate(&self, values: &FormValues) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        for field in &self.fields {
            let value = values.get(&field.name).unwrap_or(&FieldValue::Empty);
            if let Err(message) = field.check(value) {
                errors.fields.insert(field.name.clone(), message);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Build the schema for a form variant.
pub fn schema_for(variant: FormVariant) -> FormSchema {
    let (submit_label, fields) = match variant {
        FormVariant::UserSignup => ("Get Started", user_fields()),
        FormVariant::PatientRegistration => ("Submit and continue", patient_fields()),
        FormVariant::AppointmentCreate => (
            FormType::Create.button_label(),
            appointment_fields(FormType::Create),
        ),
        FormVariant::AppointmentSchedule => (
            FormType::Schedule.button_label(),
            appointment_fields(FormType::Schedule),
        ),
        FormVariant::AppointmentCancel => (
            FormType::Cancel.button_label(),
            appointment_fields(FormType::Cancel),
        ),
    };

    FormSchema {
        variant,
        submit_label: submit_label.to_string(),
        fields,
    }
}

/// Schema for an appointment form of the given type.
pub fn appointment_schema(form_type: FormType) -> FormSchema {
    schema_for(form_type.into())
}

fn doctor_options() -> Vec<SelectOption> {
    DOCTORS
        .iter()
        .map(|d| SelectOption {
            value: d.name.to_string(),
            label: d.name.to_string(),
            image: Some(d.image.to_string()),
        })
        .collect()
}

fn name_field() -> FieldDescriptor {
    FieldDescriptor::new(
        FieldKind::Input,
        "name",
        "Full Name",
        FieldRule::text().required().length(2, 50),
    )
    .placeholder("John Doe")
    .icon("/assets/icons/user.svg")
}

fn email_field() -> FieldDescriptor {
    FieldDescriptor::new(
        FieldKind::Input,
        "email",
        "Email",
        FieldRule::text().required().pattern(Pattern::Email),
    )
    .placeholder("johndoe@gmail.com")
    .icon("/assets/icons/email.svg")
}

fn phone_field(name: &str, label: &str) -> FieldDescriptor {
    FieldDescriptor::new(
        FieldKind::PhoneInput,
        name,
        label,
        FieldRule::text().required().pattern(Pattern::Phone),
    )
    .placeholder("(555) 123-4567")
}

fn user_fields() -> Vec<FieldDescriptor> {
    vec![name_field(), email_field(), phone_field("phone", "Phone number")]
}

fn history_field(name: &str, label: &str, placeholder: &str) -> FieldDescriptor {
    FieldDescriptor::new(FieldKind::TextArea, name, label, FieldRule::text()).placeholder(placeholder)
}

fn consent_field(name: &str, label: &str, message: &str) -> FieldDescriptor {
    FieldDescriptor::new(
        FieldKind::Checkbox,
        name,
        label,
        FieldRule::boolean().must_be_true().with_message(message),
    )
}

fn patient_fields() -> Vec<FieldDescriptor> {
    let genders = [Gender::Male, Gender::Female, Gender::Other];
    let mut fields = user_fields();
    fields.extend([
        FieldDescriptor::new(
            FieldKind::DatePicker,
            "birthDate",
            "Date of birth",
            FieldRule::datetime().required(),
        )
        .date_format("MM/dd/yyyy", false),
        FieldDescriptor::new(
            FieldKind::Skeleton,
            "gender",
            "Gender",
            FieldRule::choice(genders.iter().map(|g| g.as_str())).required(),
        ),
        FieldDescriptor::new(
            FieldKind::Input,
            "address",
            "Address",
            FieldRule::text()
                .required()
                .length(5, 500)
                .with_message("Address must be between 5 and 500 characters"),
        )
        .placeholder("14 street, New york, NY - 5101"),
        FieldDescriptor::new(
            FieldKind::Input,
            "occupation",
            "Occupation",
            FieldRule::text().required().length(2, 500),
        )
        .placeholder("Software Engineer"),
        FieldDescriptor::new(
            FieldKind::Input,
            "emergencyContactName",
            "Emergency contact name",
            FieldRule::text().required().length(2, 50),
        )
        .placeholder("Guardian's name"),
        phone_field("emergencyContactNumber", "Emergency contact number"),
        FieldDescriptor::new(
            FieldKind::Select,
            "primaryPhysician",
            "Primary care physician",
            FieldRule::text()
                .required()
                .min(2)
                .with_message("Select at least one doctor"),
        )
        .placeholder("Select a physician")
        .options(doctor_options()),
        FieldDescriptor::new(
            FieldKind::Input,
            "insuranceProvider",
            "Insurance provider",
            FieldRule::text().required().length(2, 50),
        )
        .placeholder("BlueCross BlueShield"),
        FieldDescriptor::new(
            FieldKind::Input,
            "insurancePolicyNumber",
            "Insurance policy number",
            FieldRule::text().required().length(2, 50),
        )
        .placeholder("ABC123456789"),
        history_field("allergies", "Allergies (if any)", "Peanuts, Penicillin, Pollen"),
        history_field(
            "currentMedication",
            "Current medications",
            "Ibuprofen 200mg, Levothyroxine 50mcg",
        ),
        history_field(
            "familyMedicalHistory",
            "Family medical history (if relevant)",
            "Mother had brain cancer, Father has hypertension",
        ),
        history_field(
            "pastMedicalHistory",
            "Past medical history",
            "Appendectomy in 2015, Asthma diagnosis in childhood",
        ),
        FieldDescriptor::new(
            FieldKind::Select,
            "identificationType",
            "Identification Type",
            FieldRule::choice(IDENTIFICATION_TYPES.iter().copied()),
        )
        .placeholder("Select identification type")
        .options(
            IDENTIFICATION_TYPES
                .iter()
                .map(|t| SelectOption {
                    value: t.to_string(),
                    label: t.to_string(),
                    image: None,
                })
                .collect(),
        ),
        FieldDescriptor::new(
            FieldKind::Input,
            "identificationNumber",
            "Identification Number",
            FieldRule::text(),
        )
        .placeholder("123456789"),
        FieldDescriptor::new(
            FieldKind::Skeleton,
            "identificationDocumentId",
            "Scanned Copy of Identification Document",
            FieldRule::text(),
        ),
        consent_field(
            "treatmentConsent",
            "I consent to receive treatment for my health condition.",
            "You must consent to treatment in order to proceed",
        ),
        consent_field(
            "disclosureConsent",
            "I consent to the use and disclosure of my health information for treatment purposes.",
            "You must consent to disclosure in order to proceed",
        ),
        consent_field(
            "privacyConsent",
            "I acknowledge that I have reviewed and agree to the privacy policy",
            "You must consent to privacy in order to proceed",
        ),
    ]);
    fields
}

fn appointment_fields(form_type: FormType) -> Vec<FieldDescriptor> {
    use FormType::{Cancel, Create, Schedule};

    let table = vec![
        FieldDescriptor::new(
            FieldKind::Select,
            "primaryPhysician",
            "Doctor",
            FieldRule::text()
                .required()
                .min(2)
                .with_message("Select at least one doctor"),
        )
        .placeholder("Select a doctor")
        .options(doctor_options())
        .visible_for(&[Create, Schedule]),
        FieldDescriptor::new(
            FieldKind::DatePicker,
            "schedule",
            "Expected appointment date",
            FieldRule::datetime().required(),
        )
        .placeholder("Select a date")
        .date_format("MMMM/dd/yyyy - h:mm aa", true)
        .visible_for(&[Create, Schedule]),
        // Only a new request has to explain itself; scheduling reuses the stored reason.
        FieldDescriptor::new(
            FieldKind::TextArea,
            "reason",
            "Reason for appointment",
            FieldRule::text().required().length(2, 500),
        )
        .placeholder("Enter reason for appointment")
        .visible_for(&[Create]),
        FieldDescriptor::new(
            FieldKind::TextArea,
            "reason",
            "Reason for appointment",
            FieldRule::text(),
        )
        .placeholder("Enter reason for appointment")
        .visible_for(&[Schedule]),
        FieldDescriptor::new(FieldKind::TextArea, "note", "Note", FieldRule::text())
            .placeholder("Enter note")
            .visible_for(&[Create, Schedule]),
        FieldDescriptor::new(
            FieldKind::TextArea,
            "cancellationReason",
            "Reason for cancellation",
            FieldRule::text().required().length(2, 500),
        )
        .placeholder("Enter reason for cancellation")
        .visible_for(&[Cancel]),
    ];

    table
        .into_iter()
        .filter(|field| field.is_visible(form_type))
        .collect()
}
