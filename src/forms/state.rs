use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

use super::rules::{FieldValue, FormValues, ValidationErrors};
use super::schema::{appointment_schema, FieldKind, FormSchema};
use crate::models::{Appointment, FormType};

/// Values and per-field errors of one form instance, bound to its schema.
#[derive(Debug, Clone)]
pub struct FormState {
    schema: FormSchema,
    values: FormValues,
    errors: BTreeMap<String, String>,
}

impl FormState {
    /// Fresh state: checkboxes start unticked, everything else empty.
    pub fn new(schema: FormSchema) -> Self {
        let values = schema
            .fields
            .iter()
            .map(|f| {
                let initial = match f.kind {
                    FieldKind::Checkbox => FieldValue::Bool(false),
                    _ => FieldValue::Empty,
                };
                (f.name.clone(), initial)
            })
            .collect();
        Self {
            schema,
            values,
            errors: BTreeMap::new(),
        }
    }

    /// Appointment form pre-filled from an existing record (schedule/cancel)
    /// or with the schedule defaulting to `now` (create).
    pub fn for_appointment(
        form_type: FormType,
        existing: Option<&Appointment>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut state = Self::new(appointment_schema(form_type));
        let schedule = existing.map(|a| a.schedule).unwrap_or(now);
        state.set("schedule", FieldValue::text(format_input_datetime(&schedule)));
        if let Some(appt) = existing {
            state.set("primaryPhysician", FieldValue::text(appt.primary_physician.clone()));
            state.set("reason", FieldValue::text(appt.reason.clone()));
            if let Some(note) = &appt.note {
                state.set("note", FieldValue::text(note.clone()));
            }
        }
        state
    }

    pub fn with_values(mut self, values: FormValues) -> Self {
        for (name, value) in values {
            self.set(&name, value);
        }
        self
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, name: &str) -> &FieldValue {
        self.values.get(name).unwrap_or(&FieldValue::Empty)
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    /// Set a value without validating (defaults, pre-fill).
    fn set(&mut self, name: &str, value: FieldValue) {
        self.values.insert(name.to_string(), value);
    }

    /// Change event from a widget: store the value and revalidate that
    /// field only. Returns the field's current error, if any.
    pub fn on_change(&mut self, name: &str, value: FieldValue) -> Option<&str> {
        match self.schema.validate_field(name, &value) {
            Ok(()) => {
                self.errors.remove(name);
            }
            Err(message) => {
                self.errors.insert(name.to_string(), message);
            }
        }
        self.set(name, value);
        self.error(name)
    }

    /// Validate every field. On failure all errors are recorded in the state
    /// and nothing is handed out for submission.
    pub fn submit(&mut self) -> Result<FormValues, ValidationErrors> {
        match self.schema.validate(&self.values) {
            Ok(()) => {
                self.errors.clear();
                Ok(self.values.clone())
            }
            Err(errors) => {
                self.errors = errors.fields.clone();
                Err(errors)
            }
        }
    }
}

/// `datetime-local` input format.
pub fn format_input_datetime(dt: &DateTime<Utc>) -> String {
    let s = dt.to_rfc3339_opts(SecondsFormat::Secs, true);
    // 2024-01-01T10:00:00Z -> 2024-01-01T10:00
    s.get(..16).unwrap_or(&s).to_string()
}
