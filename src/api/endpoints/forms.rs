//! Form schema endpoints.
//!
//! - `GET /api/forms/:variant`: schema plus the rendered field widgets
//! - `POST /api/forms/:variant/validate`: validate submitted values

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::forms::{schema_for, FormSchema, FormState, FormValues, FormVariant, RenderedField};
use crate::models::FormType;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormQuery {
    /// Pre-fill an appointment form from this stored appointment.
    pub appointment_id: Option<String>,
}

#[derive(Serialize)]
pub struct FormResponse {
    pub schema: FormSchema,
    pub fields: Vec<RenderedField>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub values: FormValues,
}

fn parse_variant(raw: &str) -> Result<FormVariant, ApiError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| ApiError::NotFound(format!("Form {raw} not found")))
}

fn appointment_form_type(variant: FormVariant) -> Option<FormType> {
    match variant {
        FormVariant::AppointmentCreate => Some(FormType::Create),
        FormVariant::AppointmentSchedule => Some(FormType::Schedule),
        FormVariant::AppointmentCancel => Some(FormType::Cancel),
        FormVariant::UserSignup | FormVariant::PatientRegistration => None,
    }
}

/// `GET /api/forms/:variant`
pub async fn schema(
    State(ctx): State<ApiContext>,
    Path(variant): Path<String>,
    Query(query): Query<FormQuery>,
) -> Result<Json<FormResponse>, ApiError> {
    let variant = parse_variant(&variant)?;

    let state = match appointment_form_type(variant) {
        Some(form_type) => {
            let existing = match &query.appointment_id {
                Some(id) => Some(ctx.appointments.get(id).await?),
                None => None,
            };
            FormState::for_appointment(form_type, existing.as_ref(), Utc::now())
        }
        None => FormState::new(schema_for(variant)),
    };

    let fields = ctx.renderer.render_form(&state);
    Ok(Json(FormResponse {
        schema: state.schema().clone(),
        fields,
    }))
}

/// `POST /api/forms/:variant/validate`
pub async fn validate(
    Path(variant): Path<String>,
    payload: Result<Json<FormValues>, JsonRejection>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let variant = parse_variant(&variant)?;
    let Json(values) = payload?;

    let mut state = FormState::new(schema_for(variant)).with_values(values);
    let values = state.submit().map_err(ApiError::Validation)?;
    Ok(Json(ValidateResponse {
        valid: true,
        values,
    }))
}
