//! Appointment endpoints.
//!
//! - `POST /api/appointments`: patient request
//! - `GET /api/appointments/:id`
//! - `PATCH /api/appointments/:id`: admin schedule/cancel

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::appointment::{CreateAppointment, UpdateAppointment, UpdateOutcome};
use crate::models::Appointment;

/// `POST /api/appointments`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<CreateAppointment>, JsonRejection>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let Json(request) = payload?;
    let appointment = ctx.appointments.create(request).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// `GET /api/appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    Ok(Json(ctx.appointments.get(&appointment_id).await?))
}

/// `PATCH /api/appointments/:id`: the path id wins over any id in the body.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(appointment_id): Path<String>,
    payload: Result<Json<UpdateAppointment>, JsonRejection>,
) -> Result<Json<UpdateOutcome>, ApiError> {
    let Json(mut request) = payload?;
    request.appointment_id = appointment_id;
    Ok(Json(ctx.appointments.update(request).await?))
}
