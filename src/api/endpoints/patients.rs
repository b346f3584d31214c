//! Patient registration endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{NewPatient, Patient};

/// `POST /api/patients`
pub async fn register(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let Json(request) = payload?;
    let patient = ctx.patients.register_patient(request).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients/:user_id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    Ok(Json(ctx.patients.get_patient(&user_id).await?))
}
