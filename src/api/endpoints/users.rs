//! User identity endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{CreateUser, User};

/// `POST /api/users`: create, or return the existing identity.
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(request) = payload?;
    let user = ctx.patients.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /api/users/:user_id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(ctx.patients.get_user(&user_id).await?))
}
