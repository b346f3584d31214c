//! Physician directory endpoint.

use axum::Json;
use serde::Serialize;

use crate::models::{Doctor, DOCTORS};

#[derive(Serialize)]
pub struct DoctorsResponse {
    pub doctors: &'static [Doctor],
}

/// `GET /api/doctors`
pub async fn list() -> Json<DoctorsResponse> {
    Json(DoctorsResponse { doctors: DOCTORS })
}
