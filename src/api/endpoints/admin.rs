//! Admin dashboard endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::dashboard::DashboardSummary;
use crate::revalidate::ADMIN_PATH;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboardResponse {
    #[serde(flatten)]
    pub summary: DashboardSummary,
    /// Revalidation generation of the admin view at read time.
    pub generation: u64,
}

/// `GET /api/admin/appointments`
pub async fn appointments(
    State(ctx): State<ApiContext>,
) -> Result<Json<AdminDashboardResponse>, ApiError> {
    let summary = ctx.appointments.recent().await?;
    Ok(Json(AdminDashboardResponse {
        summary,
        generation: ctx.revalidator.generation(ADMIN_PATH),
    }))
}
