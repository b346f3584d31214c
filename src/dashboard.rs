use serde::Serialize;

use crate::models::{Appointment, AppointmentStatus};

/// Status counts for the admin view, recomputed on every read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub scheduled_count: usize,
    pub pending_count: usize,
    pub cancelled_count: usize,
    pub total_count: u64,
    pub documents: Vec<Appointment>,
}

/// Count every record by status. `total` is the store's reported total for
/// the queried set; documents keep their input order.
pub fn summarize(documents: Vec<Appointment>, total: u64) -> DashboardSummary {
    let (mut scheduled, mut pending, mut cancelled) = (0, 0, 0);
    for appointment in &documents {
        match appointment.status {
            AppointmentStatus::Scheduled => scheduled += 1,
            AppointmentStatus::Pending => pending += 1,
            AppointmentStatus::Cancelled => cancelled += 1,
        }
    }
    DashboardSummary {
        scheduled_count: scheduled,
        pending_count: pending,
        cancelled_count: cancelled,
        total_count: total,
        documents,
    }
}
