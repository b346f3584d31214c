use chrono::{DateTime, Utc};
use serde::Serialize;

/// Display forms of one instant, as shown in tables and messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedDateTime {
    /// `Jan 1, 2024, 10:00 AM`
    pub date_time: String,
    /// `Mon, 01/01/2024`
    pub date_day: String,
    /// `Jan 1, 2024`
    pub date_only: String,
    /// `10:00 AM`
    pub time_only: String,
}

pub fn format_date_time(dt: &DateTime<Utc>) -> FormattedDateTime {
    FormattedDateTime {
        date_time: dt.format("%b %-d, %Y, %-I:%M %p").to_string(),
        date_day: dt.format("%a, %m/%d/%Y").to_string(),
        date_only: dt.format("%b %-d, %Y").to_string(),
        time_only: dt.format("%-I:%M %p").to_string(),
    }
}
