use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Fixed-width 24h rendering used on the wire and in exports.
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
}

impl AttendanceRecord {
    pub fn is_closed(&self) -> bool {
        self.check_out.is_some()
    }

    pub fn check_in_display(&self) -> Option<String> {
        format_time(self.check_in)
    }

    pub fn check_out_display(&self) -> Option<String> {
        format_time(self.check_out)
    }
}

/// One attendance row joined with the owning employee's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BranchAttendanceRow {
    pub employee_id: u64,
    pub employee_name: String,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
}

pub fn format_time(time: Option<NaiveTime>) -> Option<String> {
    time.map(|t| t.format(TIME_FORMAT).to_string())
}
