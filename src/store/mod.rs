//! Persistence contracts consumed by the attendance core and the supervisory views.
//!
//! The MySQL implementation is what the server runs on; the in-memory one backs the tests.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::error::AttendanceError;
use crate::model::{
    action::NewAction,
    attendance::{AttendanceRecord, BranchAttendanceRow},
    branch::Branch,
    employee::Employee,
    user::User,
};

#[cfg(test)]
pub mod memory;
pub mod mysql;

/// Employees and branches. Read-only for the attendance core.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Sensor ids are unique, so at most one employee matches.
    async fn resolve_employee(
        &self,
        sensor_id: u32,
        branch_id: u64,
    ) -> Result<Option<Employee>, sqlx::Error>;

    async fn get_branch(&self, branch_id: u64) -> Result<Option<Branch>, sqlx::Error>;

    /// Ordered by id
    async fn list_branches(&self) -> Result<Vec<Branch>, sqlx::Error>;

    /// Ordered by name
    async fn list_employees_for_branch(&self, branch_id: u64)
    -> Result<Vec<Employee>, sqlx::Error>;
}

/// One attendance record per (employee, date).
#[async_trait]
pub trait AttendanceLedger: Send + Sync {
    async fn get_record(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AttendanceError>;

    /// Fails with `DuplicateRecord` when the (employee, date) slot is taken.
    async fn create_record(
        &self,
        employee_id: u64,
        date: NaiveDate,
        check_in: NaiveTime,
    ) -> Result<AttendanceRecord, AttendanceError>;

    /// Fails with `AlreadyClosed` when check-out is set, `RecordNotFound` when the row is gone.
    async fn set_check_out(
        &self,
        record_id: u64,
        check_out: NaiveTime,
    ) -> Result<AttendanceRecord, AttendanceError>;

    /// Ordered by employee name, then date
    async fn list_records_for_branch(
        &self,
        branch_id: u64,
    ) -> Result<Vec<BranchAttendanceRow>, sqlx::Error>;
}

#[async_trait]
pub trait ActionLog: Send + Sync {
    async fn record_action(&self, action: NewAction) -> Result<(), sqlx::Error>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;

    async fn touch_last_login(&self, user_id: u64) -> Result<(), sqlx::Error>;
}
