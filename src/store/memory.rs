use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use super::{ActionLog, AttendanceLedger, IdentityStore, UserStore};
use crate::error::AttendanceError;
use crate::model::{
    action::NewAction,
    attendance::{AttendanceRecord, BranchAttendanceRow},
    branch::Branch,
    employee::Employee,
    user::User,
};

#[derive(Default)]
struct Tables {
    branches: Vec<Branch>,
    employees: Vec<Employee>,
    users: Vec<User>,
    records: HashMap<u64, AttendanceRecord>,
    actions: Vec<NewAction>,
    next_record_id: u64,
}

/// Mirrors the MySQL constraints: unique sensor ids, unique (employee, date) records and
/// conditional check-out.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_branch(&self, id: u64, name: &str) {
        self.tables().branches.push(Branch {
            id,
            name: name.to_string(),
        });
    }

    pub fn add_employee(&self, id: u64, name: &str, sensor_id: u32, branch_id: u64) {
        let mut tables = self.tables();
        assert!(
            tables.employees.iter().all(|e| e.sensor_id != sensor_id),
            "sensor id {sensor_id} already provisioned"
        );
        tables.employees.push(Employee {
            id,
            name: name.to_string(),
            sensor_id,
            branch_id,
        });
    }

    pub fn add_user(&self, user: User) {
        self.tables().users.push(user);
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        let mut records: Vec<_> = self.tables().records.values().cloned().collect();
        records.sort_by_key(|r| r.id);
        records
    }

    pub fn actions(&self) -> Vec<NewAction> {
        self.tables().actions.clone()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn resolve_employee(
        &self,
        sensor_id: u32,
        branch_id: u64,
    ) -> Result<Option<Employee>, sqlx::Error> {
        Ok(self
            .tables()
            .employees
            .iter()
            .find(|e| e.sensor_id == sensor_id && e.branch_id == branch_id)
            .cloned())
    }

    async fn get_branch(&self, branch_id: u64) -> Result<Option<Branch>, sqlx::Error> {
        Ok(self
            .tables()
            .branches
            .iter()
            .find(|b| b.id == branch_id)
            .cloned())
    }

    async fn list_branches(&self) -> Result<Vec<Branch>, sqlx::Error> {
        let mut branches = self.tables().branches.clone();
        branches.sort_by_key(|b| b.id);
        Ok(branches)
    }

    async fn list_employees_for_branch(
        &self,
        branch_id: u64,
    ) -> Result<Vec<Employee>, sqlx::Error> {
        let mut employees: Vec<_> = self
            .tables()
            .employees
            .iter()
            .filter(|e| e.branch_id == branch_id)
            .cloned()
            .collect();
        employees.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(employees)
    }
}

#[async_trait]
impl AttendanceLedger for MemoryStore {
    async fn get_record(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        // Give racing tasks a chance to interleave between read and write.
        tokio::task::yield_now().await;

        Ok(self
            .tables()
            .records
            .values()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn create_record(
        &self,
        employee_id: u64,
        date: NaiveDate,
        check_in: NaiveTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        tokio::task::yield_now().await;

        let mut tables = self.tables();
        if tables
            .records
            .values()
            .any(|r| r.employee_id == employee_id && r.date == date)
        {
            return Err(AttendanceError::DuplicateRecord { employee_id, date });
        }

        tables.next_record_id += 1;
        let record = AttendanceRecord {
            id: tables.next_record_id,
            employee_id,
            date,
            check_in: Some(check_in),
            check_out: None,
        };
        tables.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn set_check_out(
        &self,
        record_id: u64,
        check_out: NaiveTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        tokio::task::yield_now().await;

        let mut tables = self.tables();
        let record = tables
            .records
            .get_mut(&record_id)
            .ok_or(AttendanceError::RecordNotFound { record_id })?;

        if record.check_out.is_some() {
            return Err(AttendanceError::AlreadyClosed { record_id });
        }

        record.check_out = Some(check_out);
        Ok(record.clone())
    }

    async fn list_records_for_branch(
        &self,
        branch_id: u64,
    ) -> Result<Vec<BranchAttendanceRow>, sqlx::Error> {
        let tables = self.tables();
        let mut rows: Vec<_> = tables
            .records
            .values()
            .filter_map(|r| {
                let employee = tables
                    .employees
                    .iter()
                    .find(|e| e.id == r.employee_id && e.branch_id == branch_id)?;
                Some(BranchAttendanceRow {
                    employee_id: employee.id,
                    employee_name: employee.name.clone(),
                    date: r.date,
                    check_in: r.check_in,
                    check_out: r.check_out,
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            a.employee_name
                .cmp(&b.employee_name)
                .then(a.employee_id.cmp(&b.employee_id))
                .then(a.date.cmp(&b.date))
        });
        Ok(rows)
    }
}

#[async_trait]
impl ActionLog for MemoryStore {
    async fn record_action(&self, action: NewAction) -> Result<(), sqlx::Error> {
        self.tables().actions.push(action);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn touch_last_login(&self, _user_id: u64) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn second_insert_for_same_day_is_rejected() {
        let store = MemoryStore::new();
        store.create_record(1, date(), time(8, 0)).await.unwrap();

        let err = store.create_record(1, date(), time(8, 1)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::DuplicateRecord { employee_id: 1, .. }));
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn check_out_is_written_once() {
        let store = MemoryStore::new();
        let record = store.create_record(1, date(), time(8, 0)).await.unwrap();

        store.set_check_out(record.id, time(17, 0)).await.unwrap();
        let err = store.set_check_out(record.id, time(18, 0)).await.unwrap_err();

        assert!(matches!(err, AttendanceError::AlreadyClosed { .. }));
        assert_eq!(store.records()[0].check_out, Some(time(17, 0)));
    }

    #[tokio::test]
    async fn check_out_on_missing_record_fails() {
        let store = MemoryStore::new();
        let err = store.set_check_out(42, time(17, 0)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::RecordNotFound { record_id: 42 }));
    }
}
