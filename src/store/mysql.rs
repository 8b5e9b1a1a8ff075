use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::MySqlPool;
use tracing::{debug, warn};

use super::{ActionLog, AttendanceLedger, IdentityStore, UserStore};
use crate::error::AttendanceError;
use crate::model::{
    action::NewAction,
    attendance::{AttendanceRecord, BranchAttendanceRow},
    branch::Branch,
    employee::Employee,
    user::User,
};

/// All stores backed by one MySQL pool. Cloning shares the pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_record(&self, record_id: u64) -> Result<Option<AttendanceRecord>, sqlx::Error> {
        sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, employee_id, date, check_in, check_out
            FROM attendance
            WHERE id = ?
            "#,
        )
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[async_trait]
impl IdentityStore for MySqlStore {
    async fn resolve_employee(
        &self,
        sensor_id: u32,
        branch_id: u64,
    ) -> Result<Option<Employee>, sqlx::Error> {
        sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, name, sensor_id, branch_id
            FROM employees
            WHERE sensor_id = ? AND branch_id = ?
            "#,
        )
        .bind(sensor_id)
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_branch(&self, branch_id: u64) -> Result<Option<Branch>, sqlx::Error> {
        sqlx::query_as::<_, Branch>("SELECT id, name FROM branches WHERE id = ?")
            .bind(branch_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_branches(&self) -> Result<Vec<Branch>, sqlx::Error> {
        sqlx::query_as::<_, Branch>("SELECT id, name FROM branches ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    async fn list_employees_for_branch(
        &self,
        branch_id: u64,
    ) -> Result<Vec<Employee>, sqlx::Error> {
        sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, name, sensor_id, branch_id
            FROM employees
            WHERE branch_id = ?
            ORDER BY name, id
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl AttendanceLedger for MySqlStore {
    async fn get_record(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, employee_id, date, check_in, check_out
            FROM attendance
            WHERE employee_id = ? AND date = ?
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn create_record(
        &self,
        employee_id: u64,
        date: NaiveDate,
        check_in: NaiveTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, check_in)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(check_in)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(AttendanceRecord {
                id: done.last_insert_id(),
                employee_id,
                date,
                check_in: Some(check_in),
                check_out: None,
            }),
            // uq_attendance_employee_date
            Err(e) if is_unique_violation(&e) => {
                debug!(employee_id, %date, "Insert lost the race for the attendance slot");
                Err(AttendanceError::DuplicateRecord { employee_id, date })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_check_out(
        &self,
        record_id: u64,
        check_out: NaiveTime,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?
            WHERE id = ?
            AND check_out IS NULL
            "#,
        )
        .bind(check_out)
        .bind(record_id)
        .execute(&self.pool)
        .await?;

        let current = self.fetch_record(record_id).await?;

        match current {
            None => {
                warn!(record_id, "Attendance record vanished during check-out");
                Err(AttendanceError::RecordNotFound { record_id })
            }
            Some(_) if result.rows_affected() == 0 => {
                Err(AttendanceError::AlreadyClosed { record_id })
            }
            Some(record) => Ok(record),
        }
    }

    async fn list_records_for_branch(
        &self,
        branch_id: u64,
    ) -> Result<Vec<BranchAttendanceRow>, sqlx::Error> {
        sqlx::query_as::<_, BranchAttendanceRow>(
            r#"
            SELECT
                e.id AS employee_id,
                e.name AS employee_name,
                a.date,
                a.check_in,
                a.check_out
            FROM attendance a
            JOIN employees e ON e.id = a.employee_id
            WHERE e.branch_id = ?
            ORDER BY e.name, e.id, a.date
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl ActionLog for MySqlStore {
    async fn record_action(&self, action: NewAction) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO actions (user_id, kind, description)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(action.user_id)
        .bind(action.kind.code())
        .bind(&action.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, role_id, branch_id
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn touch_last_login(&self, user_id: u64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
