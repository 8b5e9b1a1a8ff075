//! Daily check-in / check-out state machine.
//!
//! Each (employee, day) moves through three states:
//!
//! ```text
//! Absent --first event--> Present --second event--> Closed --any event--> Closed
//! ```
//!
//! The read-decide-write sequence runs under a per-(employee, day) lock. The ledger's own
//! uniqueness and conditional-update guarantees catch anything that slips past the lock
//! (another server process), and those lost races are reported as `already-recorded`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::error::AttendanceError;
use crate::model::{attendance::AttendanceRecord, employee::Employee};
use crate::service::clock::AttendanceClock;
use crate::store::{AttendanceLedger, IdentityStore};
use crate::utils::{employee_cache::EmployeeCache, key_lock::KeyedLocks};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AttendanceAction {
    CheckIn,
    CheckOut,
    AlreadyRecorded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    Absent,
    Present,
    Closed,
}

impl DayState {
    pub fn of(record: Option<&AttendanceRecord>) -> Self {
        match record {
            None => DayState::Absent,
            Some(r) if !r.is_closed() => DayState::Present,
            Some(_) => DayState::Closed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttendanceOutcome {
    pub action: AttendanceAction,
    pub employee: Employee,
    pub record: AttendanceRecord,
}

pub struct AttendanceTracker {
    employees: EmployeeCache,
    ledger: Arc<dyn AttendanceLedger>,
    locks: KeyedLocks<(u64, NaiveDate)>,
    clock: AttendanceClock,
}

impl AttendanceTracker {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        ledger: Arc<dyn AttendanceLedger>,
        clock: AttendanceClock,
        employee_cache_ttl: Duration,
    ) -> Self {
        Self {
            employees: EmployeeCache::new(identity, employee_cache_ttl),
            ledger,
            locks: KeyedLocks::new(),
            clock,
        }
    }

    /// Live terminal path: the event happens now, on the attendance clock.
    pub async fn record_event_now(
        &self,
        sensor_id: u32,
        branch_id: u64,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        self.record_event(sensor_id, branch_id, self.clock.now()).await
    }

    pub async fn record_event(
        &self,
        sensor_id: u32,
        branch_id: u64,
        event_time: NaiveDateTime,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        let employee = self
            .employees
            .resolve(sensor_id, branch_id)
            .await?
            .ok_or(AttendanceError::EmployeeNotFound {
                sensor_id,
                branch_id,
            })?;

        let today = event_time.date();
        let time = whole_seconds(event_time.time());

        let _guard = self.locks.lock((employee.id, today)).await;

        let current = self.ledger.get_record(employee.id, today).await?;
        let state = DayState::of(current.as_ref());
        debug!(
            employee_id = employee.id,
            %today,
            ?state,
            in_flight = self.locks.active(),
            "Applying attendance event"
        );

        let (action, record) = match (state, current) {
            (DayState::Present, Some(record)) => self.check_out(record, time).await?,
            (DayState::Closed, Some(record)) => (AttendanceAction::AlreadyRecorded, record),
            _ => self.check_in(employee.id, today, time).await?,
        };

        info!(
            employee_id = employee.id,
            sensor_id,
            branch_id,
            %today,
            action = %action,
            "Attendance event recorded"
        );

        Ok(AttendanceOutcome {
            action,
            employee,
            record,
        })
    }

    async fn check_in(
        &self,
        employee_id: u64,
        today: NaiveDate,
        time: NaiveTime,
    ) -> Result<(AttendanceAction, AttendanceRecord), AttendanceError> {
        match self.ledger.create_record(employee_id, today, time).await {
            Ok(record) => Ok((AttendanceAction::CheckIn, record)),
            Err(AttendanceError::DuplicateRecord { .. }) => {
                warn!(employee_id, %today, "Check-in raced with another writer");
                let record = self.ledger.get_record(employee_id, today).await?.ok_or(
                    AttendanceError::DuplicateRecord {
                        employee_id,
                        date: today,
                    },
                )?;
                Ok((AttendanceAction::AlreadyRecorded, record))
            }
            Err(e) => Err(e),
        }
    }

    async fn check_out(
        &self,
        record: AttendanceRecord,
        time: NaiveTime,
    ) -> Result<(AttendanceAction, AttendanceRecord), AttendanceError> {
        // Keep check-in <= check-out even if the terminal clock went backwards.
        let check_out = match record.check_in {
            Some(check_in) if time < check_in => {
                warn!(record_id = record.id, %check_in, %time, "Check-out before check-in, clamping");
                check_in
            }
            _ => time,
        };

        match self.ledger.set_check_out(record.id, check_out).await {
            Ok(updated) => Ok((AttendanceAction::CheckOut, updated)),
            Err(AttendanceError::AlreadyClosed { record_id }) => {
                warn!(record_id, "Check-out raced with another writer");
                let current = self
                    .ledger
                    .get_record(record.employee_id, record.date)
                    .await?
                    .ok_or(AttendanceError::RecordNotFound { record_id })?;
                Ok((AttendanceAction::AlreadyRecorded, current))
            }
            Err(e) => Err(e),
        }
    }
}

fn whole_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}
