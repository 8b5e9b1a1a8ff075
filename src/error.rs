use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::service::export::ExportError;

/// Failures of the attendance state machine and of the stores it drives.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("no employee registered for sensor {sensor_id} at branch {branch_id}")]
    EmployeeNotFound { sensor_id: u32, branch_id: u64 },

    #[error("attendance for employee {employee_id} on {date} already exists")]
    DuplicateRecord { employee_id: u64, date: NaiveDate },

    #[error("attendance record {record_id} is already closed")]
    AlreadyClosed { record_id: u64 },

    #[error("attendance record {record_id} disappeared")]
    RecordNotFound { record_id: u64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::EmployeeNotFound { .. } => StatusCode::NOT_FOUND,
            // Both are folded into `already-recorded` before reaching a handler
            AttendanceError::DuplicateRecord { .. } | AttendanceError::AlreadyClosed { .. } => {
                StatusCode::CONFLICT
            }
            AttendanceError::RecordNotFound { .. } | AttendanceError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AttendanceError::EmployeeNotFound { .. } => "Employee not found",
            AttendanceError::DuplicateRecord { .. } | AttendanceError::AlreadyClosed { .. } => {
                "Attendance already recorded"
            }
            _ => "Something went wrong, Contact with system admin",
        };

        HttpResponse::build(self.status_code()).json(json!({
            "status": "error",
            "message": message
        }))
    }
}

/// Failures of the supervisory views: dashboard, branch detail and export.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("branch {0} not found")]
    BranchNotFound(u64),

    #[error("access to branch {0} denied")]
    Forbidden(u64),

    #[error("unsupported export format `{0}`")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ResponseError for ReportError {
    fn status_code(&self) -> StatusCode {
        match self {
            ReportError::BranchNotFound(_) => StatusCode::NOT_FOUND,
            ReportError::Forbidden(_) => StatusCode::FORBIDDEN,
            ReportError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            ReportError::Export(_) | ReportError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ReportError::BranchNotFound(_) => "Branch not found".to_string(),
            ReportError::Forbidden(_) => "Access denied".to_string(),
            ReportError::UnsupportedFormat(format) => format!("Unsupported format: {format}"),
            _ => "Internal Server Error".to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "message": message
        }))
    }
}
