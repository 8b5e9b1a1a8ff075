use crate::config::Config;
use crate::error::AttendanceError;
use crate::service::tracker::{AttendanceAction, AttendanceOutcome, AttendanceTracker};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use utoipa::ToSchema;

pub const TERMINAL_KEY_HEADER: &str = "X-Terminal-Key";

/// Fingerprint match reported by a terminal.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEvent {
    #[serde(alias = "sensor_id")]
    #[schema(example = 2)]
    pub sensor_id: u32,
    #[serde(alias = "branch_id")]
    #[schema(example = 1)]
    pub branch_id: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "María López")]
    pub employee_name: String,
    pub action: AttendanceAction,
    #[schema(example = "08:00:00", nullable = true)]
    pub check_in: Option<String>,
    #[schema(example = "17:00:00", nullable = true)]
    pub check_out: Option<String>,
}

impl From<AttendanceOutcome> for AttendanceResponse {
    fn from(outcome: AttendanceOutcome) -> Self {
        Self {
            status: "ok".to_string(),
            check_in: outcome.record.check_in_display(),
            check_out: outcome.record.check_out_display(),
            employee_name: outcome.employee.name,
            action: outcome.action,
        }
    }
}

fn terminal_authorized(req: &HttpRequest, config: &Config) -> bool {
    match &config.terminal_api_key {
        None => true,
        Some(expected) => req
            .headers()
            .get(TERMINAL_KEY_HEADER)
            .and_then(|h| h.to_str().ok())
            .is_some_and(|given| given == expected),
    }
}

/// Record a fingerprint event
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = AttendanceEvent,
    responses(
        (status = 200, description = "Event classified and applied", body = AttendanceResponse),
        (status = 401, description = "Missing or wrong terminal key"),
        (status = 404, description = "No employee for this sensor at this branch", body = Object, example = json!({
            "status": "error",
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn record_attendance(
    req: HttpRequest,
    tracker: web::Data<AttendanceTracker>,
    config: web::Data<Config>,
    payload: web::Json<AttendanceEvent>,
) -> actix_web::Result<impl Responder> {
    if !terminal_authorized(&req, &config) {
        return Ok(HttpResponse::Unauthorized().json(json!({
            "status": "error",
            "message": "Unknown terminal"
        })));
    }

    let AttendanceEvent {
        sensor_id,
        branch_id,
    } = payload.into_inner();

    let outcome = tracker
        .record_event_now(sensor_id, branch_id)
        .await
        .map_err(|e| {
            match &e {
                AttendanceError::EmployeeNotFound { .. } => {
                    info!(sensor_id, branch_id, "Scan from unregistered sensor")
                }
                _ => error!(error = %e, sensor_id, branch_id, "Failed to record attendance"),
            }
            e
        })?;

    Ok(HttpResponse::Ok().json(AttendanceResponse::from(outcome)))
}
