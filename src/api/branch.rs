use crate::auth::auth::AuthUser;
use crate::model::{
    attendance::{BranchAttendanceRow, DATE_FORMAT, format_time},
    branch::Branch,
    employee::Employee,
};
use crate::service::reports::BranchReports;
use actix_web::{
    HttpResponse, Responder,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRowResponse {
    #[schema(example = 2)]
    pub employee_id: u64,
    #[schema(example = "María López")]
    pub employee_name: String,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub date: String,
    #[schema(example = "08:00:00", nullable = true)]
    pub check_in: Option<String>,
    #[schema(example = "17:00:00", nullable = true)]
    pub check_out: Option<String>,
}

impl From<BranchAttendanceRow> for AttendanceRowResponse {
    fn from(row: BranchAttendanceRow) -> Self {
        Self {
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            date: row.date.format(DATE_FORMAT).to_string(),
            check_in: format_time(row.check_in),
            check_out: format_time(row.check_out),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BranchDetailResponse {
    pub branch: Branch,
    pub employees: Vec<Employee>,
    pub attendance: Vec<AttendanceRowResponse>,
}

/// Branches visible to the caller
#[utoipa::path(
    get,
    path = "/api/branches",
    responses(
        (status = 200, description = "All branches for owners, own branch for admins", body = [Branch]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Branch",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_branches(
    auth: AuthUser,
    reports: web::Data<BranchReports>,
) -> actix_web::Result<impl Responder> {
    let branches = reports.visible_branches(&auth).await?;
    Ok(HttpResponse::Ok().json(branches))
}

/// Branch detail with employees and attendance
#[utoipa::path(
    get,
    path = "/api/branches/{branch_id}",
    params(
        ("branch_id", Path, description = "Branch ID")
    ),
    responses(
        (status = 200, description = "Branch found", body = BranchDetailResponse),
        (status = 403, description = "Branch outside the caller's scope"),
        (status = 404, description = "Branch not found", body = Object, example = json!({
            "message": "Branch not found"
        }))
    ),
    tag = "Branch",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_branch(
    auth: AuthUser,
    reports: web::Data<BranchReports>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let overview = reports.branch_overview(&auth, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(BranchDetailResponse {
        branch: overview.branch,
        employees: overview.employees,
        attendance: overview.attendance.into_iter().map(Into::into).collect(),
    }))
}

/// Download branch attendance as a spreadsheet or CSV
#[utoipa::path(
    get,
    path = "/api/branches/{branch_id}/export/{format}",
    params(
        ("branch_id", Path, description = "Branch ID"),
        ("format", Path, description = "`excel`, `xlsx` or `csv`")
    ),
    responses(
        (status = 200, description = "Attendance file, or an empty notice when there is nothing to export", body = Object, example = json!({
            "status": "empty",
            "message": "No attendance records to export"
        })),
        (status = 400, description = "Unsupported format"),
        (status = 403, description = "Branch outside the caller's scope"),
        (status = 404, description = "Branch not found")
    ),
    tag = "Branch",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn export_branch(
    auth: AuthUser,
    reports: web::Data<BranchReports>,
    path: web::Path<(u64, String)>,
) -> actix_web::Result<impl Responder> {
    let (branch_id, format) = path.into_inner();

    let file = match reports.export(&auth, branch_id, &format).await? {
        Some(file) => file,
        None => {
            return Ok(HttpResponse::Ok().json(json!({
                "status": "empty",
                "message": "No attendance records to export"
            })));
        }
    };

    Ok(HttpResponse::Ok()
        .content_type(file.format.content_type())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file.file_name)],
        })
        .body(file.bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{jwt::generate_access_token, middleware::auth_middleware};
    use crate::config::Config;
    use crate::model::role::Role;
    use crate::store::{AttendanceLedger, memory::MemoryStore};
    use actix_web::{App, http::StatusCode, middleware::from_fn, test};
    use chrono::{NaiveDate, NaiveTime};
    use std::sync::Arc;

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_branch(1, "Central");
        store.add_branch(2, "Norte");
        store.add_employee(1, "Juan Pérez", 1, 1);
        store.add_employee(2, "María López", 2, 1);

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let record = store
            .create_record(2, date, NaiveTime::from_hms_opt(8, 0, 0).unwrap())
            .await
            .unwrap();
        store
            .set_check_out(record.id, NaiveTime::from_hms_opt(17, 0, 0).unwrap())
            .await
            .unwrap();
        store
            .create_record(1, date, NaiveTime::from_hms_opt(9, 0, 0).unwrap())
            .await
            .unwrap();
        store
    }

    fn bearer(role: Role, branch_id: Option<u64>) -> (&'static str, String) {
        let config = Config::for_tests();
        let token = generate_access_token(
            1,
            "someone@company.com".into(),
            role.id(),
            branch_id,
            &config.jwt_secret,
            60,
        )
        .unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    macro_rules! branch_app {
        ($store:expr) => {{
            let reports = BranchReports::new($store.clone(), $store.clone(), $store.clone());
            test::init_service(
                App::new()
                    .app_data(web::Data::new(reports))
                    .app_data(web::Data::new(Config::for_tests()))
                    .service(
                        web::scope("/api")
                            .wrap(from_fn(auth_middleware))
                            .route("/branches", web::get().to(list_branches))
                            .route("/branches/{id}", web::get().to(get_branch))
                            .route(
                                "/branches/{id}/export/{format}",
                                web::get().to(export_branch),
                            ),
                    ),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let store = seeded().await;
        let app = branch_app!(store);

        let req = test::TestRequest::get().uri("/api/branches").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn owner_dashboard_lists_all_branches() {
        let store = seeded().await;
        let app = branch_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/branches")
            .insert_header(bearer(Role::Owner, None))
            .to_request();
        let branches: Vec<Branch> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(branches.len(), 2);
    }

    #[actix_web::test]
    async fn branch_detail_renders_times() {
        let store = seeded().await;
        let app = branch_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/branches/1")
            .insert_header(bearer(Role::Admin, Some(1)))
            .to_request();
        let detail: BranchDetailResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(detail.branch.name, "Central");
        assert_eq!(detail.employees.len(), 2);
        let maria = detail
            .attendance
            .iter()
            .find(|r| r.employee_name == "María López")
            .unwrap();
        assert_eq!(maria.date, "2026-03-02");
        assert_eq!(maria.check_out.as_deref(), Some("17:00:00"));
    }

    #[actix_web::test]
    async fn admin_cannot_open_other_branch() {
        let store = seeded().await;
        let app = branch_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/branches/1")
            .insert_header(bearer(Role::Admin, Some(2)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn csv_export_is_an_attachment() {
        let store = seeded().await;
        let app = branch_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/branches/1/export/csv")
            .insert_header(bearer(Role::Owner, None))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get("content-disposition")
            .and_then(|h| h.to_str().ok())
            .unwrap()
            .to_string();
        assert!(disposition.contains("attendance.csv"));

        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("Employee,Date,Check-in time,Check-out time"));
        assert!(text.contains("Juan Pérez,2026-03-02,09:00:00,\n"));
        assert!(text.contains("María López,2026-03-02,08:00:00,17:00:00"));
    }

    #[actix_web::test]
    async fn export_of_branch_without_attendance_is_empty_notice() {
        let store = seeded().await;
        let app = branch_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/branches/2/export/excel")
            .insert_header(bearer(Role::Owner, None))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "empty");
    }

    #[actix_web::test]
    async fn unsupported_format_is_bad_request() {
        let store = seeded().await;
        let app = branch_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/branches/1/export/pdf")
            .insert_header(bearer(Role::Owner, None))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn branch_checks_come_before_format_checks() {
        let store = seeded().await;
        let app = branch_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/branches/9/export/pdf")
            .insert_header(bearer(Role::Owner, None))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/api/branches/1/export/pdf")
            .insert_header(bearer(Role::Admin, Some(2)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
