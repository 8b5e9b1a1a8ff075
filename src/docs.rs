use crate::api::attendance::{AttendanceEvent, AttendanceResponse};
use crate::api::branch::{AttendanceRowResponse, BranchDetailResponse};
use crate::model::{branch::Branch, employee::Employee};
use crate::models::{LoginReqDto, LoginResponse};
use crate::service::tracker::AttendanceAction;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Fingerprint Attendance Tracker

Terminals with a fingerprint sensor report matches; the server keeps one
attendance record per employee and day.

### 🔹 Key Features
- **Ingestion**
  - First scan of the day is a check-in, the second a check-out, anything after is ignored
- **Branches**
  - Owners review every branch, admins only their own
- **Export**
  - Branch attendance as a spreadsheet (`excel`/`xlsx`) or `csv`

### 🔐 Security
Supervisory endpoints use **JWT Bearer authentication** (`POST /auth/login`).
Terminals may be required to send `X-Terminal-Key`.
"#,
    ),
    paths(
        crate::api::attendance::record_attendance,

        crate::api::branch::list_branches,
        crate::api::branch::get_branch,
        crate::api::branch::export_branch,

        crate::auth::handlers::login
    ),
    components(
        schemas(
            AttendanceEvent,
            AttendanceResponse,
            AttendanceAction,
            AttendanceRowResponse,
            BranchDetailResponse,
            Branch,
            Employee,
            LoginReqDto,
            LoginResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Terminal ingestion"),
        (name = "Branch", description = "Dashboard, branch detail and export"),
        (name = "Auth", description = "Supervisor login"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
