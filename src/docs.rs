use crate::api::approval::{HistoryFilter, SubmitDecision, UpdateApproval};
use crate::api::attendance_request::{
    AttendanceRequestFilter, AttendanceRequestListResponse, CreateAttendanceRequest, PendingFilter,
};
use crate::api::project::{
    CreateProject, OwnerAssign, OwnerResponse, ProjectListResponse, ProjectQuery,
};
use crate::api::user::{UserListResponse, UserQuery, UserResponse};
use crate::auth::handlers::MeResponse;
use crate::model::approval::ApprovalRecord;
use crate::model::attendance_request::{AttendanceRequest, Decision, RequestStatus, RequestType};
use crate::model::project::Project;
use crate::service::approvals::ApprovalHistoryEntry;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Resource Management System API",
        version = "1.0.0",
        description = r#"
## Resource Management System

This API powers a resource management backend for projects, users and
attendance workflows.

### Key Features
- **Projects**
  - Create, update, list and deactivate projects; assign and remove owners
- **Attendance Requests**
  - Submit leave/WFH/regularization requests and browse them by status
- **Approvals**
  - Record, correct and audit decisions on attendance requests
- **Users**
  - Directory lookups backing the dashboard

### Security
Most endpoints are protected using **JWT Bearer authentication**.
Decision and correction endpoints require the **Admin** or **Manager** role.

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints
"#,
    ),
    paths(
        crate::api::attendance_request::create_request,
        crate::api::attendance_request::list_requests,
        crate::api::attendance_request::pending_requests,
        crate::api::attendance_request::get_request,

        crate::api::approval::record_decision,
        crate::api::approval::approval_history,
        crate::api::approval::update_approval,
        crate::api::approval::delete_approval,

        crate::api::project::create_project,
        crate::api::project::list_projects,
        crate::api::project::get_project,
        crate::api::project::update_project,
        crate::api::project::deactivate_project,
        crate::api::project::assign_owner,
        crate::api::project::list_project_owners,
        crate::api::project::remove_project_owner,

        crate::api::user::list_users,
        crate::api::user::get_user,

        crate::auth::handlers::me
    ),
    components(
        schemas(
            RequestType,
            RequestStatus,
            Decision,
            AttendanceRequest,
            ApprovalRecord,
            ApprovalHistoryEntry,
            CreateAttendanceRequest,
            AttendanceRequestFilter,
            AttendanceRequestListResponse,
            PendingFilter,
            SubmitDecision,
            UpdateApproval,
            HistoryFilter,
            Project,
            CreateProject,
            ProjectQuery,
            ProjectListResponse,
            OwnerAssign,
            OwnerResponse,
            UserResponse,
            UserQuery,
            UserListResponse,
            MeResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance Requests", description = "Attendance request APIs"),
        (name = "Approvals", description = "Approval workflow APIs"),
        (name = "Projects", description = "Project management APIs"),
        (name = "Users", description = "User directory APIs"),
        (name = "Auth", description = "Session and identity APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
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
}
