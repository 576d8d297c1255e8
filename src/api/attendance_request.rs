use crate::auth::auth::AuthUser;
use crate::errors::ApiError;
use crate::model::attendance_request::{AttendanceRequest, RequestStatus, RequestType};
use crate::service::approvals::{self, RequestFilter};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Deserialize, ToSchema)]
pub struct CreateAttendanceRequest {
    #[schema(example = "LEAVE")]
    pub request_type: RequestType,
    #[schema(example = "2024-01-10", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2024-01-12", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    #[schema(example = "family event")]
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceRequestFilter {
    #[schema(example = "PENDING")]
    /// Filter by request status
    pub status: Option<RequestStatus>,
    #[schema(example = "LEAVE")]
    /// Filter by request type
    pub request_type: Option<RequestType>,
    /// Filter by requesting user
    pub user_id: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PendingFilter {
    #[schema(example = "LEAVE")]
    /// Restrict the pending queue to one request type
    pub request_type: Option<RequestType>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceRequestListResponse {
    pub data: Vec<AttendanceRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/* =========================
Create attendance request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/attendance-requests",
    request_body(
        content = CreateAttendanceRequest,
        description = "Attendance request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Attendance request submitted", body = Object, example = json!({
            "id": "3f1c8a0e-9d2b-4f6a-8c3d-5e7f9a1b2c4d",
            "status": "PENDING",
            "message": "Attendance request submitted"
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Requests"
)]
pub async fn create_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAttendanceRequest>,
) -> actix_web::Result<impl Responder> {
    if payload.end_date < payload.start_date {
        return Err(ApiError::Validation("end_date cannot be before start_date".into()).into());
    }

    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO attendance_requests
            (id, user_id, request_type, start_date, end_date, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, 'PENDING')
        "#,
    )
    .bind(&id)
    .bind(&auth.user_id)
    .bind(payload.request_type.to_string())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(&payload.reason)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = %auth.user_id, "Failed to create attendance request");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "id": id,
        "status": "PENDING",
        "message": "Attendance request submitted"
    })))
}

/* =========================
List attendance requests
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/attendance-requests",
    params(AttendanceRequestFilter),
    responses(
        (status = 200, description = "Paginated request list", body = AttendanceRequestListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Requests"
)]
pub async fn list_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceRequestFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);

    let filter = RequestFilter {
        status: query.status,
        request_type: query.request_type,
        user_id: query.user_id.clone(),
    };

    let (requests, total) = approvals::list_all(pool.get_ref(), &filter, page, per_page).await?;

    Ok(HttpResponse::Ok().json(AttendanceRequestListResponse {
        data: requests,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/* =========================
Pending queue
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/attendance-requests/pending",
    params(PendingFilter),
    responses(
        (status = 200, description = "Pending requests, oldest first", body = [AttendanceRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Requests"
)]
pub async fn pending_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PendingFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let pending = approvals::list_pending(pool.get_ref(), query.request_type).await?;

    Ok(HttpResponse::Ok().json(pending))
}

/* =========================
Request details
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/attendance-requests/{request_id}",
    params(
        ("request_id" = String, Path, description = "ID of the attendance request")
    ),
    responses(
        (status = 200, description = "Attendance request found", body = AttendanceRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Attendance request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance Requests"
)]
pub async fn get_request(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();

    let request = sqlx::query_as::<_, AttendanceRequest>(
        r#"
        SELECT id, user_id, request_type, start_date, end_date, reason, status, created_at
        FROM attendance_requests
        WHERE id = ?
        "#,
    )
    .bind(&request_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, request_id, "Failed to fetch attendance request");
        ApiError::from(e)
    })?;

    match request {
        Some(r) => Ok(HttpResponse::Ok().json(r)),
        None => Err(ApiError::not_found("Attendance request").into()),
    }
}
