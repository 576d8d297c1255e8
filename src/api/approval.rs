use crate::auth::auth::AuthUser;
use crate::errors::ApiError;
use crate::model::approval::ApprovalRecord;
use crate::model::attendance_request::{Decision, RequestType};
use crate::service::approvals::{self, ApprovalHistoryEntry, DecisionInput};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct SubmitDecision {
    #[schema(example = "3f1c8a0e-9d2b-4f6a-8c3d-5e7f9a1b2c4d")]
    pub request_id: String,
    /// Approver user id; omitted when the caller's session has not cached
    /// one yet, in which case the authenticated identity is used.
    pub approver_user_id: Option<String>,
    #[schema(example = "APPROVED")]
    pub decision: Decision,
    #[schema(example = "ok")]
    pub comment: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateApproval {
    #[schema(example = "REJECTED")]
    pub decision: Decision,
    pub comment: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct HistoryFilter {
    #[schema(example = "APPROVED")]
    /// Filter by decision
    pub decision: Option<Decision>,
    #[schema(example = "LEAVE")]
    /// Filter by originating request type
    pub request_type: Option<RequestType>,
}

/// Picks the approver identity the decision will be recorded under: the
/// explicit id from the payload when the caller has one cached, otherwise
/// the authenticated user. Either way the id must resolve to a stored user.
pub async fn resolve_approver_identity(
    pool: &MySqlPool,
    auth: &AuthUser,
    explicit: Option<String>,
) -> Result<String, ApiError> {
    let candidate = match explicit {
        Some(id) if !id.trim().is_empty() => id,
        _ => auth.user_id.clone(),
    };

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ? LIMIT 1)",
    )
    .bind(&candidate)
    .fetch_one(pool)
    .await?;

    if !exists {
        return Err(ApiError::not_found("Approver user"));
    }

    Ok(candidate)
}

/* =========================
Record a decision
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/attendance-approvals",
    request_body(
        content = SubmitDecision,
        description = "Decision payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Decision recorded", body = ApprovalRecord),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance request or approver not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
pub async fn record_decision(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SubmitDecision>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let payload = payload.into_inner();

    let approver_user_id =
        resolve_approver_identity(pool.get_ref(), &auth, payload.approver_user_id).await?;

    let record = approvals::record_decision(
        pool.get_ref(),
        DecisionInput {
            request_id: payload.request_id,
            approver_user_id,
            decision: payload.decision,
            comment: payload.comment.unwrap_or_default(),
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(record))
}

/* =========================
Approval history
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/attendance-approvals",
    params(HistoryFilter),
    responses(
        (status = 200, description = "Approval history, newest first", body = [ApprovalHistoryEntry]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
pub async fn approval_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HistoryFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let history =
        approvals::approval_history(pool.get_ref(), query.decision, query.request_type).await?;

    Ok(HttpResponse::Ok().json(history))
}

/* =========================
Correct an approval record
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/attendance-approvals/{approval_id}",
    params(
        ("approval_id" = String, Path, description = "ID of the approval record to correct")
    ),
    request_body = UpdateApproval,
    responses(
        (status = 200, description = "Approval record updated", body = ApprovalRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Approval record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
pub async fn update_approval(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<UpdateApproval>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let approval_id = path.into_inner();

    let record = approvals::update_approval(
        pool.get_ref(),
        &approval_id,
        payload.decision,
        payload.comment.as_deref().unwrap_or_default(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(record))
}

/* =========================
Delete an approval record
========================= */
#[utoipa::path(
    delete,
    path = "/api/v1/attendance-approvals/{approval_id}",
    params(
        ("approval_id" = String, Path, description = "ID of the approval record to delete")
    ),
    responses(
        (status = 200, description = "Approval record deleted", body = Object, example = json!({
            "message": "Approval record deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Approval record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Approvals"
)]
pub async fn delete_approval(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let approval_id = path.into_inner();

    approvals::delete_approval(pool.get_ref(), &approval_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Approval record deleted"
    })))
}
