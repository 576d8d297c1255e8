use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One recorded decision against an attendance request. A request may carry
/// several of these; the request row's status reflects the latest one.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ApprovalRecord {
    pub id: String,
    pub request_id: String,
    pub approver_user_id: String,
    #[schema(example = "APPROVED")]
    pub decision: String,
    pub comment: String,
    #[schema(example = "2024-01-12T09:30:00Z", value_type = String, format = "date-time")]
    pub decided_at: DateTime<Utc>,
}
