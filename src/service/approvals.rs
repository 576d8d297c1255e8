//! Approval recording service: the only writer of attendance request status.
//!
//! Every decision becomes one row in `attendance_request_approvals` plus a
//! status overwrite on the request, committed as a single transaction.
//! Concurrent decisions on the same request are not serialized here; the last
//! committed write determines the stored status and every decision row is
//! kept.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::model::approval::ApprovalRecord;
use crate::model::attendance_request::{AttendanceRequest, Decision, RequestStatus, RequestType};

pub struct DecisionInput {
    pub request_id: String,
    pub approver_user_id: String,
    pub decision: Decision,
    pub comment: String,
}

/// Records one decision: inserts the approval row and overwrites the
/// request's status with the decision value.
///
/// The request must exist; the approver id is resolved and validated by the
/// caller. There is no PENDING precondition: an already-decided request can
/// be re-decided, each call adds a row and the latest commit wins.
pub async fn record_decision(
    pool: &MySqlPool,
    input: DecisionInput,
) -> Result<ApprovalRecord, ApiError> {
    if input.request_id.trim().is_empty() {
        return Err(ApiError::Validation("request_id must not be empty".into()));
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM attendance_requests WHERE id = ? LIMIT 1)",
    )
    .bind(&input.request_id)
    .fetch_one(pool)
    .await?;

    if !exists {
        return Err(ApiError::not_found("Attendance request"));
    }

    let record = ApprovalRecord {
        id: Uuid::new_v4().to_string(),
        request_id: input.request_id,
        approver_user_id: input.approver_user_id,
        decision: input.decision.to_string(),
        comment: input.comment,
        decided_at: Utc::now(),
    };

    // One logical decision: the approval row and the status overwrite
    // commit together or not at all.
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO attendance_request_approvals
            (id, request_id, approver_user_id, decision, comment, decided_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.request_id)
    .bind(&record.approver_user_id)
    .bind(&record.decision)
    .bind(&record.comment)
    .bind(record.decided_at)
    .execute(&mut *tx)
    .await?;

    // No status precondition and no row lock: last committed writer wins.
    sqlx::query("UPDATE attendance_requests SET status = ? WHERE id = ?")
        .bind(input.decision.as_status().to_string())
        .bind(&record.request_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        request_id = %record.request_id,
        approver = %record.approver_user_id,
        decision = %record.decision,
        "Decision recorded"
    );

    Ok(record)
}

/// All PENDING requests, oldest first, optionally restricted to one type.
pub async fn list_pending(
    pool: &MySqlPool,
    request_type: Option<RequestType>,
) -> Result<Vec<AttendanceRequest>, ApiError> {
    let mut sql = String::from(
        r#"
        SELECT id, user_id, request_type, start_date, end_date, reason, status, created_at
        FROM attendance_requests
        WHERE status = 'PENDING'
        "#,
    );
    if request_type.is_some() {
        sql.push_str(" AND request_type = ?");
    }
    sql.push_str(" ORDER BY created_at ASC");

    let mut q = sqlx::query_as::<_, AttendanceRequest>(&sql);
    if let Some(t) = request_type {
        q = q.bind(t.to_string());
    }

    Ok(q.fetch_all(pool).await?)
}

#[derive(Default)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub request_type: Option<RequestType>,
    pub user_id: Option<String>,
}

/// WHERE clause + bind values for a request listing. Every bind is a string,
/// appended in clause order.
fn build_request_where(filter: &RequestFilter) -> (String, Vec<String>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<String> = Vec::new();

    if let Some(status) = filter.status {
        where_sql.push_str(" AND status = ?");
        args.push(status.to_string());
    }

    if let Some(request_type) = filter.request_type {
        where_sql.push_str(" AND request_type = ?");
        args.push(request_type.to_string());
    }

    if let Some(user_id) = &filter.user_id {
        where_sql.push_str(" AND user_id = ?");
        args.push(user_id.clone());
    }

    (where_sql, args)
}

/// Filtered, paginated request listing; also the context source the history
/// view reconstructs requester details from.
pub async fn list_all(
    pool: &MySqlPool,
    filter: &RequestFilter,
    page: u64,
    per_page: u64,
) -> Result<(Vec<AttendanceRequest>, i64), ApiError> {
    let offset = (page - 1) * per_page;
    let (where_sql, args) = build_request_where(filter);

    let count_sql = format!("SELECT COUNT(*) FROM attendance_requests{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = count_q.bind(arg);
    }
    let total = count_q.fetch_one(pool).await?;

    let data_sql = format!(
        r#"
        SELECT id, user_id, request_type, start_date, end_date, reason, status, created_at
        FROM attendance_requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, AttendanceRequest>(&data_sql);
    for arg in args {
        data_q = data_q.bind(arg);
    }

    let requests = data_q.bind(per_page).bind(offset).fetch_all(pool).await?;

    Ok((requests, total))
}

/// Raw join row behind the history view. Request context is nullable: the
/// request may have been deleted after the decision was recorded.
#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: String,
    request_id: String,
    approver_user_id: String,
    decision: String,
    comment: String,
    decided_at: DateTime<Utc>,
    request_type: Option<String>,
    reason: Option<String>,
    requester_id: Option<String>,
    requester_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalHistoryEntry {
    pub id: String,
    pub request_id: String,
    pub approver_user_id: String,
    #[schema(example = "APPROVED")]
    pub decision: String,
    pub comment: String,
    #[schema(value_type = String, format = "date-time")]
    pub decided_at: DateTime<Utc>,
    #[schema(example = "LEAVE")]
    pub request_type: String,
    pub reason: Option<String>,
    pub requester_id: Option<String>,
    #[schema(example = "Jane Doe")]
    pub requester_name: String,
}

/// Substitutes placeholder context when the originating request (or its
/// requester) is gone, so one orphaned approval cannot fail the listing.
fn reconcile(row: HistoryRow) -> ApprovalHistoryEntry {
    ApprovalHistoryEntry {
        id: row.id,
        request_id: row.request_id,
        approver_user_id: row.approver_user_id,
        decision: row.decision,
        comment: row.comment,
        decided_at: row.decided_at,
        request_type: row.request_type.unwrap_or_else(|| "UNKNOWN".into()),
        reason: row.reason,
        requester_id: row.requester_id,
        requester_name: row.requester_name.unwrap_or_else(|| "Unknown".into()),
    }
}

/// Approval records joined back to request and requester context, newest
/// decision first. A request_type filter excludes records whose request is
/// missing, since their type cannot be known.
pub async fn approval_history(
    pool: &MySqlPool,
    decision: Option<Decision>,
    request_type: Option<RequestType>,
) -> Result<Vec<ApprovalHistoryEntry>, ApiError> {
    let mut sql = String::from(
        r#"
        SELECT
            a.id, a.request_id, a.approver_user_id, a.decision, a.comment, a.decided_at,
            r.request_type AS request_type,
            r.reason AS reason,
            r.user_id AS requester_id,
            u.name AS requester_name
        FROM attendance_request_approvals a
        LEFT JOIN attendance_requests r ON r.id = a.request_id
        LEFT JOIN users u ON u.id = r.user_id
        WHERE 1=1
        "#,
    );

    let mut args: Vec<String> = Vec::new();
    if let Some(d) = decision {
        sql.push_str(" AND a.decision = ?");
        args.push(d.to_string());
    }
    if let Some(t) = request_type {
        sql.push_str(" AND r.request_type = ?");
        args.push(t.to_string());
    }
    sql.push_str(" ORDER BY a.decided_at DESC");

    let mut q = sqlx::query_as::<_, HistoryRow>(&sql);
    for arg in args {
        q = q.bind(arg);
    }

    let rows = q.fetch_all(pool).await?;
    Ok(rows.into_iter().map(reconcile).collect())
}

/// Administrative correction: overwrites decision/comment on one approval
/// record. The linked request keeps whatever status it has.
pub async fn update_approval(
    pool: &MySqlPool,
    approval_id: &str,
    decision: Decision,
    comment: &str,
) -> Result<ApprovalRecord, ApiError> {
    if approval_id.trim().is_empty() {
        return Err(ApiError::Validation("approval_id must not be empty".into()));
    }

    let result = sqlx::query(
        "UPDATE attendance_request_approvals SET decision = ?, comment = ? WHERE id = ?",
    )
    .bind(decision.to_string())
    .bind(comment)
    .bind(approval_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Approval record"));
    }

    let record = sqlx::query_as::<_, ApprovalRecord>(
        r#"
        SELECT id, request_id, approver_user_id, decision, comment, decided_at
        FROM attendance_request_approvals
        WHERE id = ?
        "#,
    )
    .bind(approval_id)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// Administrative correction: removes one approval record permanently. The
/// linked request keeps whatever status it has.
pub async fn delete_approval(pool: &MySqlPool, approval_id: &str) -> Result<(), ApiError> {
    if approval_id.trim().is_empty() {
        return Err(ApiError::Validation("approval_id must not be empty".into()));
    }

    let result = sqlx::query("DELETE FROM attendance_request_approvals WHERE id = ?")
        .bind(approval_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Approval record"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn empty_filter_builds_bare_where() {
        let (sql, args) = build_request_where(&RequestFilter::default());
        assert_eq!(sql, " WHERE 1=1");
        assert!(args.is_empty());
    }

    #[test]
    fn full_filter_binds_in_clause_order() {
        let filter = RequestFilter {
            status: Some(RequestStatus::Pending),
            request_type: Some(RequestType::Wfh),
            user_id: Some("u-1".into()),
        };
        let (sql, args) = build_request_where(&filter);
        assert_eq!(
            sql,
            " WHERE 1=1 AND status = ? AND request_type = ? AND user_id = ?"
        );
        assert_eq!(args, vec!["PENDING", "WFH", "u-1"]);
    }

    #[test]
    fn reconcile_substitutes_placeholders_for_missing_request() {
        let entry = reconcile(HistoryRow {
            id: "a-1".into(),
            request_id: "r-gone".into(),
            approver_user_id: "mgr-1".into(),
            decision: "APPROVED".into(),
            comment: "ok".into(),
            decided_at: Utc::now(),
            request_type: None,
            reason: None,
            requester_id: None,
            requester_name: None,
        });

        assert_eq!(entry.request_type, "UNKNOWN");
        assert_eq!(entry.requester_name, "Unknown");
        assert_eq!(entry.requester_id, None);
        assert_eq!(entry.decision, "APPROVED");
    }

    #[test]
    fn reconcile_keeps_real_context() {
        let entry = reconcile(HistoryRow {
            id: "a-2".into(),
            request_id: "r-1".into(),
            approver_user_id: "mgr-1".into(),
            decision: "REJECTED".into(),
            comment: "overlaps release".into(),
            decided_at: Utc::now(),
            request_type: Some("LEAVE".into()),
            reason: Some("family event".into()),
            requester_id: Some("u-9".into()),
            requester_name: Some("Jane Doe".into()),
        });

        assert_eq!(entry.request_type, "LEAVE");
        assert_eq!(entry.requester_name, "Jane Doe");
        assert_eq!(entry.reason.as_deref(), Some("family event"));
    }

    // ------------------------------------------------------------------
    // DB-backed workflow tests. They run against the schema in migrations/
    // and are skipped unless a MySQL server is reachable via DATABASE_URL.
    // ------------------------------------------------------------------

    async fn test_pool() -> MySqlPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for DB tests");
        MySqlPool::connect(&url)
            .await
            .expect("failed to connect to test database")
    }

    async fn seed_user(pool: &MySqlPool, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO users (id, name, email, password, role_id) VALUES (?, ?, ?, 'x', 3)",
        )
        .bind(&id)
        .bind(name)
        .bind(format!("{}@example.com", Uuid::new_v4()))
        .execute(pool)
        .await
        .unwrap();
        id
    }

    async fn seed_request(pool: &MySqlPool, user_id: &str, request_type: RequestType) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO attendance_requests
                (id, user_id, request_type, start_date, end_date, reason, status)
            VALUES (?, ?, ?, ?, ?, ?, 'PENDING')
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(request_type.to_string())
        .bind(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
        .bind(NaiveDate::from_ymd_opt(2024, 1, 12).unwrap())
        .bind(Some("family event"))
        .execute(pool)
        .await
        .unwrap();
        id
    }

    async fn request_status(pool: &MySqlPool, request_id: &str) -> String {
        sqlx::query_scalar("SELECT status FROM attendance_requests WHERE id = ?")
            .bind(request_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn approvals_for(pool: &MySqlPool, request_id: &str) -> Vec<ApprovalRecord> {
        sqlx::query_as(
            r#"
            SELECT id, request_id, approver_user_id, decision, comment, decided_at
            FROM attendance_request_approvals
            WHERE request_id = ?
            ORDER BY decided_at ASC
            "#,
        )
        .bind(request_id)
        .fetch_all(pool)
        .await
        .unwrap()
    }

    fn decision_input(request_id: &str, approver: &str, decision: Decision, comment: &str) -> DecisionInput {
        DecisionInput {
            request_id: request_id.into(),
            approver_user_id: approver.into(),
            decision,
            comment: comment.into(),
        }
    }

    #[actix_web::test]
    #[ignore = "requires a MySQL database (DATABASE_URL)"]
    async fn approving_pending_request_sets_status_and_creates_one_record() {
        let pool = test_pool().await;
        let requester = seed_user(&pool, "Requester").await;
        let approver = seed_user(&pool, "Approver").await;
        let request_id = seed_request(&pool, &requester, RequestType::Leave).await;

        let record = record_decision(
            &pool,
            decision_input(&request_id, &approver, Decision::Approved, "ok"),
        )
        .await
        .unwrap();

        assert_eq!(record.request_id, request_id);
        assert_eq!(record.decision, "APPROVED");
        assert_eq!(request_status(&pool, &request_id).await, "APPROVED");
        assert_eq!(approvals_for(&pool, &request_id).await.len(), 1);
    }

    #[actix_web::test]
    #[ignore = "requires a MySQL database (DATABASE_URL)"]
    async fn deciding_nonexistent_request_fails_without_side_effects() {
        let pool = test_pool().await;
        let approver = seed_user(&pool, "Approver").await;
        let bogus = Uuid::new_v4().to_string();

        let err = record_decision(
            &pool,
            decision_input(&bogus, &approver, Decision::Approved, "x"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(approvals_for(&pool, &bogus).await.is_empty());
    }

    #[actix_web::test]
    #[ignore = "requires a MySQL database (DATABASE_URL)"]
    async fn re_deciding_adds_a_record_and_last_decision_wins() {
        // Documented gap: no duplicate-decision guard, status is overwritten.
        let pool = test_pool().await;
        let requester = seed_user(&pool, "Requester").await;
        let approver = seed_user(&pool, "Approver").await;
        let request_id = seed_request(&pool, &requester, RequestType::Wfh).await;

        record_decision(
            &pool,
            decision_input(&request_id, &approver, Decision::Approved, "first"),
        )
        .await
        .unwrap();
        record_decision(
            &pool,
            decision_input(&request_id, &approver, Decision::Rejected, "second"),
        )
        .await
        .unwrap();

        assert_eq!(approvals_for(&pool, &request_id).await.len(), 2);
        assert_eq!(request_status(&pool, &request_id).await, "REJECTED");
    }

    #[actix_web::test]
    #[ignore = "requires a MySQL database (DATABASE_URL)"]
    async fn updating_a_record_leaves_request_status_alone() {
        let pool = test_pool().await;
        let requester = seed_user(&pool, "Requester").await;
        let approver = seed_user(&pool, "Approver").await;
        let request_id = seed_request(&pool, &requester, RequestType::Leave).await;

        let record = record_decision(
            &pool,
            decision_input(&request_id, &approver, Decision::Approved, "ok"),
        )
        .await
        .unwrap();

        let updated = update_approval(&pool, &record.id, Decision::Rejected, "corrected").await.unwrap();

        assert_eq!(updated.decision, "REJECTED");
        assert_eq!(updated.comment, "corrected");
        // Correction does not flow back into the request row.
        assert_eq!(request_status(&pool, &request_id).await, "APPROVED");
    }

    #[actix_web::test]
    #[ignore = "requires a MySQL database (DATABASE_URL)"]
    async fn deleting_a_record_removes_it_from_history_only() {
        let pool = test_pool().await;
        let requester = seed_user(&pool, "Requester").await;
        let approver = seed_user(&pool, "Approver").await;
        let request_id = seed_request(&pool, &requester, RequestType::Other).await;

        let record = record_decision(
            &pool,
            decision_input(&request_id, &approver, Decision::Rejected, "no"),
        )
        .await
        .unwrap();

        delete_approval(&pool, &record.id).await.unwrap();

        let history = approval_history(&pool, None, None).await.unwrap();
        assert!(history.iter().all(|h| h.id != record.id));
        assert_eq!(request_status(&pool, &request_id).await, "REJECTED");

        let err = delete_approval(&pool, &record.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[actix_web::test]
    #[ignore = "requires a MySQL database (DATABASE_URL)"]
    async fn pending_listing_respects_type_filter() {
        let pool = test_pool().await;
        let requester = seed_user(&pool, "Requester").await;
        let leave_id = seed_request(&pool, &requester, RequestType::Leave).await;
        let wfh_id = seed_request(&pool, &requester, RequestType::Wfh).await;

        let all = list_pending(&pool, None).await.unwrap();
        assert!(all.iter().all(|r| r.status == "PENDING"));
        assert!(all.iter().any(|r| r.id == leave_id));
        assert!(all.iter().any(|r| r.id == wfh_id));

        let leave_only = list_pending(&pool, Some(RequestType::Leave)).await.unwrap();
        assert!(leave_only.iter().any(|r| r.id == leave_id));
        assert!(leave_only.iter().all(|r| r.request_type == "LEAVE"));
    }

    #[actix_web::test]
    #[ignore = "requires a MySQL database (DATABASE_URL)"]
    async fn end_to_end_approval_shows_up_in_listing_and_history() {
        let pool = test_pool().await;
        let requester = seed_user(&pool, "U1").await;
        let approver = seed_user(&pool, "A1").await;
        let request_id = seed_request(&pool, &requester, RequestType::Leave).await;

        record_decision(
            &pool,
            decision_input(&request_id, &approver, Decision::Approved, "ok"),
        )
        .await
        .unwrap();

        let filter = RequestFilter {
            status: Some(RequestStatus::Approved),
            ..Default::default()
        };
        let (approved, _total) = list_all(&pool, &filter, 1, 100).await.unwrap();
        assert!(approved.iter().any(|r| r.id == request_id));

        let history = approval_history(&pool, None, None).await.unwrap();
        let entry = history
            .iter()
            .find(|h| h.request_id == request_id)
            .expect("decision missing from history");
        assert_eq!(entry.decision, "APPROVED");
        assert_eq!(entry.comment, "ok");
        assert_eq!(entry.requester_name, "U1");
    }

    #[actix_web::test]
    #[ignore = "requires a MySQL database (DATABASE_URL)"]
    async fn concurrent_decisions_race_and_both_records_persist() {
        let pool = test_pool().await;
        let requester = seed_user(&pool, "Requester").await;
        let a1 = seed_user(&pool, "Approver1").await;
        let a2 = seed_user(&pool, "Approver2").await;
        let request_id = seed_request(&pool, &requester, RequestType::ShiftChange).await;

        let approve = record_decision(
            &pool,
            decision_input(&request_id, &a1, Decision::Approved, "yes"),
        );
        let reject = record_decision(
            &pool,
            decision_input(&request_id, &a2, Decision::Rejected, "no"),
        );

        let (r1, r2) = futures::join!(approve, reject);
        r1.unwrap();
        r2.unwrap();

        assert_eq!(approvals_for(&pool, &request_id).await.len(), 2);
        let status = request_status(&pool, &request_id).await;
        assert!(status == "APPROVED" || status == "REJECTED");
    }
}
