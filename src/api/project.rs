use crate::auth::auth::AuthUser;
use crate::errors::ApiError;
use crate::model::project::Project;
use crate::model::project_owner::ProjectOwner;
use crate::utils::db_utils::{build_update_sql, execute_update};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Columns a partial update may touch.
const PROJECT_UPDATE_COLUMNS: &[&str] = &["code", "name", "is_active", "start_date", "end_date"];

#[derive(Deserialize, ToSchema)]
pub struct CreateProject {
    #[schema(example = "PRJ-001")]
    pub code: String,
    #[schema(example = "Internal Tooling")]
    pub name: String,
    #[schema(example = true)]
    pub is_active: Option<bool>,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-06-30", format = "date", value_type = String, nullable = true)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ProjectQuery {
    /// Search by name or code
    pub search: Option<String>,
    /// Filter by active flag
    pub is_active: Option<bool>,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    /// Projects starting on or after this date
    pub start_date_from: Option<NaiveDate>,
    #[schema(example = "2024-12-31", format = "date", value_type = String)]
    /// Projects starting on or before this date
    pub start_date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub data: Vec<Project>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 3)]
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct OwnerAssign {
    pub user_id: String,
    #[schema(example = "PM")]
    pub work_role: String,
}

#[derive(Serialize, ToSchema)]
pub struct OwnerResponse {
    pub id: u64,
    pub project_id: String,
    pub user_id: String,
    #[schema(example = "PM")]
    pub work_role: String,
    #[schema(example = "Jane Doe")]
    pub user_name: String,
}

#[derive(sqlx::FromRow)]
struct OwnerRow {
    #[sqlx(flatten)]
    owner: ProjectOwner,
    user_name: Option<String>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    Str(String),
    Bool(bool),
    Date(NaiveDate),
}

async fn project_code_taken(
    pool: &MySqlPool,
    code: &str,
    ignore_id: Option<&str>,
) -> Result<bool, ApiError> {
    let taken = match ignore_id {
        Some(id) => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM projects WHERE code = ? AND id != ? LIMIT 1)",
            )
            .bind(code)
            .bind(id)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM projects WHERE code = ? LIMIT 1)",
            )
            .bind(code)
            .fetch_one(pool)
            .await?
        }
    };
    Ok(taken)
}

async fn fetch_project(pool: &MySqlPool, project_id: &str) -> Result<Option<Project>, ApiError> {
    let project = sqlx::query_as::<_, Project>(
        r#"
        SELECT id, code, name, is_active, start_date, end_date, created_at, updated_at
        FROM projects
        WHERE id = ?
        "#,
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?;
    Ok(project)
}

/* =========================
Create project
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = CreateProject,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Bad request"),
        (status = 409, description = "Duplicate project code"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn create_project(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateProject>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    if let Some(end) = payload.end_date {
        if end < payload.start_date {
            return Err(
                ApiError::Validation("End date cannot be earlier than start date".into()).into(),
            );
        }
    }

    if project_code_taken(pool.get_ref(), &payload.code, None).await? {
        return Err(ApiError::Duplicate(format!(
            "Project with code '{}' already exists",
            payload.code
        ))
        .into());
    }

    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO projects (id, code, name, is_active, start_date, end_date)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&payload.code)
    .bind(&payload.name)
    .bind(payload.is_active.unwrap_or(true))
    .bind(payload.start_date)
    .bind(payload.end_date)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, code = %payload.code, "Failed to create project");
        ApiError::from(e)
    })?;

    match fetch_project(pool.get_ref(), &id).await? {
        Some(project) => Ok(HttpResponse::Created().json(project)),
        None => Err(ApiError::Database.into()),
    }
}

/* =========================
List projects
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    params(ProjectQuery),
    responses(
        (status = 200, description = "Paginated project list", body = ProjectListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn list_projects(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ProjectQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<FilterValue> = Vec::new();

    if let Some(search) = &query.search {
        conditions.push("(name LIKE ? OR code LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(FilterValue::Str(like.clone()));
        bindings.push(FilterValue::Str(like));
    }

    if let Some(is_active) = query.is_active {
        conditions.push("is_active = ?");
        bindings.push(FilterValue::Bool(is_active));
    }

    if let Some(from) = query.start_date_from {
        conditions.push("start_date >= ?");
        bindings.push(FilterValue::Date(from));
    }

    if let Some(to) = query.start_date_to {
        conditions.push("start_date <= ?");
        bindings.push(FilterValue::Date(to));
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM projects {}", where_clause);
    debug!(sql = %count_sql, "Counting projects");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = match b {
            FilterValue::Str(v) => count_query.bind(v),
            FilterValue::Bool(v) => count_query.bind(*v),
            FilterValue::Date(v) => count_query.bind(*v),
        };
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count projects");
        ApiError::from(e)
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        r#"
        SELECT id, code, name, is_active, start_date, end_date, created_at, updated_at
        FROM projects
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_clause
    );

    let mut data_query = sqlx::query_as::<_, Project>(&data_sql);
    for b in bindings {
        data_query = match b {
            FilterValue::Str(v) => data_query.bind(v),
            FilterValue::Bool(v) => data_query.bind(v),
            FilterValue::Date(v) => data_query.bind(v),
        };
    }

    let projects = data_query
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, sql = %data_sql, "Failed to fetch projects");
            ApiError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(ProjectListResponse {
        data: projects,
        page,
        per_page,
        total,
    }))
}

/* =========================
Project details
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}",
    params(
        ("project_id" = String, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project found", body = Project),
        (status = 404, description = "Project not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn get_project(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let project_id = path.into_inner();

    match fetch_project(pool.get_ref(), &project_id).await? {
        Some(project) => Ok(HttpResponse::Ok().json(project)),
        None => Err(ApiError::not_found("Project").into()),
    }
}

/* =========================
Update project
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/projects/{project_id}",
    params(
        ("project_id" = String, Path, description = "Project ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Duplicate project code"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn update_project(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let project_id = path.into_inner();

    if let Some(code) = body.get("code").and_then(Value::as_str) {
        if project_code_taken(pool.get_ref(), code, Some(&project_id)).await? {
            return Err(ApiError::Duplicate(format!(
                "Project with code '{}' already exists",
                code
            ))
            .into());
        }
    }

    let update = build_update_sql("projects", &body, PROJECT_UPDATE_COLUMNS, "id", &project_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, project_id, "Failed to update project");
        ApiError::from(e)
    })?;

    if affected == 0 {
        return Err(ApiError::not_found("Project").into());
    }

    match fetch_project(pool.get_ref(), &project_id).await? {
        Some(project) => Ok(HttpResponse::Ok().json(project)),
        None => Err(ApiError::not_found("Project").into()),
    }
}

/* =========================
Deactivate project
========================= */
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{project_id}",
    params(
        ("project_id" = String, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project deactivated", body = Object, example = json!({
            "message": "Project deactivated successfully"
        })),
        (status = 404, description = "Project not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn deactivate_project(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let project_id = path.into_inner();

    let result = sqlx::query("UPDATE projects SET is_active = FALSE WHERE id = ?")
        .bind(&project_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, project_id, "Failed to deactivate project");
            ApiError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Project").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Project deactivated successfully"
    })))
}

/* =========================
Assign owner (PM/APM)
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/projects/{project_id}/owners",
    params(
        ("project_id" = String, Path, description = "Project ID")
    ),
    request_body = OwnerAssign,
    responses(
        (status = 201, description = "Owner assigned", body = OwnerResponse),
        (status = 404, description = "Project or user not found"),
        (status = 409, description = "User is already an owner of this project"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn assign_owner(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<OwnerAssign>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let project_id = path.into_inner();

    if fetch_project(pool.get_ref(), &project_id).await?.is_none() {
        return Err(ApiError::not_found("Project").into());
    }

    let user_name = sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = ?")
        .bind(&payload.user_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let already_owner = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM project_owners WHERE project_id = ? AND user_id = ? LIMIT 1)",
    )
    .bind(&project_id)
    .bind(&payload.user_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(ApiError::from)?;

    if already_owner {
        return Err(ApiError::Duplicate("User is already an owner of this project".into()).into());
    }

    let result = sqlx::query(
        "INSERT INTO project_owners (project_id, user_id, work_role) VALUES (?, ?, ?)",
    )
    .bind(&project_id)
    .bind(&payload.user_id)
    .bind(&payload.work_role)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, project_id, "Failed to assign project owner");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Created().json(OwnerResponse {
        id: result.last_insert_id(),
        project_id,
        user_id: payload.user_id.clone(),
        work_role: payload.work_role.clone(),
        user_name,
    }))
}

/* =========================
List owners
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/owners",
    params(
        ("project_id" = String, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Owner assignments", body = [OwnerResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn list_project_owners(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let project_id = path.into_inner();

    let rows = sqlx::query_as::<_, OwnerRow>(
        r#"
        SELECT o.id, o.project_id, o.user_id, o.work_role, u.name AS user_name
        FROM project_owners o
        LEFT JOIN users u ON u.id = o.user_id
        WHERE o.project_id = ?
        "#,
    )
    .bind(&project_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, project_id, "Failed to list project owners");
        ApiError::from(e)
    })?;

    let owners: Vec<OwnerResponse> = rows
        .into_iter()
        .map(|o| OwnerResponse {
            id: o.owner.id,
            project_id: o.owner.project_id,
            user_id: o.owner.user_id,
            work_role: o.owner.work_role,
            user_name: o.user_name.unwrap_or_else(|| "Unknown".into()),
        })
        .collect();

    Ok(HttpResponse::Ok().json(owners))
}

/* =========================
Remove owner
========================= */
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{project_id}/owners/{user_id}",
    params(
        ("project_id" = String, Path, description = "Project ID"),
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Owner removed", body = Object, example = json!({
            "message": "Owner removed successfully"
        })),
        (status = 404, description = "Owner assignment not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Projects"
)]
pub async fn remove_project_owner(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(String, String)>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager_or_admin()?;

    let (project_id, user_id) = path.into_inner();

    let result = sqlx::query("DELETE FROM project_owners WHERE project_id = ? AND user_id = ?")
        .bind(&project_id)
        .bind(&user_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, project_id, user_id, "Failed to remove project owner");
            ApiError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Owner assignment").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Owner removed successfully"
    })))
}
