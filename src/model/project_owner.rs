use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectOwner {
    pub id: u64,
    pub project_id: String,
    pub user_id: String,
    pub work_role: String,
}
