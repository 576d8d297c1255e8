use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": "3f1c8a0e-9d2b-4f6a-8c3d-5e7f9a1b2c4d",
        "code": "PRJ-001",
        "name": "Internal Tooling",
        "is_active": true,
        "start_date": "2024-01-01",
        "end_date": null,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
)]
pub struct Project {
    pub id: String,
    #[schema(example = "PRJ-001")]
    pub code: String,
    #[schema(example = "Internal Tooling")]
    pub name: String,
    pub is_active: bool,
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2024-06-30", value_type = String, format = "date", nullable = true)]
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: Option<DateTime<Utc>>,
}
