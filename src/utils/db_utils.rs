use crate::errors::ApiError;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Only columns listed in `allowed` may appear in the payload; anything else
/// is rejected before any SQL is assembled.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: &str,
) -> Result<SqlUpdate, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::Validation("Payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(ApiError::Validation("No fields provided for update".into()));
    }

    if let Some(unknown) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(ApiError::Validation(format!(
            "Unknown field '{}' in update payload",
            unknown
        )));
    }

    // Build SET clause
    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);

    // Convert JSON values to SqlValue
    for value in obj.values() {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    values.push(SqlValue::Date(d));
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    values.push(SqlValue::DateTime(dt));
                } else {
                    values.push(SqlValue::String(s.clone()));
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => return Err(ApiError::Validation("Unsupported JSON value type".into())),
        }
    }

    // WHERE id = ?
    values.push(SqlValue::String(id_value.to_string()));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALLOWED: &[&str] = &["code", "name", "is_active", "start_date", "end_date"];

    #[test]
    fn builds_set_clause_and_binds_id_last() {
        let update = build_update_sql(
            "projects",
            &json!({"name": "Renamed"}),
            ALLOWED,
            "id",
            "abc-123",
        )
        .unwrap();

        assert_eq!(update.sql, "UPDATE projects SET name = ? WHERE id = ?");
        assert_eq!(update.values.len(), 2);
        assert!(matches!(&update.values[1], SqlValue::String(s) if s == "abc-123"));
    }

    #[test]
    fn date_strings_bind_as_dates() {
        let update = build_update_sql(
            "projects",
            &json!({"start_date": "2024-01-10"}),
            ALLOWED,
            "id",
            "p1",
        )
        .unwrap();
        assert!(matches!(update.values[0], SqlValue::Date(_)));
    }

    #[test]
    fn rejects_unknown_columns() {
        let err = build_update_sql(
            "projects",
            &json!({"status": "x"}),
            ALLOWED,
            "id",
            "p1",
        )
        .unwrap_err();
        assert!(err.to_string().contains("status"));
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(build_update_sql("projects", &json!({}), ALLOWED, "id", "p1").is_err());
    }

    #[test]
    fn rejects_non_object_payload() {
        assert!(build_update_sql("projects", &json!([1, 2]), ALLOWED, "id", "p1").is_err());
    }

    #[test]
    fn null_clears_nullable_column() {
        let update = build_update_sql(
            "projects",
            &json!({"end_date": null}),
            ALLOWED,
            "id",
            "p1",
        )
        .unwrap();
        assert!(matches!(update.values[0], SqlValue::Null));
    }
}
