use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Category of attendance exception a user may request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Leave,
    Wfh,
    Regularization,
    ShiftChange,
    Other,
}

/// Lifecycle status of a request. PENDING until a decision is recorded;
/// only the approval service writes the terminal values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Terminal outcome of a review.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// The request status a recorded decision leaves behind.
    pub fn as_status(self) -> RequestStatus {
        match self {
            Decision::Approved => RequestStatus::Approved,
            Decision::Rejected => RequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRequest {
    #[schema(example = "3f1c8a0e-9d2b-4f6a-8c3d-5e7f9a1b2c4d")]
    pub id: String,
    pub user_id: String,
    #[schema(example = "LEAVE")]
    pub request_type: String,
    #[schema(example = "2024-01-10", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-12", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    #[schema(example = "PENDING")]
    pub status: String,
    #[schema(example = "2024-01-01T00:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn request_type_wire_form_is_upper_snake() {
        assert_eq!(RequestType::Leave.to_string(), "LEAVE");
        assert_eq!(RequestType::Wfh.to_string(), "WFH");
        assert_eq!(RequestType::ShiftChange.to_string(), "SHIFT_CHANGE");
        assert_eq!(RequestType::from_str("REGULARIZATION").unwrap(), RequestType::Regularization);
        assert!(RequestType::from_str("HOLIDAY").is_err());
    }

    #[test]
    fn status_round_trips() {
        for s in [RequestStatus::Pending, RequestStatus::Approved, RequestStatus::Rejected] {
            assert_eq!(RequestStatus::from_str(&s.to_string()).unwrap(), s);
        }
    }

    #[test]
    fn decision_maps_onto_terminal_status() {
        assert_eq!(Decision::Approved.as_status(), RequestStatus::Approved);
        assert_eq!(Decision::Rejected.as_status(), RequestStatus::Rejected);
        assert_eq!(Decision::Approved.as_status().to_string(), "APPROVED");
    }

    #[test]
    fn decision_never_yields_pending() {
        for d in [Decision::Approved, Decision::Rejected] {
            assert_ne!(d.as_status(), RequestStatus::Pending);
        }
    }
}
