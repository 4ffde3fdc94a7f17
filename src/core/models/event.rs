use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: i32,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    /// None means unlimited RSVPs.
    pub capacity: Option<i32>,
    pub rsvp_required: bool,
    pub points: i32,
    /// Points deducted when someone checks in without a required RSVP.
    pub rsvp_penalty: i32,
    #[serde(skip_serializing)]
    pub checkin_token: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Wire shape of a check-in result. `points_awarded` can be negative (an
/// RSVP-violation penalty) while `success` stays true; callers style that
/// case as a failure.
#[derive(Debug, Serialize)]
pub struct CheckinOutcome {
    pub success: bool,
    pub message: String,
    pub points_awarded: i32,
    pub event_name: String,
}
