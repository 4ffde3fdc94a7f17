use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Permission tiers, lowest to highest. Ordering is load-bearing: review
/// rights require `>= Board`, administration requires `Eboard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Prospect,
    Member,
    Board,
    Eboard,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i32,
    pub full_name: String,
    pub class_year: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub salt: String,
    pub points: i32,
    pub banned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RosterEntry {
    pub id: i32,
    pub full_name: String,
    pub class_year: String,
    pub role: Role,
    pub points: i32,
}

#[derive(Debug, Clone)]
pub struct UserInsert {
    pub full_name: String,
    pub class_year: String,
    pub email: String,
    pub password: String,
    pub salt: String,
}
