use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::models::{
    application::{Application, ApplicationInsert, ApplicationStatus},
    catalog::{Class, Project},
    event::Event,
    user::{RosterEntry, Role, User, UserInsert},
};
use crate::error::Error;

pub trait UserStore {
    async fn insert_user(&mut self, data: UserInsert) -> Result<i32, Error>;
    async fn get_user(&mut self, uid: i32) -> Result<User, Error>;
    async fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>, Error>;
    async fn get_role(&mut self, uid: i32) -> Result<Role, Error>;
    async fn grant_role(&mut self, uid: i32, role: Role) -> Result<(), Error>;
    async fn set_board_position(&mut self, uid: i32, position: &str) -> Result<(), Error>;
    async fn add_points(&mut self, uid: i32, delta: i32) -> Result<(), Error>;
    async fn notify(&mut self, uid: i32, body: &str) -> Result<(), Error>;
    async fn roster(&mut self, page: i64, size: i64) -> Result<(Vec<RosterEntry>, i64), Error>;
    async fn ban_user(&mut self, uid: i32) -> Result<(), Error>;
    async fn delete_user(&mut self, uid: i32) -> Result<i64, Error>;
}

pub trait ApplicationStore {
    async fn insert_application(&mut self, data: ApplicationInsert) -> Result<i32, Error>;
    async fn get_application(&mut self, id: i32) -> Result<Application, Error>;
    /// List visible to `(actor, role)` under the scoping rules, newest first.
    async fn query_applications(&mut self, actor: i32, role: Role, status: Option<ApplicationStatus>, page: i64, size: i64) -> Result<Vec<Application>, Error>;
    async fn count_applications(&mut self, actor: i32, role: Role, status: Option<ApplicationStatus>) -> Result<i64, Error>;
    /// Compare-and-swap review stamp: updates status and audit fields only
    /// while the row is still pending. Returns affected row count.
    async fn mark_reviewed(&mut self, id: i32, status: ApplicationStatus, reviewer: i32, reviewed_at: DateTime<Utc>) -> Result<u64, Error>;
    /// Deletes terminal applications reviewed at or before `cutoff`.
    async fn delete_reviewed_before(&mut self, cutoff: DateTime<Utc>) -> Result<i64, Error>;
}

pub trait CatalogStore {
    async fn get_class(&mut self, id: i32) -> Result<Option<Class>, Error>;
    async fn get_project(&mut self, id: i32) -> Result<Option<Project>, Error>;
    async fn enroll_in_class(&mut self, class_id: i32, uid: i32) -> Result<(), Error>;
    async fn add_project_member(&mut self, project_id: i32, uid: i32) -> Result<(), Error>;
}

pub trait EventStore {
    async fn get_event(&mut self, id: i32) -> Result<Event, Error>;
    async fn get_event_by_token(&mut self, token: Uuid) -> Result<Option<Event>, Error>;
    async fn list_events(&mut self, page: i64, size: i64) -> Result<(Vec<Event>, i64), Error>;
    async fn has_rsvp(&mut self, event_id: i32, uid: i32) -> Result<bool, Error>;
    /// Capacity-guarded insert; returns affected row count (0 when full).
    async fn insert_rsvp(&mut self, event_id: i32, uid: i32) -> Result<u64, Error>;
    async fn has_attended(&mut self, event_id: i32, uid: i32) -> Result<bool, Error>;
    async fn record_attendance(&mut self, event_id: i32, uid: i32, points_awarded: i32) -> Result<(), Error>;
    async fn delete_event(&mut self, id: i32) -> Result<i64, Error>;
}

/// Transaction boundary, kept separate so service functions can bound on
/// exactly the stores they touch plus `Tx`.
pub trait Tx {
    async fn commit(self) -> Result<(), Error>;
    async fn rollback(self) -> Result<(), Error>;
}
