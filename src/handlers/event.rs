use actix_web::web::{Data, Json, Path, Query};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::context::UserInfo;
use crate::core::event::{check_in, delete_event, rsvp};
use crate::core::models::event::{CheckinOutcome, Event};
use crate::core::ports::repository::EventStore;
use crate::database::sqlx::PgStore;
use crate::error::Error;
use crate::request::Pagination;
use crate::response::{DeleteResponse, List, ProcedureResponse};

pub async fn list(_user_info: UserInfo, Query(Pagination { page, size }): Query<Pagination>, db: Data<PgPool>) -> Result<Json<List<Event>>, Error> {
    Pagination::check(page, size)?;
    let mut store = PgStore::new(db.acquire().await?);
    let (list, total) = store.list_events(page, size).await?;
    Ok(Json(List::new(list, total)))
}

pub async fn create_rsvp(user_info: UserInfo, event_id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<ProcedureResponse>, Error> {
    let event_id = event_id.into_inner().0;
    let store = PgStore::new(db.begin().await?);
    let event = rsvp(store, user_info.id, event_id).await?;
    Ok(Json(ProcedureResponse::ok(format!("RSVP confirmed for {}", event.name))))
}

#[derive(Debug, Deserialize)]
pub struct CheckinRequest {
    pub token: Uuid,
}

pub async fn checkin(user_info: UserInfo, Json(req): Json<CheckinRequest>, db: Data<PgPool>) -> Result<Json<CheckinOutcome>, Error> {
    let store = PgStore::new(db.begin().await?);
    let outcome = check_in(store, user_info.id, req.token).await?;
    Ok(Json(outcome))
}

pub async fn delete(user_info: UserInfo, event_id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<DeleteResponse>, Error> {
    let event_id = event_id.into_inner().0;
    let store = PgStore::new(db.begin().await?);
    let deleted = delete_event(store, user_info.id, event_id).await?;
    Ok(Json(DeleteResponse { deleted }))
}
