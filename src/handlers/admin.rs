use actix_web::web::{Data, Json, Path};
use chrono::Utc;
use sqlx::PgPool;

use crate::context::UserInfo;
use crate::core::admin::{ban_user, delete_user};
use crate::core::application::purge_expired_applications;
use crate::database::sqlx::PgStore;
use crate::error::Error;
use crate::response::{DeleteResponse, ProcedureResponse};

pub async fn ban(user_info: UserInfo, user_id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<ProcedureResponse>, Error> {
    let user_id = user_id.into_inner().0;
    let store = PgStore::new(db.begin().await?);
    ban_user(store, user_info.id, user_id).await?;
    Ok(Json(ProcedureResponse::ok("user banned")))
}

pub async fn delete(user_info: UserInfo, user_id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<DeleteResponse>, Error> {
    let user_id = user_id.into_inner().0;
    let store = PgStore::new(db.begin().await?);
    let deleted = delete_user(store, user_info.id, user_id).await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// Retention sweep: removes reviewed applications older than the 30-day
/// window. Invoked on demand rather than on a timer.
pub async fn sweep(user_info: UserInfo, db: Data<PgPool>) -> Result<Json<DeleteResponse>, Error> {
    let store = PgStore::new(db.begin().await?);
    let deleted = purge_expired_applications(store, user_info.id, Utc::now()).await?;
    Ok(Json(DeleteResponse { deleted }))
}
