use actix_web::web::{Data, Json, Query};
use serde::Serialize;
use sqlx::PgPool;

use crate::context::UserInfo;
use crate::core::models::user::{Role, RosterEntry};
use crate::core::ports::repository::UserStore;
use crate::database::sqlx::PgStore;
use crate::error::Error;
use crate::request::Pagination;
use crate::response::List;

#[derive(Debug, Serialize)]
pub struct Me {
    pub id: i32,
    pub full_name: String,
    pub class_year: String,
    pub email: String,
    pub points: i32,
    pub role: Role,
}

pub async fn me(user_info: UserInfo, db: Data<PgPool>) -> Result<Json<Me>, Error> {
    let mut store = PgStore::new(db.acquire().await?);
    let user = store.get_user(user_info.id).await?;
    let role = store.get_role(user_info.id).await?;
    Ok(Json(Me {
        id: user.id,
        full_name: user.full_name,
        class_year: user.class_year,
        email: user.email,
        points: user.points,
        role,
    }))
}

pub async fn roster(user_info: UserInfo, Query(Pagination { page, size }): Query<Pagination>, db: Data<PgPool>) -> Result<Json<List<RosterEntry>>, Error> {
    Pagination::check(page, size)?;
    let mut store = PgStore::new(db.acquire().await?);
    let role = store.get_role(user_info.id).await?;
    if role < Role::Member {
        return Err(Error::PermissionDenied("the roster is visible to members only".into()));
    }
    let (list, total) = store.roster(page, size).await?;
    Ok(Json(List::new(list, total)))
}
