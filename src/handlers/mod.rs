pub mod admin;
pub mod application;
pub mod document;
pub mod event;
pub mod user;

use std::ops::Add;

use actix_web::{
    cookie::{time::OffsetDateTime, Cookie, CookieBuilder},
    web::{Data, Json},
    HttpResponse,
};
use hex::ToHex;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::core::models::user::{Role, UserInsert};
use crate::core::ports::repository::{Tx, UserStore};
use crate::core::tokener::Tokener;
use crate::database::sqlx::PgStore;
use crate::error::Error;
use crate::middlewares::jwt::{Claim, JWT_SECRET, JWT_TOKEN};
use crate::response::CreateResponse;
use crate::tokener::JWT;

fn hash_password(pass: &str, slt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pass);
    hasher.update(slt);
    hasher.finalize().encode_hex()
}

fn random_salt() -> String {
    let chars: Vec<char> = ('0'..='9').chain('a'..='z').chain('A'..='Z').collect();
    let mut slt = String::new();
    let mut rng = thread_rng();
    for _ in 0..32 {
        let i = rng.gen_range(0..chars.len());
        slt.push(chars[i]);
    }
    slt
}

#[derive(Debug, Clone, Deserialize)]
pub struct Signup {
    pub full_name: String,
    pub class_year: String,
    pub email: String,
    pub password: String,
}

pub async fn signup(Json(data): Json<Signup>, db: Data<PgPool>) -> Result<Json<CreateResponse>, Error> {
    let mut store = PgStore::new(db.begin().await?);
    if store.get_user_by_email(&data.email).await?.is_some() {
        return Err(Error::Conflict("an account with this email already exists".into()));
    }
    let slt = random_salt();
    let id = store
        .insert_user(UserInsert {
            full_name: data.full_name,
            class_year: data.class_year,
            email: data.email,
            password: hash_password(&data.password, &slt),
            salt: slt,
        })
        .await?;
    // everyone starts out as a prospect
    store.grant_role(id, Role::Prospect).await?;
    store.commit().await?;
    Ok(Json(CreateResponse { id }))
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

pub async fn login(Json(Login { email, password }): Json<Login>, db: Data<PgPool>) -> Result<HttpResponse, Error> {
    let mut store = PgStore::new(db.acquire().await?);
    let user = store
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| Error::Unauthorized("invalid email or password".into()))?;
    if hash_password(&password, &user.salt) != user.password {
        return Err(Error::Unauthorized("invalid email or password".into()));
    }
    if user.banned_at.is_some() {
        return Err(Error::PermissionDenied("this account has been banned".into()));
    }
    let claim = Claim {
        user: user.id.to_string(),
        exp: chrono::Utc::now().add(chrono::Duration::days(30)).timestamp(),
    };
    let secret = dotenv::var(JWT_SECRET)?;
    let tokener = JWT::new(secret.into_bytes());
    let token = tokener.gen_token(&claim)?;
    Ok(HttpResponse::Ok().cookie(Cookie::new(JWT_TOKEN, token.clone())).json(LoginResponse { token }))
}

pub async fn logout() -> HttpResponse {
    HttpResponse::Ok()
        .cookie(CookieBuilder::new(JWT_TOKEN, "").expires(OffsetDateTime::now_utc()).finish())
        .finish()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hashing_is_salted() {
        let a = hash_password("hunter2", "salt-a");
        let b = hash_password("hunter2", "salt-b");
        assert_ne!(a, b);
        assert_eq!(a, hash_password("hunter2", "salt-a"));
    }

    #[tokio::test]
    async fn logout_expires_the_token_cookie() {
        let resp = logout().await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        let cookie = resp.cookies().find(|c| c.name() == JWT_TOKEN).unwrap();
        assert_eq!(cookie.value(), "");
        assert!(cookie.expires_datetime().unwrap() <= OffsetDateTime::now_utc());
    }

    #[test]
    fn salts_are_fresh() {
        let a = random_salt();
        let b = random_salt();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
