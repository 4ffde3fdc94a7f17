use actix_web::{self, error::ErrorUnauthorized, FromRequest, HttpMessage};
use std::future::{ready, Ready};

#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: i32,
}

impl FromRequest for UserInfo {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;
    fn from_request(req: &actix_web::HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<Self>() {
            ready(Ok(user.clone()))
        } else {
            ready(Err(ErrorUnauthorized("")))
        }
    }
}
