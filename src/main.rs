mod context;
mod core;
mod database;
mod error;
mod handlers;
mod middlewares;
mod request;
mod response;
mod storer;
mod tokener;

use actix_web::web::{delete, get, post, resource, scope, Data};
use actix_web::HttpServer;
use middlewares::jwt::{JWTMiddleware, JWT_SECRET};
use sqlx::postgres::PgPoolOptions;
use storer::sign::UrlSigner;
use storer::LocalStore;

#[actix_web::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv::dotenv().ok();
    env_logger::init();
    let database_url = dotenv::var("DATABASE_URL").expect("environment variable DATABASE_URL not been set");
    let jwt_secret = dotenv::var(JWT_SECRET).expect("environment variable JWT_SECRET not been set");
    let signing_secret = dotenv::var("SIGNING_SECRET").expect("environment variable SIGNING_SECRET not been set");
    let upload_path = dotenv::var("UPLOAD_PATH").expect("environment variable UPLOAD_PATH not been set");
    let bind_addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_owned());
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to database");
    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(LocalStore::new(upload_path.clone())))
            .app_data(Data::new(UrlSigner::new(signing_secret.clone().into_bytes())))
            .service(
                scope("")
                    .service(resource("signup").route(post().to(handlers::signup)))
                    .service(resource("login").route(post().to(handlers::login)))
                    .service(resource("logout").route(post().to(handlers::logout)))
                    // signed URLs are the capability here, no session needed
                    .service(resource("documents/{folder}/{file}").route(get().to(handlers::document::fetch::<LocalStore>)))
                    .service(
                        scope("")
                            .wrap(JWTMiddleware::new(jwt_secret.clone().into_bytes()))
                            .service(
                                scope("applications")
                                    .route("", post().to(handlers::application::create::<LocalStore>))
                                    .route("", get().to(handlers::application::list))
                                    .service(
                                        scope("{application_id}")
                                            .route("", get().to(handlers::application::detail))
                                            .route("review", post().to(handlers::application::review)),
                                    ),
                            )
                            .service(
                                scope("events")
                                    .route("", get().to(handlers::event::list))
                                    .service(
                                        scope("{event_id}")
                                            .route("", delete().to(handlers::event::delete))
                                            .route("rsvp", post().to(handlers::event::create_rsvp)),
                                    ),
                            )
                            .service(resource("checkin").route(post().to(handlers::event::checkin)))
                            .service(
                                scope("users")
                                    .route("", get().to(handlers::user::roster))
                                    .route("me", get().to(handlers::user::me)),
                            )
                            .service(
                                scope("admin")
                                    .service(
                                        scope("users").service(
                                            scope("{user_id}")
                                                .route("", delete().to(handlers::admin::delete))
                                                .route("ban", post().to(handlers::admin::ban)),
                                        ),
                                    )
                                    .service(scope("applications").route("sweep", post().to(handlers::admin::sweep))),
                            ),
                    ),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
