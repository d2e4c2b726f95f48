#![allow(async_fn_in_trait)]

mod config;
mod context;
mod core;
mod database;
mod error;
mod guard;
mod handlers;
mod impls;
mod middlewares;
mod request;
mod response;

use actix_web::middleware::Logger;
use actix_web::web::{delete, get, post, put, scope, Data};
use actix_web::{App, HttpServer};
use config::Config;
use database::sqlx::PgSqlxManager;
use impls::notifier::broadcast::BroadcastHub;
use impls::tokener::jwt::JWT;
use middlewares::jwt::JWTMiddleware;
use sqlx::postgres::PgPoolOptions;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::from_env()?;
    let pool = PgPoolOptions::new().max_connections(config.max_connections).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await.map_err(error::Error::from)?;

    let manager = Data::new(PgSqlxManager::new(pool));
    let hub = Data::new(BroadcastHub::new(config.channel_capacity));
    let tokener = JWT::new(config.jwt_secret.as_bytes().to_owned());
    let bind_addr = config.bind_addr.clone();
    let config = Data::new(config);
    log::info!("listening on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(JWTMiddleware::new(tokener.clone()))
            .wrap(Logger::default())
            .app_data(manager.clone())
            .app_data(hub.clone())
            .app_data(config.clone())
            .app_data(Data::new(tokener.clone()))
            .route("/signup", post().to(handlers::user::signup))
            .route("/login", post().to(handlers::user::login))
            .route("/logout", post().to(handlers::user::logout))
            .service(
                scope("/me")
                    .route("", get().to(handlers::user::me))
                    .route("/profile", put().to(handlers::user::update_profile)),
            )
            .service(
                scope("/polls")
                    .route("", get().to(handlers::poll::list))
                    .route("", post().to(handlers::poll::create))
                    .service(
                        scope("/{poll_id}")
                            .route("", get().to(handlers::poll::detail))
                            .route("", put().to(handlers::poll::update))
                            .route("", delete().to(handlers::poll::delete))
                            .route("/results", get().to(handlers::vote::results))
                            .route("/votes", get().to(handlers::vote::list))
                            .route("/votes", post().to(handlers::vote::submit))
                            .route("/comments", get().to(handlers::comment::list))
                            .route("/comments", post().to(handlers::comment::create))
                            .route("/events", get().to(handlers::events::poll_events)),
                    ),
            )
            .route("/comments/{comment_id}", delete().to(handlers::comment::delete))
            .route("/events/polls", get().to(handlers::events::polls_events))
    })
    .bind(bind_addr)?
    .run()
    .await?;
    Ok(())
}
