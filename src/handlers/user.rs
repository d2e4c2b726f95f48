use crate::config::Config;
use crate::context::UserInfo;
use crate::core::models::{
    profile::{Profile, Update as ProfileUpdate},
    user::{Login, Session, Signup},
};
use crate::core::services::auth;
use crate::error::Error;
use crate::handlers::Manager;
use crate::impls::tokener::jwt::JWT;
use crate::middlewares::jwt::JWT_TOKEN;
use actix_web::cookie::{time::Duration as CookieDuration, time::OffsetDateTime, Cookie};
use actix_web::web::{Data, Json};
use actix_web::HttpResponse;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    id: Uuid,
}

pub async fn signup(Json(body): Json<Signup>, manager: Manager) -> Result<HttpResponse, Error> {
    let mut store = manager.acquire().await?;
    let id = auth::signup(&mut store, body).await?;
    Ok(HttpResponse::Created().json(SignupResponse { id }))
}

pub async fn login(Json(body): Json<Login>, manager: Manager, tokener: Data<JWT>, config: Data<Config>) -> Result<HttpResponse, Error> {
    let mut store = manager.acquire().await?;
    let authenticated = auth::login(&mut store, tokener.get_ref(), body, chrono::Duration::days(config.token_ttl_days)).await?;
    let cookie = Cookie::build(JWT_TOKEN, authenticated.token.clone())
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .max_age(CookieDuration::days(config.token_ttl_days))
        .finish();
    Ok(HttpResponse::Ok().cookie(cookie).json(authenticated))
}

pub async fn logout() -> HttpResponse {
    HttpResponse::Ok()
        .cookie(Cookie::build(JWT_TOKEN, "").path("/").expires(OffsetDateTime::now_utc()).max_age(CookieDuration::ZERO).finish())
        .finish()
}

pub async fn me(user_info: UserInfo, manager: Manager) -> Result<Json<Session>, Error> {
    let mut store = manager.acquire().await?;
    let session = auth::session(&mut store, user_info.id).await?;
    Ok(Json(session))
}

pub async fn update_profile(user_info: UserInfo, Json(body): Json<ProfileUpdate>, manager: Manager) -> Result<Json<Profile>, Error> {
    let mut store = manager.acquire().await?;
    let profile = auth::update_profile(&mut store, user_info.id, body).await?;
    Ok(Json(profile))
}
