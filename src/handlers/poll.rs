use crate::context::UserInfo;
use crate::core::models::poll::{Create, Detail, Poll, PollWithOptions, Update};
use crate::core::services::poll;
use crate::error::Error;
use crate::handlers::{Hub, Manager};
use crate::response::{DeleteResponse, List};
use actix_web::web::{Json, Path};
use actix_web::HttpResponse;
use chrono::Utc;
use uuid::Uuid;

pub async fn list(user_info: Option<UserInfo>, manager: Manager) -> Result<Json<List<Poll>>, Error> {
    let mut store = manager.acquire().await?;
    let polls = poll::list(&mut store, user_info.map(|u| u.id)).await?;
    Ok(Json(List::new(polls)))
}

pub async fn create(user_info: UserInfo, Json(body): Json<Create>, manager: Manager, hub: Hub) -> Result<HttpResponse, Error> {
    let mut store = manager.acquire().await?;
    let created: PollWithOptions = poll::create(&mut store, hub.get_ref(), user_info.id, body).await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn detail(user_info: Option<UserInfo>, poll_id: Path<(Uuid,)>, manager: Manager) -> Result<Json<Detail>, Error> {
    let mut store = manager.acquire().await?;
    let detail = poll::detail(&mut store, user_info.map(|u| u.id), poll_id.into_inner().0, Utc::now()).await?;
    Ok(Json(detail))
}

pub async fn update(user_info: UserInfo, poll_id: Path<(Uuid,)>, Json(body): Json<Update>, manager: Manager, hub: Hub) -> Result<Json<Poll>, Error> {
    let mut store = manager.acquire().await?;
    let poll = poll::update(&mut store, hub.get_ref(), user_info.id, poll_id.into_inner().0, body).await?;
    Ok(Json(poll))
}

pub async fn delete(user_info: UserInfo, poll_id: Path<(Uuid,)>, manager: Manager, hub: Hub) -> Result<Json<DeleteResponse>, Error> {
    let mut store = manager.acquire().await?;
    poll::delete(&mut store, hub.get_ref(), user_info.id, poll_id.into_inner().0).await?;
    Ok(Json(DeleteResponse::new(1)))
}
