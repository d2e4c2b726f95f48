use crate::context::UserInfo;
use crate::core::models::comment::{CommentWithAuthor, Create};
use crate::core::services::comment;
use crate::error::Error;
use crate::handlers::{Hub, Manager};
use crate::response::{DeleteResponse, List};
use actix_web::web::{Json, Path};
use actix_web::HttpResponse;
use uuid::Uuid;

pub async fn list(poll_id: Path<(Uuid,)>, manager: Manager) -> Result<Json<List<CommentWithAuthor>>, Error> {
    let mut store = manager.acquire().await?;
    let comments = comment::list(&mut store, poll_id.into_inner().0).await?;
    Ok(Json(List::new(comments)))
}

pub async fn create(user_info: UserInfo, poll_id: Path<(Uuid,)>, Json(body): Json<Create>, manager: Manager, hub: Hub) -> Result<HttpResponse, Error> {
    let mut store = manager.acquire().await?;
    let comment = comment::add(&mut store, hub.get_ref(), user_info.id, poll_id.into_inner().0, body).await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn delete(user_info: UserInfo, comment_id: Path<(Uuid,)>, manager: Manager, hub: Hub) -> Result<Json<DeleteResponse>, Error> {
    let mut store = manager.acquire().await?;
    comment::delete(&mut store, hub.get_ref(), user_info.id, comment_id.into_inner().0).await?;
    Ok(Json(DeleteResponse::new(1)))
}
