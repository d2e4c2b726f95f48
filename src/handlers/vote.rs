use crate::config::Config;
use crate::context::UserInfo;
use crate::core::models::vote::{Outcome, Submit, Vote, Voter};
use crate::core::services::vote;
use crate::core::tally::Results;
use crate::error::Error;
use crate::guard;
use crate::handlers::{Hub, Manager};
use crate::response::List;
use actix_web::web::{Data, Json, Path};
use actix_web::{HttpRequest, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

pub fn voter_of(req: &HttpRequest, user_info: Option<UserInfo>, poll_id: Uuid) -> Voter {
    match user_info {
        Some(user) => Voter::User(user.id),
        None => Voter::Anonymous {
            already_voted: guard::has_voted(req, poll_id),
        },
    }
}

pub async fn submit(
    req: HttpRequest,
    user_info: Option<UserInfo>,
    poll_id: Path<(Uuid,)>,
    Json(body): Json<Submit>,
    manager: Manager,
    hub: Hub,
    config: Data<Config>,
) -> Result<HttpResponse, Error> {
    let poll_id = poll_id.into_inner().0;
    let voter = voter_of(&req, user_info, poll_id);
    let tx = manager.begin().await?;
    let outcome = vote::submit(tx, hub.get_ref(), poll_id, voter, body, Utc::now()).await?;
    Ok(vote_response(voter, &outcome, config.secure_cookies))
}

/// Anonymous voters get the revote guard cookie along with the outcome.
fn vote_response(voter: Voter, outcome: &Outcome, secure: bool) -> HttpResponse {
    let mut resp = HttpResponse::Ok();
    if let Voter::Anonymous { .. } = voter {
        resp.cookie(guard::voted_cookie(outcome.vote.poll_id, outcome.vote.option_id, secure));
    }
    resp.json(outcome)
}

pub async fn list(poll_id: Path<(Uuid,)>, manager: Manager) -> Result<Json<List<Vote>>, Error> {
    let mut store = manager.acquire().await?;
    let votes = vote::list(&mut store, poll_id.into_inner().0).await?;
    Ok(Json(List::new(votes)))
}

pub async fn results(poll_id: Path<(Uuid,)>, manager: Manager) -> Result<Json<Results>, Error> {
    let mut store = manager.acquire().await?;
    let results = vote::results(&mut store, poll_id.into_inner().0).await?;
    Ok(Json(results))
}
