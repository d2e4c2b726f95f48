use crate::core::live::PollView;
use crate::core::models::{
    change::{Change, Row},
    option::Insert as OptionInsert,
    poll::{Create, Detail, Insert, Patch, Poll, PollWithOptions, Query, Update},
    vote::Query as VoteQuery,
};
use crate::core::ports::notifier::Notifier;
use crate::core::ports::repository::{CommentCommon, OptionCommon, PollCommon, Store, VoteCommon};
use crate::core::tally::tally;
use crate::error::Error;
use crate::request::non_blank;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

fn normalize_title(title: &str) -> Result<String, Error> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("Title is required".into()));
    }
    Ok(title.to_owned())
}

pub async fn get<S>(store: &mut S, id: Uuid) -> Result<Poll, Error>
where
    S: Store,
{
    PollCommon::get(store, id).await?.ok_or_else(|| Error::NotFound("poll".into()))
}

/// Creates the poll, then its options. The two inserts are not atomic: when the options
/// cannot be stored the poll row is removed again on a best-effort basis.
pub async fn create<S, N>(store: &mut S, notifier: &N, user_id: Uuid, mut create: Create) -> Result<PollWithOptions, Error>
where
    S: Store,
    N: Notifier,
{
    create.title = normalize_title(&create.title)?;
    create.description = non_blank(create.description);
    create.options = create.options.iter().map(|o| o.trim().to_owned()).collect();
    create.validate()?;
    if create.options.iter().any(String::is_empty) {
        return Err(Error::InvalidInput("Options cannot be empty".into()));
    }
    let poll = PollCommon::insert(
        store,
        Insert {
            title: create.title,
            description: create.description,
            created_by: user_id,
            is_public: create.is_public,
            allow_comments: create.allow_comments,
            closes_at: create.closes_at,
        },
    )
    .await?;
    let inserts = create
        .options
        .into_iter()
        .enumerate()
        .map(|(i, text)| OptionInsert {
            poll_id: poll.id,
            text,
            position: i as i32,
        })
        .collect();
    let options = match OptionCommon::bulk_insert(store, inserts).await {
        Ok(options) => options,
        Err(e) => {
            if let Err(cleanup) = PollCommon::delete(store, poll.id).await {
                log::error!("failed to remove poll {} after option insert failed: {}", poll.id, cleanup);
            }
            return Err(e);
        }
    };
    log::info!("poll {} created by {}", poll.id, user_id);
    notifier.publish(Change::Insert(Row::Poll(poll.clone())));
    Ok(PollWithOptions { poll, options })
}

pub async fn list<S>(store: &mut S, viewer: Option<Uuid>) -> Result<Vec<Poll>, Error>
where
    S: Store,
{
    PollCommon::query(store, &Query { viewer }).await
}

pub async fn detail<S>(store: &mut S, viewer: Option<Uuid>, id: Uuid, now: DateTime<Utc>) -> Result<Detail, Error>
where
    S: Store,
{
    let poll = get(store, id).await?;
    let options = OptionCommon::query(store, id).await?;
    let votes = VoteCommon::query(
        store,
        &VoteQuery {
            poll_id_eq: Some(id),
            ..Default::default()
        },
    )
    .await?;
    let results = tally(&options, &votes);
    let my_vote = viewer.and_then(|uid| {
        let uid = uid.to_string();
        votes.iter().rev().find(|v| v.user_id == uid).map(|v| v.option_id)
    });
    let comments = if poll.allow_comments {
        Some(CommentCommon::query_with_author(store, id).await?)
    } else {
        None
    };
    Ok(Detail {
        is_closed: poll.is_closed(now),
        poll,
        options,
        results,
        my_vote,
        comments,
    })
}

fn ensure_creator(poll: &Poll, user_id: Uuid) -> Result<(), Error> {
    if poll.created_by != user_id {
        return Err(Error::Forbidden("only the creator can change this poll".into()));
    }
    Ok(())
}

pub async fn update<S, N>(store: &mut S, notifier: &N, user_id: Uuid, id: Uuid, mut update: Update) -> Result<Poll, Error>
where
    S: Store,
    N: Notifier,
{
    let poll = get(store, id).await?;
    ensure_creator(&poll, user_id)?;
    update.title = update.title.as_deref().map(normalize_title).transpose()?;
    update.description = update.description.map(non_blank);
    update.validate()?;
    let patch = Patch {
        title: update.title,
        description: update.description,
        is_public: update.is_public,
        allow_comments: update.allow_comments,
        closes_at: update.closes_at,
    };
    if patch.is_empty() {
        return Ok(poll);
    }
    let updated = PollCommon::update(store, id, patch).await?;
    notifier.publish(Change::Update {
        before: Row::Poll(poll),
        after: Row::Poll(updated.clone()),
    });
    Ok(updated)
}

pub async fn delete<S, N>(store: &mut S, notifier: &N, user_id: Uuid, id: Uuid) -> Result<(), Error>
where
    S: Store,
    N: Notifier,
{
    let poll = get(store, id).await?;
    ensure_creator(&poll, user_id)?;
    PollCommon::delete(store, id).await?;
    log::info!("poll {} deleted by {}", id, user_id);
    notifier.publish(Change::Delete(Row::Poll(poll)));
    Ok(())
}

/// Loads everything a live subscriber of the poll starts from.
pub async fn poll_view<S>(store: &mut S, id: Uuid) -> Result<PollView, Error>
where
    S: Store,
{
    let poll = get(store, id).await?;
    let options = OptionCommon::query(store, id).await?;
    let votes = VoteCommon::query(
        store,
        &VoteQuery {
            poll_id_eq: Some(id),
            ..Default::default()
        },
    )
    .await?;
    let comments = if poll.allow_comments {
        CommentCommon::query_with_author(store, id).await?
    } else {
        vec![]
    };
    Ok(PollView::new(poll, options, votes, comments))
}
