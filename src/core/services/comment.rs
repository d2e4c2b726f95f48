use crate::core::models::{
    change::{Change, Row},
    comment::{CommentWithAuthor, Create, Insert},
};
use crate::core::ports::notifier::Notifier;
use crate::core::ports::repository::{CommentCommon, Store};
use crate::core::services::poll::get as get_poll;
use crate::error::Error;
use uuid::Uuid;
use validator::Validate;

pub async fn list<S>(store: &mut S, poll_id: Uuid) -> Result<Vec<CommentWithAuthor>, Error>
where
    S: Store,
{
    let poll = get_poll(store, poll_id).await?;
    // kept rows of a poll that turned comments off stay hidden
    if !poll.allow_comments {
        return Ok(vec![]);
    }
    CommentCommon::query_with_author(store, poll_id).await
}

pub async fn add<S, N>(store: &mut S, notifier: &N, user_id: Uuid, poll_id: Uuid, mut create: Create) -> Result<CommentWithAuthor, Error>
where
    S: Store,
    N: Notifier,
{
    let poll = get_poll(store, poll_id).await?;
    if !poll.allow_comments {
        return Err(Error::Forbidden("comments are disabled for this poll".into()));
    }
    create.content = create.content.trim().to_owned();
    if create.content.is_empty() {
        return Err(Error::InvalidInput("Comment cannot be empty".into()));
    }
    create.validate()?;
    let comment = CommentCommon::insert(
        store,
        Insert {
            poll_id,
            user_id,
            content: create.content,
        },
    )
    .await?;
    let with_author = match CommentCommon::get_with_author(store, comment.id).await? {
        Some(c) => c,
        None => CommentWithAuthor::new(comment.clone(), None),
    };
    notifier.publish(Change::Insert(Row::Comment(comment)));
    Ok(with_author)
}

pub async fn delete<S, N>(store: &mut S, notifier: &N, user_id: Uuid, id: Uuid) -> Result<(), Error>
where
    S: Store,
    N: Notifier,
{
    let comment = CommentCommon::get(store, id).await?.ok_or_else(|| Error::NotFound("comment".into()))?;
    if comment.user_id != user_id {
        return Err(Error::Forbidden("only the author can delete this comment".into()));
    }
    CommentCommon::delete(store, id).await?;
    notifier.publish(Change::Delete(Row::Comment(comment)));
    Ok(())
}
