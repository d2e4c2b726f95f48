//! Server-sent event streams that keep clients in sync with committed changes.

use crate::context::UserInfo;
use crate::core::live::{Patch, PollView};
use crate::core::models::change::{Change, Row, Topic};
use crate::core::models::comment::CommentWithAuthor;
use crate::core::models::vote::Vote;
use crate::core::ports::repository::CommentCommon;
use crate::core::services::poll::poll_view;
use crate::database::sqlx::PgSqlxManager;
use crate::error::Error;
use crate::handlers::{Hub, Manager};
use crate::impls::notifier::broadcast::Subscription;
use actix_web::http::header::CACHE_CONTROL;
use actix_web::web::Path;
use actix_web::HttpResponse;
use bytes::Bytes;
use futures::future;
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use uuid::Uuid;

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const PING: &[u8] = b": ping\n\n";

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub event: &'static str,
    pub data: Value,
}

impl Frame {
    pub fn new<T: Serialize>(event: &'static str, data: &T) -> Self {
        let data = serde_json::to_value(data).unwrap_or_else(|e| {
            log::error!("failed to serialize {} event: {}", event, e);
            Value::Null
        });
        Self { event, data }
    }

    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(format!("event: {}\ndata: {}\n\n", self.event, self.data))
    }
}

#[derive(Debug, Serialize)]
struct VoteEvent<'a> {
    action: &'static str,
    vote: &'a Vote,
}

#[derive(Debug, Serialize)]
struct Removed {
    id: Uuid,
}

/// Frames for one poll, produced from its local view.
pub struct PollFeed {
    view: PollView,
    ended: bool,
}

impl PollFeed {
    pub fn new(view: PollView) -> Self {
        Self { view, ended: false }
    }

    pub fn snapshot(&self) -> Frame {
        Frame::new("snapshot", &self.view.snapshot())
    }

    /// True once the poll was deleted.
    pub fn ended(&self) -> bool {
        self.ended
    }

    fn vote_frames(&mut self, frame: Frame, patch: Patch<Vote>) -> Vec<Frame> {
        let results = self.view.apply_vote(patch);
        vec![frame, Frame::new("results", &results)]
    }

    /// `resolved` is the changed comment joined with its author, when it could be loaded.
    pub fn apply(&mut self, change: Change, resolved: Option<CommentWithAuthor>) -> Vec<Frame> {
        match change {
            Change::Insert(Row::Vote(v)) => {
                let frame = Frame::new("vote", &VoteEvent { action: "insert", vote: &v });
                self.vote_frames(frame, Patch::Insert(v))
            }
            Change::Update { after: Row::Vote(v), .. } => {
                let frame = Frame::new("vote", &VoteEvent { action: "update", vote: &v });
                self.vote_frames(frame, Patch::Update(v))
            }
            Change::Delete(Row::Vote(v)) => {
                let frame = Frame::new("vote", &VoteEvent { action: "delete", vote: &v });
                self.vote_frames(frame, Patch::Delete(v.id))
            }
            Change::Insert(Row::Comment(c)) => {
                let comment = resolved.unwrap_or_else(|| CommentWithAuthor::new(c, None));
                let frame = Frame::new("comment", &comment);
                self.view.apply_comment(Patch::Insert(comment));
                vec![frame]
            }
            Change::Update { after: Row::Comment(c), .. } => {
                let comment = resolved.unwrap_or_else(|| CommentWithAuthor::new(c, None));
                let frame = Frame::new("comment", &comment);
                self.view.apply_comment(Patch::Update(comment));
                vec![frame]
            }
            Change::Delete(Row::Comment(c)) => {
                self.view.apply_comment(Patch::Delete(c.id));
                vec![Frame::new("comment_deleted", &Removed { id: c.id })]
            }
            Change::Update { after: Row::Poll(p), .. } => {
                let frame = Frame::new("poll", &p);
                self.view.replace_poll(p);
                vec![frame]
            }
            Change::Delete(Row::Poll(p)) => {
                self.ended = true;
                vec![Frame::new("poll_deleted", &Removed { id: p.id })]
            }
            Change::Insert(Row::Poll(_)) => vec![],
        }
    }
}

struct PollStream {
    feed: PollFeed,
    subscription: Subscription,
    manager: PgSqlxManager,
    pending: VecDeque<Bytes>,
}

async fn load_comment(manager: &PgSqlxManager, id: Uuid) -> Result<Option<CommentWithAuthor>, Error> {
    let mut store = manager.acquire().await?;
    CommentCommon::get_with_author(&mut store, id).await
}

impl PollStream {
    async fn next_chunk(&mut self) -> Option<Bytes> {
        loop {
            if let Some(chunk) = self.pending.pop_front() {
                return Some(chunk);
            }
            if self.feed.ended() {
                return None;
            }
            let change = self.subscription.next().await?;
            let resolved = match &change {
                Change::Insert(Row::Comment(c)) | Change::Update { after: Row::Comment(c), .. } => match load_comment(&self.manager, c.id).await {
                    Ok(comment) => comment,
                    Err(e) => {
                        log::warn!("failed to load author of comment {}: {}", c.id, e);
                        None
                    }
                },
                _ => None,
            };
            self.pending.extend(self.feed.apply(change, resolved).iter().map(Frame::to_bytes));
        }
    }
}

/// Interleaves comment frames every `period` so idle connections stay open and dead ones get noticed.
/// Ends together with `body`.
fn with_keep_alive<S>(body: S, period: Duration) -> impl Stream<Item = Bytes>
where
    S: Stream<Item = Bytes>,
{
    let pings = stream::unfold(interval_at(Instant::now() + period, period), |mut ticker| async move {
        ticker.tick().await;
        Some((Some(Bytes::from_static(PING)), ticker))
    });
    let frames = body.map(Some).chain(stream::once(future::ready(None)));
    stream::select(frames, pings)
        .take_while(|chunk| future::ready(chunk.is_some()))
        .filter_map(future::ready)
}

fn event_stream<S>(body: S) -> HttpResponse
where
    S: Stream<Item = Bytes> + 'static,
{
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(with_keep_alive(body, KEEP_ALIVE).map(Ok::<_, Infallible>))
}

pub async fn poll_events(poll_id: Path<(Uuid,)>, manager: Manager, hub: Hub) -> Result<HttpResponse, Error> {
    let poll_id = poll_id.into_inner().0;
    // subscribe before loading, changes racing the load are deduplicated by the view
    let subscription = hub.subscribe(Topic::poll(poll_id));
    let view = {
        let mut store = manager.acquire().await?;
        poll_view(&mut store, poll_id).await?
    };
    let feed = PollFeed::new(view);
    let snapshot = feed.snapshot().to_bytes();
    let state = PollStream {
        feed,
        subscription,
        manager: manager.get_ref().clone(),
        pending: VecDeque::new(),
    };
    let body = stream::once(async move { snapshot }).chain(stream::unfold(state, |mut s| async move { s.next_chunk().await.map(|chunk| (chunk, s)) }));
    Ok(event_stream(body))
}

/// Poll list changes as seen by one viewer.
pub struct PollListFeed {
    viewer: Option<Uuid>,
}

impl PollListFeed {
    pub fn new(viewer: Option<Uuid>) -> Self {
        Self { viewer }
    }

    /// Polls never listed for the viewer produce no frame, their ids stay private.
    pub fn apply(&self, change: Change) -> Option<Frame> {
        match change {
            Change::Insert(Row::Poll(p)) if p.is_listed_for(self.viewer) => Some(Frame::new("poll_inserted", &p)),
            Change::Update {
                before: Row::Poll(old),
                after: Row::Poll(p),
            } => match (old.is_listed_for(self.viewer), p.is_listed_for(self.viewer)) {
                (true, true) => Some(Frame::new("poll_updated", &p)),
                (false, true) => Some(Frame::new("poll_inserted", &p)),
                (true, false) => Some(Frame::new("poll_deleted", &Removed { id: p.id })),
                (false, false) => None,
            },
            Change::Delete(Row::Poll(p)) if p.is_listed_for(self.viewer) => Some(Frame::new("poll_deleted", &Removed { id: p.id })),
            _ => None,
        }
    }
}

pub async fn polls_events(user_info: Option<UserInfo>, hub: Hub) -> HttpResponse {
    let subscription = hub.subscribe(Topic::polls());
    let feed = PollListFeed::new(user_info.map(|u| u.id));
    let body = stream::unfold((subscription, feed), |(mut subscription, feed)| async move {
        loop {
            let change = subscription.next().await?;
            if let Some(frame) = feed.apply(change) {
                return Some((frame.to_bytes(), (subscription, feed)));
            }
        }
    });
    event_stream(body)
}
