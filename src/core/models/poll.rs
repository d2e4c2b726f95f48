use crate::core::models::{comment::CommentWithAuthor, option::Opt};
use crate::core::tally::Results;
use crate::request::present;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Poll {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub is_public: bool,
    pub allow_comments: bool,
    pub closes_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Poll {
    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        matches!(self.closes_at, Some(closes_at) if closes_at < now)
    }

    /// Private polls are left out of listings for everyone but their creator.
    pub fn is_listed_for(&self, viewer: Option<Uuid>) -> bool {
        self.is_public || viewer == Some(self.created_by)
    }
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub title: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub is_public: bool,
    pub allow_comments: bool,
    pub closes_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct Create {
    #[validate(length(max = 100, message = "Title must not exceed 100 characters"))]
    pub title: String,
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default = "default_true")]
    pub allow_comments: bool,
    pub closes_at: Option<DateTime<Utc>>,
    #[validate(length(min = 2, message = "You must provide at least two options"))]
    pub options: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct Update {
    #[validate(length(max = 100, message = "Title must not exceed 100 characters"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<Option<String>>,
    pub is_public: Option<bool>,
    pub allow_comments: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub closes_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Default, Clone)]
pub struct Patch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub is_public: Option<bool>,
    pub allow_comments: Option<bool>,
    pub closes_at: Option<Option<DateTime<Utc>>>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.is_public.is_none() && self.allow_comments.is_none() && self.closes_at.is_none()
    }
}

/// Polls listed for `viewer`, see [`Poll::is_listed_for`].
#[derive(Debug, Default)]
pub struct Query {
    pub viewer: Option<Uuid>,
}

/// A poll together with its options, as returned after creation.
#[derive(Debug, Serialize)]
pub struct PollWithOptions {
    #[serde(flatten)]
    pub poll: Poll,
    pub options: Vec<Opt>,
}

#[derive(Debug, Serialize)]
pub struct Detail {
    pub poll: Poll,
    pub options: Vec<Opt>,
    pub results: Results,
    pub is_closed: bool,
    /// Option chosen by the signed-in viewer, if they voted.
    pub my_vote: Option<Uuid>,
    /// `None` when the poll does not allow comments.
    pub comments: Option<Vec<CommentWithAuthor>>,
}
