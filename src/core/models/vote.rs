use crate::core::tally::Results;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const ANONYMOUS_PREFIX: &str = "anon-";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Vote {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub option_id: Uuid,
    /// A user id, or an anonymous token starting with [`ANONYMOUS_PREFIX`].
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub poll_id: Uuid,
    pub option_id: Uuid,
    pub user_id: String,
}

#[derive(Debug, Default, Clone)]
pub struct Query {
    pub poll_id_eq: Option<Uuid>,
    pub user_id_eq: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Submit {
    pub option_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voter {
    User(Uuid),
    /// `already_voted` is the browser's own claim that it voted on this poll before.
    Anonymous { already_voted: bool },
}

#[derive(Debug, Serialize)]
pub struct Outcome {
    pub vote: Vote,
    /// True when an earlier vote of the same identity was replaced.
    pub changed: bool,
    pub results: Results,
}

pub fn anonymous_identity() -> String {
    format!("{}{}", ANONYMOUS_PREFIX, Uuid::new_v4().simple())
}
