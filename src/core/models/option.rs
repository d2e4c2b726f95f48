use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Opt {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub text: String,
    /// Creation order within the poll, starting at 0.
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub poll_id: Uuid,
    pub text: String,
    pub position: i32,
}
