use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Shown in place of a username when the author has no profile.
pub const UNKNOWN_AUTHOR: &str = "Anonymous";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub poll_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Create {
    #[validate(length(max = 1000, message = "Comment must not exceed 1000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub username: String,
    pub avatar_url: Option<String>,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            username: UNKNOWN_AUTHOR.into(),
            avatar_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Author,
}

impl CommentWithAuthor {
    pub fn new(comment: Comment, author: Option<Author>) -> Self {
        Self {
            comment,
            author: author.unwrap_or_default(),
        }
    }
}

/// A comment left joined with its author's profile.
#[derive(Debug, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<CommentRow> for CommentWithAuthor {
    fn from(row: CommentRow) -> Self {
        let author = row.username.map(|username| Author {
            username,
            avatar_url: row.avatar_url,
        });
        Self::new(
            Comment {
                id: row.id,
                poll_id: row.poll_id,
                user_id: row.user_id,
                content: row.content,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            author,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn row(username: Option<&str>) -> CommentRow {
        CommentRow {
            id: Uuid::new_v4(),
            poll_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            content: "pineapple belongs on pizza".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            username: username.map(Into::into),
            avatar_url: None,
        }
    }

    #[test]
    fn test_missing_profile_falls_back() {
        let c: CommentWithAuthor = row(None).into();
        assert_eq!(c.author.username, UNKNOWN_AUTHOR);
        let c: CommentWithAuthor = row(Some("pizza_lover")).into();
        assert_eq!(c.author.username, "pizza_lover");
    }

    #[test]
    fn test_serialized_shape() {
        let c: CommentWithAuthor = row(Some("pizza_lover")).into();
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["content"], "pineapple belongs on pizza");
        assert_eq!(v["author"]["username"], "pizza_lover");
    }

    #[test]
    fn test_content_limit() {
        let ok = Create { content: "a".repeat(1000) };
        assert!(ok.validate().is_ok());
        let too_long = Create { content: "a".repeat(1001) };
        assert!(too_long.validate().is_err());
    }
}
