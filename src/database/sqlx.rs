use crate::core::models::{
    comment::{Comment, CommentRow, CommentWithAuthor, Insert as CommentInsert},
    option::{Insert as OptionInsert, Opt},
    poll::{Insert as PollInsert, Patch as PollPatch, Poll, Query as PollQuery},
    profile::{Insert as ProfileInsert, Patch as ProfilePatch, Profile},
    user::{Insert as UserInsert, User},
    vote::{Insert as VoteInsert, Query as VoteQuery, Vote},
};
use crate::core::ports::repository::{Common, CommentCommon, OptionCommon, PollCommon, ProfileCommon, Store, TxStore, UserCommon, VoteCommon};
use crate::error::Error;
use sqlx::pool::PoolConnection;
use sqlx::{query, query_as, PgConnection, PgPool, Postgres, QueryBuilder, Transaction};
use std::ops::DerefMut;
use uuid::Uuid;

pub struct PgSqlx<E>
where
    E: DerefMut<Target = PgConnection>,
{
    executor: E,
}

impl<E> PgSqlx<E>
where
    E: DerefMut<Target = PgConnection>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

const COMMENT_WITH_AUTHOR: &str = "
    SELECT c.id, c.poll_id, c.user_id, c.content, c.created_at, c.updated_at, p.username, p.avatar_url
    FROM comments AS c
    LEFT JOIN profiles AS p ON p.id = c.user_id";

impl<E> UserCommon for PgSqlx<E>
where
    E: DerefMut<Target = PgConnection>,
{
    async fn insert(&mut self, user: UserInsert) -> Result<User, Error> {
        query_as("INSERT INTO users (email, password, salt, username) VALUES ($1, $2, $3, $4) RETURNING *")
            .bind(user.email)
            .bind(user.password)
            .bind(user.salt)
            .bind(user.username)
            .fetch_one(&mut *self.executor)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => Error::Conflict("email already registered".into()),
                e => e.into(),
            })
    }

    async fn get(&mut self, id: Uuid) -> Result<Option<User>, Error> {
        let user = query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(&mut *self.executor).await?;
        Ok(user)
    }

    async fn get_by_email(&mut self, email: &str) -> Result<Option<User>, Error> {
        let user = query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(&mut *self.executor).await?;
        Ok(user)
    }
}

impl<E> ProfileCommon for PgSqlx<E>
where
    E: DerefMut<Target = PgConnection>,
{
    async fn insert(&mut self, profile: ProfileInsert) -> Result<Profile, Error> {
        // two first requests of the same user may race here
        let profile = query_as(
            "INSERT INTO profiles (id, username, avatar_url) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id
            RETURNING *",
        )
        .bind(profile.id)
        .bind(profile.username)
        .bind(profile.avatar_url)
        .fetch_one(&mut *self.executor)
        .await?;
        Ok(profile)
    }

    async fn get(&mut self, id: Uuid) -> Result<Option<Profile>, Error> {
        let profile = query_as("SELECT * FROM profiles WHERE id = $1").bind(id).fetch_optional(&mut *self.executor).await?;
        Ok(profile)
    }

    async fn update(&mut self, id: Uuid, patch: ProfilePatch) -> Result<Profile, Error> {
        query_as("UPDATE profiles SET username = $1, avatar_url = $2, updated_at = now() WHERE id = $3 RETURNING *")
            .bind(patch.username)
            .bind(patch.avatar_url)
            .bind(id)
            .fetch_optional(&mut *self.executor)
            .await?
            .ok_or_else(|| Error::NotFound("profile".into()))
    }
}

impl<E> PollCommon for PgSqlx<E>
where
    E: DerefMut<Target = PgConnection>,
{
    async fn insert(&mut self, poll: PollInsert) -> Result<Poll, Error> {
        let poll = query_as(
            "INSERT INTO polls (title, description, created_by, is_public, allow_comments, closes_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *",
        )
        .bind(poll.title)
        .bind(poll.description)
        .bind(poll.created_by)
        .bind(poll.is_public)
        .bind(poll.allow_comments)
        .bind(poll.closes_at)
        .fetch_one(&mut *self.executor)
        .await?;
        Ok(poll)
    }

    async fn get(&mut self, id: Uuid) -> Result<Option<Poll>, Error> {
        let poll = query_as("SELECT * FROM polls WHERE id = $1").bind(id).fetch_optional(&mut *self.executor).await?;
        Ok(poll)
    }

    async fn query(&mut self, query: &PollQuery) -> Result<Vec<Poll>, Error> {
        let polls = query_as(
            "
        SELECT *
        FROM polls
        WHERE is_public OR created_by = $1
        ORDER BY created_at DESC",
        )
        .bind(query.viewer)
        .fetch_all(&mut *self.executor)
        .await?;
        Ok(polls)
    }

    async fn update(&mut self, id: Uuid, patch: PollPatch) -> Result<Poll, Error> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE polls SET updated_at = now()");
        if let Some(title) = patch.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Some(description) = patch.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(is_public) = patch.is_public {
            builder.push(", is_public = ").push_bind(is_public);
        }
        if let Some(allow_comments) = patch.allow_comments {
            builder.push(", allow_comments = ").push_bind(allow_comments);
        }
        if let Some(closes_at) = patch.closes_at {
            builder.push(", closes_at = ").push_bind(closes_at);
        }
        builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");
        builder
            .build_query_as::<Poll>()
            .fetch_optional(&mut *self.executor)
            .await?
            .ok_or_else(|| Error::NotFound("poll".into()))
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), Error> {
        query("DELETE FROM polls WHERE id = $1").bind(id).execute(&mut *self.executor).await?;
        Ok(())
    }
}

impl<E> OptionCommon for PgSqlx<E>
where
    E: DerefMut<Target = PgConnection>,
{
    async fn bulk_insert(&mut self, options: Vec<OptionInsert>) -> Result<Vec<Opt>, Error> {
        if options.is_empty() {
            return Ok(vec![]);
        }
        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO options (poll_id, text, position) ");
        builder.push_values(options, |mut b, o| {
            b.push_bind(o.poll_id).push_bind(o.text).push_bind(o.position);
        });
        builder.push(" RETURNING *");
        let mut options: Vec<Opt> = builder.build_query_as().fetch_all(&mut *self.executor).await?;
        options.sort_by_key(|o| o.position);
        Ok(options)
    }

    async fn get(&mut self, id: Uuid) -> Result<Option<Opt>, Error> {
        let option = query_as("SELECT * FROM options WHERE id = $1").bind(id).fetch_optional(&mut *self.executor).await?;
        Ok(option)
    }

    async fn query(&mut self, poll_id: Uuid) -> Result<Vec<Opt>, Error> {
        let options = query_as("SELECT * FROM options WHERE poll_id = $1 ORDER BY position")
            .bind(poll_id)
            .fetch_all(&mut *self.executor)
            .await?;
        Ok(options)
    }
}

impl<E> VoteCommon for PgSqlx<E>
where
    E: DerefMut<Target = PgConnection>,
{
    async fn insert(&mut self, vote: VoteInsert) -> Result<Vote, Error> {
        let vote = query_as("INSERT INTO votes (poll_id, option_id, user_id) VALUES ($1, $2, $3) RETURNING *")
            .bind(vote.poll_id)
            .bind(vote.option_id)
            .bind(vote.user_id)
            .fetch_one(&mut *self.executor)
            .await?;
        Ok(vote)
    }

    async fn query(&mut self, query: &VoteQuery) -> Result<Vec<Vote>, Error> {
        let votes = query_as(
            "
        SELECT *
        FROM votes
        WHERE ($1::UUID IS NULL OR poll_id = $1)
            AND ($2::TEXT IS NULL OR user_id = $2)
        ORDER BY created_at, id",
        )
        .bind(query.poll_id_eq)
        .bind(&query.user_id_eq)
        .fetch_all(&mut *self.executor)
        .await?;
        Ok(votes)
    }

    async fn delete(&mut self, query: &VoteQuery) -> Result<Vec<Vote>, Error> {
        let votes = query_as(
            "
        DELETE FROM votes
        WHERE ($1::UUID IS NULL OR poll_id = $1)
            AND ($2::TEXT IS NULL OR user_id = $2)
        RETURNING *",
        )
        .bind(query.poll_id_eq)
        .bind(&query.user_id_eq)
        .fetch_all(&mut *self.executor)
        .await?;
        Ok(votes)
    }
}

impl<E> CommentCommon for PgSqlx<E>
where
    E: DerefMut<Target = PgConnection>,
{
    async fn insert(&mut self, comment: CommentInsert) -> Result<Comment, Error> {
        let comment = query_as("INSERT INTO comments (poll_id, user_id, content) VALUES ($1, $2, $3) RETURNING *")
            .bind(comment.poll_id)
            .bind(comment.user_id)
            .bind(comment.content)
            .fetch_one(&mut *self.executor)
            .await?;
        Ok(comment)
    }

    async fn get(&mut self, id: Uuid) -> Result<Option<Comment>, Error> {
        let comment = query_as("SELECT * FROM comments WHERE id = $1").bind(id).fetch_optional(&mut *self.executor).await?;
        Ok(comment)
    }

    async fn get_with_author(&mut self, id: Uuid) -> Result<Option<CommentWithAuthor>, Error> {
        let row: Option<CommentRow> = query_as(&format!("{} WHERE c.id = $1", COMMENT_WITH_AUTHOR))
            .bind(id)
            .fetch_optional(&mut *self.executor)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn query_with_author(&mut self, poll_id: Uuid) -> Result<Vec<CommentWithAuthor>, Error> {
        let rows: Vec<CommentRow> = query_as(&format!("{} WHERE c.poll_id = $1 ORDER BY c.created_at DESC", COMMENT_WITH_AUTHOR))
            .bind(poll_id)
            .fetch_all(&mut *self.executor)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), Error> {
        query("DELETE FROM comments WHERE id = $1").bind(id).execute(&mut *self.executor).await?;
        Ok(())
    }
}

impl Common for PgSqlx<PoolConnection<Postgres>> {}
impl Common for PgSqlx<Transaction<'static, Postgres>> {}
impl Store for PgSqlx<PoolConnection<Postgres>> {}
impl Store for PgSqlx<Transaction<'static, Postgres>> {}

impl TxStore for PgSqlx<Transaction<'static, Postgres>> {
    async fn commit(self) -> Result<(), Error> {
        self.executor.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        self.executor.rollback().await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgSqlxManager {
    pool: PgPool,
}

impl PgSqlxManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> Result<PgSqlx<Transaction<'static, Postgres>>, Error> {
        let tx = self.pool.begin().await?;
        Ok(PgSqlx::new(tx))
    }

    pub async fn acquire(&self) -> Result<PgSqlx<PoolConnection<Postgres>>, Error> {
        let conn = self.pool.acquire().await?;
        Ok(PgSqlx::new(conn))
    }
}
