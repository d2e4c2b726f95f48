use crate::core::models::{
    comment::{Comment, CommentWithAuthor, Insert as CommentInsert},
    option::{Insert as OptionInsert, Opt},
    poll::{Insert as PollInsert, Patch as PollPatch, Poll, Query as PollQuery},
    profile::{Insert as ProfileInsert, Patch as ProfilePatch, Profile},
    user::{Insert as UserInsert, User},
    vote::{Insert as VoteInsert, Query as VoteQuery, Vote},
};
use crate::error::Error;
use uuid::Uuid;

pub trait UserCommon {
    async fn insert(&mut self, user: UserInsert) -> Result<User, Error>;
    async fn get(&mut self, id: Uuid) -> Result<Option<User>, Error>;
    async fn get_by_email(&mut self, email: &str) -> Result<Option<User>, Error>;
}

pub trait ProfileCommon {
    async fn insert(&mut self, profile: ProfileInsert) -> Result<Profile, Error>;
    async fn get(&mut self, id: Uuid) -> Result<Option<Profile>, Error>;
    async fn update(&mut self, id: Uuid, patch: ProfilePatch) -> Result<Profile, Error>;
}

pub trait PollCommon {
    async fn insert(&mut self, poll: PollInsert) -> Result<Poll, Error>;
    async fn get(&mut self, id: Uuid) -> Result<Option<Poll>, Error>;
    /// Newest first.
    async fn query(&mut self, query: &PollQuery) -> Result<Vec<Poll>, Error>;
    async fn update(&mut self, id: Uuid, patch: PollPatch) -> Result<Poll, Error>;
    async fn delete(&mut self, id: Uuid) -> Result<(), Error>;
}

pub trait OptionCommon {
    async fn bulk_insert(&mut self, options: Vec<OptionInsert>) -> Result<Vec<Opt>, Error>;
    async fn get(&mut self, id: Uuid) -> Result<Option<Opt>, Error>;
    /// Options of a poll ordered by position.
    async fn query(&mut self, poll_id: Uuid) -> Result<Vec<Opt>, Error>;
}

pub trait VoteCommon {
    async fn insert(&mut self, vote: VoteInsert) -> Result<Vote, Error>;
    /// Oldest first.
    async fn query(&mut self, query: &VoteQuery) -> Result<Vec<Vote>, Error>;
    /// Returns the removed rows.
    async fn delete(&mut self, query: &VoteQuery) -> Result<Vec<Vote>, Error>;
}

pub trait CommentCommon {
    async fn insert(&mut self, comment: CommentInsert) -> Result<Comment, Error>;
    async fn get(&mut self, id: Uuid) -> Result<Option<Comment>, Error>;
    async fn get_with_author(&mut self, id: Uuid) -> Result<Option<CommentWithAuthor>, Error>;
    /// Newest first.
    async fn query_with_author(&mut self, poll_id: Uuid) -> Result<Vec<CommentWithAuthor>, Error>;
    async fn delete(&mut self, id: Uuid) -> Result<(), Error>;
}

pub trait Common: UserCommon + ProfileCommon + PollCommon + OptionCommon + VoteCommon + CommentCommon {}

pub trait Store: Common {}

pub trait TxStore: Store {
    async fn commit(self) -> Result<(), Error>;
    async fn rollback(self) -> Result<(), Error>;
}
