//! Repository implementation over plain vectors, used by service tests.

use crate::core::models::{
    comment::{Author, Comment, CommentWithAuthor, Insert as CommentInsert},
    option::{Insert as OptionInsert, Opt},
    poll::{Insert as PollInsert, Patch as PollPatch, Poll, Query as PollQuery},
    profile::{Insert as ProfileInsert, Patch as ProfilePatch, Profile},
    user::{Insert as UserInsert, User},
    vote::{Insert as VoteInsert, Query as VoteQuery, Vote},
};
use crate::core::ports::repository::{Common, CommentCommon, OptionCommon, PollCommon, ProfileCommon, Store, TxStore, UserCommon, VoteCommon};
use crate::error::Error;
use chrono::Utc;
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemState {
    pub users: Vec<User>,
    pub profiles: Vec<Profile>,
    pub polls: Vec<Poll>,
    pub options: Vec<Opt>,
    pub votes: Vec<Vote>,
    pub comments: Vec<Comment>,
    /// Makes option inserts fail.
    pub fail_options: bool,
    pub commits: usize,
    pub rollbacks: usize,
}

/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    pub state: Rc<RefCell<MemState>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_vote(query: &VoteQuery, vote: &Vote) -> bool {
    query.poll_id_eq.map_or(true, |id| vote.poll_id == id) && query.user_id_eq.as_ref().map_or(true, |uid| &vote.user_id == uid)
}

impl UserCommon for MemStore {
    async fn insert(&mut self, user: UserInsert) -> Result<User, Error> {
        let mut state = self.state.borrow_mut();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(Error::Conflict("email already registered".into()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            password: user.password,
            salt: user.salt,
            username: user.username,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get(&mut self, id: Uuid) -> Result<Option<User>, Error> {
        Ok(self.state.borrow().users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_email(&mut self, email: &str) -> Result<Option<User>, Error> {
        Ok(self.state.borrow().users.iter().find(|u| u.email == email).cloned())
    }
}

impl ProfileCommon for MemStore {
    async fn insert(&mut self, profile: ProfileInsert) -> Result<Profile, Error> {
        let now = Utc::now();
        let profile = Profile {
            id: profile.id,
            username: profile.username,
            avatar_url: profile.avatar_url,
            created_at: now,
            updated_at: now,
        };
        self.state.borrow_mut().profiles.push(profile.clone());
        Ok(profile)
    }

    async fn get(&mut self, id: Uuid) -> Result<Option<Profile>, Error> {
        Ok(self.state.borrow().profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn update(&mut self, id: Uuid, patch: ProfilePatch) -> Result<Profile, Error> {
        let mut state = self.state.borrow_mut();
        let profile = state.profiles.iter_mut().find(|p| p.id == id).ok_or_else(|| Error::NotFound("profile".into()))?;
        profile.username = patch.username;
        profile.avatar_url = patch.avatar_url;
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }
}

impl PollCommon for MemStore {
    async fn insert(&mut self, poll: PollInsert) -> Result<Poll, Error> {
        let now = Utc::now();
        let poll = Poll {
            id: Uuid::new_v4(),
            title: poll.title,
            description: poll.description,
            created_by: poll.created_by,
            is_public: poll.is_public,
            allow_comments: poll.allow_comments,
            closes_at: poll.closes_at,
            created_at: now,
            updated_at: now,
        };
        self.state.borrow_mut().polls.push(poll.clone());
        Ok(poll)
    }

    async fn get(&mut self, id: Uuid) -> Result<Option<Poll>, Error> {
        Ok(self.state.borrow().polls.iter().find(|p| p.id == id).cloned())
    }

    async fn query(&mut self, query: &PollQuery) -> Result<Vec<Poll>, Error> {
        Ok(self.state.borrow().polls.iter().rev().filter(|p| p.is_listed_for(query.viewer)).cloned().collect())
    }

    async fn update(&mut self, id: Uuid, patch: PollPatch) -> Result<Poll, Error> {
        let mut state = self.state.borrow_mut();
        let poll = state.polls.iter_mut().find(|p| p.id == id).ok_or_else(|| Error::NotFound("poll".into()))?;
        if let Some(title) = patch.title {
            poll.title = title;
        }
        if let Some(description) = patch.description {
            poll.description = description;
        }
        if let Some(is_public) = patch.is_public {
            poll.is_public = is_public;
        }
        if let Some(allow_comments) = patch.allow_comments {
            poll.allow_comments = allow_comments;
        }
        if let Some(closes_at) = patch.closes_at {
            poll.closes_at = closes_at;
        }
        poll.updated_at = Utc::now();
        Ok(poll.clone())
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), Error> {
        let mut state = self.state.borrow_mut();
        state.polls.retain(|p| p.id != id);
        state.options.retain(|o| o.poll_id != id);
        state.votes.retain(|v| v.poll_id != id);
        state.comments.retain(|c| c.poll_id != id);
        Ok(())
    }
}

impl OptionCommon for MemStore {
    async fn bulk_insert(&mut self, options: Vec<OptionInsert>) -> Result<Vec<Opt>, Error> {
        let mut state = self.state.borrow_mut();
        if state.fail_options {
            return Err(Error::DatabaseError(sqlx::Error::Protocol("option insert failed".into())));
        }
        let options: Vec<Opt> = options
            .into_iter()
            .map(|o| Opt {
                id: Uuid::new_v4(),
                poll_id: o.poll_id,
                text: o.text,
                position: o.position,
                created_at: Utc::now(),
            })
            .collect();
        state.options.extend(options.iter().cloned());
        Ok(options)
    }

    async fn get(&mut self, id: Uuid) -> Result<Option<Opt>, Error> {
        Ok(self.state.borrow().options.iter().find(|o| o.id == id).cloned())
    }

    async fn query(&mut self, poll_id: Uuid) -> Result<Vec<Opt>, Error> {
        let mut options: Vec<Opt> = self.state.borrow().options.iter().filter(|o| o.poll_id == poll_id).cloned().collect();
        options.sort_by_key(|o| o.position);
        Ok(options)
    }
}

impl VoteCommon for MemStore {
    async fn insert(&mut self, vote: VoteInsert) -> Result<Vote, Error> {
        let vote = Vote {
            id: Uuid::new_v4(),
            poll_id: vote.poll_id,
            option_id: vote.option_id,
            user_id: vote.user_id,
            created_at: Utc::now(),
        };
        self.state.borrow_mut().votes.push(vote.clone());
        Ok(vote)
    }

    async fn query(&mut self, query: &VoteQuery) -> Result<Vec<Vote>, Error> {
        Ok(self.state.borrow().votes.iter().filter(|v| matches_vote(query, v)).cloned().collect())
    }

    async fn delete(&mut self, query: &VoteQuery) -> Result<Vec<Vote>, Error> {
        let mut state = self.state.borrow_mut();
        let (deleted, kept): (Vec<Vote>, Vec<Vote>) = state.votes.drain(..).partition(|v| matches_vote(query, v));
        state.votes = kept;
        Ok(deleted)
    }
}

impl MemStore {
    fn with_author(&self, comment: Comment) -> CommentWithAuthor {
        let author = self.state.borrow().profiles.iter().find(|p| p.id == comment.user_id).map(|p| Author {
            username: p.username.clone(),
            avatar_url: p.avatar_url.clone(),
        });
        CommentWithAuthor::new(comment, author)
    }
}

impl CommentCommon for MemStore {
    async fn insert(&mut self, comment: CommentInsert) -> Result<Comment, Error> {
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            poll_id: comment.poll_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: now,
            updated_at: now,
        };
        self.state.borrow_mut().comments.push(comment.clone());
        Ok(comment)
    }

    async fn get(&mut self, id: Uuid) -> Result<Option<Comment>, Error> {
        Ok(self.state.borrow().comments.iter().find(|c| c.id == id).cloned())
    }

    async fn get_with_author(&mut self, id: Uuid) -> Result<Option<CommentWithAuthor>, Error> {
        let comment = CommentCommon::get(self, id).await?;
        Ok(comment.map(|c| self.with_author(c)))
    }

    async fn query_with_author(&mut self, poll_id: Uuid) -> Result<Vec<CommentWithAuthor>, Error> {
        let comments: Vec<Comment> = self.state.borrow().comments.iter().rev().filter(|c| c.poll_id == poll_id).cloned().collect();
        Ok(comments.into_iter().map(|c| self.with_author(c)).collect())
    }

    async fn delete(&mut self, id: Uuid) -> Result<(), Error> {
        self.state.borrow_mut().comments.retain(|c| c.id != id);
        Ok(())
    }
}

impl Common for MemStore {}
impl Store for MemStore {}

impl TxStore for MemStore {
    async fn commit(self) -> Result<(), Error> {
        self.state.borrow_mut().commits += 1;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        self.state.borrow_mut().rollbacks += 1;
        Ok(())
    }
}
