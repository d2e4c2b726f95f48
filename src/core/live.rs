//! Local state kept by stream subscribers and patched with incoming changes.

use crate::core::models::{comment::CommentWithAuthor, option::Opt, poll::Poll, vote::Vote};
use crate::core::tally::{tally, Results};
use serde::Serialize;
use uuid::Uuid;

pub trait Keyed {
    fn key(&self) -> Uuid;
}

impl Keyed for Vote {
    fn key(&self) -> Uuid {
        self.id
    }
}

impl Keyed for CommentWithAuthor {
    fn key(&self) -> Uuid {
        self.comment.id
    }
}

/// Where inserted rows go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Append,
    Prepend,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Insert(T),
    Update(T),
    Delete(Uuid),
}

#[derive(Debug, Clone)]
pub struct LiveList<T> {
    items: Vec<T>,
    placement: Placement,
}

impl<T: Keyed> LiveList<T> {
    pub fn new(items: Vec<T>, placement: Placement) -> Self {
        Self { items, placement }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Applies `patch`, returning false when it left the list untouched.
    pub fn apply(&mut self, patch: Patch<T>) -> bool {
        match patch {
            Patch::Insert(item) => {
                // A row seen in the initial load may arrive again as an insert.
                if let Some(slot) = self.items.iter_mut().find(|i| i.key() == item.key()) {
                    *slot = item;
                    return true;
                }
                match self.placement {
                    Placement::Append => self.items.push(item),
                    Placement::Prepend => self.items.insert(0, item),
                }
                true
            }
            Patch::Update(item) => match self.items.iter_mut().find(|i| i.key() == item.key()) {
                Some(slot) => {
                    *slot = item;
                    true
                }
                None => false,
            },
            Patch::Delete(id) => {
                let before = self.items.len();
                self.items.retain(|i| i.key() != id);
                self.items.len() != before
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub poll: &'a Poll,
    pub options: &'a [Opt],
    pub results: Results,
    pub comments: &'a [CommentWithAuthor],
}

/// A single poll as followed by a live subscriber.
#[derive(Debug, Clone)]
pub struct PollView {
    poll: Poll,
    options: Vec<Opt>,
    votes: LiveList<Vote>,
    comments: LiveList<CommentWithAuthor>,
}

impl PollView {
    pub fn new(poll: Poll, options: Vec<Opt>, votes: Vec<Vote>, comments: Vec<CommentWithAuthor>) -> Self {
        Self {
            poll,
            options,
            votes: LiveList::new(votes, Placement::Append),
            comments: LiveList::new(comments, Placement::Prepend),
        }
    }

    pub fn results(&self) -> Results {
        tally(&self.options, self.votes.items())
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            poll: &self.poll,
            options: &self.options,
            results: self.results(),
            comments: self.comments.items(),
        }
    }

    /// Patches the vote list and returns the recomputed results.
    pub fn apply_vote(&mut self, patch: Patch<Vote>) -> Results {
        self.votes.apply(patch);
        self.results()
    }

    pub fn apply_comment(&mut self, patch: Patch<CommentWithAuthor>) -> bool {
        self.comments.apply(patch)
    }

    pub fn replace_poll(&mut self, poll: Poll) {
        self.poll = poll;
    }
}
