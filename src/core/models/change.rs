use crate::core::models::{comment::Comment, poll::Poll, vote::Vote};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Polls,
    Votes,
    Comments,
}

/// Raw columns of a changed row.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Poll(Poll),
    Vote(Vote),
    Comment(Comment),
}

impl Row {
    pub fn table(&self) -> Table {
        match self {
            Row::Poll(_) => Table::Polls,
            Row::Vote(_) => Table::Votes,
            Row::Comment(_) => Table::Comments,
        }
    }

    /// The poll the row belongs to; a poll belongs to itself.
    pub fn poll_id(&self) -> Uuid {
        match self {
            Row::Poll(p) => p.id,
            Row::Vote(v) => v.poll_id,
            Row::Comment(c) => c.poll_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Insert(Row),
    /// `before` is the row as it was prior to the update.
    Update { before: Row, after: Row },
    Delete(Row),
}

impl Change {
    /// The row as it is after the change; the removed row for deletes.
    pub fn row(&self) -> &Row {
        match self {
            Change::Insert(row) | Change::Update { after: row, .. } | Change::Delete(row) => row,
        }
    }

    pub fn table(&self) -> Table {
        self.row().table()
    }

    pub fn poll_id(&self) -> Uuid {
        self.row().poll_id()
    }
}

/// Subscription filter over changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    pub tables: Vec<Table>,
    pub poll_id: Option<Uuid>,
}

impl Topic {
    pub fn polls() -> Self {
        Self {
            tables: vec![Table::Polls],
            poll_id: None,
        }
    }

    pub fn poll(id: Uuid) -> Self {
        Self {
            tables: vec![Table::Polls, Table::Votes, Table::Comments],
            poll_id: Some(id),
        }
    }

    pub fn matches(&self, change: &Change) -> bool {
        if !self.tables.contains(&change.table()) {
            return false;
        }
        match self.poll_id {
            Some(id) => change.poll_id() == id,
            None => true,
        }
    }
}
