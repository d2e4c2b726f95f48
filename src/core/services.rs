pub mod auth;
pub mod comment;
pub mod poll;
pub mod username;
pub mod vote;
