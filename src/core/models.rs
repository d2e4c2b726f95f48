pub mod change;
pub mod comment;
pub mod option;
pub mod poll;
pub mod profile;
pub mod user;
pub mod vote;
