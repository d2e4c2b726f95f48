pub mod comment;
pub mod events;
pub mod poll;
pub mod user;
pub mod vote;

use crate::database::sqlx::PgSqlxManager;
use crate::impls::notifier::broadcast::BroadcastHub;
use actix_web::web::Data;

pub type Manager = Data<PgSqlxManager>;
pub type Hub = Data<BroadcastHub>;
