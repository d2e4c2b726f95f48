use crate::error::Error;
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

/// Identity of the signed-in caller, put into the request extensions by the jwt middleware.
///
/// Extracting `UserInfo` rejects anonymous requests with 401, extracting `Option<UserInfo>` does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserInfo {
    pub id: Uuid,
}

impl FromRequest for UserInfo {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<Self>() {
            ready(Ok(*user))
        } else {
            ready(Err(Error::Unauthorized))
        }
    }
}
