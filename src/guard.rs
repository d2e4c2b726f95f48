//! Browser-side marker remembering that an anonymous visitor voted on a poll.

use actix_web::cookie::time::Duration;
use actix_web::cookie::Cookie;
use actix_web::HttpRequest;
use uuid::Uuid;

pub const COOKIE_PREFIX: &str = "poll_vote_";

pub fn cookie_name(poll_id: Uuid) -> String {
    format!("{}{}", COOKIE_PREFIX, poll_id)
}

pub fn has_voted(req: &HttpRequest, poll_id: Uuid) -> bool {
    req.cookie(&cookie_name(poll_id)).is_some()
}

/// Cookie holding the chosen option, kept for a year.
pub fn voted_cookie(poll_id: Uuid, option_id: Uuid, secure: bool) -> Cookie<'static> {
    Cookie::build(cookie_name(poll_id), option_id.to_string())
        .path("/")
        .max_age(Duration::days(365))
        .http_only(true)
        .secure(secure)
        .finish()
}
