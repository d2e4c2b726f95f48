use crate::context::UserInfo;
use crate::core::ports::tokener::{Claim, Payload, Tokener};
use crate::error::Error as AppError;
use crate::impls::tokener::jwt::JWT;
use actix_web::dev::{Service, ServiceRequest, Transform};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{Error, HttpMessage};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

pub static JWT_TOKEN: &str = "JWT_TOKEN";

/// Resolves the session token into a [`UserInfo`] request extension.
///
/// Requests without a token pass through anonymously. A bad bearer token is rejected with 401,
/// a stale session cookie is ignored so logout and login still work.
pub struct JWTMiddleware {
    tokener: JWT,
}

impl JWTMiddleware {
    pub fn new(tokener: JWT) -> Self {
        Self { tokener }
    }
}

impl<S> Transform<S, ServiceRequest> for JWTMiddleware
where
    S: Service<ServiceRequest, Error = Error> + 'static,
    S::Future: 'static,
{
    type Error = Error;
    type Response = S::Response;
    type Transform = JWTService<S>;
    type InitError = ();
    type Future = Pin<Box<dyn Future<Output = Result<Self::Transform, Self::InitError>>>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let tokener = self.tokener.clone();
        Box::pin(async move {
            Ok(JWTService {
                tokener,
                next_service: service,
            })
        })
    }
}

pub struct JWTService<S> {
    tokener: JWT,
    next_service: S,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Bearer,
    Cookie,
}

/// Bearer header first, then the session cookie.
fn token_of(req: &ServiceRequest) -> Option<(String, Source)> {
    if let Some(header) = req.headers().get(AUTHORIZATION) {
        if let Some(token) = header.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
            return Some((token.trim().to_owned(), Source::Bearer));
        }
    }
    req.cookie(JWT_TOKEN)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
        .map(|v| (v, Source::Cookie))
}

fn verify(tokener: &JWT, token: &str) -> Result<UserInfo, AppError> {
    let claim: Claim = tokener.verify_token(token)?;
    let id = claim.user().parse::<Uuid>().map_err(|_| AppError::Unauthorized)?;
    Ok(UserInfo { id })
}

impl<S> Service<ServiceRequest> for JWTService<S>
where
    S: Service<ServiceRequest, Error = Error>,
    S::Future: 'static,
{
    type Response = S::Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, ctx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.next_service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some((token, source)) = token_of(&req) {
            match verify(&self.tokener, &token) {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                }
                Err(e) if source == Source::Cookie => {
                    log::debug!("ignored stale session cookie: {}", e);
                }
                Err(e) => {
                    log::debug!("rejected bearer token: {}", e);
                    return Box::pin(async move { Err(AppError::Unauthorized.into()) });
                }
            }
        }
        let res_fut = self.next_service.call(req);
        Box::pin(res_fut)
    }
}
