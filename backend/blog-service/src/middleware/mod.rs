/// Session extraction for blog-service
///
/// Pages and the API share one session format. The token is read from an
/// `Authorization: Bearer` header first, then from the session cookie.
/// [`SessionUser`] rejects anonymous requests with 401; [`Viewer`] never
/// rejects and lets page handlers decide (usually a redirect to `/login`).
use crate::error::AppError;
use crate::services::{SessionKeys, SessionUser};
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "blog_session";

/// The current user, if any
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<SessionUser>);

impl Viewer {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.id)
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.0.as_ref()
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

fn session_from_request(req: &HttpRequest) -> Result<SessionUser, AppError> {
    let keys = req
        .app_data::<web::Data<SessionKeys>>()
        .ok_or_else(|| AppError::Internal("session keys not configured".to_string()))?;

    let token = bearer_token(req)
        .or_else(|| req.cookie(SESSION_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    keys.verify(&token)
}

impl FromRequest for SessionUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(session_from_request(req))
    }
}

impl FromRequest for Viewer {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let viewer = match session_from_request(req) {
            Ok(user) => Viewer(Some(user)),
            Err(AppError::Internal(msg)) => return ready(Err(AppError::Internal(msg))),
            Err(err) => {
                debug!(reason = %err.message(), "anonymous request");
                Viewer(None)
            }
        };
        ready(Ok(viewer))
    }
}

/// Cookie holding a freshly issued session token
pub fn session_cookie(token: String, keys: &SessionKeys) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(keys.secure_cookie())
        .max_age(CookieDuration::seconds(keys.ttl_secs() as i64))
        .finish()
}

/// Expired cookie that makes the browser drop the session
pub fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    cookie
}
