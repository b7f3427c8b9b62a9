use crate::error::Result;
use crate::middleware::session_cookie;
use crate::models::{LoginRequest, RegisterRequest, User};
use crate::services::AuthService;
use actix_web::{web, HttpResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

/// `auth.register`
pub async fn register(
    auth: web::Data<AuthService>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let user = auth.register(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

/// `auth.login`; the token is returned in the body and set as the session
/// cookie
pub async fn login(
    auth: web::Data<AuthService>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let (user, token) = auth.login(body.into_inner()).await?;
    let cookie = session_cookie(token.clone(), auth.sessions());
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(LoginResponse { user, token }))
}
