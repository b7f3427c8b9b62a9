/// Accounts and sessions
///
/// Passwords are stored as Argon2id PHC strings. Sessions are HS256 JWTs
/// signed with the configured secret; the token travels in the
/// `blog_session` cookie for pages or a Bearer header for the API.
use crate::config::SessionConfig;
use crate::db::BlogStore;
use crate::error::{AppError, Result};
use crate::metrics::record_mutation;
use crate::models::{LoginRequest, NewUser, RegisterRequest, User};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

pub const INVALID_CREDENTIALS: &str = "Email ou senha inválidos";

/// Hash a password with Argon2id and a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Constant-time check of `password` against a stored PHC hash
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Username, for display without a store round trip
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// The signed-in user, as carried by the session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
}

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
    secure_cookie: bool,
}

impl SessionKeys {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl_secs: config.ttl_secs,
            secure_cookie: config.secure_cookie,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn secure_cookie(&self) -> bool {
        self.secure_cookie
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            iat: now,
            exp: now + self.ttl_secs as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
    }

    /// Verify signature and expiry; any failure is `Unauthorized`
    pub fn verify(&self, token: &str) -> Result<SessionUser> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))?;

        let id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user ID".to_string()))?;

        Ok(SessionUser {
            id,
            name: data.claims.name,
        })
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn BlogStore>,
    sessions: SessionKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn BlogStore>, sessions: SessionKeys) -> Self {
        Self { store, sessions }
    }

    pub fn sessions(&self) -> &SessionKeys {
        &self.sessions
    }

    /// `auth.register`. Schema errors come back as `Validation`, a taken
    /// email or name as `Conflict` carrying the banner text.
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        // Validate what gets stored, not what was typed
        let request = RegisterRequest {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            ..request
        };
        request.validate()?;

        let new_user = NewUser {
            name: request.name,
            email: request.email.to_lowercase(),
            password_hash: hash_password(&request.password)?,
        };

        let result = self.store.create_user(&new_user).await;
        record_mutation("user_register", &result);
        let user = result?;

        info!(user_id = %user.id, name = %user.name, "user registered");
        Ok(user)
    }

    /// `auth.login`: returns the user and a fresh session token
    pub async fn login(&self, request: LoginRequest) -> Result<(User, String)> {
        let email = request.email.trim().to_lowercase();
        let record = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&request.password, &record.password_hash)? {
            warn!(user_id = %record.id, "login with wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let user = record.user();
        let token = self.sessions.issue(&user)?;
        info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<User>> {
        self.store.find_user_by_name(name).await
    }
}
