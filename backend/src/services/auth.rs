//! Accounts and bearer tokens.
//!
//! Passwords are hashed with bcrypt and sessions are stateless HS256 JWTs that
//! carry the user's role, so request handling never needs a session store.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::{NewUser, Role, User, UserId};
use crate::db::repository::{FullRepository, RepositoryError};

const DEV_SECRET: &str = "dev-secret-change-me";

/// `[auth]` section of the club configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_secret() -> String {
    DEV_SECRET.to_string()
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_bcrypt_cost() -> u32 {
    10
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: default_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl AuthSettings {
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_SECRET
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("this action requires the {0} role")]
    Forbidden(Role),

    #[error("{0}")]
    Validation(String),

    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(max = 120, message = "full name is too long"))]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A freshly authenticated user and their token.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Issues and verifies credentials.
#[derive(Clone)]
pub struct AuthService {
    settings: AuthSettings,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("token_ttl_hours", &self.settings.token_ttl_hours)
            .field("bcrypt_cost", &self.settings.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(settings: AuthSettings) -> Self {
        if settings.uses_dev_secret() {
            warn!("JWT secret is the development default; set JWT_SECRET in production");
        }
        let encoding = EncodingKey::from_secret(settings.jwt_secret.as_bytes());
        let decoding = DecodingKey::from_secret(settings.jwt_secret.as_bytes());
        Self {
            settings,
            encoding,
            decoding,
        }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let exp = Utc::now() + Duration::hours(self.settings.token_ttl_hours);
        let claims = Claims {
            sub: user.id.value(),
            role: user.role,
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Hash on the blocking pool; bcrypt is deliberately slow.
    pub async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let cost = self.settings.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    pub async fn verify_password(&self, password: String, hash: String) -> bool {
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
            .await
            .unwrap_or(false)
    }

    /// Create a member account and sign it in.
    pub async fn register<R: FullRepository + ?Sized>(
        &self,
        repo: &R,
        request: RegisterRequest,
    ) -> Result<Session, AuthError> {
        request
            .validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        let password_hash = self.hash_password(request.password).await?;
        let full_name = request
            .full_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let user = repo
            .create_user(NewUser {
                email: request.email.trim().to_lowercase(),
                full_name,
                role: Role::Member,
                password_hash,
            })
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    AuthError::EmailTaken
                } else {
                    AuthError::Repository(e)
                }
            })?;

        info!("registered user {}", user.id);
        let token = self.issue_token(&user)?;
        Ok(Session { user, token })
    }

    /// Check credentials. Unknown emails and wrong passwords look the same.
    pub async fn login<R: FullRepository + ?Sized>(
        &self,
        repo: &R,
        request: LoginRequest,
    ) -> Result<Session, AuthError> {
        let user = repo
            .get_user_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self
            .verify_password(request.password, user.password_hash.clone())
            .await
        {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        Ok(Session { user, token })
    }

    /// Resolve the account behind a verified token.
    pub async fn current_user<R: FullRepository + ?Sized>(
        &self,
        repo: &R,
        user_id: UserId,
    ) -> Result<User, AuthError> {
        repo.get_user(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}
