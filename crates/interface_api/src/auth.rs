//! Authentication
//!
//! Users register with a login and password; the password is stored as an
//! Argon2 PHC string. Both register and login answer with a signed JWT whose
//! subject is the numeric user id.

use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use core_kernel::{PortError, UserId};
use domain_loyalty::UserPort;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (numeric user ID)
    pub sub: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    /// The user the token was issued to
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Login already taken: {0}")]
    LoginTaken(String),
    #[error("Invalid login or password")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("User store error: {0}")]
    Port(#[from] PortError),
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(user_id: UserId, secret: &str, expiration_secs: u64) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.get().to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Hashes a password into an Argon2 PHC string
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Checks a password against a stored PHC string
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Registration, login and token handling over a [`UserPort`]
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserPort>,
    secret: String,
    expiration_secs: u64,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserPort>, secret: impl Into<String>, expiration_secs: u64) -> Self {
        Self {
            users,
            secret: secret.into(),
            expiration_secs,
        }
    }

    /// Creates the user and returns a token for it
    pub async fn register(&self, login: &str, password: &str) -> Result<(UserId, String), AuthError> {
        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))??;

        let user = self
            .users
            .create_user(login, &hash)
            .await?
            .ok_or_else(|| AuthError::LoginTaken(login.to_string()))?;

        info!(user = %user.id, "User registered");
        let token = self.issue_token(user.id)?;
        Ok((user.id, token))
    }

    /// Checks the credentials and returns a token for the user
    pub async fn login(&self, login: &str, password: &str) -> Result<(UserId, String), AuthError> {
        let Some(user) = self.users.find_user_by_login(login).await? else {
            warn!("Login attempt for unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_string();
        let stored = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))??;

        if !matches {
            warn!(user = %user.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(user.id)?;
        Ok((user.id, token))
    }

    pub fn issue_token(&self, user: UserId) -> Result<String, AuthError> {
        create_token(user, &self.secret, self.expiration_secs)
    }

    /// Resolves a bearer token to the user it was issued to
    pub fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        validate_token(token, &self.secret)?.user_id()
    }
}
