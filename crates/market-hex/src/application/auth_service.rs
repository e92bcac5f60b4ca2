use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use market_types::domain::user::{normalize_email, Role, User};
use market_types::ports::UserRepository;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::load_user;
use crate::errors::AppError;

const MIN_PASSWORD_LENGTH: usize = 6;
const BAD_CREDENTIALS: &str = "invalid email or password";

/// JWT payload carried in the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl: chrono::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("token signing failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected session token");
                AppError::Unauthorized("invalid or expired session".into())
            })
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<(), AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("stored hash unreadable: {e}")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::Unauthorized(BAD_CREDENTIALS.into()))
}

pub struct AuthService<R: UserRepository> {
    repo: Arc<R>,
    keys: TokenKeys,
    admin_emails: Vec<String>,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, keys: TokenKeys, admin_emails: Vec<String>) -> Self {
        Self {
            repo,
            keys,
            admin_emails,
        }
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    /// Creates the account and returns it with a fresh session token.
    pub async fn register(
        &self,
        name: String,
        email: String,
        password: String,
    ) -> Result<(User, String), AppError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::BadRequest(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        let role = if self.admin_emails.contains(&normalize_email(&email)) {
            Role::Admin
        } else {
            Role::Customer
        };
        // Validate before paying for the hash.
        User::new(name.clone(), &email, String::new(), role).map_err(AppError::bad_request)?;
        let hash = hash_password(&password)?;
        let user = User::new(name, &email, hash, role).map_err(AppError::bad_request)?;

        let user = self.repo.create_user(user).await.map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("email already registered".into()),
            other => other,
        })?;
        tracing::info!(user_id = %user.id, role = ?user.role, "user registered");
        let token = self.keys.issue(&user)?;
        Ok((user, token))
    }

    pub async fn login(&self, email: String, password: String) -> Result<(User, String), AppError> {
        let user = self
            .repo
            .get_user_by_email(&normalize_email(&email))
            .await?
            .ok_or_else(|| AppError::Unauthorized(BAD_CREDENTIALS.into()))?;
        if let Err(e) = verify_password(&password, &user.password_hash) {
            tracing::info!(user_id = %user.id, "login rejected");
            return Err(e);
        }
        let token = self.keys.issue(&user)?;
        Ok((user, token))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        self.keys.verify(token)
    }

    /// The account behind a verified token; a vanished account reads as logged out.
    pub async fn current_user(&self, id: Uuid) -> Result<User, AppError> {
        load_user(self.repo.as_ref(), id).await.map_err(|e| match e {
            AppError::NotFound(_) => AppError::Unauthorized("account not found".into()),
            other => other,
        })
    }
}
