//! Authentication
//!
//! Argon2id password hashes and HS256-signed session tokens.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::models::UserAccount;
use crate::session::Session;
use crate::store::{RepoResult, UserRepository};

pub use argon2::password_hash::Error as PasswordHashError;

const SALT_LEN: usize = 16;

/// Hash a password for storage as an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt_bytes: [u8; SALT_LEN] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes)?;
    Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Check a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

/// Look up `username` and check `password`. `Ok(None)` means bad credentials.
pub async fn authenticate(
    users: &dyn UserRepository,
    username: &str,
    password: &str,
) -> RepoResult<Option<UserAccount>> {
    let Some(user) = users.find_by_username(username).await? else {
        return Ok(None);
    };
    if verify_password(password, &user.password_hash) {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Signed session token body
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub session: Session,
    pub iat: i64,
    pub exp: usize,
}

/// Signing keys and lifetime for session tokens
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Per-process secret; sessions do not survive a restart.
    pub fn random(ttl_hours: i64) -> Self {
        let secret: [u8; 32] = rand::random();
        Self::new(&secret, ttl_hours)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn create_token(&self, session: &Session) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            session: session.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    pub fn verify_token(&self, token: &str) -> Result<Session, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(token_data.claims.session)
    }
}
