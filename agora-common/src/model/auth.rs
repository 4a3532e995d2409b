use crate::model::{
    Id,
    user::{UserMarker, Username},
};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString},
};
use base64::{DecodeError, Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Debug, Formatter},
    str::FromStr,
};
use thiserror::Error;

pub const SESSION_TOKEN_LEN: usize = 32;
pub const PASSWORD_SALT_LEN: usize = 16;

/// The identity a session token resolves to.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Identity {
    pub user_id: Id<UserMarker>,
    pub username: Username,
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum SessionTokenDecodeError {
    #[error("Decoding base64 failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("The length of the token is incorrect")]
    InvalidLength,
}

/// Opaque, unguessable session reference. Carries no claims of its own.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SessionToken([u8; SESSION_TOKEN_LEN]);

impl SessionToken {
    #[must_use]
    pub fn generate_random() -> Self {
        Self(rand::random())
    }

    #[must_use]
    pub fn as_token_str(&self) -> String {
        BASE64_URL_SAFE_NO_PAD.encode(self.0)
    }

    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("session:{}", self.as_token_str())
    }
}

impl FromStr for SessionToken {
    type Err = SessionTokenDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = BASE64_URL_SAFE_NO_PAD
            .decode(s)?
            .try_into()
            .map_err(|_| Self::Err::InvalidLength)?;

        Ok(Self(token))
    }
}

impl Debug for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionToken").field(&"[redacted]").finish()
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing password failed: {0}")]
pub struct PasswordHashError(password_hash::Error);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The stored password hash is not a valid PHC string")]
pub struct InvalidPasswordHashError;

/// Salted argon2 hash of a password in PHC string format.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    /// Hashes `password` with a fresh random salt.
    ///
    /// This is deliberately slow; call it off the async executor.
    pub fn generate(password: &str) -> Result<Self, PasswordHashError> {
        let salt_bytes: [u8; PASSWORD_SALT_LEN] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes).map_err(PasswordHashError)?;

        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(PasswordHashError)?;

        Ok(Self(hash.to_string()))
    }

    /// Wraps a hash loaded from storage.
    pub fn from_phc(phc: String) -> Result<Self, InvalidPasswordHashError> {
        PasswordHash::new(&phc).map_err(|_| InvalidPasswordHashError)?;
        Ok(Self(phc))
    }

    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        let Ok(hash) = PasswordHash::new(&self.0) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for PasswordHashString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PasswordHashString")
            .field(&"[redacted]")
            .finish()
    }
}
