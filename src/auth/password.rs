use std::str::FromStr;

use argon2::{
    password_hash::{
        Error as PhcError, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Argon2,
};
use rand::rngs::OsRng;
use serde::Deserialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("password comparison failed: {0}")]
    Comparison(String),
}

#[derive(Debug, Error)]
#[error("unknown password scheme: {0}")]
pub struct UnknownScheme(pub String);

/// Algorithm used for newly written hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    Bcrypt,
    Argon2,
}

impl FromStr for PasswordScheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bcrypt" => Ok(Self::Bcrypt),
            "argon2" | "argon2id" => Ok(Self::Argon2),
            other => Err(UnknownScheme(other.to_string())),
        }
    }
}

/// Salted one-way password hashing.
///
/// `compare` returning `Ok(false)` is a plain mismatch; `Err` means the
/// primitive itself failed.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, PasswordError>;
    fn compare(&self, plain: &str, hashed: &str) -> Result<bool, PasswordError>;
}

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    scheme: PasswordScheme,
    bcrypt_cost: u32,
}

impl PasswordHasher {
    pub fn new(scheme: PasswordScheme, bcrypt_cost: u32) -> Self {
        Self {
            scheme,
            bcrypt_cost,
        }
    }

    pub fn bcrypt(cost: u32) -> Self {
        Self::new(PasswordScheme::Bcrypt, cost)
    }

    pub fn argon2() -> Self {
        Self::new(PasswordScheme::Argon2, crate::config::DEFAULT_BCRYPT_COST)
    }

    pub fn scheme(&self) -> PasswordScheme {
        self.scheme
    }
}

impl CredentialHasher for PasswordHasher {
    fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        match self.scheme {
            PasswordScheme::Bcrypt => bcrypt::hash(plain, self.bcrypt_cost).map_err(|e| {
                error!(error = %e, cost = self.bcrypt_cost, "bcrypt hash error");
                PasswordError::Hashing(e.to_string())
            }),
            PasswordScheme::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                let hash = Argon2::default()
                    .hash_password(plain.as_bytes(), &salt)
                    .map_err(|e| {
                        error!(error = %e, "argon2 hash_password error");
                        PasswordError::Hashing(e.to_string())
                    })?
                    .to_string();
                Ok(hash)
            }
        }
    }

    fn compare(&self, plain: &str, hashed: &str) -> Result<bool, PasswordError> {
        // Scheme follows the stored hash, not the configured one.
        if hashed.starts_with("$argon2") {
            let parsed = PasswordHash::new(hashed).map_err(|e| {
                error!(error = %e, "argon2 parse hash error");
                PasswordError::Comparison(e.to_string())
            })?;
            return match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(PhcError::Password) => Ok(false),
                Err(e) => {
                    error!(error = %e, "argon2 verify_password error");
                    Err(PasswordError::Comparison(e.to_string()))
                }
            };
        }

        bcrypt::verify(plain, hashed).map_err(|e| {
            error!(error = %e, "bcrypt verify error");
            PasswordError::Comparison(e.to_string())
        })
    }
}
