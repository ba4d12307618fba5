use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

/// Shortest password accepted at registration
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Email and password as submitted by the register and login forms
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Rules a new account must satisfy. Login skips these so accounts keep
    /// working if the rules tighten.
    pub fn validate_new_account(&self) -> AppResult<()> {
        if !is_valid_email(self.email.trim()) {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }
        if self.password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

/// Basic email shape check: one '@', dotted domain, TLD of two or more chars
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if domain.contains('@') {
        return false;
    }

    if local.is_empty() || local.len() > 64 {
        return false;
    }
    if domain.is_empty() || domain.len() > 255 {
        return false;
    }

    // Also catches "user@.com" and "user@domain."
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return false;
    }

    labels.last().is_some_and(|tld| tld.len() >= 2)
}

impl User {
    /// Hash a password using Argon2id
    pub fn hash_password(password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Verify a password against the stored hash
    pub fn verify_password(&self, password: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(&self.password_hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
