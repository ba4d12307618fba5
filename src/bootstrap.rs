use log::{info, warn};
use sqlx::PgPool;
use std::env;

use crate::error::{AppError, AppResult};
use crate::models::Credentials;
use crate::services::UsersService;

pub const BOOTSTRAP_ACCOUNT_VAR: &str = "BOOTSTRAP_ACCOUNT";

/// Parses a `BOOTSTRAP_ACCOUNT` value of the form `email:password`.
/// Only the first ':' separates, so passwords may contain colons.
pub fn parse_bootstrap_account(raw: &str) -> AppResult<Credentials> {
    let (email, password) = raw.split_once(':').ok_or_else(|| {
        AppError::Validation(format!(
            "{} must be in format 'email:password'",
            BOOTSTRAP_ACCOUNT_VAR
        ))
    })?;

    let credentials = Credentials {
        email: email.trim().to_string(),
        password: password.to_string(),
    };
    credentials.validate_new_account()?;
    Ok(credentials)
}

/// Seeds one ordinary study account into an empty database, e.g. for a demo
/// deployment where registration happens later
pub async fn create_bootstrap_account_if_needed(pool: &PgPool) -> AppResult<()> {
    let raw = match env::var(BOOTSTRAP_ACCOUNT_VAR) {
        Ok(val) if !val.is_empty() => val,
        _ => return Ok(()),
    };

    if UsersService::user_count(pool).await? > 0 {
        warn!(
            "{} set but accounts already exist, not seeding",
            BOOTSTRAP_ACCOUNT_VAR
        );
        return Ok(());
    }

    let credentials = parse_bootstrap_account(&raw)?;
    let account = UsersService::create_user(pool, &credentials).await?;
    info!("Seeded bootstrap account {}", account.email);

    Ok(())
}
