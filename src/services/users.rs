use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::{Credentials, User};

pub struct UsersService;

/// Emails are matched case-insensitively; store them lowercased and trimmed
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl UsersService {
    /// Creates a new study account
    pub async fn create_user(pool: &PgPool, credentials: &Credentials) -> AppResult<User> {
        let password_hash = User::hash_password(&credentials.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, is_active, created_at, last_login
            "#,
        )
        .bind(normalize_email(&credentials.email))
        .bind(&password_hash)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Validation("Email already exists".to_string())
            }
            _ => AppError::Internal(format!("Failed to create user: {}", e)),
        })?;

        log::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Looks up an account by (normalized) email for login
    pub async fn get_by_email(pool: &PgPool, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_active, created_at, last_login
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by ID (session lookup)
    pub async fn get_by_id(pool: &PgPool, user_id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_active, created_at, last_login
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Enabled flag only, for resolving a session without loading the account.
    /// `None` when the account no longer exists.
    pub async fn is_active(pool: &PgPool, user_id: i32) -> AppResult<Option<bool>> {
        let active = sqlx::query_scalar::<_, bool>("SELECT is_active FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(active)
    }

    /// Stamps a successful login and returns the refreshed account
    pub async fn touch_last_login(pool: &PgPool, user_id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET last_login = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, is_active, created_at, last_login
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))
    }

    /// Enables or disables an account. Disabled accounts cannot log in and
    /// their sessions stop resolving.
    pub async fn set_active(pool: &PgPool, user_id: i32, is_active: bool) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = $2
            WHERE id = $1
            RETURNING id, email, password_hash, is_active, created_at, last_login
            "#,
        )
        .bind(user_id)
        .bind(is_active)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))
    }

    pub async fn user_count(pool: &PgPool) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
