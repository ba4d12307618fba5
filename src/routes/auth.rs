//! Account endpoints for the study frontend.
//!
//! A successful register or login leaves a session holding only the account
//! id; that id is what `/api/quota` charges usage against.

use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::{self, Student};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Credentials, User};
use crate::services::UsersService;

#[derive(Serialize)]
struct AccountView {
    id: i32,
    email: String,
    created_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl From<&User> for AccountView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

#[derive(Serialize)]
struct AccountResponse {
    account: AccountView,
}

impl AccountResponse {
    fn of(user: &User) -> Self {
        Self {
            account: AccountView::from(user),
        }
    }
}

/// Resolves a login form to an enabled account. Unknown email and wrong
/// password are indistinguishable to the caller.
async fn check_credentials(pool: &DbPool, form: &Credentials) -> AppResult<User> {
    match UsersService::get_by_email(pool, &form.email).await? {
        Some(user) if user.verify_password(&form.password)? => {
            if user.is_active {
                Ok(user)
            } else {
                Err(AppError::Unauthorized("Account is disabled".to_string()))
            }
        }
        _ => Err(AppError::Unauthorized("Invalid credentials".to_string())),
    }
}

/// POST /auth/register
pub async fn register(
    pool: web::Data<DbPool>,
    session: Session,
    form: web::Json<Credentials>,
) -> AppResult<HttpResponse> {
    form.validate_new_account()?;

    let account = UsersService::create_user(pool.get_ref(), &form).await?;
    auth::sign_in(&session, account.id)?;

    Ok(HttpResponse::Created().json(AccountResponse::of(&account)))
}

/// POST /auth/login
pub async fn login(
    pool: web::Data<DbPool>,
    session: Session,
    form: web::Json<Credentials>,
) -> AppResult<HttpResponse> {
    let account = check_credentials(pool.get_ref(), &form).await?;
    let account = UsersService::touch_last_login(pool.get_ref(), account.id).await?;
    auth::sign_in(&session, account.id)?;

    Ok(HttpResponse::Ok().json(AccountResponse::of(&account)))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> HttpResponse {
    auth::sign_out(&session);
    HttpResponse::NoContent().finish()
}

/// GET /auth/me
pub async fn me(pool: web::Data<DbPool>, student: Student) -> AppResult<HttpResponse> {
    let account = UsersService::get_by_id(pool.get_ref(), student.id())
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    Ok(HttpResponse::Ok().json(AccountResponse::of(&account)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/me", web::get().to(me)),
    );
}
