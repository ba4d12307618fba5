//! Cookie-session identity for quota callers.
//!
//! The session stores nothing but the account id. Quota routes turn it into a
//! [`Student`] without loading the account row; the only database read is
//! whether the account is still enabled.

use actix_session::{Session, SessionExt};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::Future;
use std::pin::Pin;

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::services::UsersService;

const ACCOUNT_ID_KEY: &str = "account_id";

/// Binds the session to `account_id` under a fresh session id
pub fn sign_in(session: &Session, account_id: i32) -> AppResult<()> {
    session.renew();
    session
        .insert(ACCOUNT_ID_KEY, account_id)
        .map_err(|e| AppError::Internal(format!("Failed to write session: {}", e)))
}

pub fn signed_in_account(session: &Session) -> Option<i32> {
    session.get::<i32>(ACCOUNT_ID_KEY).ok().flatten()
}

pub fn sign_out(session: &Session) {
    session.purge();
}

/// The signed-in student, reduced to the opaque id the usage ledger keys on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Student {
    id: i32,
}

impl Student {
    pub fn id(&self) -> i32 {
        self.id
    }
}

impl FromRequest for Student {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, AppError>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let account_id = signed_in_account(&req.get_session());
        let pool = req.app_data::<web::Data<DbPool>>().cloned();

        Box::pin(async move {
            let id = account_id
                .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))?;
            let pool = pool.ok_or_else(|| {
                AppError::Internal("Database pool not configured".to_string())
            })?;

            // Lookup failures answer 503, like a ledger outage
            match UsersService::is_active(pool.get_ref(), id)
                .await
                .map_err(|e| AppError::StorageUnavailable(e.to_string()))?
            {
                Some(true) => Ok(Student { id }),
                Some(false) => Err(AppError::Unauthorized("Account is disabled".to_string())),
                None => Err(AppError::Unauthorized("Account no longer exists".to_string())),
            }
        })
    }
}
