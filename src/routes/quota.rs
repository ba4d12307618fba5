use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::Student;
use crate::error::{AppError, AppResult};
use crate::models::{CategoryUsage, EntryId, FeatureCategory, QuotaDecision};
use crate::quota::QuotaPolicy;

#[derive(Serialize)]
struct UsageResponse {
    day_started_at: DateTime<Utc>,
    resets_at: DateTime<Utc>,
    categories: Vec<CategoryUsage>,
}

#[derive(Serialize)]
struct ConsumeResponse {
    decision: &'static str,
    category: FeatureCategory,
    entry_id: EntryId,
    used: i64,
    limit: i64,
    remaining: i64,
}

/// GET /api/quota
/// Today's usage per feature for the signed-in user
pub async fn get_usage(
    policy: web::Data<QuotaPolicy>,
    student: Student,
) -> AppResult<HttpResponse> {
    let now = policy.now();
    let categories = policy.usage(student.id()).await?;

    Ok(HttpResponse::Ok().json(UsageResponse {
        day_started_at: policy.day_boundary(now),
        resets_at: policy.next_boundary(now),
        categories,
    }))
}

/// POST /api/quota/{category}
///
/// Called by a feature handler right before it starts an AI generation.
/// 200 means the invocation was granted and recorded; 429 means today's
/// limit is used up and nothing was recorded.
pub async fn consume(
    policy: web::Data<QuotaPolicy>,
    student: Student,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let category = QuotaPolicy::parse_category(&path.into_inner())?;

    match policy
        .check_and_consume_category(student.id(), category)
        .await?
    {
        QuotaDecision::Allowed {
            entry_id,
            used,
            limit,
        } => Ok(HttpResponse::Ok().json(ConsumeResponse {
            decision: "allowed",
            category,
            entry_id,
            used,
            limit,
            remaining: (limit - used).max(0),
        })),
        QuotaDecision::Denied {
            used,
            limit,
            resets_at,
        } => {
            let retry_after = (resets_at - policy.now()).num_seconds().max(1) as u64;
            Err(AppError::QuotaExceeded {
                message: format!(
                    "daily limit for {} reached ({}/{}), resets at {}",
                    category,
                    used,
                    limit,
                    resets_at.to_rfc3339()
                ),
                retry_after,
            })
        }
    }
}

/// Configure quota routes (session auth via the Student extractor)
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/quota")
            .route("", web::get().to(get_usage))
            .route("/{category}", web::post().to(consume)),
    );
}
