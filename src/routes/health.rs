use actix_web::{http::StatusCode, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{self, DbPool};
use crate::quota::QuotaPolicy;

#[derive(Serialize)]
pub struct LivenessResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: &'static str,
    checks: ReadinessChecks,
    /// Start of the accounting day currently in effect
    quota_day_started_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    database: &'static str,
}

/// GET /health
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(LivenessResponse { status: "ok" })
}

/// GET /health/ready
/// 200 when the ledger database answers, 503 otherwise.
pub async fn readiness(pool: web::Data<DbPool>, policy: web::Data<QuotaPolicy>) -> HttpResponse {
    let db_healthy = db::health_check(pool.get_ref()).await;

    let (status, db_status, http_status) = if db_healthy {
        ("ready", "ok", StatusCode::OK)
    } else {
        ("not_ready", "error", StatusCode::SERVICE_UNAVAILABLE)
    };

    HttpResponse::build(http_status).json(ReadinessResponse {
        status,
        checks: ReadinessChecks {
            database: db_status,
        },
        quota_day_started_at: policy.day_boundary(policy.now()),
    })
}

/// Configure health routes (no auth required)
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(liveness))
            .route("/ready", web::get().to(readiness)),
    );
}
