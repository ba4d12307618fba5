//! Integration tests for the quota API
//!
//! Drives `/api/quota` through a real session: register, consume until the
//! daily limit, observe the 429, then roll the clock past midnight.

use actix_web::{test, web, App};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use studyquota::routes;
use studyquota::services::UsersService;

use crate::common::{manual_policy, quota_config, session_cookie, session_middleware, TestDb};

#[actix_web::test]
async fn test_consume_until_limit_then_reset() {
    let db = TestDb::new().await;
    let start = Utc.with_ymd_and_hms(2025, 10, 6, 8, 0, 0).unwrap();
    let (clock, policy) = manual_policy(&db.pool, start, quota_config(3));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(policy))
            .wrap(session_middleware())
            .configure(routes::auth::configure)
            .configure(routes::quota::configure),
    )
    .await;

    let register = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"email": "reader@uni.edu", "password": "flashcards4ever"}))
        .to_request();
    let resp = test::call_service(&app, register).await;
    assert_eq!(resp.status(), 201);
    let cookie = session_cookie(&resp);

    for expected_used in 1..=3 {
        let req = test::TestRequest::post()
            .uri("/api/quota/summary")
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["decision"], "allowed");
        assert_eq!(body["category"], "summary");
        assert_eq!(body["used"], expected_used);
        assert_eq!(body["remaining"], 3 - expected_used);
        assert!(body["entry_id"].is_string());
    }

    // 4th call at 11:00 is denied
    clock.set(Utc.with_ymd_and_hms(2025, 10, 6, 11, 0, 0).unwrap());
    let req = test::TestRequest::post()
        .uri("/api/quota/summary")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 429);

    let retry_after: u64 = resp
        .headers()
        .get("retry-after")
        .expect("Retry-After header")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(retry_after, 13 * 3600);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "QuotaExceeded");
    assert_eq!(body["error"]["retry_after"], 13 * 3600);

    // Denial recorded nothing
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usage_entries")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(rows, 3);

    // 00:01 the next day
    clock.set(Utc.with_ymd_and_hms(2025, 10, 7, 0, 1, 0).unwrap());
    let req = test::TestRequest::post()
        .uri("/api/quota/summary")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["used"], 1);
}

#[actix_web::test]
async fn test_usage_summary() {
    let db = TestDb::new().await;
    let start = Utc.with_ymd_and_hms(2025, 10, 6, 15, 30, 0).unwrap();
    let (_clock, policy) = manual_policy(&db.pool, start, quota_config(4));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(policy))
            .wrap(session_middleware())
            .configure(routes::auth::configure)
            .configure(routes::quota::configure),
    )
    .await;

    let register = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"email": "quiz@uni.edu", "password": "multiplechoice"}))
        .to_request();
    let resp = test::call_service(&app, register).await;
    let cookie = session_cookie(&resp);

    // kebab-case path segment from the frontend
    let req = test::TestRequest::post()
        .uri("/api/quota/edit-content")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get()
        .uri("/api/quota")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["day_started_at"], "2025-10-06T00:00:00Z");
    assert_eq!(body["resets_at"], "2025-10-07T00:00:00Z");

    let categories = body["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 5);
    let edit = categories
        .iter()
        .find(|c| c["category"] == "edit_content")
        .unwrap();
    assert_eq!(edit["used"], 1);
    assert_eq!(edit["limit"], 4);
    assert_eq!(edit["remaining"], 3);
}

#[actix_web::test]
async fn test_unknown_category_is_rejected_without_recording() {
    let db = TestDb::new().await;
    let (_clock, policy) = manual_policy(&db.pool, Utc::now(), quota_config(3));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(policy))
            .wrap(session_middleware())
            .configure(routes::auth::configure)
            .configure(routes::quota::configure),
    )
    .await;

    let register = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"email": "essay@uni.edu", "password": "longenough"}))
        .to_request();
    let resp = test::call_service(&app, register).await;
    let cookie = session_cookie(&resp);

    let req = test::TestRequest::post()
        .uri("/api/quota/essay")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "InvalidCategory");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM usage_entries")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

#[actix_web::test]
async fn test_consume_requires_session() {
    let db = TestDb::new().await;
    let (_clock, policy) = manual_policy(&db.pool, Utc::now(), quota_config(3));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(policy))
            .wrap(session_middleware())
            .configure(routes::quota::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/quota/summary")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::get().uri("/api/quota").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_disabled_or_removed_account_is_not_charged() {
    let db = TestDb::new().await;
    let (_clock, policy) = manual_policy(&db.pool, Utc::now(), quota_config(3));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(policy))
            .wrap(session_middleware())
            .configure(routes::auth::configure)
            .configure(routes::quota::configure),
    )
    .await;

    let register = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"email": "gone@uni.edu", "password": "password123"}))
        .to_request();
    let resp = test::call_service(&app, register).await;
    let cookie = session_cookie(&resp);
    let body: Value = test::read_body_json(resp).await;
    let account_id = body["account"]["id"].as_i64().unwrap() as i32;

    UsersService::set_active(&db.pool, account_id, false)
        .await
        .unwrap();
    let req = test::TestRequest::post()
        .uri("/api/quota/questions")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(account_id)
        .execute(&db.pool)
        .await
        .unwrap();
    let req = test::TestRequest::post()
        .uri("/api/quota/questions")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], "Unauthorized: Account no longer exists");

    assert_eq!(db.usage_rows(account_id, "questions").await, 0);
}

#[actix_web::test]
async fn test_session_lookup_outage_is_service_unavailable() {
    let db = TestDb::new().await;
    let (_clock, policy) = manual_policy(&db.pool, Utc::now(), quota_config(3));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(db.pool.clone()))
            .app_data(web::Data::new(policy))
            .wrap(session_middleware())
            .configure(routes::auth::configure)
            .configure(routes::quota::configure),
    )
    .await;

    let register = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({"email": "offline@uni.edu", "password": "password123"}))
        .to_request();
    let resp = test::call_service(&app, register).await;
    let cookie = session_cookie(&resp);

    db.pool.close().await;

    let req = test::TestRequest::post()
        .uri("/api/quota/summary")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "StorageUnavailable");
}
