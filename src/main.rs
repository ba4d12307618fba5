use actix_cors::Cors;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{cookie::Key, middleware, web, App, HttpServer};
use std::sync::Arc;

use studyquota::bootstrap;
use studyquota::config;
use studyquota::db;
use studyquota::quota::{QuotaPolicy, SystemClock};
use studyquota::retention;
use studyquota::routes;
use studyquota::services::PgUsageLedger;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::Config::from_env().map_err(|e| {
        log::error!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("Starting studyquota on {}:{}", config.host, config.port);
    log::info!(
        "Quota day starts at local midnight of UTC{} (limits: {:?})",
        config.quota.utc_offset,
        config.quota.limits
    );

    let db_pool = db::create_pool(&config.database).await.map_err(|e| {
        log::error!("Database pool error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    db::run_migrations(&db_pool).await.map_err(|e| {
        log::error!("Migration error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    if let Err(e) = bootstrap::create_bootstrap_account_if_needed(&db_pool).await {
        log::error!("Failed to seed bootstrap account: {}", e);
    }

    let clock = Arc::new(SystemClock);
    let ledger = Arc::new(PgUsageLedger::new(db_pool.clone(), clock.clone()));
    let policy = QuotaPolicy::new(ledger, clock, config.quota.clone());

    let retention_task = retention::spawn_if_configured(policy.clone());

    // Session secret key from config or generate random (with warning)
    let secret_key = match &config.security.session_secret_key {
        Some(key) => key.clone(),
        None => {
            log::warn!(
                "SESSION_SECRET_KEY not set, using random key (sessions won't persist across restarts)"
            );
            use rand::Rng;
            let random_bytes: Vec<u8> = (0..64).map(|_| rand::rng().random()).collect();
            hex::encode(random_bytes)
        }
    };

    let key = Key::from(secret_key.as_bytes());

    let host = config.host.clone();
    let port = config.port;
    let ssl_proxy = config.security.ssl_proxy;
    let policy_data = web::Data::new(policy);

    let server = HttpServer::new(move || {
        // The study frontend is served from its own origin and sends the session cookie
        let cors = Cors::default()
            .allow_any_origin()
            .supports_credentials()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .expose_headers(vec![actix_web::http::header::RETRY_AFTER])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(policy_data.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(cors) // CORS must be before SessionMiddleware
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                    .cookie_name("studyquota_session".to_string())
                    .cookie_secure(ssl_proxy)
                    .cookie_http_only(true)
                    .cookie_same_site(actix_web::cookie::SameSite::Lax)
                    .build(),
            )
            .configure(routes::health::configure)
            .configure(routes::auth::configure)
            .configure(routes::quota::configure)
    })
    .bind((host.as_str(), port))?
    .shutdown_timeout(30)
    .run();

    let server_handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        log::info!("Shutdown signal received, stopping server...");
        server_handle.stop(true).await;
    });

    let result = server.await;

    if let Some(task) = retention_task {
        task.abort();
    }

    result
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                log::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
