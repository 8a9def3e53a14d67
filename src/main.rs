// main.rs - clinic front desk server
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::{Compress, DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod announcer;
mod board;
mod board_handlers;
mod client;
mod config;
mod debounce;
mod error;
mod feedback;
mod feedback_handlers;
mod handlers;
mod models;
mod validator;

use board::{CounterBoard, SharedBoard};
use client::HttpClinicApi;
use config::{load_config, Config};
use error::ApiError;
use feedback::FeedbackDesk;

pub struct AppState {
    pub feedback: FeedbackDesk,
    pub board: SharedBoard,
    pub config: Config,
    pub started_at: DateTime<Utc>,
}

// ==================== MAIN ====================

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (this calls load_env_file internally)
    let config = load_config()?;

    setup_logging(&config)?;

    if config.is_production() {
        validate_production_config(&config)?;
    }

    config.print_startup_info();

    let api = Arc::new(HttpClinicApi::new(&config.api)?);
    let feedback = FeedbackDesk::new(api, &config.feedback);

    // Employee list for the feedback screen, loaded once at startup
    let mount_desk = feedback.clone();
    tokio::spawn(async move {
        mount_desk.mount().await;
    });

    let (announcements, _announcer_worker) = announcer::spawn_announcer(announcer::from_config(&config.announcer));
    let board = CounterBoard::new(&config.board, Some(announcements)).shared();

    // Kept alive until the server stops
    let clock = board::start_clock(board.clone(), Duration::from_millis(config.board.tick_ms));

    let app_state = Arc::new(AppState {
        feedback,
        board,
        config: config.clone(),
        started_at: Utc::now(),
    });

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    log::info!("Starting server at http://{}", bind_address);

    let server_config = config.clone();
    let mut server = HttpServer::new(move || {
        let cors = setup_cors(&server_config.security.allowed_origins, server_config.is_production());
        let security_headers = setup_security_headers(&server_config.security);

        App::new()
            .wrap(cors)
            .wrap(security_headers)
            .wrap(Logger::default())
            .wrap(Compress::default())
            .app_data(web::Data::new(app_state.clone()))
            .app_data(json_config())
            .route("/health", web::get().to(handlers::health_check))
            .service(
                web::scope("/api")
                    .configure(feedback_handlers::routes)
                    .configure(board_handlers::routes),
            )
    });

    if let Some(workers) = config.server.workers {
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)?
        .run()
        .await
        .context("Server failed to run")?;

    clock.stop();
    log::info!("Server stopped");
    Ok(())
}

// ==================== HELPER FUNCTIONS ====================

/// Malformed JSON bodies get the same error envelope as every other failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

pub fn setup_cors(allowed_origins: &[String], is_production: bool) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![header::CONTENT_LENGTH])
        .max_age(3600);

    if allowed_origins.iter().any(|origin| origin == "*") && !is_production {
        log::warn!("⚠️  Using wildcard CORS (*) in development mode");
        return cors.allow_any_origin();
    }

    for origin in allowed_origins.iter().filter(|origin| !origin.is_empty() && *origin != "*") {
        log::debug!("Adding CORS origin: {}", origin);
        cors = cors.allowed_origin(origin);
    }

    cors
}

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.as_str()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

fn validate_production_config(config: &Config) -> anyhow::Result<()> {
    if config.security.allowed_origins.iter().any(|origin| origin == "*") {
        anyhow::bail!("Wildcard CORS origins not allowed in production!");
    }

    if !config.api.base_url.starts_with("https://") {
        log::warn!("Clinic API is not reached over HTTPS: {}", config.api.base_url);
    }

    Ok(())
}

fn setup_security_headers(config: &crate::config::SecurityConfig) -> DefaultHeaders {
    let mut headers = DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"));

    if config.require_https {
        headers = headers.add((
            "Strict-Transport-Security",
            "max-age=31536000; includeSubDomains",
        ));
    }

    headers
}
