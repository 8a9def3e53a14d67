// src/handlers.rs
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

// ==================== COMMON STRUCTURES ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

// ==================== HEALTH ====================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub clinic: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: i64,
}

pub async fn health_check(app_state: web::Data<Arc<AppState>>) -> HttpResponse {
    let now = Utc::now();
    let response = HealthResponse {
        status: "healthy".to_string(),
        clinic: app_state.config.board.clinic_name.clone(),
        timestamp: now,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (now - app_state.started_at).num_seconds(),
    };

    HttpResponse::Ok().json(response)
}

#[cfg(test)]
pub mod testing {
    //! Shared fixtures for handler tests.

    use super::*;
    use crate::announcer::recording::RecordingAnnouncer;
    use crate::announcer::spawn_announcer;
    use crate::board::CounterBoard;
    use crate::client::fake::FakeClinicApi;
    use crate::config::Config;
    use crate::feedback::FeedbackDesk;

    pub fn test_state(api: Arc<FakeClinicApi>, debounce_ms: u64) -> (Arc<AppState>, Arc<RecordingAnnouncer>) {
        let mut config = Config::default();
        config.feedback.debounce_ms = debounce_ms;

        let recorder = Arc::new(RecordingAnnouncer::default());
        let (announcements, _worker) = spawn_announcer(recorder.clone());

        let state = Arc::new(AppState {
            feedback: FeedbackDesk::new(api, &config.feedback),
            board: CounterBoard::new(&config.board, Some(announcements)).shared(),
            config,
            started_at: Utc::now(),
        });
        (state, recorder)
    }
}
