// src/board_handlers.rs
//! Endpoints behind the counter board screen.

use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::AppState;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/board")
            .route("", web::get().to(get_board))
            .route("/counters/{counter}", web::get().to(get_counter))
            .route("/counters/{counter}/next", web::post().to(next_token))
            .route("/counters/{counter}/out", web::post().to(mark_out)),
    );
}

pub async fn get_board(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let view = app_state.board.lock().await.view();
    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

pub async fn get_counter(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<u32>,
) -> ApiResult<HttpResponse> {
    let counter = path.into_inner();
    let state = app_state
        .board
        .lock()
        .await
        .token(counter)
        .ok_or_else(|| ApiError::counter_not_found(counter))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(state)))
}

pub async fn next_token(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<u32>,
) -> ApiResult<HttpResponse> {
    let counter = path.into_inner();
    let mut board = app_state.board.lock().await;
    let state = board.advance(counter)?;
    let message = format!("Counter {} now serving {}", counter, board.token_label(state.token));

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(state, message)))
}

pub async fn mark_out(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<u32>,
) -> ApiResult<HttpResponse> {
    let counter = path.into_inner();
    let state = app_state.board.lock().await.mark_out(counter)?;
    log::info!("Counter {} marked out", counter);

    Ok(HttpResponse::Ok().json(ApiResponse::success(state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeClinicApi;
    use crate::handlers::testing::test_state;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    #[actix_rt::test]
    async fn test_board_flow() {
        let (state, _) = test_state(Arc::new(FakeClinicApi::default()), 500);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .service(web::scope("/api").configure(routes)),
        )
        .await;

        for _ in 0..2 {
            let req = test::TestRequest::post().uri("/api/board/counters/2/next").to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::post().uri("/api/board/counters/1/out").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "out");
        assert_eq!(body["data"]["token"], 0);

        let req = test::TestRequest::get().uri("/api/board").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let rows = body["data"]["rows"].as_array().unwrap();
        assert_eq!(rows[1]["tokenLabel"], "TM-2");
        assert_eq!(rows[1]["status"], "in");
        assert_eq!(rows[0]["statusLabel"], "Out");
        assert_eq!(rows[2]["status"], "queue");

        let req = test::TestRequest::get().uri("/api/board/counters/2").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["token"], 2);
        assert_eq!(body["data"]["counter"], 2);
    }

    #[actix_rt::test]
    async fn test_unknown_counter_is_404() {
        let (state, _) = test_state(Arc::new(FakeClinicApi::default()), 500);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api").configure(routes)),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/board/counters/42/next").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/api/board/counters/42").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
