// src/feedback_handlers.rs
//! Endpoints behind the patient feedback screen.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::handlers::ApiResponse;
use crate::models::FieldUpdate;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct IdentifierInput {
    pub value: String,
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/feedback")
            .route("", web::get().to(get_feedback))
            .route("/identifier", web::put().to(input_identifier))
            .route("/candidates/{index}/select", web::post().to(select_candidate))
            .route("/fields", web::patch().to(update_fields))
            .route("/submit", web::post().to(submit_feedback))
            .route("/reset", web::post().to(reset_feedback)),
    );
}

pub async fn get_feedback(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let view = app_state.feedback.view().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

pub async fn input_identifier(
    app_state: web::Data<Arc<AppState>>,
    input: web::Json<IdentifierInput>,
) -> ApiResult<HttpResponse> {
    let view = app_state.feedback.input_identifier(input.into_inner().value).await;
    Ok(HttpResponse::Accepted().json(ApiResponse::success(view)))
}

pub async fn select_candidate(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<usize>,
) -> ApiResult<HttpResponse> {
    let view = app_state.feedback.select_candidate(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

pub async fn update_fields(
    app_state: web::Data<Arc<AppState>>,
    update: web::Json<FieldUpdate>,
) -> ApiResult<HttpResponse> {
    let view = app_state.feedback.update_fields(update.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

pub async fn submit_feedback(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let view = app_state.feedback.submit().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        view,
        "Feedback submitted successfully!".to_string(),
    )))
}

pub async fn reset_feedback(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let view = app_state.feedback.reset().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board_handlers;
    use crate::client::fake::FakeClinicApi;
    use crate::handlers::testing::test_state;
    use crate::models::{DoctorOption, EmployeeOption, LookupResponse, PatientCandidate};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;
    use std::time::Duration;

    fn clinic_api() -> FakeClinicApi {
        FakeClinicApi::default()
            .with_lookup("9876543210", LookupResponse {
                patients: vec![PatientCandidate {
                    id: "p1".into(),
                    name: "Asha Menon".into(),
                    age: Some(29),
                    address: None,
                    city: Some("Thrissur".into()),
                    phone: Some("9876543210".into()),
                    branch_id: "B1".into(),
                    patient_id: Some("TM0042".into()),
                }],
                doctors: vec![
                    DoctorOption { id: "d0".into(), name: "Dr. Elsewhere".into(), branch_id: "B2".into() },
                    DoctorOption { id: "d1".into(), name: "Dr. Pooja Jayan".into(), branch_id: "B1".into() },
                ],
            })
            .with_employees(vec![EmployeeOption {
                id: "e1".into(),
                name: "Reena".into(),
                role_type: "user".into(),
            }])
    }

    #[actix_rt::test]
    async fn test_lookup_submit_and_board_untouched() {
        let api = Arc::new(clinic_api());
        let (state, _) = test_state(api.clone(), 20);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .service(
                    web::scope("/api")
                        .configure(routes)
                        .configure(board_handlers::routes),
                ),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/board/counters/1/next").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::put()
            .uri("/api/feedback/identifier")
            .set_json(json!({ "value": "9876543210" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);

        tokio::time::sleep(Duration::from_millis(200)).await;

        let req = test::TestRequest::get().uri("/api/feedback").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["selectedPatient"]["_id"], "p1");
        assert_eq!(body["data"]["form"]["doctorName"], "Dr. Pooja Jayan");
        assert_eq!(body["data"]["doctors"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::patch()
            .uri("/api/feedback/fields")
            .set_json(json!({
                "doctorRating": 5,
                "employeeRating": 5,
                "comment": "Quick and painless visit"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post().uri("/api/feedback/submit").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["form"]["patientMobile"], "");
        assert!(body["data"]["selectedPatient"].is_null());
        assert!(body["data"]["candidates"].as_array().unwrap().is_empty());

        let sent = api.submitted.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].patient_external_id.as_deref(), Some("TM0042"));
        assert_eq!(sent[0].employee_name, "Reena");

        let board = state.board.lock().await;
        let counter = board.token(1).unwrap();
        assert_eq!(counter.token, 1);
        assert_eq!(counter.status, crate::models::CounterStatus::In);
    }

    #[actix_rt::test]
    async fn test_invalid_submit_returns_field_errors() {
        let (state, _) = test_state(Arc::new(clinic_api()), 20);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api").configure(routes)),
        )
        .await;

        let req = test::TestRequest::patch()
            .uri("/api/feedback/fields")
            .set_json(json!({ "comment": "too short" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post().uri("/api/feedback/submit").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"]["comment"], "comment too short.");
        assert_eq!(body["errors"]["selectedPatient"], "select a patient.");
    }

    #[actix_rt::test]
    async fn test_rating_out_of_range_is_rejected() {
        let (state, _) = test_state(Arc::new(clinic_api()), 20);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api").configure(routes)),
        )
        .await;

        let req = test::TestRequest::patch()
            .uri("/api/feedback/fields")
            .set_json(json!({ "doctorRating": 9 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_select_without_candidates_is_404() {
        let (state, _) = test_state(Arc::new(clinic_api()), 20);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api").configure(routes)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/feedback/candidates/0/select")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
