// src/feedback/desk.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::client::ClinicApi;
use crate::config::FeedbackConfig;
use crate::debounce::Debouncer;
use crate::error::{ApiError, ApiResult};
use crate::models::FieldUpdate;

use super::form::{FeedbackForm, FeedbackView, LookupOutcome, SearchPlan};

/// Drives the feedback form: owns its state, the search debounce and the
/// clinic API handle. Cheap to clone; clones share the same form.
#[derive(Clone)]
pub struct FeedbackDesk {
    state: Arc<Mutex<FeedbackForm>>,
    api: Arc<dyn ClinicApi>,
    debouncer: Arc<Debouncer>,
}

impl FeedbackDesk {
    pub fn new(api: Arc<dyn ClinicApi>, config: &FeedbackConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(FeedbackForm::new(config.employee_role.clone()))),
            api,
            debouncer: Arc::new(Debouncer::new(Duration::from_millis(config.debounce_ms))),
        }
    }

    /// Initial load of the employee list.
    pub async fn mount(&self) {
        self.refresh_employees().await;
    }

    pub async fn view(&self) -> FeedbackView {
        self.state.lock().await.view()
    }

    pub async fn input_identifier(&self, value: String) -> FeedbackView {
        let mut state = self.state.lock().await;
        match state.set_identifier(value.clone()) {
            SearchPlan::Cleared => self.debouncer.cancel(),
            SearchPlan::Debounce => {
                log::debug!("Lookup for '{}' scheduled in {:?}", value, self.debouncer.delay());
                let desk = self.clone();
                self.debouncer.schedule(async move {
                    desk.search(value).await;
                });
            }
        }
        state.view()
    }

    /// The debounced half of a keystroke.
    async fn search(&self, value: String) -> LookupOutcome {
        let Some(seq) = self.state.lock().await.begin_lookup(&value) else {
            log::debug!("Identifier '{}' is not lookup-shaped, search reset", value);
            return LookupOutcome::Skipped;
        };

        let result = self.api.lookup_patients(&value).await;
        let outcome = self.state.lock().await.apply_lookup(seq, result);
        log::info!("Patient lookup #{} finished: {:?}", seq, outcome);

        if outcome.found() {
            let desk = self.clone();
            tokio::spawn(async move {
                desk.refresh_employees().await;
            });
        }

        outcome
    }

    pub async fn refresh_employees(&self) {
        let seq = self.state.lock().await.begin_employee_fetch();
        let result = self.api.fetch_employees().await;
        if !self.state.lock().await.apply_employees(seq, result) {
            log::debug!("Dropping superseded employee list #{}", seq);
        }
    }

    pub async fn select_candidate(&self, index: usize) -> ApiResult<FeedbackView> {
        let mut state = self.state.lock().await;
        state.select_candidate(index)?;
        Ok(state.view())
    }

    pub async fn update_fields(&self, update: FieldUpdate) -> ApiResult<FeedbackView> {
        let mut state = self.state.lock().await;
        state.update_fields(update)?;
        Ok(state.view())
    }

    /// Validates and posts the form. The lock is held across the request so
    /// no other event interleaves with a submission.
    pub async fn submit(&self) -> ApiResult<FeedbackView> {
        let mut state = self.state.lock().await;
        let body = state.submission()?;

        let result = self.api.submit_feedback(&body).await;
        state.finish_submit(&result);

        match result {
            Ok(()) => {
                self.debouncer.cancel();
                log::info!("Feedback submitted for patient {:?}", body.patient_record_id);
                Ok(state.view())
            }
            Err(e) => Err(ApiError::submission_failed(e)),
        }
    }

    pub async fn reset(&self) -> FeedbackView {
        let mut state = self.state.lock().await;
        self.debouncer.cancel();
        state.reset();
        state.view()
    }
}
