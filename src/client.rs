// src/client.rs - Clinic API collaborator
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::models::{EmployeeOption, FormState, LookupResponse};

/// The three calls the front desk makes against the clinic API.
#[async_trait]
pub trait ClinicApi: Send + Sync {
    /// `GET /get-patient-details?phone=<value>`
    async fn lookup_patients(&self, phone: &str) -> ApiResult<LookupResponse>;

    /// `GET /get-employee-details`, unfiltered.
    async fn fetch_employees(&self) -> ApiResult<Vec<EmployeeOption>>;

    /// `POST /feedback`. Only the status is consumed.
    async fn submit_feedback(&self, form: &FormState) -> ApiResult<()>;
}

pub struct HttpClinicApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpClinicApi {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build HTTP client for the clinic API")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ClinicApi for HttpClinicApi {
    async fn lookup_patients(&self, phone: &str) -> ApiResult<LookupResponse> {
        let response = self
            .client
            .get(self.url("/get-patient-details"))
            .query(&[("phone", phone)])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<LookupResponse>().await?)
    }

    async fn fetch_employees(&self) -> ApiResult<Vec<EmployeeOption>> {
        let response = self
            .client
            .get(self.url("/get-employee-details"))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Vec<EmployeeOption>>().await?)
    }

    async fn submit_feedback(&self, form: &FormState) -> ApiResult<()> {
        self.client
            .post(self.url("/feedback"))
            .json(form)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let config = ApiConfig {
            base_url: "http://clinic.local/api/".to_string(),
            timeout_seconds: 5,
        };
        let api = HttpClinicApi::new(&config).unwrap();
        assert_eq!(api.url("/feedback"), "http://clinic.local/api/feedback");
    }
}
