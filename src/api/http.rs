use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use crate::api::AssessmentApi;
use crate::config::Config;
use crate::errors::{SessionError, SessionResult};
use crate::models::domain::{Assessment, AssessmentSource, AttemptResult};
use crate::models::dto::{
    AssessmentResponse, GenerateAssessmentRequest, ResultResponse, SubmitAttemptRequest,
};

/// REST client for the portal backend. Every request carries the bearer
/// token; a 401 anywhere maps to `SessionExpired` so the shell can run its
/// re-authentication flow.
pub struct HttpAssessmentApi {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl HttpAssessmentApi {
    pub fn new(config: &Config) -> SessionResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SessionError::Generation(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.bearer_token.clone(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.bearer_auth(self.token.expose_secret())
    }
}

/// Failure classification for the submit path: 400 carries the server's
/// message through verbatim, 401 forces re-auth, 403 is a hard refusal,
/// anything else is retryable by pressing submit again.
fn submit_error(status: StatusCode, body: String) -> SessionError {
    match status {
        StatusCode::BAD_REQUEST => {
            let message = if body.trim().is_empty() {
                "Invalid submission data".to_string()
            } else {
                body
            };
            SessionError::InvalidSubmission(message)
        }
        StatusCode::UNAUTHORIZED => SessionError::SessionExpired,
        StatusCode::FORBIDDEN => SessionError::NotAuthorized,
        _ => SessionError::SubmissionFailed(format!("Server returned {}: {}", status, body)),
    }
}

fn fetch_error(status: StatusCode, body: String) -> SessionError {
    match status {
        StatusCode::UNAUTHORIZED => SessionError::SessionExpired,
        _ => SessionError::Generation(format!("Server returned {}: {}", status, body)),
    }
}

#[async_trait]
impl AssessmentApi for HttpAssessmentApi {
    async fn generate(&self, request: GenerateAssessmentRequest) -> SessionResult<Assessment> {
        let url = self.api_url("/assessments/generate-ai");
        log::info!(
            "Generating assessment: domain='{}' difficulty='{}' questions={}",
            request.domain,
            request.difficulty,
            request.number_of_questions
        );

        let response = self
            .authorized(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                log::error!("Generate request failed: {}", e);
                SessionError::Generation(format!("Generation request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fetch_error(status, body));
        }

        let payload: AssessmentResponse = response.json().await.map_err(|e| {
            SessionError::Generation(format!("Malformed assessment payload: {}", e))
        })?;
        payload.into_domain(AssessmentSource::AiGenerated)
    }

    async fn fetch_assigned(&self) -> SessionResult<Vec<Assessment>> {
        let url = self.api_url("/assessments/student");

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| SessionError::SubmissionFailed(format!("Fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fetch_error(status, body));
        }

        let payloads: Vec<AssessmentResponse> = response.json().await.map_err(|e| {
            SessionError::Generation(format!("Malformed assessment list payload: {}", e))
        })?;

        payloads
            .into_iter()
            .map(|p| p.into_domain(AssessmentSource::Assigned))
            .collect()
    }

    async fn submit(
        &self,
        assessment_id: &str,
        request: SubmitAttemptRequest,
    ) -> SessionResult<AttemptResult> {
        let url = self.api_url(&format!("/assessments/{}/submit", assessment_id));
        log::info!(
            "Submitting attempt for assessment '{}' ({} answers)",
            assessment_id,
            request.answers.len()
        );

        let response = self
            .authorized(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                log::error!("Submit request failed: {}", e);
                SessionError::SubmissionFailed(format!("Submission request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(submit_error(status, body));
        }

        let payload: ResultResponse = response.json().await.map_err(|e| {
            SessionError::InvalidSubmission(format!("Malformed result payload: {}", e))
        })?;
        payload.into_domain()
    }

    async fn log_activity(&self, activity_type: &str, description: &str) -> SessionResult<()> {
        // The activities endpoint predates the /api prefix convention and
        // still lives at the root. Backend quirk, kept as-is.
        let url = format!("{}/activities", self.base_url);

        let body = serde_json::json!({
            "type": activity_type,
            "description": description,
        });

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| SessionError::SubmissionFailed(format!("Activity log failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SessionError::SubmissionFailed(format!(
                "Activity log returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
