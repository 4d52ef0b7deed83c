pub mod http;

use async_trait::async_trait;

use crate::errors::SessionResult;
use crate::models::domain::{Assessment, AttemptResult};
use crate::models::dto::{GenerateAssessmentRequest, SubmitAttemptRequest};

pub use http::HttpAssessmentApi;

/// Boundary to the portal backend. The session only ever issues one call
/// at a time through this trait; retries are left to the user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssessmentApi: Send + Sync {
    /// LLM-backed generation; may be slow, no client-side timeout beyond
    /// the transport default.
    async fn generate(&self, request: GenerateAssessmentRequest) -> SessionResult<Assessment>;

    /// Professor-assigned assessments for the current student.
    async fn fetch_assigned(&self) -> SessionResult<Vec<Assessment>>;

    async fn submit(
        &self,
        assessment_id: &str,
        request: SubmitAttemptRequest,
    ) -> SessionResult<AttemptResult>;

    /// Fire-and-forget telemetry. Callers swallow failures; this must
    /// never block the assessment flow.
    async fn log_activity(&self, activity_type: &str, description: &str) -> SessionResult<()>;
}
