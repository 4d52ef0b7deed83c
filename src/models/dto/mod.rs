pub mod request;
pub mod response;
pub use request::{AnswerInput, GenerateAssessmentRequest, SubmitAttemptRequest};
pub use response::{AssessmentResponse, ResultResponse};
