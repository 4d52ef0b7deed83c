use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::Validate;

use crate::models::domain::AttemptState;

/// Configuration for an AI-generated assessment. Validated client-side
/// before the generate call is ever dispatched.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct GenerateAssessmentRequest {
    #[validate(length(min = 1, max = 100, message = "Domain is required"))]
    pub domain: String,

    #[validate(length(min = 1, max = 50, message = "Difficulty is required"))]
    pub difficulty: String,

    #[validate(range(min = 1, max = 50))]
    #[serde(rename = "numberOfQuestions")]
    pub number_of_questions: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitAttemptRequest {
    pub answers: Vec<AnswerInput>,
    /// Echoed to the server for duration validation.
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerInput {
    #[serde(rename = "questionIndex")]
    pub question_index: usize,
    /// Option index, or -1 for unanswered.
    #[serde(rename = "selectedAnswer")]
    pub selected_answer: i32,
}

impl SubmitAttemptRequest {
    /// Captures whatever answers exist, unanswered entries included, so the
    /// timeout path submits without filtering.
    pub fn from_attempt(attempt: &AttemptState) -> Self {
        let answers = attempt
            .answers
            .iter()
            .enumerate()
            .map(|(question_index, &selected_answer)| AnswerInput {
                question_index,
                selected_answer,
            })
            .collect();

        Self {
            answers,
            started_at: attempt.started_at.unwrap_or_else(Utc::now),
        }
    }
}
