use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::errors::{SessionError, SessionResult};
use crate::models::domain::{
    Assessment, AssessmentSource, AttemptResult, Question, QuestionFeedback,
};

/// Wire shape of an assessment payload. Converted into the domain type with
/// a fail-closed `validate()` so missing or out-of-range fields are rejected
/// at the boundary instead of propagating silently.
#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentResponse {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub questions: Vec<QuestionResponse>,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: u32,
    #[serde(rename = "startTime", default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "endTime", default)]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionResponse {
    pub text: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswerIndex")]
    pub correct_answer_index: usize,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultResponse {
    pub score: u32,
    #[serde(rename = "totalMarks")]
    pub total_marks: u32,
    pub percentage: f64,
    #[serde(default)]
    pub feedback: Vec<FeedbackEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackEntry {
    #[serde(rename = "questionText")]
    pub question_text: String,
    #[serde(rename = "selectedOptionText")]
    pub selected_option_text: String,
    #[serde(rename = "correctOptionText")]
    pub correct_option_text: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
}

impl AssessmentResponse {
    pub fn into_domain(self, source: AssessmentSource) -> SessionResult<Assessment> {
        let assessment = Assessment {
            id: self.id,
            title: self.title,
            questions: self.questions.into_iter().map(Question::from).collect(),
            duration_seconds: self.duration_seconds,
            source,
            start_time: self.start_time,
            end_time: self.end_time,
        };
        assessment.validate()?;
        Ok(assessment)
    }
}

impl From<QuestionResponse> for Question {
    fn from(response: QuestionResponse) -> Self {
        Question {
            text: response.text,
            options: response.options,
            correct_answer_index: response.correct_answer_index,
            explanation: response.explanation,
        }
    }
}

impl ResultResponse {
    pub fn into_domain(self) -> SessionResult<AttemptResult> {
        if self.total_marks == 0 {
            return Err(SessionError::InvalidSubmission(
                "Result has zero total marks".to_string(),
            ));
        }
        if self.score > self.total_marks {
            return Err(SessionError::InvalidSubmission(format!(
                "Result score {} exceeds total marks {}",
                self.score, self.total_marks
            )));
        }

        Ok(AttemptResult {
            score: self.score,
            total_marks: self.total_marks,
            percentage: self.percentage,
            feedback: self.feedback.into_iter().map(QuestionFeedback::from).collect(),
        })
    }
}

impl From<FeedbackEntry> for QuestionFeedback {
    fn from(entry: FeedbackEntry) -> Self {
        QuestionFeedback {
            question_text: entry.question_text,
            selected_option_text: entry.selected_option_text,
            correct_option_text: entry.correct_option_text,
            explanation: entry.explanation,
            is_correct: entry.is_correct,
        }
    }
}
