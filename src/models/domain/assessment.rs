use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{SessionError, SessionResult};

/// One assessment as fetched for an attempt. Immutable from then on:
/// question order defines display order and answer-index correspondence.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Assessment {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
    pub duration_seconds: u32,
    pub source: AssessmentSource,
    /// Professor-scheduled window. AI-generated assessments carry neither.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
pub enum AssessmentSource {
    /// Generated on request; graded locally, no server round trip.
    AiGenerated,
    /// Authored by a professor and scheduled; the server grades.
    Assigned,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    /// Shown post-submission alongside the correct option.
    pub explanation: String,
}

impl Assessment {
    /// One mark per question, no partial credit.
    pub fn total_marks(&self) -> u32 {
        self.questions.len() as u32
    }

    /// Fail-closed schema check, run at the collaborator boundary so a
    /// malformed payload is rejected instead of letting a bad index
    /// surface mid-attempt.
    pub fn validate(&self) -> SessionResult<()> {
        if self.id.is_empty() {
            return Err(SessionError::Generation(
                "Assessment is missing an id".to_string(),
            ));
        }
        if self.questions.is_empty() {
            return Err(SessionError::Generation(
                "Assessment has no questions".to_string(),
            ));
        }
        if self.duration_seconds == 0 {
            return Err(SessionError::Generation(
                "Assessment has a zero time budget".to_string(),
            ));
        }
        for (i, question) in self.questions.iter().enumerate() {
            if question.options.is_empty() {
                return Err(SessionError::Generation(format!(
                    "Question {} has no options",
                    i
                )));
            }
            if question.correct_answer_index >= question.options.len() {
                return Err(SessionError::Generation(format!(
                    "Question {} has correct answer index {} out of {} options",
                    i,
                    question.correct_answer_index,
                    question.options.len()
                )));
            }
        }
        Ok(())
    }
}
