use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel for a question the user has not answered. Never equal to a
/// valid option index, so grading needs no special case for it.
pub const UNANSWERED: i32 = -1;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
pub enum Phase {
    Configuring,
    Ready,
    Active,
    Submitting,
    Completed,
}

/// Mutable attempt state, exclusively owned by one running session.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptState {
    pub answers: Vec<i32>,
    pub current_question_index: usize,
    pub remaining_seconds: u32,
    pub phase: Phase,
    /// Captured on entry to Active; sent to the server on submission for
    /// server-side duration validation.
    pub started_at: Option<DateTime<Utc>>,
}

impl AttemptState {
    pub fn new() -> Self {
        Self {
            answers: Vec::new(),
            current_question_index: 0,
            remaining_seconds: 0,
            phase: Phase::Configuring,
            started_at: None,
        }
    }

    /// Resets answer capture for an attempt over `question_count` questions.
    pub fn begin(&mut self, question_count: usize, duration_seconds: u32, now: DateTime<Utc>) {
        self.answers = vec![UNANSWERED; question_count];
        self.current_question_index = 0;
        self.remaining_seconds = duration_seconds;
        self.started_at = Some(now);
        self.phase = Phase::Active;
    }

    pub fn unanswered_count(&self) -> usize {
        self.answers.iter().filter(|&&a| a == UNANSWERED).count()
    }

    /// Moves the cursor by `delta`, clamped to the question range.
    /// A no-op at the boundaries, not an error.
    pub fn move_cursor(&mut self, delta: i64) {
        if self.answers.is_empty() {
            return;
        }
        let max = (self.answers.len() - 1) as i64;
        let next = (self.current_question_index as i64 + delta).clamp(0, max);
        self.current_question_index = next as usize;
    }
}

impl Default for AttemptState {
    fn default() -> Self {
        Self::new()
    }
}
