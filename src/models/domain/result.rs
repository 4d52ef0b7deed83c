use serde::{Deserialize, Serialize};

/// Outcome of one graded attempt. Read-only once constructed, whether it
/// was computed locally or returned by the server.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AttemptResult {
    pub score: u32,
    pub total_marks: u32,
    pub percentage: f64,
    pub feedback: Vec<QuestionFeedback>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionFeedback {
    pub question_text: String,
    /// "Not answered" when the question was left unanswered.
    pub selected_option_text: String,
    pub correct_option_text: String,
    pub explanation: String,
    pub is_correct: bool,
}

impl AttemptResult {
    /// Percentage rounded for display; internally the full f64 is kept.
    pub fn percentage_display(&self) -> String {
        format!("{:.1}", self.percentage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(score: u32, total: u32) -> AttemptResult {
        AttemptResult {
            score,
            total_marks: total,
            percentage: 100.0 * score as f64 / total as f64,
            feedback: vec![QuestionFeedback {
                question_text: "Q1".to_string(),
                selected_option_text: "Not answered".to_string(),
                correct_option_text: "Option B".to_string(),
                explanation: "B is correct".to_string(),
                is_correct: false,
            }],
        }
    }

    #[test]
    fn attempt_result_round_trip_preserves_grading_fields() {
        let result = make_result(4, 5);

        let json = serde_json::to_string(&result).expect("result should serialize");
        let parsed: AttemptResult = serde_json::from_str(&json).expect("result should deserialize");

        assert_eq!(parsed.score, 4);
        assert_eq!(parsed.total_marks, 5);
        assert!((parsed.percentage - 80.0).abs() < f64::EPSILON);
        assert!(!parsed.feedback[0].is_correct);
    }

    #[test]
    fn percentage_display_rounds_to_one_decimal() {
        let result = make_result(1, 3);
        assert_eq!(result.percentage_display(), "33.3");

        let result = make_result(4, 5);
        assert_eq!(result.percentage_display(), "80.0");
    }
}
