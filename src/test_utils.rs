#[cfg(test)]
pub mod fixtures {
    use chrono::{DateTime, Utc};

    use crate::models::domain::{Assessment, AssessmentSource, Question};

    /// Five questions, four options each. The correct option for question
    /// `i` (zero-based) is `i % 4`.
    pub fn five_question_assessment() -> Assessment {
        let questions = (1..=5)
            .map(|n| Question {
                text: format!("Question {} prompt", n),
                options: (1..=4).map(|o| format!("Option {} of q{}", o, n)).collect(),
                correct_answer_index: (n - 1) % 4,
                explanation: format!("Why option {} is right for q{}", ((n - 1) % 4) + 1, n),
            })
            .collect();

        Assessment {
            id: "assess-5q".to_string(),
            title: "Fixture assessment".to_string(),
            questions,
            duration_seconds: 300,
            source: AssessmentSource::AiGenerated,
            start_time: None,
            end_time: None,
        }
    }

    /// Same questions, but professor-assigned with an optional window so
    /// the server-graded path and window checks can be exercised.
    pub fn assigned_assessment(
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Assessment {
        Assessment {
            id: "assess-assigned".to_string(),
            title: "Scheduled midterm".to_string(),
            source: AssessmentSource::Assigned,
            start_time,
            end_time,
            ..five_question_assessment()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_fixture_assessments_are_valid() {
        assert!(five_question_assessment().validate().is_ok());
        assert!(assigned_assessment(None, None).validate().is_ok());
    }

    #[test]
    fn test_fixture_correct_indexes_follow_pattern() {
        let assessment = five_question_assessment();
        for (i, question) in assessment.questions.iter().enumerate() {
            assert_eq!(question.correct_answer_index, i % 4);
            assert_eq!(question.options.len(), 4);
        }
    }
}
