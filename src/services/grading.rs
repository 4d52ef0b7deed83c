use crate::models::domain::{Assessment, AttemptResult, QuestionFeedback, UNANSWERED};

pub const NOT_ANSWERED_TEXT: &str = "Not answered";

/// Grades one attempt. Runs exactly once, at the Submitting -> Completed
/// transition; the contract is identical whether this runs here (the
/// AI-generated path) or server-side (the assigned path).
///
/// One mark per question: correct iff the selected index equals the
/// question's correct index. The unanswered sentinel (-1) never equals a
/// valid index, so it counts as incorrect with no special case.
pub fn grade(assessment: &Assessment, answers: &[i32]) -> AttemptResult {
    debug_assert_eq!(answers.len(), assessment.questions.len());

    let mut score: u32 = 0;
    let mut feedback = Vec::with_capacity(assessment.questions.len());

    for (question, &selected) in assessment.questions.iter().zip(answers) {
        let is_correct = selected == question.correct_answer_index as i32;
        if is_correct {
            score += 1;
        }

        let selected_option_text = if selected == UNANSWERED {
            NOT_ANSWERED_TEXT.to_string()
        } else {
            question
                .options
                .get(selected as usize)
                .cloned()
                .unwrap_or_else(|| NOT_ANSWERED_TEXT.to_string())
        };

        feedback.push(QuestionFeedback {
            question_text: question.text.clone(),
            selected_option_text,
            correct_option_text: question.options[question.correct_answer_index].clone(),
            explanation: question.explanation.clone(),
            is_correct,
        });
    }

    let total_marks = assessment.total_marks();
    let percentage = if total_marks > 0 {
        100.0 * score as f64 / total_marks as f64
    } else {
        0.0
    };

    AttemptResult {
        score,
        total_marks,
        percentage,
        feedback,
    }
}
