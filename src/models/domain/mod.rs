pub mod assessment;
pub mod attempt;
pub mod result;
pub use assessment::{Assessment, AssessmentSource, Question};
pub use attempt::{AttemptState, Phase, UNANSWERED};
pub use result::{AttemptResult, QuestionFeedback};
