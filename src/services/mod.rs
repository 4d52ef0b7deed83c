pub mod grading;
pub mod session;
pub mod timer;

pub use session::{AssessmentSession, SubmitOutcome};
pub use timer::CountdownTimer;
