use std::sync::Arc;

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::api::AssessmentApi;
use crate::errors::{SessionError, SessionResult};
use crate::ledger::SubmissionLedger;
use crate::models::domain::{
    Assessment, AssessmentSource, AttemptResult, AttemptState, Phase, Question,
};
use crate::models::dto::{GenerateAssessmentRequest, SubmitAttemptRequest};
use crate::services::grading;
use crate::services::timer::CountdownTimer;

/// What a submission request produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed,
    /// Manual submit with unanswered questions: the caller must confirm
    /// via `submit_confirmed`. The timer keeps running meanwhile — time
    /// spent deciding is not refunded.
    ConfirmationRequired(usize),
    /// A dispatch already won the check-and-set guard; this call is a
    /// no-op and no second network call was issued.
    AlreadyInFlight,
}

/// One timed attempt at one assessment, from configuration to result.
///
/// Owns its `AttemptState` exclusively. Completed is terminal: a new
/// attempt needs a new session. The countdown ticks and user events all
/// run on the caller's task, so the only race worth guarding is
/// timer-expiry auto-submit versus a manual submit in the same tick,
/// resolved by `submission_in_flight` checked-and-set before any await.
pub struct AssessmentSession {
    api: Arc<dyn AssessmentApi>,
    ledger: Arc<dyn SubmissionLedger>,
    assessment: Option<Assessment>,
    attempt: AttemptState,
    timer: Option<CountdownTimer>,
    submission_in_flight: bool,
    result: Option<AttemptResult>,
}

impl AssessmentSession {
    pub fn new(api: Arc<dyn AssessmentApi>, ledger: Arc<dyn SubmissionLedger>) -> Self {
        Self {
            api,
            ledger,
            assessment: None,
            attempt: AttemptState::new(),
            timer: None,
            submission_in_flight: false,
            result: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.attempt.phase
    }

    pub fn assessment(&self) -> Option<&Assessment> {
        self.assessment.as_ref()
    }

    pub fn attempt(&self) -> &AttemptState {
        &self.attempt
    }

    pub fn result(&self) -> Option<&AttemptResult> {
        self.result.as_ref()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.attempt.remaining_seconds
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.assessment
            .as_ref()
            .and_then(|a| a.questions.get(self.attempt.current_question_index))
    }

    fn require_phase(&self, expected: Phase, action: &'static str) -> SessionResult<()> {
        if self.attempt.phase != expected {
            return Err(SessionError::InvalidTransition {
                from: self.attempt.phase,
                action,
            });
        }
        Ok(())
    }

    /// Requests an AI-generated assessment. On any failure the session
    /// stays in Configuring with the error surfaced; the user may adjust
    /// the request and try again, nothing retries automatically.
    pub async fn generate(&mut self, request: GenerateAssessmentRequest) -> SessionResult<()> {
        self.require_phase(Phase::Configuring, "generate")?;
        request.validate()?;

        let assessment = self.api.generate(request).await?;
        assessment.validate()?;

        log::info!(
            "Assessment '{}' generated with {} questions",
            assessment.id,
            assessment.questions.len()
        );
        self.assessment = Some(assessment);
        self.attempt.phase = Phase::Ready;
        Ok(())
    }

    /// Loads a professor-assigned assessment that was already fetched.
    pub fn load_assigned(&mut self, assessment: Assessment) -> SessionResult<()> {
        self.require_phase(Phase::Configuring, "load assessment")?;
        assessment.validate()?;

        self.assessment = Some(assessment);
        self.attempt.phase = Phase::Ready;
        Ok(())
    }

    pub async fn start(&mut self) -> SessionResult<()> {
        self.start_at(Utc::now()).await
    }

    /// Ready -> Active. Refuses when the advisory ledger already records a
    /// submission for this id, or when `now` falls outside the scheduled
    /// window. On refusal the attempt stays in Ready.
    pub async fn start_at(&mut self, now: DateTime<Utc>) -> SessionResult<()> {
        self.require_phase(Phase::Ready, "start")?;

        let assessment = self
            .assessment
            .as_ref()
            .ok_or(SessionError::InvalidTransition {
                from: self.attempt.phase,
                action: "start without assessment",
            })?;

        if self.ledger.has(&assessment.id).await? {
            return Err(SessionError::AlreadySubmitted);
        }
        if let Some(start_time) = assessment.start_time {
            if now < start_time {
                return Err(SessionError::NotYetOpen);
            }
        }
        if let Some(end_time) = assessment.end_time {
            if now > end_time {
                return Err(SessionError::WindowClosed);
            }
        }

        log::info!(
            "Starting attempt on '{}': {} questions, {}s budget",
            assessment.id,
            assessment.questions.len(),
            assessment.duration_seconds
        );
        self.attempt
            .begin(assessment.questions.len(), assessment.duration_seconds, now);
        self.timer = Some(CountdownTimer::start());
        Ok(())
    }

    /// Records the chosen option for the current question. Overwrite is
    /// allowed, last write wins.
    pub fn select_answer(&mut self, option_index: usize) -> SessionResult<()> {
        self.require_phase(Phase::Active, "select answer")?;

        let options_len = self
            .current_question()
            .map(|q| q.options.len())
            .unwrap_or(0);
        if option_index >= options_len {
            return Err(SessionError::InvalidTransition {
                from: self.attempt.phase,
                action: "select answer out of range",
            });
        }

        let cursor = self.attempt.current_question_index;
        self.attempt.answers[cursor] = option_index as i32;
        Ok(())
    }

    pub fn next_question(&mut self) -> SessionResult<()> {
        self.require_phase(Phase::Active, "navigate")?;
        self.attempt.move_cursor(1);
        Ok(())
    }

    pub fn previous_question(&mut self) -> SessionResult<()> {
        self.require_phase(Phase::Active, "navigate")?;
        self.attempt.move_cursor(-1);
        Ok(())
    }

    /// Waits for the next countdown tick; `false` when no timer is
    /// running. Callers follow up with `tick()`.
    pub async fn next_tick(&mut self) -> bool {
        match self.timer.as_mut() {
            Some(timer) => timer.next_tick().await.is_some(),
            None => false,
        }
    }

    /// One 1 Hz countdown step. The instant the budget reaches zero the
    /// submission dispatches automatically, with no confirmation prompt,
    /// through the same path as a manual submit. Ticks arriving outside
    /// Active are ignored.
    pub async fn tick(&mut self) -> SessionResult<Option<SubmitOutcome>> {
        if self.attempt.phase != Phase::Active {
            return Ok(None);
        }

        self.attempt.remaining_seconds = self.attempt.remaining_seconds.saturating_sub(1);
        if self.attempt.remaining_seconds == 0 {
            log::info!("Time expired, auto-submitting attempt");
            return self.dispatch_submission().await.map(Some);
        }
        Ok(None)
    }

    /// Manual submit. With unanswered questions this returns
    /// `ConfirmationRequired(n)` and changes nothing — the caller prompts
    /// the user and, on confirmation, calls `submit_confirmed`.
    pub async fn submit(&mut self) -> SessionResult<SubmitOutcome> {
        self.require_phase(Phase::Active, "submit")?;

        let unanswered = self.attempt.unanswered_count();
        if unanswered > 0 {
            return Ok(SubmitOutcome::ConfirmationRequired(unanswered));
        }
        self.dispatch_submission().await
    }

    /// Submit despite unanswered questions.
    pub async fn submit_confirmed(&mut self) -> SessionResult<SubmitOutcome> {
        self.require_phase(Phase::Active, "submit")?;
        self.dispatch_submission().await
    }

    /// The single submission path shared by manual, confirmed and timeout
    /// submits. The in-flight guard is checked and set before the first
    /// await, so whichever caller arrives second in the same event-loop
    /// turn becomes a no-op and at most one submission is ever dispatched.
    async fn dispatch_submission(&mut self) -> SessionResult<SubmitOutcome> {
        if self.submission_in_flight {
            return Ok(SubmitOutcome::AlreadyInFlight);
        }
        self.submission_in_flight = true;

        if let Some(timer) = self.timer.as_mut() {
            timer.stop();
        }
        self.timer = None;
        self.attempt.phase = Phase::Submitting;

        let assessment = match self.assessment.clone() {
            Some(assessment) => assessment,
            None => {
                return Err(SessionError::InvalidTransition {
                    from: self.attempt.phase,
                    action: "submit without assessment",
                })
            }
        };

        let outcome = match assessment.source {
            // No server round trip exists for ad-hoc AI assessments; the
            // grading contract is identical either way.
            AssessmentSource::AiGenerated => Ok(grading::grade(&assessment, &self.attempt.answers)),
            AssessmentSource::Assigned => {
                let request = SubmitAttemptRequest::from_attempt(&self.attempt);
                self.api.submit(&assessment.id, request).await
            }
        };

        match outcome {
            Ok(result) => {
                // The ledger is advisory; a write failure must not void a
                // submission the server already accepted.
                if let Err(e) = self.ledger.mark(&assessment.id).await {
                    log::warn!("Failed to record submission in ledger: {}", e);
                }
                if let Err(e) = self
                    .api
                    .log_activity(
                        "ASSESSMENT_SUBMITTED",
                        &format!("Submitted assessment '{}'", assessment.title),
                    )
                    .await
                {
                    log::warn!("Activity log call failed (ignored): {}", e);
                }

                log::info!(
                    "Attempt completed: {}/{} ({}%)",
                    result.score,
                    result.total_marks,
                    result.percentage_display()
                );
                self.result = Some(result);
                self.attempt.phase = Phase::Completed;
                Ok(SubmitOutcome::Completed)
            }
            Err(e) => {
                log::error!("Submission failed: {}", e);
                if self.attempt.remaining_seconds > 0 {
                    // Roll back and let the user retry; the countdown
                    // resumes from where it stopped.
                    self.attempt.phase = Phase::Active;
                    self.timer = Some(CountdownTimer::start());
                    self.submission_in_flight = false;
                }
                // With the timer expired the attempt is permanently
                // failed; the guard stays set and the phase stays
                // Submitting.
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockAssessmentApi;
    use crate::ledger::InMemoryLedger;
    use crate::models::domain::UNANSWERED;
    use crate::test_utils::fixtures::{assigned_assessment, five_question_assessment};
    use chrono::Duration;

    fn session_with(api: MockAssessmentApi) -> AssessmentSession {
        AssessmentSession::new(Arc::new(api), Arc::new(InMemoryLedger::new()))
    }

    fn quiet_api() -> MockAssessmentApi {
        let mut api = MockAssessmentApi::new();
        api.expect_log_activity().returning(|_, _| Ok(()));
        api
    }

    #[tokio::test]
    async fn new_session_starts_configuring() {
        let session = session_with(MockAssessmentApi::new());
        assert_eq!(session.phase(), Phase::Configuring);
        assert!(session.assessment().is_none());
    }

    #[tokio::test]
    async fn generate_rejects_missing_domain_without_calling_api() {
        // No expect_generate: a call would panic the mock.
        let mut session = session_with(MockAssessmentApi::new());

        let request = GenerateAssessmentRequest {
            domain: String::new(),
            difficulty: "easy".to_string(),
            number_of_questions: 5,
        };
        let err = session.generate(request).await.unwrap_err();

        assert_eq!(err.error_code(), "GENERATION_ERROR");
        assert_eq!(session.phase(), Phase::Configuring);
    }

    #[tokio::test]
    async fn generate_failure_keeps_session_configuring() {
        let mut api = MockAssessmentApi::new();
        api.expect_generate()
            .returning(|_| Err(SessionError::Generation("model unavailable".to_string())));
        let mut session = session_with(api);

        let request = GenerateAssessmentRequest {
            domain: "networking".to_string(),
            difficulty: "easy".to_string(),
            number_of_questions: 5,
        };
        assert!(session.generate(request).await.is_err());
        assert_eq!(session.phase(), Phase::Configuring);
    }

    #[tokio::test]
    async fn generate_success_moves_to_ready() {
        let mut api = MockAssessmentApi::new();
        api.expect_generate()
            .returning(|_| Ok(five_question_assessment()));
        let mut session = session_with(api);

        let request = GenerateAssessmentRequest {
            domain: "networking".to_string(),
            difficulty: "easy".to_string(),
            number_of_questions: 5,
        };
        session.generate(request).await.unwrap();

        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.assessment().unwrap().total_marks(), 5);
    }

    #[tokio::test]
    async fn start_initializes_attempt_state() {
        let mut session = session_with(MockAssessmentApi::new());
        session.load_assigned(five_question_assessment()).unwrap();
        session.start().await.unwrap();

        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.attempt().answers, vec![UNANSWERED; 5]);
        assert_eq!(session.remaining_seconds(), 300);
        assert!(session.attempt().started_at.is_some());
    }

    #[tokio::test]
    async fn start_refuses_before_window_opens() {
        let now = Utc::now();
        let assessment = assigned_assessment(
            Some(now + Duration::hours(1)),
            Some(now + Duration::hours(2)),
        );

        let mut session = session_with(MockAssessmentApi::new());
        session.load_assigned(assessment).unwrap();
        let err = session.start_at(now).await.unwrap_err();

        assert_eq!(err, SessionError::NotYetOpen);
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn start_refuses_after_window_closes() {
        let now = Utc::now();
        let assessment = assigned_assessment(
            Some(now - Duration::hours(2)),
            Some(now - Duration::hours(1)),
        );

        let mut session = session_with(MockAssessmentApi::new());
        session.load_assigned(assessment).unwrap();
        let err = session.start_at(now).await.unwrap_err();

        assert_eq!(err, SessionError::WindowClosed);
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn start_refuses_when_ledger_has_the_id() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.mark("assess-5q").await.unwrap();

        let mut session = AssessmentSession::new(Arc::new(MockAssessmentApi::new()), ledger);
        session.load_assigned(five_question_assessment()).unwrap();
        let err = session.start().await.unwrap_err();

        assert_eq!(err, SessionError::AlreadySubmitted);
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn navigation_clamps_at_boundaries() {
        let mut session = session_with(MockAssessmentApi::new());
        session.load_assigned(five_question_assessment()).unwrap();
        session.start().await.unwrap();

        session.previous_question().unwrap();
        assert_eq!(session.attempt().current_question_index, 0);

        for _ in 0..10 {
            session.next_question().unwrap();
        }
        assert_eq!(session.attempt().current_question_index, 4);
    }

    #[tokio::test]
    async fn select_answer_overwrites_last_write_wins() {
        let mut session = session_with(MockAssessmentApi::new());
        session.load_assigned(five_question_assessment()).unwrap();
        session.start().await.unwrap();

        session.select_answer(1).unwrap();
        session.select_answer(3).unwrap();

        assert_eq!(session.attempt().answers[0], 3);
    }

    #[tokio::test]
    async fn select_answer_rejects_out_of_range_option() {
        let mut session = session_with(MockAssessmentApi::new());
        session.load_assigned(five_question_assessment()).unwrap();
        session.start().await.unwrap();

        let err = session.select_answer(4).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert_eq!(session.attempt().answers[0], UNANSWERED);
    }

    #[tokio::test]
    async fn manual_submit_with_unanswered_asks_for_confirmation() {
        let mut session = session_with(quiet_api());
        session.load_assigned(five_question_assessment()).unwrap();
        session.start().await.unwrap();
        session.select_answer(0).unwrap();

        let outcome = session.submit().await.unwrap();

        assert_eq!(outcome, SubmitOutcome::ConfirmationRequired(4));
        assert_eq!(session.phase(), Phase::Active);
    }

    #[tokio::test]
    async fn confirmed_submit_completes_with_local_grading() {
        let mut session = session_with(quiet_api());
        session.load_assigned(five_question_assessment()).unwrap();
        session.start().await.unwrap();
        // Correct answers for this fixture are i % 4.
        for expected in [0, 1, 2, 3] {
            session.select_answer(expected).unwrap();
            session.next_question().unwrap();
        }

        let outcome = session.submit_confirmed().await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Completed);
        assert_eq!(session.phase(), Phase::Completed);
        let result = session.result().unwrap();
        assert_eq!(result.score, 4);
        assert_eq!(result.percentage_display(), "80.0");
        assert!(!result.feedback[4].is_correct);
        assert_eq!(result.feedback[4].selected_option_text, "Not answered");
    }

    #[tokio::test]
    async fn second_dispatch_is_a_no_op() {
        let mut api = quiet_api();
        // Mock enforces the at-most-one-submission property: a second
        // network call would exceed the expectation and panic.
        api.expect_submit().times(1).returning(|_, _| {
            Ok(AttemptResult {
                score: 0,
                total_marks: 5,
                percentage: 0.0,
                feedback: vec![],
            })
        });
        let now = Utc::now();
        let assessment = assigned_assessment(Some(now - Duration::hours(1)), None);

        let mut session = session_with(api);
        session.load_assigned(assessment).unwrap();
        session.start_at(now).await.unwrap();

        let first = session.dispatch_submission().await.unwrap();
        assert_eq!(first, SubmitOutcome::Completed);

        let second = session.dispatch_submission().await.unwrap();
        assert_eq!(second, SubmitOutcome::AlreadyInFlight);
    }

    #[tokio::test]
    async fn timeout_auto_submits_without_confirmation() {
        let mut session = session_with(quiet_api());
        let mut assessment = five_question_assessment();
        assessment.duration_seconds = 2;
        session.load_assigned(assessment).unwrap();
        session.start().await.unwrap();
        session.select_answer(0).unwrap();

        assert_eq!(session.tick().await.unwrap(), None);
        let outcome = session.tick().await.unwrap();

        // Two questions-plus unanswered, no prompt on the timeout path.
        assert_eq!(outcome, Some(SubmitOutcome::Completed));
        assert_eq!(session.phase(), Phase::Completed);
    }

    #[tokio::test]
    async fn submit_400_rolls_back_to_active_with_server_message() {
        let mut api = quiet_api();
        api.expect_submit().times(1).returning(|_, _| {
            Err(SessionError::InvalidSubmission(
                "Invalid submission data".to_string(),
            ))
        });
        let now = Utc::now();

        let mut session = session_with(api);
        session
            .load_assigned(assigned_assessment(Some(now - Duration::hours(1)), None))
            .unwrap();
        session.start_at(now).await.unwrap();
        for i in 0..5 {
            session.select_answer(i % 4).unwrap();
            session.next_question().unwrap();
        }
        let before = session.remaining_seconds();

        let err = session.submit().await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid submission: Invalid submission data");
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.remaining_seconds(), before);
        assert!(!session.submission_in_flight);
    }

    #[tokio::test]
    async fn submit_failure_after_expiry_is_permanent() {
        let mut api = quiet_api();
        api.expect_submit()
            .times(1)
            .returning(|_, _| Err(SessionError::SubmissionFailed("timeout".to_string())));
        let now = Utc::now();
        let mut assessment = assigned_assessment(None, None);
        assessment.duration_seconds = 1;

        let mut session = session_with(api);
        session.load_assigned(assessment).unwrap();
        session.start_at(now).await.unwrap();

        let err = session.tick().await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(session.phase(), Phase::Submitting);
        // The timer cannot be un-expired; a further submit is refused.
        assert!(session.submit().await.is_err());
    }

    #[tokio::test]
    async fn completed_session_records_ledger_entry() {
        let ledger = Arc::new(InMemoryLedger::new());
        let mut session = AssessmentSession::new(Arc::new(quiet_api()), ledger.clone());
        session.load_assigned(five_question_assessment()).unwrap();
        session.start().await.unwrap();

        session.submit_confirmed().await.unwrap();

        assert!(ledger.has("assess-5q").await.unwrap());
    }

    #[tokio::test]
    async fn activity_log_failure_never_blocks_completion() {
        let mut api = MockAssessmentApi::new();
        api.expect_log_activity()
            .returning(|_, _| Err(SessionError::SubmissionFailed("telemetry down".to_string())));
        let mut session = session_with(api);
        session.load_assigned(five_question_assessment()).unwrap();
        session.start().await.unwrap();

        let outcome = session.submit_confirmed().await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Completed);
        assert_eq!(session.phase(), Phase::Completed);
    }

    #[tokio::test]
    async fn ticks_outside_active_are_ignored() {
        let mut session = session_with(MockAssessmentApi::new());
        session.load_assigned(five_question_assessment()).unwrap();

        assert_eq!(session.tick().await.unwrap(), None);
        assert_eq!(session.phase(), Phase::Ready);
    }
}
