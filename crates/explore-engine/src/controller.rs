//! Session controller
//!
//! Orchestrates one exploration session at a time:
//! - Opens the session through the exploration service
//! - Records answers optimistically, then feedback and the next question
//! - Detects completion and requests the report in the same call
//! - Retries failed answers without duplicating the answer turn
//!
//! Every network-facing operation holds the single-flight guard for its whole
//! duration. A second call while the guard is held is rejected up front and
//! leaves the transcript untouched.
//! An answer whose request is dropped before a response is marked failed and
//! can be resent with `retry_answer`.

use crate::config::EngineConfig;
use crate::error::{ExploreError, RegistryError, ServiceError};
use crate::reconciler::SuggestionReconciler;
use crate::registry::DimensionRegistry;
use crate::service::{
    AnswerResponse, CompletionResponse, EntityUpdater, ExplorationService, InsightsData,
    NextQuestion, SeedContext, StartResponse,
};
use crate::state_machine::validate_transition;
use crate::tracker::DimensionTracker;
use crate::transcript::{DeliveryStatus, Transcript, Turn, TurnKind};
use crate::types::{Dimension, Session, SessionId, SessionStatus, TurnId};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Completion report handed to the reconciler
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    /// Session the report belongs to
    pub session_id: SessionId,
    /// Report payload
    pub data: InsightsData,
}

impl Insights {
    /// Hand the field suggestions to a new reconciler
    #[must_use]
    pub fn into_reconciler(self, updater: Arc<dyn EntityUpdater>) -> SuggestionReconciler {
        SuggestionReconciler::new(updater, self.data.field_suggestions)
    }
}

/// Result of a submitted answer
#[derive(Debug)]
pub struct AnswerOutcome {
    /// The answer turn, now acknowledged
    pub answer_turn: TurnId,
    /// Service feedback on the answer
    pub feedback: String,
    /// Question for the next dimension, absent once complete
    pub next_question: Option<NextQuestion>,
    /// Clamped progress
    pub progress: u8,
    /// Dimensions answered so far
    pub answered_count: usize,
    /// Whether this answer completed the exploration
    pub is_complete: bool,
    /// Completion report, present only when `is_complete`
    ///
    /// A failed report leaves the session in `completing`; call
    /// [`SessionController::complete`] to retry.
    pub completion: Option<Result<Insights, ExploreError>>,
}

/// Aggregated view of session progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    /// Dimensions in the registry
    pub total: usize,
    /// Dimensions with an acknowledged answer
    pub answered: usize,
    /// Dimensions still to answer
    pub remaining: usize,
    /// Clamped service progress
    pub percent: u8,
    /// Whether the exploration is complete
    pub is_complete: bool,
}

/// Clears the in-flight flag on every exit path
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Marks an answer `failed` if its request ends without a response
///
/// Covers a dropped future, where neither the success nor the failure path
/// runs, so the turn stays retryable.
struct PendingAnswer<'a> {
    state: &'a Mutex<SessionState>,
    turn_id: TurnId,
}

impl Drop for PendingAnswer<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        let unsettled = state
            .transcript
            .get(self.turn_id)
            .is_some_and(|t| t.delivery() == DeliveryStatus::PendingAck);
        if unsettled
            && state
                .transcript
                .mark_delivery(self.turn_id, DeliveryStatus::Failed)
                .is_ok()
        {
            tracing::warn!(
                session_id = %state.session.id,
                turn_id = %self.turn_id,
                "answer request dropped before a response"
            );
        }
    }
}

#[derive(Debug)]
struct SessionState {
    registry: Arc<DimensionRegistry>,
    session: Session,
    transcript: Transcript,
    tracker: DimensionTracker,
    current_dimension: Option<String>,
    insights: Option<Insights>,
}

struct AnswerStep {
    feedback: String,
    next_question: Option<NextQuestion>,
    progress: u8,
    answered_count: usize,
    is_complete: bool,
}

impl SessionState {
    fn fresh(registry: Arc<DimensionRegistry>) -> Self {
        Self {
            session: Session::new(registry.len()),
            transcript: Transcript::new(),
            tracker: DimensionTracker::new(registry.clone()),
            registry,
            current_dimension: None,
            insights: None,
        }
    }

    fn ensure(
        &self,
        id: SessionId,
        operation: &'static str,
        expected: SessionStatus,
    ) -> Result<(), ExploreError> {
        if self.session.id != id {
            return Err(ExploreError::UnknownSession(id));
        }
        if self.session.status != expected {
            return Err(ExploreError::InvalidState {
                operation,
                status: self.session.status,
            });
        }
        Ok(())
    }

    fn transition(&mut self, to: SessionStatus) -> Result<(), ExploreError> {
        validate_transition(self.session.status, to)?;
        tracing::info!(
            session_id = %self.session.id,
            from = %self.session.status,
            to = %to,
            "session transition"
        );
        self.session.status = to;
        Ok(())
    }

    fn remote_id(&self) -> String {
        self.session.remote_id.clone().unwrap_or_default()
    }

    fn fallback_dimension(&self) -> Option<String> {
        self.tracker
            .next_dimension(&self.transcript)
            .map(|d| d.key.clone())
    }

    /// Tag for the next question; the service key is display data only
    fn question_dimension(&self, service_key: Option<&str>) -> Option<String> {
        let key = self.fallback_dimension();
        if let Some(reported) = service_key {
            if key.as_deref() != Some(reported) {
                tracing::debug!(
                    session_id = %self.session.id,
                    reported,
                    tagged = ?key,
                    "service question key differs from next unanswered dimension"
                );
            }
        }
        key
    }

    /// Store the transcript-derived count; the service count is only logged
    fn record_answered_count(&mut self, reported: usize) -> usize {
        let count = self
            .tracker
            .answered_count(&self.transcript)
            .min(self.session.total_dimensions);
        if reported != count {
            tracing::debug!(
                session_id = %self.session.id,
                reported,
                derived = count,
                "service answered count differs from transcript"
            );
        }
        self.session.answered_dimension_count = count;
        count
    }

    fn record_start(&mut self, response: StartResponse) -> Result<Session, ExploreError> {
        let mut opening_dimension: Option<String> = None;
        for turn in response.turns {
            let key = if turn.kind == TurnKind::Question {
                let key = self.question_dimension(turn.dimension_key.as_deref());
                opening_dimension = key.clone();
                key
            } else {
                turn.dimension_key
            };
            self.transcript
                .append_acknowledged(turn.kind, turn.content, key);
        }

        self.session.remote_id = Some(response.session_id);
        self.session.progress_percent = DimensionTracker::clamp_progress(response.progress);
        self.record_answered_count(response.answered_count);
        self.current_dimension = opening_dimension.or_else(|| self.fallback_dimension());
        self.transition(SessionStatus::InProgress)?;
        Ok(self.session.clone())
    }

    fn record_answer(
        &mut self,
        answer: TurnId,
        response: AnswerResponse,
    ) -> Result<AnswerStep, ExploreError> {
        self.transcript
            .mark_delivery(answer, DeliveryStatus::Acknowledged)?;
        let answered_key = self
            .transcript
            .get(answer)
            .and_then(|t| t.dimension_key().map(str::to_string));

        if !response.feedback.trim().is_empty() {
            self.transcript
                .append(TurnKind::Feedback, response.feedback.clone(), answered_key);
        }

        if response.is_complete {
            self.tracker.latch_service_completion();
        }
        let progress = DimensionTracker::clamp_progress(response.progress);
        self.session.progress_percent = progress;
        let answered_count = self.record_answered_count(response.answered_count);
        let is_complete = self.tracker.is_complete(&self.transcript);

        let next_question = if is_complete {
            self.current_dimension = None;
            None
        } else {
            match response.next_question {
                Some(question) => {
                    let key = self.question_dimension(question.dimension_key.as_deref());
                    self.transcript
                        .append(TurnKind::Question, question.content.clone(), key.clone());
                    self.current_dimension = key;
                    Some(question)
                }
                None => {
                    self.current_dimension = self.fallback_dimension();
                    None
                }
            }
        };

        Ok(AnswerStep {
            feedback: response.feedback,
            next_question,
            progress,
            answered_count,
            is_complete,
        })
    }
}

/// Drives one exploration session against an injected service
pub struct SessionController {
    service: Arc<dyn ExplorationService>,
    config: EngineConfig,
    in_flight: AtomicBool,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("config", &self.config)
            .field("in_flight", &self.in_flight.load(Ordering::Acquire))
            .field("session", &self.state.lock().session)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Create a controller with an idle placeholder session
    #[must_use]
    pub fn new(service: Arc<dyn ExplorationService>, config: EngineConfig) -> Self {
        Self {
            service,
            config,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(SessionState::fresh(Arc::new(DimensionRegistry::default()))),
        }
    }

    fn guard(&self) -> Result<InFlight<'_>, ExploreError> {
        InFlight::acquire(&self.in_flight).ok_or_else(|| {
            let id = self.state.lock().session.id;
            tracing::warn!(session_id = %id, "request rejected: another request is in flight");
            ExploreError::RequestInFlight(id)
        })
    }

    /// Start a new session over `registry`
    ///
    /// Always replaces the current session with a fresh one under a new id,
    /// discarding its transcript. On failure the fresh session stays idle
    /// with an empty transcript, so calling `start` again is a clean retry.
    ///
    /// # Errors
    /// - `ExploreError::RequestInFlight` if another request is outstanding
    /// - `ExploreError::Registry` for an empty registry
    /// - `ExploreError::StartFailure` if the service call fails
    pub async fn start(
        &self,
        registry: DimensionRegistry,
        mut seed: SeedContext,
    ) -> Result<Session, ExploreError> {
        let _guard = self.guard()?;
        if registry.is_empty() {
            return Err(RegistryError::Empty.into());
        }

        let registry = Arc::new(registry);
        if seed.seed_questions.is_empty() {
            seed.seed_questions = registry.seed_questions().to_vec();
        }

        let session_id = {
            let mut state = self.state.lock();
            *state = SessionState::fresh(registry.clone());
            state.session.id
        };
        tracing::info!(
            %session_id,
            item_type = %seed.item_type,
            dimensions = registry.len(),
            "starting exploration session"
        );

        let response = self
            .service
            .start_session(registry.dimensions(), &seed)
            .await
            .and_then(|r| {
                if r.session_id.trim().is_empty() {
                    Err(ServiceError::malformed("start response has no session id"))
                } else {
                    Ok(r)
                }
            });

        match response {
            Ok(response) => {
                let session = self.state.lock().record_start(response)?;
                tracing::info!(
                    %session_id,
                    remote_id = ?session.remote_id,
                    turns = self.state.lock().transcript.len(),
                    "exploration session started"
                );
                Ok(session)
            }
            Err(source) => {
                tracing::warn!(%session_id, error = %source, "session start failed");
                Err(ExploreError::StartFailure { source })
            }
        }
    }

    /// Submit an answer for the current dimension
    ///
    /// The answer turn is appended before the service is called and is kept
    /// if the call fails, marked `failed` for [`Self::retry_answer`].
    ///
    /// # Errors
    /// - `ExploreError::RequestInFlight` while another request is outstanding
    /// - `ExploreError::UnknownSession` / `InvalidState` on precondition failure
    /// - `ExploreError::EmptyAnswer` / `AnswerTooLong` from the answer policy
    /// - `ExploreError::AnswerSubmissionFailure` if the service call fails
    pub async fn submit_answer(
        &self,
        session_id: SessionId,
        text: &str,
    ) -> Result<AnswerOutcome, ExploreError> {
        let _guard = self.guard()?;
        let (turn_id, remote_id, content) = self.append_answer(session_id, text)?;
        self.deliver_answer(session_id, turn_id, &remote_id, &content)
            .await
    }

    /// Resend the most recent answer after a failed submission
    ///
    /// Reuses the existing answer turn, so no duplicate is appended.
    ///
    /// # Errors
    /// - `ExploreError::NoFailedAnswer` if the latest answer is not `failed`
    /// - the same precondition and service errors as [`Self::submit_answer`]
    pub async fn retry_answer(&self, session_id: SessionId) -> Result<AnswerOutcome, ExploreError> {
        let _guard = self.guard()?;
        let (turn_id, remote_id, content) = self.reopen_failed_answer(session_id)?;
        tracing::info!(%session_id, turn_id = %turn_id, "retrying answer");
        self.deliver_answer(session_id, turn_id, &remote_id, &content)
            .await
    }

    /// Request the completion report for a session in `completing`
    ///
    /// Normally invoked by [`Self::submit_answer`]; call directly to retry
    /// after a `CompletionFailure`.
    ///
    /// # Errors
    /// - `ExploreError::RequestInFlight` while another request is outstanding
    /// - `ExploreError::InvalidState` unless the session is `completing`
    /// - `ExploreError::CompletionFailure` if the service call fails
    pub async fn complete(&self, session_id: SessionId) -> Result<Insights, ExploreError> {
        let _guard = self.guard()?;
        let remote_id = {
            let state = self.state.lock();
            state.ensure(session_id, "complete", SessionStatus::Completing)?;
            state.remote_id()
        };
        self.run_completion(session_id, &remote_id).await
    }

    /// Discard the current session and open a fresh idle one
    ///
    /// # Errors
    /// `ExploreError::RequestInFlight` while another request is outstanding
    pub fn reset(&self) -> Result<Session, ExploreError> {
        let _guard = self.guard()?;
        let mut state = self.state.lock();
        let previous = state.session.id;
        let registry = state.registry.clone();
        *state = SessionState::fresh(registry);
        tracing::info!(%previous, session_id = %state.session.id, "session reset");
        Ok(state.session.clone())
    }

    fn append_answer(
        &self,
        session_id: SessionId,
        text: &str,
    ) -> Result<(TurnId, String, String), ExploreError> {
        let mut state = self.state.lock();
        state.ensure(session_id, "submit an answer", SessionStatus::InProgress)?;
        let content = self.config.normalize_answer(text)?;

        let dimension = state.current_dimension.clone();
        let turn_id = state
            .transcript
            .append(TurnKind::Answer, content.clone(), dimension.clone())
            .id();
        tracing::debug!(%session_id, %turn_id, dimension = ?dimension, "answer recorded");

        Ok((turn_id, state.remote_id(), content))
    }

    fn reopen_failed_answer(
        &self,
        session_id: SessionId,
    ) -> Result<(TurnId, String, String), ExploreError> {
        let mut state = self.state.lock();
        state.ensure(session_id, "retry an answer", SessionStatus::InProgress)?;

        let (turn_id, content) = state
            .transcript
            .last_of_kind(TurnKind::Answer)
            .filter(|t| t.delivery() == DeliveryStatus::Failed)
            .map(|t| (t.id(), t.content().to_string()))
            .ok_or(ExploreError::NoFailedAnswer)?;

        state
            .transcript
            .mark_delivery(turn_id, DeliveryStatus::PendingAck)?;
        Ok((turn_id, state.remote_id(), content))
    }

    async fn deliver_answer(
        &self,
        session_id: SessionId,
        turn_id: TurnId,
        remote_id: &str,
        content: &str,
    ) -> Result<AnswerOutcome, ExploreError> {
        let _pending = PendingAnswer {
            state: &self.state,
            turn_id,
        };
        let response = match self.service.send_answer(remote_id, content).await {
            Ok(response) => response,
            Err(source) => return Err(self.fail_answer(session_id, turn_id, source)),
        };

        let step = self.acknowledge_answer(turn_id, response)?;
        tracing::info!(
            %session_id,
            answered = step.answered_count,
            progress = step.progress,
            complete = step.is_complete,
            "answer acknowledged"
        );

        let completion = if step.is_complete {
            Some(self.run_completion(session_id, remote_id).await)
        } else {
            None
        };

        Ok(AnswerOutcome {
            answer_turn: turn_id,
            feedback: step.feedback,
            next_question: step.next_question,
            progress: step.progress,
            answered_count: step.answered_count,
            is_complete: step.is_complete,
            completion,
        })
    }

    fn fail_answer(&self, session_id: SessionId, turn_id: TurnId, source: ServiceError) -> ExploreError {
        tracing::warn!(%session_id, %turn_id, error = %source, "answer submission failed");
        if let Err(e) = self
            .state
            .lock()
            .transcript
            .mark_delivery(turn_id, DeliveryStatus::Failed)
        {
            return e.into();
        }
        ExploreError::AnswerSubmissionFailure { turn_id, source }
    }

    fn acknowledge_answer(
        &self,
        turn_id: TurnId,
        response: AnswerResponse,
    ) -> Result<AnswerStep, ExploreError> {
        let mut state = self.state.lock();
        let step = state.record_answer(turn_id, response)?;
        if step.is_complete {
            state.transition(SessionStatus::Completing)?;
        }
        Ok(step)
    }

    async fn run_completion(
        &self,
        session_id: SessionId,
        remote_id: &str,
    ) -> Result<Insights, ExploreError> {
        tracing::info!(%session_id, "requesting completion report");
        match self.service.complete_session(remote_id).await {
            Ok(response) => self.finish_completion(session_id, response),
            Err(source) => {
                tracing::error!(%session_id, error = %source, "completion report failed");
                Err(ExploreError::CompletionFailure { session_id, source })
            }
        }
    }

    fn finish_completion(
        &self,
        session_id: SessionId,
        response: CompletionResponse,
    ) -> Result<Insights, ExploreError> {
        let mut state = self.state.lock();
        state.transition(SessionStatus::Completed)?;
        let insights = Insights {
            session_id,
            data: response.insights_data,
        };
        state.insights = Some(insights.clone());
        tracing::info!(
            %session_id,
            suggestions = insights.data.field_suggestions.len(),
            findings = insights.data.findings.len(),
            "exploration session completed"
        );
        Ok(insights)
    }

    /// Current session snapshot
    #[must_use]
    pub fn session(&self) -> Session {
        self.state.lock().session.clone()
    }

    /// Full transcript snapshot
    #[must_use]
    pub fn transcript(&self) -> Transcript {
        self.state.lock().transcript.clone()
    }

    /// Transcript turns minus the kinds hidden by [`EngineConfig`]
    #[must_use]
    pub fn visible_turns(&self) -> Vec<Turn> {
        let state = self.state.lock();
        state
            .transcript
            .visible(&self.config.hidden_turn_kinds)
            .cloned()
            .collect()
    }

    /// Completion report once the session is `completed`
    #[must_use]
    pub fn insights(&self) -> Option<Insights> {
        self.state.lock().insights.clone()
    }

    /// Dimension the next answer will be tagged with
    #[must_use]
    pub fn current_dimension(&self) -> Option<Dimension> {
        let state = self.state.lock();
        state
            .current_dimension
            .as_deref()
            .and_then(|k| state.registry.get(k))
            .cloned()
    }

    /// Lowest-order dimension without an acknowledged answer
    #[must_use]
    pub fn next_dimension(&self) -> Option<Dimension> {
        let state = self.state.lock();
        state.tracker.next_dimension(&state.transcript).cloned()
    }

    /// True once at most one dimension remains
    #[must_use]
    pub fn is_last_dimension(&self) -> bool {
        let state = self.state.lock();
        state.tracker.is_last_dimension(&state.transcript)
    }

    /// Answered, remaining and percent for the current session
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let state = self.state.lock();
        SessionProgress {
            total: state.session.total_dimensions,
            answered: state.session.answered_dimension_count,
            remaining: state.session.remaining(),
            percent: state.session.progress_percent,
            is_complete: state.tracker.is_complete(&state.transcript),
        }
    }

    /// Whether a request currently holds the single-flight guard
    #[inline]
    #[must_use]
    pub fn is_awaiting_response(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Answer and view policy this controller was built with
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_harness::{ScriptedExplorationService, ServiceCall};

    fn registry() -> DimensionRegistry {
        DimensionRegistry::new([("a", "A"), ("b", "B")]).unwrap()
    }

    fn controller(service: Arc<ScriptedExplorationService>) -> SessionController {
        SessionController::new(service, EngineConfig::default())
    }

    #[tokio::test]
    async fn new_controller_is_idle() {
        let c = controller(Arc::new(ScriptedExplorationService::new()));
        assert_eq!(c.session().status, SessionStatus::Idle);
        assert!(c.transcript().is_empty());
        assert!(!c.is_awaiting_response());
    }

    #[tokio::test]
    async fn empty_registry_is_rejected() {
        let c = controller(Arc::new(ScriptedExplorationService::new()));
        let err = c
            .start(DimensionRegistry::default(), SeedContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExploreError::Registry(RegistryError::Empty)));
        assert!(!c.is_awaiting_response());
    }

    #[tokio::test]
    async fn start_tags_opening_question() {
        let c = controller(Arc::new(ScriptedExplorationService::new()));
        let session = c.start(registry(), SeedContext::new("persona", "Ada")).await.unwrap();
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.total_dimensions, 2);
        assert_eq!(c.current_dimension().unwrap().key, "a");
    }

    #[tokio::test]
    async fn blank_answer_leaves_transcript_untouched() {
        let c = controller(Arc::new(ScriptedExplorationService::new()));
        let session = c.start(registry(), SeedContext::default()).await.unwrap();
        let before = c.transcript().len();

        let err = c.submit_answer(session.id, "   ").await.unwrap_err();
        assert!(matches!(err, ExploreError::EmptyAnswer));
        assert_eq!(c.transcript().len(), before);
    }

    #[tokio::test]
    async fn wrong_session_id_is_unknown() {
        let c = controller(Arc::new(ScriptedExplorationService::new()));
        c.start(registry(), SeedContext::default()).await.unwrap();
        let other = SessionId::new();
        let err = c.submit_answer(other, "x").await.unwrap_err();
        assert!(matches!(err, ExploreError::UnknownSession(id) if id == other));
    }

    #[tokio::test]
    async fn reset_issues_fresh_idle_session() {
        let c = controller(Arc::new(ScriptedExplorationService::new()));
        let first = c.start(registry(), SeedContext::default()).await.unwrap();
        let reset = c.reset().unwrap();
        assert_ne!(first.id, reset.id);
        assert_eq!(reset.status, SessionStatus::Idle);
        assert!(c.transcript().is_empty());
        assert!(matches!(
            c.submit_answer(reset.id, "x").await,
            Err(ExploreError::InvalidState { status: SessionStatus::Idle, .. })
        ));
    }

    #[tokio::test]
    async fn retry_without_failure_is_rejected() {
        let service = Arc::new(ScriptedExplorationService::new());
        let c = controller(service.clone());
        let session = c.start(registry(), SeedContext::default()).await.unwrap();
        c.submit_answer(session.id, "first").await.unwrap();

        let err = c.retry_answer(session.id).await.unwrap_err();
        assert!(matches!(err, ExploreError::NoFailedAnswer));
        assert_eq!(service.call_count(ServiceCall::Answer), 1);
    }

    #[tokio::test]
    async fn early_service_completion_latches() {
        let service = Arc::new(ScriptedExplorationService::new().complete_after(1));
        let c = controller(service);
        let session = c.start(registry(), SeedContext::default()).await.unwrap();

        let outcome = c.submit_answer(session.id, "enough").await.unwrap();
        assert!(outcome.is_complete);
        assert!(outcome.next_question.is_none());
        assert!(matches!(outcome.completion, Some(Ok(_))));
        assert_eq!(c.session().status, SessionStatus::Completed);
        assert!(c.progress().is_complete);
    }
}
