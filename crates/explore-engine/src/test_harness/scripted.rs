//! Scripted collaborators
//!
//! Deterministic stand-ins for the exploration service and the entity
//! updater. Failures can be planned per call kind or injected at a seeded
//! random rate.

use crate::error::ServiceError;
use crate::service::{
    AnswerResponse, CompletionResponse, DimensionInsight, EntityUpdater, ExplorationService,
    Finding, InsightsData, NextQuestion, ProposedSuggestion, SeedContext, ServiceTurn,
    StartResponse, UpdateMap,
};
use crate::transcript::TurnKind;
use crate::types::Dimension;
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

/// Exploration service operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceCall {
    Start,
    Answer,
    Complete,
}

#[derive(Debug)]
struct FaultInjector {
    rng: StdRng,
    rate: f64,
}

impl FaultInjector {
    fn new(seed: u64, rate: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            rate: rate.clamp(0.0, 1.0),
        }
    }

    fn roll(&mut self) -> bool {
        self.rate > 0.0 && self.rng.gen_bool(self.rate)
    }
}

#[derive(Debug, Default)]
struct Script {
    dimensions: Vec<Dimension>,
    item_name: String,
    answered: usize,
    sessions_opened: u64,
    remote_id: Option<String>,
}

/// Exploration service that walks the dimensions in order
///
/// Each answer covers the next dimension; completion is signaled once every
/// dimension is answered, or earlier with [`Self::complete_after`].
#[derive(Debug)]
pub struct ScriptedExplorationService {
    script: Mutex<Script>,
    planned: Mutex<VecDeque<(ServiceCall, ServiceError)>>,
    faults: Option<Mutex<FaultInjector>>,
    complete_after: Option<usize>,
    suggestions: Option<Vec<ProposedSuggestion>>,
    answers: Mutex<Vec<String>>,
    calls: Mutex<Vec<ServiceCall>>,
}

impl Default for ScriptedExplorationService {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedExplorationService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script::default()),
            planned: Mutex::new(VecDeque::new()),
            faults: None,
            complete_after: None,
            suggestions: None,
            answers: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail calls at random with probability `rate`
    #[must_use]
    pub fn with_fault_rate(mut self, seed: u64, rate: f64) -> Self {
        self.faults = Some(Mutex::new(FaultInjector::new(seed, rate)));
        self
    }

    /// Signal completion after `answers` answers regardless of dimension count
    #[must_use]
    pub fn complete_after(mut self, answers: usize) -> Self {
        self.complete_after = Some(answers);
        self
    }

    /// Report these suggestions instead of one per dimension
    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<ProposedSuggestion>) -> Self {
        self.suggestions = Some(suggestions);
        self
    }

    /// Fail the next call of `call` kind with `error`
    pub fn fail_next(&self, call: ServiceCall, error: ServiceError) {
        self.planned.lock().push_back((call, error));
    }

    /// Answers received, in order
    #[must_use]
    pub fn answers(&self) -> Vec<String> {
        self.answers.lock().clone()
    }

    /// Number of calls of `call` kind, failed ones included
    #[must_use]
    pub fn call_count(&self, call: ServiceCall) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    fn check(&self, call: ServiceCall) -> Result<(), ServiceError> {
        self.calls.lock().push(call);

        let mut planned = self.planned.lock();
        if let Some(pos) = planned.iter().position(|(c, _)| *c == call) {
            if let Some((_, err)) = planned.remove(pos) {
                return Err(err);
            }
        }
        drop(planned);

        if let Some(faults) = &self.faults {
            if faults.lock().roll() {
                return Err(ServiceError::transport(format!("injected {call:?} fault")));
            }
        }
        Ok(())
    }

    fn check_session(script: &Script, session_id: &str) -> Result<(), ServiceError> {
        if script.remote_id.as_deref() == Some(session_id) {
            Ok(())
        } else {
            Err(ServiceError::rejected(format!("unknown session {session_id}")))
        }
    }

    fn question_for(dim: &Dimension) -> NextQuestion {
        NextQuestion {
            content: format!("Tell me about {}.", dim.label.to_lowercase()),
            dimension_key: Some(dim.key.clone()),
            dimension_title: Some(dim.label.clone()),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn progress(answered: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            answered as f64 * 100.0 / total as f64
        }
    }
}

#[async_trait::async_trait]
impl ExplorationService for ScriptedExplorationService {
    async fn start_session(
        &self,
        dimensions: &[Dimension],
        seed: &SeedContext,
    ) -> Result<StartResponse, ServiceError> {
        self.check(ServiceCall::Start)?;

        let mut script = self.script.lock();
        script.sessions_opened += 1;
        script.dimensions = dimensions.to_vec();
        script.item_name = seed.item_name.clone();
        script.answered = 0;
        let remote_id = format!("scripted-{}", script.sessions_opened);
        script.remote_id = Some(remote_id.clone());

        let mut turns = vec![ServiceTurn::new(
            TurnKind::Intro,
            format!(
                "Let's explore {} across {} dimensions.",
                seed.item_name,
                dimensions.len()
            ),
            None,
        )];
        if let Some(first) = dimensions.first() {
            let q = Self::question_for(first);
            turns.push(ServiceTurn::new(
                TurnKind::Question,
                q.content,
                Some(first.key.as_str()),
            ));
        }

        Ok(StartResponse {
            session_id: remote_id,
            turns,
            progress: 0.0,
            answered_count: 0,
        })
    }

    async fn send_answer(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<AnswerResponse, ServiceError> {
        self.check(ServiceCall::Answer)?;

        let mut script = self.script.lock();
        Self::check_session(&script, session_id)?;
        self.answers.lock().push(text.to_string());

        let total = script.dimensions.len();
        let answered_dim = script.dimensions.get(script.answered).cloned();
        script.answered = (script.answered + 1).min(total);

        let is_complete = script.answered >= total
            || self.complete_after.is_some_and(|n| script.answered >= n);
        let next_question = if is_complete {
            None
        } else {
            script.dimensions.get(script.answered).map(Self::question_for)
        };

        let feedback = answered_dim
            .map(|d| format!("Thanks, that sharpens the {} picture.", d.label.to_lowercase()))
            .unwrap_or_else(|| "Thanks.".to_string());

        Ok(AnswerResponse {
            feedback,
            next_question,
            progress: Self::progress(script.answered, total),
            answered_count: script.answered,
            is_complete,
        })
    }

    async fn complete_session(&self, session_id: &str) -> Result<CompletionResponse, ServiceError> {
        self.check(ServiceCall::Complete)?;

        let script = self.script.lock();
        Self::check_session(&script, session_id)?;

        let dimensions = script
            .dimensions
            .iter()
            .map(|d| DimensionInsight {
                key: d.key.clone(),
                title: d.label.clone(),
                summary: format!("{} is well defined.", d.label),
            })
            .collect();
        let findings = script
            .dimensions
            .iter()
            .map(|d| Finding {
                dimension_key: Some(d.key.clone()),
                title: format!("{} finding", d.label),
                description: format!("Answers on {} were consistent.", d.label.to_lowercase()),
            })
            .collect();
        let field_suggestions = self.suggestions.clone().unwrap_or_else(|| {
            script
                .dimensions
                .iter()
                .map(|d| ProposedSuggestion {
                    target_field: d.key.clone(),
                    label: d.label.clone(),
                    current_value: json!(null),
                    suggested_value: json!(format!("Refined {}", d.label.to_lowercase())),
                    reason: format!("Derived from the {} answers", d.label.to_lowercase()),
                })
                .collect()
        });

        Ok(CompletionResponse {
            insights_data: InsightsData {
                dimensions,
                findings,
                recommendations: vec![format!("Revisit {} quarterly.", script.item_name)],
                executive_summary: format!(
                    "{} covered {} dimensions.",
                    script.item_name,
                    script.dimensions.len()
                ),
                field_suggestions,
            },
        })
    }
}

/// Wraps a scripted service and holds each answer until released
///
/// Lets a test observe the controller while a request is in flight.
#[derive(Debug)]
pub struct GatedExplorationService {
    inner: Arc<ScriptedExplorationService>,
    gate: Semaphore,
    entered: Notify,
}

impl GatedExplorationService {
    #[must_use]
    pub fn new(inner: Arc<ScriptedExplorationService>) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
            entered: Notify::new(),
        }
    }

    /// Wait until an answer call is blocked on the gate
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let one held answer call proceed
    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait::async_trait]
impl ExplorationService for GatedExplorationService {
    async fn start_session(
        &self,
        dimensions: &[Dimension],
        seed: &SeedContext,
    ) -> Result<StartResponse, ServiceError> {
        self.inner.start_session(dimensions, seed).await
    }

    async fn send_answer(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<AnswerResponse, ServiceError> {
        self.entered.notify_one();
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| ServiceError::transport("gate closed"))?;
        permit.forget();
        self.inner.send_answer(session_id, text).await
    }

    async fn complete_session(&self, session_id: &str) -> Result<CompletionResponse, ServiceError> {
        self.inner.complete_session(session_id).await
    }
}

/// Entity updater that records every call and keeps the resulting entity
#[derive(Debug, Default)]
pub struct RecordingEntityUpdater {
    calls: Mutex<Vec<UpdateMap>>,
    entity: Mutex<UpdateMap>,
    fail_remaining: AtomicUsize,
    faults: Option<Mutex<FaultInjector>>,
}

impl RecordingEntityUpdater {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail calls at random with probability `rate`
    #[must_use]
    pub fn with_fault_rate(mut self, seed: u64, rate: f64) -> Self {
        self.faults = Some(Mutex::new(FaultInjector::new(seed, rate)));
        self
    }

    /// Fail the next `n` calls
    pub fn fail_next(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Every update map received, failed calls included
    #[must_use]
    pub fn calls(&self) -> Vec<UpdateMap> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Entity fields after all successful updates
    #[must_use]
    pub fn entity(&self) -> UpdateMap {
        self.entity.lock().clone()
    }
}

#[async_trait::async_trait]
impl EntityUpdater for RecordingEntityUpdater {
    async fn apply_changes(&self, changes: &UpdateMap) -> Result<(), ServiceError> {
        self.calls.lock().push(changes.clone());

        let planned = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let injected = self.faults.as_ref().is_some_and(|f| f.lock().roll());
        if planned || injected {
            return Err(ServiceError::transport("entity update failed"));
        }

        let mut entity = self.entity.lock();
        for (field, value) in changes {
            entity.insert(field.clone(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> Vec<Dimension> {
        vec![Dimension::new("a", "Alpha", 0), Dimension::new("b", "Beta", 1)]
    }

    #[tokio::test]
    async fn scripted_walks_dimensions() {
        let svc = ScriptedExplorationService::new();
        let start = svc.start_session(&dims(), &SeedContext::default()).await.unwrap();
        assert_eq!(start.turns.len(), 2);

        let first = svc.send_answer(&start.session_id, "x").await.unwrap();
        assert!(!first.is_complete);
        assert_eq!(first.next_question.unwrap().dimension_key.as_deref(), Some("b"));

        let second = svc.send_answer(&start.session_id, "y").await.unwrap();
        assert!(second.is_complete);
        assert!((second.progress - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn planned_failure_hits_matching_call_only() {
        let svc = ScriptedExplorationService::new();
        svc.fail_next(ServiceCall::Answer, ServiceError::timeout("slow"));
        let start = svc.start_session(&dims(), &SeedContext::default()).await.unwrap();

        assert!(svc.send_answer(&start.session_id, "x").await.is_err());
        assert!(svc.send_answer(&start.session_id, "x").await.is_ok());
        assert_eq!(svc.call_count(ServiceCall::Answer), 2);
        assert_eq!(svc.answers().len(), 1);
    }

    #[tokio::test]
    async fn recording_updater_fails_then_recovers() {
        let updater = RecordingEntityUpdater::new();
        updater.fail_next(1);
        let mut changes = UpdateMap::new();
        changes.insert("name".into(), json!("New"));

        assert!(updater.apply_changes(&changes).await.is_err());
        assert!(updater.entity().is_empty());
        assert!(updater.apply_changes(&changes).await.is_ok());
        assert_eq!(updater.entity()["name"], json!("New"));
        assert_eq!(updater.call_count(), 2);
    }
}
