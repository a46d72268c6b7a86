//! Exploration simulator
//!
//! Drives a complete session against fault-injecting scripted collaborators:
//! start, one answer per dimension, completion, then reconciliation and
//! apply. Every failure is retried the way a caller would, and the session
//! is checked against the engine invariants along the way.
//!
//! Key invariants checked:
//! - A failed start leaves an idle session with an empty transcript
//! - A failed answer does not advance progress
//! - Order indices are gapless and the digest chain verifies
//! - Completion is signaled exactly once
//! - A failed apply changes no suggestion; a successful one writes exactly
//!   the accepted and edited values

use super::scripted::{RecordingEntityUpdater, ScriptedExplorationService};
use crate::config::{DimensionEntry, EngineConfig, ExplorationConfig};
use crate::controller::{Insights, SessionController};
use crate::error::ExploreError;
use crate::reconciler::{ReconcilerStats, SuggestionReconciler};
use crate::registry::DimensionRegistry;
use crate::service::SeedContext;
use crate::types::{Session, SessionId, SessionStatus};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Simulator configuration
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Probability that any external call fails
    pub failure_rate: f64,
    /// Attempts per operation before giving up
    pub max_attempts: u32,
    /// Share of suggestions rejected during reconciliation
    pub reject_ratio: f64,
    /// Share of suggestions edited during reconciliation
    pub edit_ratio: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            failure_rate: 0.2,
            max_attempts: 12,
            reject_ratio: 0.25,
            edit_ratio: 0.25,
        }
    }
}

/// A violation detected during simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Start failure left turns or a non-idle status behind
    DirtyStartFailure { turns: usize, status: SessionStatus },
    /// Progress moved on a failed answer
    ProgressAdvancedOnFailure { before: usize, after: usize },
    /// Order indices or digest chain broken
    TranscriptIntegrity { detail: String },
    /// Completion signaled a number of times other than once
    CompletionSignalCount { count: u32 },
    /// Final answered count does not match the registry
    AnsweredCountMismatch { answered: usize, total: usize },
    /// Session did not end `completed`
    FinalStatus { status: SessionStatus },
    /// Failed apply changed suggestion state
    StateChangedOnApplyFailure,
    /// Entity contents differ from the accepted set
    EntityMismatch { expected: usize, written: usize },
    /// A rejected field reached the entity
    RejectedFieldApplied { field: String },
    /// An operation kept failing
    RetriesExhausted { operation: String },
    /// Error outside the expected taxonomy
    UnexpectedError { operation: String, error: String },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulatorStats {
    pub start_attempts: u32,
    pub start_failures: u32,
    pub answers_submitted: u32,
    pub answer_failures: u32,
    pub answer_retries: u32,
    pub completion_failures: u32,
    pub apply_attempts: u32,
    pub apply_failures: u32,
    pub turns_recorded: usize,
    pub fields_applied: usize,
}

/// Final report from simulator
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub item_type: String,
    pub dimensions: usize,
    pub stats: SimulatorStats,
    pub reconciliation: Option<ReconcilerStats>,
    pub final_session: Option<Session>,
    pub violations: Vec<Violation>,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Exploration Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Item Type: {}\n", self.item_type));
        report.push_str(&format!("Dimensions: {}\n", self.dimensions));
        report.push_str(&format!("Failure Rate: {:.2}\n\n", self.config.failure_rate));
        report.push_str(&format!("Start Attempts: {}\n", self.stats.start_attempts));
        report.push_str(&format!("Start Failures: {}\n", self.stats.start_failures));
        report.push_str(&format!("Answers Submitted: {}\n", self.stats.answers_submitted));
        report.push_str(&format!("Answer Failures: {}\n", self.stats.answer_failures));
        report.push_str(&format!("Answer Retries: {}\n", self.stats.answer_retries));
        report.push_str(&format!("Completion Failures: {}\n", self.stats.completion_failures));
        report.push_str(&format!("Apply Attempts: {}\n", self.stats.apply_attempts));
        report.push_str(&format!("Apply Failures: {}\n", self.stats.apply_failures));
        report.push_str(&format!("Turns Recorded: {}\n", self.stats.turns_recorded));
        report.push_str(&format!("Fields Applied: {}\n", self.stats.fields_applied));

        if let Some(r) = &self.reconciliation {
            report.push_str(&format!(
                "\nSuggestions: {} total, {} accepted, {} edited, {} rejected\n",
                r.total, r.accepted, r.edited, r.rejected
            ));
        }

        report.push_str(&format!("\nViolations: {}\n", self.violations.len()));
        for v in &self.violations {
            report.push_str(&format!("  - {v:?}\n"));
        }
        report.push_str(&format!(
            "\nStatus: {}\n",
            if self.passed() { "PASSED" } else { "FAILED" }
        ));
        report
    }
}

/// Built-in brand asset setup used when no config file is given
#[must_use]
pub fn demo_config() -> ExplorationConfig {
    let dims = [
        ("purpose", "Purpose"),
        ("audience", "Audience"),
        ("personality", "Personality"),
        ("voice", "Voice"),
        ("differentiation", "Differentiation"),
    ];
    ExplorationConfig {
        item_type: "brand_asset".to_string(),
        dimensions: dims
            .iter()
            .map(|(key, label)| DimensionEntry {
                key: (*key).to_string(),
                label: (*label).to_string(),
            })
            .collect(),
        seed_questions: vec!["What should people feel when they meet this brand?".to_string()],
        engine: EngineConfig::default(),
    }
}

struct Run {
    config: SimulatorConfig,
    stats: SimulatorStats,
    violations: Vec<Violation>,
    rng: StdRng,
}

impl Run {
    fn unexpected(&mut self, operation: &str, error: &ExploreError) {
        self.violations.push(Violation::UnexpectedError {
            operation: operation.to_string(),
            error: error.to_string(),
        });
    }

    fn exhausted(&mut self, operation: &str) {
        self.violations.push(Violation::RetriesExhausted {
            operation: operation.to_string(),
        });
    }

    async fn start(
        &mut self,
        controller: &SessionController,
        registry: &DimensionRegistry,
        item_type: &str,
    ) -> Option<Session> {
        for _ in 0..self.config.max_attempts {
            self.stats.start_attempts += 1;
            let seed = SeedContext::new(item_type, "Simulated item");
            match controller.start(registry.clone(), seed).await {
                Ok(session) => return Some(session),
                Err(ExploreError::StartFailure { .. }) => {
                    self.stats.start_failures += 1;
                    let turns = controller.transcript().len();
                    let status = controller.session().status;
                    if turns != 0 || status != SessionStatus::Idle {
                        self.violations
                            .push(Violation::DirtyStartFailure { turns, status });
                    }
                }
                Err(e) => {
                    self.unexpected("start", &e);
                    return None;
                }
            }
        }
        self.exhausted("start");
        None
    }

    async fn answer_all(
        &mut self,
        controller: &SessionController,
        session_id: SessionId,
    ) -> (u32, Option<Insights>) {
        let mut signals = 0;
        let mut insights = None;

        while controller.session().status == SessionStatus::InProgress {
            let label = controller
                .current_dimension()
                .map_or_else(|| "the item".to_string(), |d| d.label);
            let before = controller.session().answered_dimension_count;

            self.stats.answers_submitted += 1;
            let mut result = controller
                .submit_answer(session_id, &format!("Simulated answer about {label}"))
                .await;
            let mut attempts = 1;

            loop {
                match result {
                    Ok(outcome) => {
                        if outcome.is_complete {
                            signals += 1;
                            match outcome.completion {
                                Some(Ok(i)) => insights = Some(i),
                                Some(Err(ExploreError::CompletionFailure { .. })) => {
                                    self.stats.completion_failures += 1;
                                }
                                Some(Err(e)) => self.unexpected("complete", &e),
                                None => self.unexpected(
                                    "complete",
                                    &ExploreError::InvalidState {
                                        operation: "complete",
                                        status: controller.session().status,
                                    },
                                ),
                            }
                        }
                        break;
                    }
                    Err(ExploreError::AnswerSubmissionFailure { .. }) => {
                        self.stats.answer_failures += 1;
                        let after = controller.session().answered_dimension_count;
                        if after != before {
                            self.violations
                                .push(Violation::ProgressAdvancedOnFailure { before, after });
                        }
                        if attempts >= self.config.max_attempts {
                            self.exhausted("submit_answer");
                            return (signals, insights);
                        }
                        attempts += 1;
                        self.stats.answer_retries += 1;
                        result = controller.retry_answer(session_id).await;
                    }
                    Err(e) => {
                        self.unexpected("submit_answer", &e);
                        return (signals, insights);
                    }
                }
            }
        }

        (signals, insights)
    }

    async fn finish_completion(
        &mut self,
        controller: &SessionController,
        session_id: SessionId,
    ) -> Option<Insights> {
        for _ in 0..self.config.max_attempts {
            match controller.complete(session_id).await {
                Ok(insights) => return Some(insights),
                Err(ExploreError::CompletionFailure { .. }) => {
                    self.stats.completion_failures += 1;
                }
                Err(e) => {
                    self.unexpected("complete", &e);
                    return None;
                }
            }
        }
        self.exhausted("complete");
        None
    }

    fn check_session(&mut self, controller: &SessionController, signals: u32) {
        let transcript = controller.transcript();
        self.stats.turns_recorded = transcript.len();

        let gapless = transcript
            .turns()
            .iter()
            .enumerate()
            .all(|(i, t)| t.order_index() == i);
        if !gapless {
            self.violations.push(Violation::TranscriptIntegrity {
                detail: "order indices are not gapless".to_string(),
            });
        }
        if let Err(e) = transcript.verify_integrity() {
            self.violations.push(Violation::TranscriptIntegrity {
                detail: e.to_string(),
            });
        }

        if signals != 1 {
            self.violations
                .push(Violation::CompletionSignalCount { count: signals });
        }

        let session = controller.session();
        if session.answered_dimension_count != session.total_dimensions {
            self.violations.push(Violation::AnsweredCountMismatch {
                answered: session.answered_dimension_count,
                total: session.total_dimensions,
            });
        }
        if session.status != SessionStatus::Completed {
            self.violations.push(Violation::FinalStatus {
                status: session.status,
            });
        }
    }

    fn decide(&mut self, reconciler: &mut SuggestionReconciler) {
        let ids: Vec<_> = reconciler.all().iter().map(|s| s.id).collect();
        for id in ids {
            let roll: f64 = self.rng.gen();
            let outcome = if roll < self.config.reject_ratio {
                reconciler.reject(id).map(|_| ())
            } else if roll < self.config.reject_ratio + self.config.edit_ratio {
                reconciler.edit(id, json!(format!("Edited {id}"))).map(|_| ())
            } else {
                Ok(())
            };
            if let Err(e) = outcome {
                self.unexpected("reconcile", &ExploreError::from(e));
            }
        }
        reconciler.accept_all_pending();
    }

    async fn apply(&mut self, reconciler: &mut SuggestionReconciler, updater: &RecordingEntityUpdater) {
        let expected = reconciler.update_map();

        let mut applied = false;
        for _ in 0..self.config.max_attempts {
            self.stats.apply_attempts += 1;
            let before = reconciler.all().to_vec();
            match reconciler.apply().await {
                Ok(result) => {
                    self.stats.fields_applied = result.applied_fields;
                    applied = true;
                    break;
                }
                Err(ExploreError::ApplyChangesFailure { .. }) => {
                    self.stats.apply_failures += 1;
                    if reconciler.all() != before.as_slice() {
                        self.violations.push(Violation::StateChangedOnApplyFailure);
                    }
                }
                Err(e) => {
                    self.unexpected("apply", &e);
                    return;
                }
            }
        }
        if !applied {
            self.exhausted("apply");
            return;
        }

        let entity = updater.entity();
        if entity != expected {
            self.violations.push(Violation::EntityMismatch {
                expected: expected.len(),
                written: entity.len(),
            });
        }
        for s in reconciler.all() {
            let rejected = s.status == crate::reconciler::SuggestionStatus::Rejected;
            if rejected && !expected.contains_key(&s.target_field) && entity.contains_key(&s.target_field) {
                self.violations.push(Violation::RejectedFieldApplied {
                    field: s.target_field.clone(),
                });
            }
        }
    }
}

/// Run one simulated exploration over `config`
pub async fn run_simulator(exploration: &ExplorationConfig, config: SimulatorConfig) -> SimulatorReport {
    let mut run = Run {
        rng: StdRng::seed_from_u64(config.seed.wrapping_add(2)),
        config,
        stats: SimulatorStats::default(),
        violations: Vec::new(),
    };

    let mut report = SimulatorReport {
        config: run.config.clone(),
        item_type: exploration.item_type.clone(),
        dimensions: exploration.dimensions.len(),
        stats: SimulatorStats::default(),
        reconciliation: None,
        final_session: None,
        violations: Vec::new(),
    };

    let registry = match exploration.registry() {
        Ok(registry) => registry,
        Err(e) => {
            run.unexpected("registry", &ExploreError::from(e));
            report.violations = run.violations;
            return report;
        }
    };

    let service = Arc::new(
        ScriptedExplorationService::new().with_fault_rate(run.config.seed, run.config.failure_rate),
    );
    let updater = Arc::new(
        RecordingEntityUpdater::new()
            .with_fault_rate(run.config.seed.wrapping_add(1), run.config.failure_rate),
    );
    let controller = SessionController::new(service, exploration.engine.clone());

    tracing::info!(
        seed = run.config.seed,
        item_type = %exploration.item_type,
        dimensions = registry.len(),
        "simulation started"
    );

    if let Some(session) = run.start(&controller, &registry, &exploration.item_type).await {
        let (signals, mut insights) = run.answer_all(&controller, session.id).await;
        if insights.is_none() && controller.session().status == SessionStatus::Completing {
            insights = run.finish_completion(&controller, session.id).await;
        }
        run.check_session(&controller, signals);

        if let Some(insights) = insights {
            let mut reconciler = insights.into_reconciler(updater.clone());
            run.decide(&mut reconciler);
            run.apply(&mut reconciler, &updater).await;
            report.reconciliation = Some(reconciler.stats());
        }
        report.final_session = Some(controller.session());
    }

    tracing::info!(violations = run.violations.len(), "simulation finished");
    report.stats = run.stats;
    report.violations = run.violations;
    report
}
