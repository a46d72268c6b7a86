//! Suggestion reconciler
//!
//! Owns the field suggestions produced by a completed session and drives the
//! accept/edit/reject workflow. [`SuggestionReconciler::apply`] sends every
//! accepted or edited value to the entity updater in a single call and only
//! updates local state once that call succeeds.

use crate::error::{ExploreError, SuggestionError};
use crate::service::{EntityUpdater, ProposedSuggestion, UpdateMap};
use crate::types::SuggestionId;
use serde::Serialize;
use std::sync::Arc;

/// Suggestion lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    Pending,
    Accepted,
    Rejected,
    Edited,
}

impl SuggestionStatus {
    /// Included in the apply map
    #[inline]
    #[must_use]
    pub fn is_apply_eligible(&self) -> bool {
        matches!(self, SuggestionStatus::Accepted | SuggestionStatus::Edited)
    }
}

impl std::fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SuggestionStatus::Pending => "pending",
            SuggestionStatus::Accepted => "accepted",
            SuggestionStatus::Rejected => "rejected",
            SuggestionStatus::Edited => "edited",
        };
        f.write_str(name)
    }
}

/// A proposed value for one field of the target entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSuggestion {
    pub id: SuggestionId,
    pub target_field: String,
    pub label: String,
    pub current_value: serde_json::Value,
    pub suggested_value: serde_json::Value,
    pub reason: String,
    pub status: SuggestionStatus,
    /// Written to the entity by a successful apply
    pub settled: bool,
}

impl FieldSuggestion {
    /// Create a pending suggestion from a service proposal
    #[must_use]
    pub fn from_proposal(proposal: ProposedSuggestion) -> Self {
        Self {
            id: SuggestionId::new(),
            target_field: proposal.target_field,
            label: proposal.label,
            current_value: proposal.current_value,
            suggested_value: proposal.suggested_value,
            reason: proposal.reason,
            status: SuggestionStatus::Pending,
            settled: false,
        }
    }
}

/// Outcome of an apply call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApplyResult {
    /// Distinct fields written
    pub applied_fields: usize,
    /// Whether the entity updater was called
    pub invoked: bool,
}

impl ApplyResult {
    #[inline]
    fn noop() -> Self {
        Self {
            applied_fields: 0,
            invoked: false,
        }
    }
}

/// Counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilerStats {
    /// Suggestions in the batch
    pub total: usize,
    /// Awaiting a decision
    pub pending: usize,
    /// Accepted as proposed, or settled by an apply
    pub accepted: usize,
    /// Edited and not yet applied
    pub edited: usize,
    /// Rejected; never applied
    pub rejected: usize,
    /// Included in the next apply
    pub apply_eligible: usize,
    /// Written by a successful apply
    pub settled: usize,
}

/// Accept/edit/reject workflow over one suggestion batch
pub struct SuggestionReconciler {
    updater: Arc<dyn EntityUpdater>,
    suggestions: Vec<FieldSuggestion>,
}

impl std::fmt::Debug for SuggestionReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionReconciler")
            .field("suggestions", &self.suggestions)
            .finish_non_exhaustive()
    }
}

impl SuggestionReconciler {
    /// Take ownership of a batch of proposals; all start pending
    #[must_use]
    pub fn new(updater: Arc<dyn EntityUpdater>, proposals: Vec<ProposedSuggestion>) -> Self {
        let suggestions: Vec<_> = proposals
            .into_iter()
            .map(FieldSuggestion::from_proposal)
            .collect();
        tracing::debug!(count = suggestions.len(), "reconciler received suggestions");
        Self {
            updater,
            suggestions,
        }
    }

    fn find_mut(&mut self, id: SuggestionId) -> Result<&mut FieldSuggestion, SuggestionError> {
        self.suggestions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SuggestionError::NotFound(id))
    }

    fn transition(
        &mut self,
        id: SuggestionId,
        operation: &'static str,
        permitted: &[SuggestionStatus],
        to: SuggestionStatus,
    ) -> Result<&mut FieldSuggestion, SuggestionError> {
        let suggestion = self.find_mut(id)?;
        if !permitted.contains(&suggestion.status) {
            return Err(SuggestionError::InvalidTransition {
                id,
                operation,
                from: suggestion.status,
            });
        }
        suggestion.status = to;
        tracing::debug!(%id, field = %suggestion.target_field, status = %to, "suggestion {operation}");
        Ok(suggestion)
    }

    /// Accept a pending suggestion
    pub fn accept(&mut self, id: SuggestionId) -> Result<&FieldSuggestion, SuggestionError> {
        let suggestion = self.transition(
            id,
            "accept",
            &[SuggestionStatus::Pending],
            SuggestionStatus::Accepted,
        )?;
        Ok(suggestion)
    }

    /// Reject a pending suggestion; it stays in [`Self::all`]
    pub fn reject(&mut self, id: SuggestionId) -> Result<&FieldSuggestion, SuggestionError> {
        let suggestion = self.transition(
            id,
            "reject",
            &[SuggestionStatus::Pending],
            SuggestionStatus::Rejected,
        )?;
        Ok(suggestion)
    }

    /// Replace the suggested value of a pending or accepted suggestion
    pub fn edit(
        &mut self,
        id: SuggestionId,
        new_value: serde_json::Value,
    ) -> Result<&FieldSuggestion, SuggestionError> {
        let suggestion = self.transition(
            id,
            "edit",
            &[SuggestionStatus::Pending, SuggestionStatus::Accepted],
            SuggestionStatus::Edited,
        )?;
        suggestion.suggested_value = new_value;
        suggestion.settled = false;
        Ok(suggestion)
    }

    /// Accept every pending suggestion, returning how many changed
    pub fn accept_all_pending(&mut self) -> usize {
        let mut changed = 0;
        for s in &mut self.suggestions {
            if s.status == SuggestionStatus::Pending {
                s.status = SuggestionStatus::Accepted;
                changed += 1;
            }
        }
        tracing::debug!(changed, "accepted all pending suggestions");
        changed
    }

    /// Update map over accepted and edited suggestions
    ///
    /// If two suggestions target the same field the later one wins.
    #[must_use]
    pub fn update_map(&self) -> UpdateMap {
        self.suggestions
            .iter()
            .filter(|s| s.status.is_apply_eligible())
            .map(|s| (s.target_field.clone(), s.suggested_value.clone()))
            .collect()
    }

    /// Write every accepted and edited value in one entity update
    ///
    /// An empty selection returns without calling the updater. On failure no
    /// suggestion changes state, so the call can be repeated as is.
    ///
    /// # Errors
    /// `ExploreError::ApplyChangesFailure` if the entity updater fails
    pub async fn apply(&mut self) -> Result<ApplyResult, ExploreError> {
        let changes = self.update_map();
        if changes.is_empty() {
            tracing::debug!("apply skipped: no accepted or edited suggestions");
            return Ok(ApplyResult::noop());
        }

        let field_count = changes.len();
        tracing::info!(fields = field_count, "applying field changes");

        if let Err(source) = self.updater.apply_changes(&changes).await {
            tracing::warn!(fields = field_count, error = %source, "apply failed");
            return Err(ExploreError::ApplyChangesFailure {
                field_count,
                source,
            });
        }

        for s in &mut self.suggestions {
            if s.status.is_apply_eligible() {
                s.status = SuggestionStatus::Accepted;
                s.settled = true;
            }
        }

        tracing::info!(fields = field_count, "field changes applied");
        Ok(ApplyResult {
            applied_fields: field_count,
            invoked: true,
        })
    }

    /// Every suggestion, including rejected ones
    #[inline]
    #[must_use]
    pub fn all(&self) -> &[FieldSuggestion] {
        &self.suggestions
    }

    /// Suggestions to render; rejected ones are left out
    pub fn visible(&self) -> impl Iterator<Item = &FieldSuggestion> {
        self.suggestions
            .iter()
            .filter(|s| s.status != SuggestionStatus::Rejected)
    }

    /// Look up a suggestion by id
    #[must_use]
    pub fn get(&self, id: SuggestionId) -> Option<&FieldSuggestion> {
        self.suggestions.iter().find(|s| s.id == id)
    }

    /// Number of suggestions an apply would include
    #[must_use]
    pub fn apply_eligible_count(&self) -> usize {
        self.suggestions
            .iter()
            .filter(|s| s.status.is_apply_eligible())
            .count()
    }

    /// Counts by status for the whole batch
    #[must_use]
    pub fn stats(&self) -> ReconcilerStats {
        let mut stats = ReconcilerStats {
            total: self.suggestions.len(),
            ..ReconcilerStats::default()
        };
        for s in &self.suggestions {
            match s.status {
                SuggestionStatus::Pending => stats.pending += 1,
                SuggestionStatus::Accepted => stats.accepted += 1,
                SuggestionStatus::Rejected => stats.rejected += 1,
                SuggestionStatus::Edited => stats.edited += 1,
            }
            if s.status.is_apply_eligible() {
                stats.apply_eligible += 1;
            }
            if s.settled {
                stats.settled += 1;
            }
        }
        stats
    }
}
