//! Dimension tracker
//!
//! Derives answered counts and completion from the transcript and the
//! registry. Only acknowledged answers count: an answer whose request failed
//! is on record but has not advanced the exploration.

use crate::registry::DimensionRegistry;
use crate::transcript::Transcript;
use crate::types::Dimension;
use std::collections::HashSet;
use std::sync::Arc;

/// Completion tracking for one session
#[derive(Debug, Clone, Default)]
pub struct DimensionTracker {
    registry: Arc<DimensionRegistry>,
    service_complete: bool,
}

impl DimensionTracker {
    /// Create tracker over a registry
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<DimensionRegistry>) -> Self {
        Self {
            registry,
            service_complete: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.registry.len()
    }

    fn answered_keys<'a>(&self, transcript: &'a Transcript) -> HashSet<&'a str> {
        transcript
            .acknowledged_answers()
            .filter_map(|t| t.dimension_key())
            .filter(|key| self.registry.contains(key))
            .collect()
    }

    /// Dimensions with at least one acknowledged answer
    #[must_use]
    pub fn answered_count(&self, transcript: &Transcript) -> usize {
        self.answered_keys(transcript).len()
    }

    /// Lowest-order dimension not yet answered
    #[must_use]
    pub fn next_dimension(&self, transcript: &Transcript) -> Option<&Dimension> {
        let answered = self.answered_keys(transcript);
        self.registry
            .dimensions()
            .iter()
            .find(|d| !answered.contains(d.key.as_str()))
    }

    /// True once at most one dimension remains
    #[must_use]
    pub fn is_last_dimension(&self, transcript: &Transcript) -> bool {
        self.answered_count(transcript) + 1 >= self.total()
    }

    /// Record the service's completion signal; never cleared
    #[inline]
    pub fn latch_service_completion(&mut self) {
        self.service_complete = true;
    }

    /// Every dimension answered, or the service signaled completion
    #[must_use]
    pub fn is_complete(&self, transcript: &Transcript) -> bool {
        self.service_complete
            || (self.total() > 0 && self.answered_count(transcript) >= self.total())
    }

    /// Clamp a service-reported progress value to 0..=100
    #[must_use]
    pub fn clamp_progress(progress: f64) -> u8 {
        if !progress.is_finite() {
            return 0;
        }
        // Truncation is intended after clamping
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = progress.round().clamp(0.0, 100.0) as u8;
        pct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{DeliveryStatus, TurnKind};

    fn tracker() -> DimensionTracker {
        let reg = DimensionRegistry::new([("a", "A"), ("b", "B"), ("c", "C")]).unwrap();
        DimensionTracker::new(Arc::new(reg))
    }

    fn answer(t: &mut Transcript, key: &str) {
        let id = t.append(TurnKind::Answer, "x", Some(key.into())).id();
        t.mark_delivery(id, DeliveryStatus::Acknowledged).unwrap();
    }

    #[test]
    fn counts_distinct_acknowledged_dimensions() {
        let tr = tracker();
        let mut t = Transcript::new();
        answer(&mut t, "a");
        answer(&mut t, "a");
        t.append(TurnKind::Answer, "pending", Some("b".into()));
        answer(&mut t, "unknown");

        assert_eq!(tr.answered_count(&t), 1);
        assert_eq!(tr.next_dimension(&t).unwrap().key, "b");
    }

    #[test]
    fn next_dimension_skips_answered_out_of_order() {
        let tr = tracker();
        let mut t = Transcript::new();
        answer(&mut t, "b");
        assert_eq!(tr.next_dimension(&t).unwrap().key, "a");
        answer(&mut t, "a");
        assert_eq!(tr.next_dimension(&t).unwrap().key, "c");
        assert!(tr.is_last_dimension(&t));
    }

    #[test]
    fn completion_by_count_or_latch() {
        let mut tr = tracker();
        let mut t = Transcript::new();
        answer(&mut t, "a");
        assert!(!tr.is_complete(&t));

        tr.latch_service_completion();
        assert!(tr.is_complete(&t));

        let tr = tracker();
        answer(&mut t, "b");
        answer(&mut t, "c");
        assert!(tr.is_complete(&t));
        assert!(tr.next_dimension(&t).is_none());
    }

    #[test]
    fn clamp_progress_bounds() {
        assert_eq!(DimensionTracker::clamp_progress(-5.0), 0);
        assert_eq!(DimensionTracker::clamp_progress(33.4), 33);
        assert_eq!(DimensionTracker::clamp_progress(250.0), 100);
        assert_eq!(DimensionTracker::clamp_progress(f64::NAN), 0);
        assert_eq!(DimensionTracker::clamp_progress(f64::INFINITY), 0);
    }
}
