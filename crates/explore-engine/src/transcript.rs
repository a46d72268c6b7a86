//! Append-only transcript
//!
//! Every turn of a session lands here in order. Turns are never updated or
//! removed; the only per-turn state that changes is the delivery status of an
//! answer while its request is outstanding. Each turn is chained to its
//! predecessor by a SHA-256 digest so tampering with a stored transcript is
//! detectable via [`Transcript::verify_integrity`].

use crate::error::TranscriptError;
use crate::types::TurnId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kind of transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    Intro,
    Question,
    Answer,
    Feedback,
}

impl TurnKind {
    #[inline]
    fn as_u8(self) -> u8 {
        match self {
            TurnKind::Intro => 0,
            TurnKind::Question => 1,
            TurnKind::Answer => 2,
            TurnKind::Feedback => 3,
        }
    }
}

impl std::fmt::Display for TurnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TurnKind::Intro => "intro",
            TurnKind::Question => "question",
            TurnKind::Answer => "answer",
            TurnKind::Feedback => "feedback",
        };
        f.write_str(name)
    }
}

/// Delivery state of an answer turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Sent, awaiting the service response
    PendingAck,
    /// Processed by the service
    Acknowledged,
    /// Service call failed; eligible for retry
    Failed,
}

impl DeliveryStatus {
    fn can_move_to(self, to: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, to),
            (PendingAck, Acknowledged) | (PendingAck, Failed) | (Failed, PendingAck)
        )
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeliveryStatus::PendingAck => "pending_ack",
            DeliveryStatus::Acknowledged => "acknowledged",
            DeliveryStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    id: TurnId,
    kind: TurnKind,
    content: String,
    order_index: usize,
    dimension_key: Option<String>,
    created_at: DateTime<Utc>,
    delivery: DeliveryStatus,
    prev_digest: [u8; 32],
    digest: [u8; 32],
}

impl Turn {
    #[inline]
    #[must_use]
    pub fn id(&self) -> TurnId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> TurnKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[inline]
    #[must_use]
    pub fn order_index(&self) -> usize {
        self.order_index
    }

    #[inline]
    #[must_use]
    pub fn dimension_key(&self) -> Option<&str> {
        self.dimension_key.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Delivery status; non-answer turns are always acknowledged
    #[inline]
    #[must_use]
    pub fn delivery(&self) -> DeliveryStatus {
        self.delivery
    }

    /// Chain digest as lowercase hex
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

/// Append-only ordered log of turns
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Create empty transcript
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, assigning the next order index
    ///
    /// Answer turns start in `PendingAck`; every other kind is recorded as
    /// acknowledged.
    pub fn append(
        &mut self,
        kind: TurnKind,
        content: impl Into<String>,
        dimension_key: Option<String>,
    ) -> &Turn {
        let delivery = if kind == TurnKind::Answer {
            DeliveryStatus::PendingAck
        } else {
            DeliveryStatus::Acknowledged
        };
        self.push(kind, content.into(), dimension_key, delivery)
    }

    /// Append a turn that the service already processed
    pub fn append_acknowledged(
        &mut self,
        kind: TurnKind,
        content: impl Into<String>,
        dimension_key: Option<String>,
    ) -> &Turn {
        self.push(kind, content.into(), dimension_key, DeliveryStatus::Acknowledged)
    }

    fn push(
        &mut self,
        kind: TurnKind,
        content: String,
        dimension_key: Option<String>,
        delivery: DeliveryStatus,
    ) -> &Turn {
        let prev_digest = self.head_digest();
        let mut turn = Turn {
            id: TurnId::new(),
            kind,
            content,
            order_index: self.turns.len(),
            dimension_key,
            created_at: Utc::now(),
            delivery,
            prev_digest,
            digest: [0u8; 32],
        };
        turn.digest = compute_digest(&turn);

        tracing::trace!(
            order_index = turn.order_index,
            kind = %turn.kind,
            dimension = ?turn.dimension_key,
            "transcript append"
        );

        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    /// Move an answer turn to a new delivery status
    ///
    /// # Errors
    /// - `TranscriptError::TurnNotFound` for an unknown id
    /// - `TranscriptError::NotAnAnswer` for non-answer turns
    /// - `TranscriptError::IllegalDelivery` for a disallowed change
    pub fn mark_delivery(&mut self, id: TurnId, to: DeliveryStatus) -> Result<(), TranscriptError> {
        let turn = self
            .turns
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TranscriptError::TurnNotFound(id))?;

        if turn.kind != TurnKind::Answer {
            return Err(TranscriptError::NotAnAnswer {
                id,
                kind: turn.kind,
            });
        }
        if !turn.delivery.can_move_to(to) {
            return Err(TranscriptError::IllegalDelivery {
                id,
                from: turn.delivery,
                to,
            });
        }

        turn.delivery = to;
        Ok(())
    }

    /// All turns in order
    #[inline]
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Look up a turn by id
    #[must_use]
    pub fn get(&self, id: TurnId) -> Option<&Turn> {
        self.turns.iter().find(|t| t.id == id)
    }

    /// Most recent turn of `kind`
    #[must_use]
    pub fn last_of_kind(&self, kind: TurnKind) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.kind == kind)
    }

    /// Answer turns the service acknowledged
    pub fn acknowledged_answers(&self) -> impl Iterator<Item = &Turn> {
        self.turns
            .iter()
            .filter(|t| t.kind == TurnKind::Answer && t.delivery == DeliveryStatus::Acknowledged)
    }

    /// Turns whose kind is not in `hidden`
    ///
    /// Presentation filter only; the log itself keeps every entry.
    pub fn visible<'a>(&'a self, hidden: &'a [TurnKind]) -> impl Iterator<Item = &'a Turn> + 'a {
        self.turns.iter().filter(move |t| !hidden.contains(&t.kind))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Digest of the last turn, zeroes when empty
    #[must_use]
    pub fn head_digest(&self) -> [u8; 32] {
        self.turns.last().map(|t| t.digest).unwrap_or([0u8; 32])
    }

    /// Re-derive the digest chain and order indices
    ///
    /// # Errors
    /// `TranscriptError::IntegrityViolation` at the first broken index
    pub fn verify_integrity(&self) -> Result<(), TranscriptError> {
        let mut prev = [0u8; 32];
        for (index, turn) in self.turns.iter().enumerate() {
            if turn.order_index != index
                || turn.prev_digest != prev
                || turn.digest != compute_digest(turn)
            {
                return Err(TranscriptError::IntegrityViolation { index });
            }
            prev = turn.digest;
        }
        Ok(())
    }
}

// Delivery status is deliberately left out; it is not part of turn identity.
fn compute_digest(turn: &Turn) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(turn.prev_digest);
    hasher.update(turn.id.0.to_bytes());
    hasher.update((turn.order_index as u64).to_le_bytes());
    hasher.update([turn.kind.as_u8()]);
    if let Some(key) = &turn.dimension_key {
        hasher.update(key.as_bytes());
    }
    hasher.update([0]);
    hasher.update(turn.content.as_bytes());
    hasher.update([0]);
    hasher.update(turn.created_at.timestamp_micros().to_le_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        let mut t = Transcript::new();
        t.append(TurnKind::Intro, "Welcome", None);
        t.append(TurnKind::Question, "What is your purpose?", Some("purpose".into()));
        t.append(TurnKind::Answer, "To help", Some("purpose".into()));
        t.append(TurnKind::Feedback, "Clear purpose", Some("purpose".into()));
        t
    }

    #[test]
    fn order_index_is_gapless_from_zero() {
        let t = sample();
        let indices: Vec<_> = t.turns().iter().map(Turn::order_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn answers_start_pending() {
        let t = sample();
        assert_eq!(t.turns()[2].delivery(), DeliveryStatus::PendingAck);
        assert_eq!(t.turns()[3].delivery(), DeliveryStatus::Acknowledged);
        assert_eq!(t.acknowledged_answers().count(), 0);
    }

    #[test]
    fn delivery_transitions() {
        let mut t = sample();
        let answer = t.turns()[2].id();

        t.mark_delivery(answer, DeliveryStatus::Failed).unwrap();
        t.mark_delivery(answer, DeliveryStatus::PendingAck).unwrap();
        t.mark_delivery(answer, DeliveryStatus::Acknowledged).unwrap();
        assert_eq!(t.acknowledged_answers().count(), 1);

        let err = t.mark_delivery(answer, DeliveryStatus::Failed).unwrap_err();
        assert!(matches!(err, TranscriptError::IllegalDelivery { .. }));

        let intro = t.turns()[0].id();
        let err = t.mark_delivery(intro, DeliveryStatus::Failed).unwrap_err();
        assert!(matches!(err, TranscriptError::NotAnAnswer { .. }));
    }

    #[test]
    fn delivery_changes_keep_chain_intact() {
        let mut t = sample();
        let answer = t.turns()[2].id();
        t.mark_delivery(answer, DeliveryStatus::Failed).unwrap();
        assert!(t.verify_integrity().is_ok());
    }

    #[test]
    fn tampering_is_detected() {
        let mut t = sample();
        t.turns[1].content = "Edited question".into();
        assert_eq!(
            t.verify_integrity(),
            Err(TranscriptError::IntegrityViolation { index: 1 })
        );
    }

    #[test]
    fn visible_filters_without_dropping() {
        let t = sample();
        let hidden = [TurnKind::Feedback];
        let shown: Vec<_> = t.visible(&hidden).map(Turn::kind).collect();
        assert_eq!(
            shown,
            vec![TurnKind::Intro, TurnKind::Question, TurnKind::Answer]
        );
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn digest_hex_is_64_chars() {
        let t = sample();
        assert_eq!(t.turns()[0].digest_hex().len(), 64);
        assert_ne!(t.head_digest(), [0u8; 32]);
    }
}
