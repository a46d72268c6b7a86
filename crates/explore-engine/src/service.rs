//! External collaborators
//!
//! The engine consumes two services it does not implement:
//! - [`ExplorationService`] generates questions, feedback and the report
//! - [`EntityUpdater`] writes accepted field values to the target entity
//!
//! Both are injected as trait objects so the controller and reconciler can be
//! driven by scripted fakes in tests.

use crate::error::ServiceError;
use crate::transcript::TurnKind;
use crate::types::Dimension;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field name to new value, in suggestion batch order
pub type UpdateMap = IndexMap<String, serde_json::Value>;

/// Context describing the item being explored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedContext {
    /// Item type, e.g. `persona`, `brand_asset`, `product`
    pub item_type: String,
    /// Display name of the item
    pub item_name: String,
    /// Free-form attributes of the item
    #[serde(default)]
    pub attributes: IndexMap<String, serde_json::Value>,
    /// Questions to open with; empty uses the registry defaults
    #[serde(default)]
    pub seed_questions: Vec<String>,
}

impl SeedContext {
    /// Create new seed context
    pub fn new(item_type: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            item_name: item_name.into(),
            ..Self::default()
        }
    }

    /// Add an item attribute
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Set opening questions
    #[must_use]
    pub fn with_seed_questions(mut self, questions: Vec<String>) -> Self {
        self.seed_questions = questions;
        self
    }
}

/// A turn produced by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTurn {
    pub kind: TurnKind,
    pub content: String,
    #[serde(default)]
    pub dimension_key: Option<String>,
}

impl ServiceTurn {
    pub fn new(kind: TurnKind, content: impl Into<String>, dimension_key: Option<&str>) -> Self {
        Self {
            kind,
            content: content.into(),
            dimension_key: dimension_key.map(str::to_string),
        }
    }
}

/// Initial session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub session_id: String,
    #[serde(default)]
    pub turns: Vec<ServiceTurn>,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub answered_count: usize,
}

/// Question for the next dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestion {
    pub content: String,
    #[serde(default)]
    pub dimension_key: Option<String>,
    #[serde(default)]
    pub dimension_title: Option<String>,
}

/// Response to an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub feedback: String,
    #[serde(default)]
    pub next_question: Option<NextQuestion>,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub answered_count: usize,
    #[serde(default)]
    pub is_complete: bool,
}

/// Per-dimension summary in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionInsight {
    pub key: String,
    pub title: String,
    pub summary: String,
}

/// A finding in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    #[serde(default)]
    pub dimension_key: Option<String>,
    pub title: String,
    pub description: String,
}

/// A proposed value for one field of the target entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedSuggestion {
    pub target_field: String,
    pub label: String,
    #[serde(default)]
    pub current_value: serde_json::Value,
    pub suggested_value: serde_json::Value,
    #[serde(default)]
    pub reason: String,
}

/// Completion report payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsData {
    #[serde(default)]
    pub dimensions: Vec<DimensionInsight>,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub executive_summary: String,
    #[serde(default)]
    pub field_suggestions: Vec<ProposedSuggestion>,
}

/// Response to a completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub insights_data: InsightsData,
}

/// AI exploration service
#[async_trait::async_trait]
pub trait ExplorationService: Send + Sync {
    /// Open a session and return its opening turns
    async fn start_session(
        &self,
        dimensions: &[Dimension],
        seed: &SeedContext,
    ) -> Result<StartResponse, ServiceError>;

    /// Submit one answer
    async fn send_answer(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<AnswerResponse, ServiceError>;

    /// Produce the completion report
    async fn complete_session(&self, session_id: &str) -> Result<CompletionResponse, ServiceError>;
}

/// Entity update service
#[async_trait::async_trait]
pub trait EntityUpdater: Send + Sync {
    /// Apply every field in `changes` in one call
    async fn apply_changes(&self, changes: &UpdateMap) -> Result<(), ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answer_response_parses_wire_shape() {
        let raw = json!({
            "feedback": "Good detail",
            "nextQuestion": {
                "content": "Who is it for?",
                "dimensionKey": "audience",
                "dimensionTitle": "Audience"
            },
            "progress": 33.3,
            "answeredCount": 1,
            "isComplete": false
        });
        let resp: AnswerResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(resp.answered_count, 1);
        assert_eq!(
            resp.next_question.unwrap().dimension_key.as_deref(),
            Some("audience")
        );
    }

    #[test]
    fn completion_defaults_missing_sections() {
        let raw = json!({ "insightsData": { "executiveSummary": "Strong base" } });
        let resp: CompletionResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(resp.insights_data.executive_summary, "Strong base");
        assert!(resp.insights_data.field_suggestions.is_empty());
    }

    #[test]
    fn seed_context_builder() {
        let seed = SeedContext::new("product", "Trail Shoe")
            .with_attribute("price", json!(120))
            .with_seed_questions(vec!["Who runs trails?".into()]);
        assert_eq!(seed.attributes["price"], json!(120));
        assert_eq!(seed.seed_questions.len(), 1);
    }
}
