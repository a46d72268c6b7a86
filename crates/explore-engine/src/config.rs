//! Engine configuration
//!
//! [`EngineConfig`] holds controller policy. [`ExplorationConfig`] is the
//! on-disk shape of a per-item-type setup (dimensions, seed questions and an
//! optional engine section), loadable from TOML or YAML.

use crate::error::{ConfigError, ExploreError, RegistryError};
use crate::registry::DimensionRegistry;
use crate::transcript::TurnKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Controller policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Trim surrounding whitespace from answers before sending
    pub trim_answers: bool,
    /// Reject answers that are blank after trimming
    pub reject_blank_answers: bool,
    /// Maximum answer length in characters, 0 disables the check
    pub max_answer_chars: usize,
    /// Turn kinds left out of [`crate::SessionController::visible_turns`]
    pub hidden_turn_kinds: Vec<TurnKind>,
}

impl EngineConfig {
    /// Hide turn kinds from the presentation view
    #[inline]
    #[must_use]
    pub fn with_hidden_kinds(mut self, kinds: Vec<TurnKind>) -> Self {
        self.hidden_turn_kinds = kinds;
        self
    }

    /// With answer length limit
    #[inline]
    #[must_use]
    pub fn with_max_answer_chars(mut self, max: usize) -> Self {
        self.max_answer_chars = max;
        self
    }

    /// Apply the answer policy to raw user input
    ///
    /// # Errors
    /// - `ExploreError::EmptyAnswer` for blank input when rejection is enabled
    /// - `ExploreError::AnswerTooLong` above `max_answer_chars`
    pub fn normalize_answer(&self, raw: &str) -> Result<String, ExploreError> {
        let text = if self.trim_answers { raw.trim() } else { raw };

        if self.reject_blank_answers && text.trim().is_empty() {
            return Err(ExploreError::EmptyAnswer);
        }

        let chars = text.chars().count();
        if self.max_answer_chars > 0 && chars > self.max_answer_chars {
            return Err(ExploreError::AnswerTooLong {
                limit: self.max_answer_chars,
                actual: chars,
            });
        }

        Ok(text.to_string())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trim_answers: true,
            reject_blank_answers: true,
            max_answer_chars: 8000,
            hidden_turn_kinds: Vec::new(),
        }
    }
}

/// One dimension as written in a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionEntry {
    pub key: String,
    pub label: String,
}

/// Per-item-type exploration setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationConfig {
    /// Item type this setup explores
    pub item_type: String,
    /// Dimensions in the order they are asked
    pub dimensions: Vec<DimensionEntry>,
    /// Default opening questions
    #[serde(default)]
    pub seed_questions: Vec<String>,
    /// Controller policy
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ExplorationConfig {
    /// Parse from TOML
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Parse from YAML
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::UnsupportedFormat` for other extensions
    /// - parse errors from the matching format
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = match ext.as_str() {
            "toml" => Self::from_toml_str(&raw)?,
            "yaml" | "yml" => Self::from_yaml_str(&raw)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        tracing::debug!(
            path = %path.display(),
            item_type = %config.item_type,
            dimensions = config.dimensions.len(),
            "loaded exploration config"
        );
        Ok(config)
    }

    /// Build the validated registry
    pub fn registry(&self) -> Result<DimensionRegistry, RegistryError> {
        let registry = DimensionRegistry::new(
            self.dimensions
                .iter()
                .map(|d| (d.key.clone(), d.label.clone())),
        )?;
        Ok(registry.with_seed_questions(self.seed_questions.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = r#"
item_type = "product"
seed_questions = ["What problem does it solve?"]

[engine]
hidden_turn_kinds = ["feedback"]
max_answer_chars = 200

[[dimensions]]
key = "problem"
label = "Problem"

[[dimensions]]
key = "audience"
label = "Audience"
"#;

    #[test]
    fn parses_toml_with_engine_section() {
        let config = ExplorationConfig::from_toml_str(TOML).unwrap();
        assert_eq!(config.item_type, "product");
        assert_eq!(config.engine.hidden_turn_kinds, vec![TurnKind::Feedback]);
        assert_eq!(config.engine.max_answer_chars, 200);
        assert!(config.engine.trim_answers);

        let registry = config.registry().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.seed_questions().len(), 1);
    }

    #[test]
    fn parses_yaml_with_default_engine() {
        let yaml = "item_type: persona\ndimensions:\n  - key: goals\n    label: Goals\n";
        let config = ExplorationConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.registry().unwrap().dimensions()[0].key, "goals");
    }

    #[test]
    fn duplicate_keys_fail_registry() {
        let yaml = "item_type: persona\ndimensions:\n  - {key: a, label: A}\n  - {key: a, label: B}\n";
        let config = ExplorationConfig::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            config.registry(),
            Err(RegistryError::DuplicateKey(_))
        ));
    }

    #[test]
    fn normalize_answer_policy() {
        let config = EngineConfig::default().with_max_answer_chars(5);
        assert_eq!(config.normalize_answer("  hi  ").unwrap(), "hi");
        assert!(matches!(
            config.normalize_answer("   "),
            Err(ExploreError::EmptyAnswer)
        ));
        assert!(matches!(
            config.normalize_answer("toolong"),
            Err(ExploreError::AnswerTooLong { limit: 5, actual: 7 })
        ));
    }
}
