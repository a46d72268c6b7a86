//! Dimension registry
//!
//! Static, caller-supplied ordered list of dimensions. Built once per item
//! type and shared read-only by every session over that item type.

use crate::error::RegistryError;
use crate::types::Dimension;
use serde::Serialize;
use std::collections::HashSet;

/// Ordered, validated set of dimensions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DimensionRegistry {
    dimensions: Vec<Dimension>,
    seed_questions: Vec<String>,
}

impl DimensionRegistry {
    /// Build from `(key, label)` pairs; order follows iteration order
    ///
    /// # Errors
    /// - `RegistryError::Empty` if no pairs are given
    /// - `RegistryError::BlankKey` / `BlankLabel` for whitespace-only strings
    /// - `RegistryError::DuplicateKey` if a key repeats
    pub fn new<K, L>(pairs: impl IntoIterator<Item = (K, L)>) -> Result<Self, RegistryError>
    where
        K: Into<String>,
        L: Into<String>,
    {
        let dimensions = pairs
            .into_iter()
            .enumerate()
            .map(|(i, (key, label))| {
                Dimension::new(key, label, u32::try_from(i).unwrap_or(u32::MAX))
            })
            .collect();
        Self::from_dimensions(dimensions)
    }

    /// Build from explicit dimensions, sorted by `order`
    ///
    /// Equal `order` values keep their input position.
    pub fn from_dimensions(mut dimensions: Vec<Dimension>) -> Result<Self, RegistryError> {
        if dimensions.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for (position, dim) in dimensions.iter().enumerate() {
            if dim.key.trim().is_empty() {
                return Err(RegistryError::BlankKey { position });
            }
            if dim.label.trim().is_empty() {
                return Err(RegistryError::BlankLabel {
                    key: dim.key.clone(),
                });
            }
            if !seen.insert(dim.key.as_str()) {
                return Err(RegistryError::DuplicateKey(dim.key.clone()));
            }
        }

        dimensions.sort_by_key(|d| d.order);

        Ok(Self {
            dimensions,
            seed_questions: Vec::new(),
        })
    }

    /// Attach default seed questions passed to the service on start
    #[must_use]
    pub fn with_seed_questions(mut self, questions: Vec<String>) -> Self {
        self.seed_questions = questions
            .into_iter()
            .filter(|q| !q.trim().is_empty())
            .collect();
        self
    }

    /// Dimensions in ascending `order`
    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Default seed questions
    #[inline]
    #[must_use]
    pub fn seed_questions(&self) -> &[String] {
        &self.seed_questions
    }

    /// Look up a dimension by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.key == key)
    }

    /// Whether `key` is configured
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of dimensions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    /// Empty check; only the placeholder registry of an unstarted controller is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_preserves_order() {
        let reg = DimensionRegistry::new([("a", "A"), ("b", "B"), ("c", "C")]).unwrap();
        let keys: Vec<_> = reg.dimensions().iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(reg.get("b").unwrap().order, 1);
    }

    #[test]
    fn registry_sorts_explicit_order() {
        let reg = DimensionRegistry::from_dimensions(vec![
            Dimension::new("late", "Late", 5),
            Dimension::new("early", "Early", 1),
            Dimension::new("tie", "Tie", 5),
        ])
        .unwrap();
        let keys: Vec<_> = reg.dimensions().iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["early", "late", "tie"]);
    }

    #[test]
    fn registry_rejects_invalid_input() {
        let empty: [(&str, &str); 0] = [];
        assert_eq!(DimensionRegistry::new(empty), Err(RegistryError::Empty));
        assert_eq!(
            DimensionRegistry::new([("a", "A"), (" ", "B")]),
            Err(RegistryError::BlankKey { position: 1 })
        );
        assert_eq!(
            DimensionRegistry::new([("a", "A"), ("a", "Again")]),
            Err(RegistryError::DuplicateKey("a".to_string()))
        );
        assert!(matches!(
            DimensionRegistry::new([("a", "")]),
            Err(RegistryError::BlankLabel { .. })
        ));
    }

    #[test]
    fn seed_questions_drop_blanks() {
        let reg = DimensionRegistry::new([("a", "A")])
            .unwrap()
            .with_seed_questions(vec!["Why?".into(), "  ".into()]);
        assert_eq!(reg.seed_questions(), ["Why?".to_string()]);
    }
}
