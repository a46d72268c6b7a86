//! Testing utilities for the explore workspace
//!
//! Shared fixtures and setup helpers for integration tests.

#![allow(missing_docs)]

use explore_engine::test_harness::{RecordingEntityUpdater, ScriptedExplorationService};
use explore_engine::{
    DimensionRegistry, EngineConfig, ProposedSuggestion, SeedContext, SessionController,
};
use std::sync::Arc;

/// Registry over single-letter keys with upper-case labels
pub fn registry(keys: &[&str]) -> DimensionRegistry {
    DimensionRegistry::new(keys.iter().map(|k| (k.to_string(), k.to_uppercase())))
        .expect("fixture keys must be valid")
}

/// The `[A, B, C]` registry used by the end-to-end scenarios
pub fn abc_registry() -> DimensionRegistry {
    registry(&["a", "b", "c"])
}

pub fn seed() -> SeedContext {
    SeedContext::new("brand_asset", "Northwind Coffee")
}

pub fn proposal(field: &str, value: &str) -> ProposedSuggestion {
    ProposedSuggestion {
        target_field: field.to_string(),
        label: field.to_uppercase(),
        current_value: serde_json::Value::Null,
        suggested_value: serde_json::Value::String(value.to_string()),
        reason: format!("answers point to {value}"),
    }
}

pub fn setup_controller() -> (SessionController, Arc<ScriptedExplorationService>) {
    let service = Arc::new(ScriptedExplorationService::new());
    let controller = SessionController::new(service.clone(), EngineConfig::default());
    (controller, service)
}

pub fn setup_updater() -> Arc<RecordingEntityUpdater> {
    Arc::new(RecordingEntityUpdater::new())
}

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("explore_engine=debug")
        .try_init();
}
