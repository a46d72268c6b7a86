//! Explore Engine - guided multi-dimension exploration
//!
//! A turn-based dialogue controller that:
//! - Walks a user through questions covering a configured set of dimensions
//! - Keeps an append-only, hash-chained transcript of every turn
//! - Tracks dimension completion across turns
//! - Hands off to a completion report once every dimension is covered
//! - Reconciles proposed field updates against a target entity
//!
//! The engine is item-type agnostic: a strategy object, a brand asset and a
//! product are all explored by the same controller, parameterized only by
//! their [`DimensionRegistry`].
//!
//! # Example
//!
//! ```no_run
//! use explore_engine::prelude::*;
//!
//! # async fn example(service: Arc<dyn ExplorationService>, updater: Arc<dyn EntityUpdater>)
//! #     -> Result<(), ExploreError> {
//! let registry = DimensionRegistry::new([("purpose", "Purpose"), ("audience", "Audience")])?;
//! let controller = SessionController::new(service, EngineConfig::default());
//!
//! let session = controller.start(registry, SeedContext::new("brand_asset", "Tone of voice")).await?;
//! let outcome = controller.submit_answer(session.id, "We sound like a trusted friend").await?;
//!
//! if let Some(Ok(insights)) = outcome.completion {
//!     let mut reconciler = insights.into_reconciler(updater);
//!     reconciler.accept_all_pending();
//!     reconciler.apply().await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod controller;
pub mod error;
pub mod reconciler;
pub mod registry;
pub mod service;
pub mod state_machine;
pub mod test_harness;
pub mod tracker;
pub mod transcript;
pub mod types;

pub use config::{DimensionEntry, EngineConfig, ExplorationConfig};
pub use controller::{AnswerOutcome, Insights, SessionController, SessionProgress};
pub use error::{
    ConfigError, ExploreError, RegistryError, ServiceError, ServiceErrorKind, StateMachineError,
    SuggestionError, TranscriptError,
};
pub use reconciler::{
    ApplyResult, FieldSuggestion, ReconcilerStats, SuggestionReconciler, SuggestionStatus,
};
pub use registry::DimensionRegistry;
pub use service::{
    AnswerResponse, CompletionResponse, DimensionInsight, EntityUpdater, ExplorationService,
    Finding, InsightsData, NextQuestion, ProposedSuggestion, SeedContext, ServiceTurn,
    StartResponse, UpdateMap,
};
pub use tracker::DimensionTracker;
pub use transcript::{DeliveryStatus, Transcript, Turn, TurnKind};
pub use types::{Dimension, Session, SessionId, SessionStatus, SuggestionId, TurnId};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving an exploration session
    pub use crate::{
        DimensionRegistry, EngineConfig, EntityUpdater, ExplorationService, ExploreError,
        Insights, SeedContext, Session, SessionController, SessionStatus, SuggestionReconciler,
        SuggestionStatus,
    };
    pub use std::sync::Arc;
}

