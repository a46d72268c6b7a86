//! Suggestion reconciliation against a recording entity updater

use explore_engine::test_harness::{RecordingEntityUpdater, ScriptedExplorationService};
use explore_engine::{
    EngineConfig, ExploreError, SessionController, SuggestionError, SuggestionReconciler,
    SuggestionStatus,
};
use explore_test_utils::{abc_registry, proposal, seed, setup_updater};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn three_suggestions(updater: Arc<RecordingEntityUpdater>) -> SuggestionReconciler {
    SuggestionReconciler::new(
        updater,
        vec![
            proposal("name", "Northwind"),
            proposal("tagline", "Coffee for the long shift"),
            proposal("tone", "warm"),
        ],
    )
}

/// Scenario: accept all three, apply once with all three fields.
#[tokio::test]
async fn accept_all_applies_every_field() {
    let updater = setup_updater();
    let mut reconciler = three_suggestions(updater.clone());

    assert_eq!(reconciler.accept_all_pending(), 3);
    let result = reconciler.apply().await.unwrap();

    assert_eq!(result.applied_fields, 3);
    assert!(result.invoked);
    assert_eq!(updater.call_count(), 1);
    let call = &updater.calls()[0];
    assert_eq!(
        call.keys().cloned().collect::<Vec<_>>(),
        vec!["name", "tagline", "tone"]
    );
    assert!(reconciler.all().iter().all(|s| s.settled));
    assert_eq!(reconciler.stats().settled, 3);
}

/// Scenario: a rejected suggestion never reaches the entity but stays listed.
#[tokio::test]
async fn rejected_suggestion_is_excluded_from_apply() {
    let updater = setup_updater();
    let mut reconciler = three_suggestions(updater.clone());
    let ids: Vec<_> = reconciler.all().iter().map(|s| s.id).collect();

    reconciler.accept(ids[0]).unwrap();
    reconciler.reject(ids[1]).unwrap();
    reconciler
        .edit(ids[2], json!("warm but direct"))
        .unwrap();

    let map = reconciler.update_map();
    assert_eq!(map.len(), 2);
    assert!(!map.contains_key("tagline"));
    assert_eq!(map["tone"], json!("warm but direct"));

    reconciler.apply().await.unwrap();
    let entity = updater.entity();
    assert!(!entity.contains_key("tagline"));
    assert_eq!(entity["tone"], json!("warm but direct"));

    assert_eq!(reconciler.all().len(), 3);
    assert_eq!(reconciler.visible().count(), 2);
    assert_eq!(
        reconciler.get(ids[1]).unwrap().status,
        SuggestionStatus::Rejected
    );
    assert_eq!(
        reconciler.get(ids[2]).unwrap().status,
        SuggestionStatus::Accepted
    );
}

#[tokio::test]
async fn nothing_accepted_does_not_call_updater() {
    let updater = setup_updater();
    let mut reconciler = three_suggestions(updater.clone());
    for id in reconciler.all().iter().map(|s| s.id).collect::<Vec<_>>() {
        reconciler.reject(id).unwrap();
    }

    let result = reconciler.apply().await.unwrap();
    assert_eq!(result.applied_fields, 0);
    assert!(!result.invoked);
    assert_eq!(updater.call_count(), 0);
}

/// A failed apply changes nothing; repeating it sends the same map.
#[tokio::test]
async fn apply_failure_is_all_or_nothing() {
    let updater = setup_updater();
    updater.fail_next(1);
    let mut reconciler = three_suggestions(updater.clone());
    let ids: Vec<_> = reconciler.all().iter().map(|s| s.id).collect();
    reconciler.accept(ids[0]).unwrap();
    reconciler.edit(ids[1], json!("Brewed slowly")).unwrap();
    let before = reconciler.all().to_vec();

    let err = reconciler.apply().await.unwrap_err();
    assert!(matches!(
        err,
        ExploreError::ApplyChangesFailure { field_count: 2, .. }
    ));
    assert!(err.is_retryable());
    assert_eq!(reconciler.all(), before.as_slice());
    assert!(updater.entity().is_empty());

    let result = reconciler.apply().await.unwrap();
    assert_eq!(result.applied_fields, 2);
    let calls = updater.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
    assert_eq!(updater.entity()["tagline"], json!("Brewed slowly"));
}

/// Repeating a successful apply rewrites the same values.
#[tokio::test]
async fn repeated_apply_is_idempotent() {
    let updater = setup_updater();
    let mut reconciler = three_suggestions(updater.clone());
    reconciler.accept_all_pending();

    reconciler.apply().await.unwrap();
    let first = updater.entity();
    reconciler.apply().await.unwrap();

    assert_eq!(updater.entity(), first);
    assert_eq!(updater.calls()[0], updater.calls()[1]);
}

#[tokio::test]
async fn settled_suggestions_cannot_be_rejected() {
    let updater = setup_updater();
    let mut reconciler = three_suggestions(updater);
    let id = reconciler.all()[0].id;
    reconciler.accept(id).unwrap();
    reconciler.apply().await.unwrap();

    let err = reconciler.reject(id).unwrap_err();
    assert!(matches!(
        err,
        SuggestionError::InvalidTransition {
            from: SuggestionStatus::Accepted,
            ..
        }
    ));

    reconciler.edit(id, json!("Northwind Roasters")).unwrap();
    assert!(!reconciler.get(id).unwrap().settled);
    assert_eq!(reconciler.apply_eligible_count(), 1);
}

/// Insights from a completed session feed straight into the reconciler.
#[tokio::test]
async fn completed_session_hands_off_suggestions() {
    let service = Arc::new(ScriptedExplorationService::new());
    let controller = SessionController::new(service, EngineConfig::default());
    let session = controller.start(abc_registry(), seed()).await.unwrap();
    let mut last = None;
    for text in ["x", "y", "z"] {
        last = Some(controller.submit_answer(session.id, text).await.unwrap());
    }
    let insights = last.unwrap().completion.unwrap().unwrap();

    let updater = setup_updater();
    let mut reconciler = insights.into_reconciler(updater.clone());
    assert_eq!(reconciler.stats().pending, 3);

    reconciler.accept_all_pending();
    reconciler.apply().await.unwrap();
    let fields: Vec<_> = updater.entity().keys().cloned().collect();
    assert_eq!(fields, vec!["a", "b", "c"]);
}
