mod support;

use std::sync::Arc;
use std::time::Duration;

use scout_core::contracts::{ServiceError, Subscription};
use scout_core::model::{
    CategoryEvent, EntityCategory, EntityChange, Phase, ProgressEvent,
};
use scout_core::{ControllerConfig, DiscoveryJobController, ScoutError};
use support::{
    FakeEventSource, RecordingJobService, RecordingObserver, StaticDirectory,
    correlation, entity,
};

fn controller(
    directory: StaticDirectory,
) -> (FakeEventSource, DiscoveryJobController) {
    let source = FakeEventSource::new();
    let jobs = RecordingJobService::new(source.clone());
    let controller = DiscoveryJobController::new(
        Arc::new(source.clone()),
        Arc::new(jobs),
        Arc::new(directory),
        ControllerConfig::default(),
    );
    (source, controller)
}

#[tokio::test]
async fn empty_category_list_yields_releasable_composite() {
    let (source, controller) = controller(StaticDirectory::default());

    let composite = controller
        .run_monitor_all(&[], Arc::new(RecordingObserver::default()))
        .await
        .unwrap();

    assert!(composite.members().is_empty().await);
    composite.release().await.unwrap();
    assert!(source.entries().is_empty());
}

#[tokio::test]
async fn subscribes_categories_then_each_discoverer() {
    let directory =
        StaticDirectory::with(EntityCategory::Discoverer, &["disc-a", "disc-b"]);
    let (source, controller) = controller(directory);
    let observer = Arc::new(RecordingObserver::default());

    let composite = controller
        .run_monitor_all(
            &[EntityCategory::Application, EntityCategory::Discoverer],
            observer.clone(),
        )
        .await
        .unwrap();

    assert_eq!(
        composite.members().labels().await,
        vec!["application", "discoverer", "disc-a", "disc-b"]
    );

    source.emit_category(CategoryEvent::new(
        EntityCategory::Application,
        EntityChange::New,
        entity("srv-1"),
    ));
    source.emit_progress(
        ProgressEvent::new(correlation("pass-1"), Phase::Finished)
            .with_discoverer(entity("disc-b")),
    );
    assert_eq!(observer.category_events.lock().unwrap().len(), 1);
    assert_eq!(observer.completions().len(), 1);

    composite.release().await.unwrap();
    assert_eq!(
        source.release_calls(),
        vec![
            "entity:disc-b",
            "entity:disc-a",
            "category:discoverer",
            "category:application",
        ]
    );
    assert_eq!(source.active(), 0);
}

#[tokio::test]
async fn failure_mid_fan_out_releases_acquired_in_reverse() {
    let directory = StaticDirectory::with(
        EntityCategory::Discoverer,
        &["disc-a", "disc-b", "disc-c"],
    );
    let (source, controller) = controller(directory);
    // one category subscription, two discoverers, then the third fails
    source.fail_subscribe_at(4);

    let err = controller
        .run_monitor_all(
            &[EntityCategory::Discoverer],
            Arc::new(RecordingObserver::default()),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScoutError::Subscription {
            released_with_errors: None,
            ..
        }
    ));
    assert_eq!(
        source.release_calls(),
        vec!["entity:disc-b", "entity:disc-a", "category:discoverer"]
    );
    assert_eq!(source.active(), 0);
}

#[tokio::test]
async fn release_failures_are_collected_not_fatal() {
    let directory =
        StaticDirectory::with(EntityCategory::Discoverer, &["disc-a", "disc-b"]);
    let (source, controller) = controller(directory);
    source.fail_release_of("entity:disc-a");
    source.fail_subscribe_at(3);

    let err = controller
        .run_monitor_all(
            &[EntityCategory::Discoverer],
            Arc::new(RecordingObserver::default()),
        )
        .await
        .unwrap_err();

    let errors = match err {
        ScoutError::Subscription {
            released_with_errors: Some(errors),
            ..
        } => errors,
        other => panic!("expected release errors, got {other:?}"),
    };
    assert_eq!(errors.labels().collect::<Vec<_>>(), vec!["disc-a"]);
    assert_eq!(source.release_calls().len(), 2);
}

#[tokio::test]
async fn directory_failure_releases_category_subscriptions() {
    let directory = StaticDirectory::default();
    directory.fail_with(ServiceError::Transport("offline".into()));
    let (source, controller) = controller(directory);

    let err = controller
        .run_monitor_all(
            &[EntityCategory::Application, EntityCategory::Discoverer],
            Arc::new(RecordingObserver::default()),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ScoutError::Directory(ServiceError::Transport(_))));
    assert_eq!(
        source.release_calls(),
        vec!["category:discoverer", "category:application"]
    );
}

#[tokio::test]
async fn dropped_composite_releases_in_background() {
    let directory = StaticDirectory::with(EntityCategory::Discoverer, &["disc-a"]);
    let (source, controller) = controller(directory);

    let composite = controller
        .run_monitor_all(
            &[EntityCategory::Discoverer],
            Arc::new(RecordingObserver::default()),
        )
        .await
        .unwrap();
    assert_eq!(source.active(), 2);
    drop(composite);

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(
        source.release_calls(),
        vec!["entity:disc-a", "category:discoverer"]
    );
    assert_eq!(source.active(), 0);
}
