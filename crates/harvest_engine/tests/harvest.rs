mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    fast_settings, http_error, ids, init_logging, services, GatedLookup, RecordingSink,
    ScriptedLookup, StaticDirectory,
};
use harvest_core::{ExportFormat, HarvestEvent, Progress, CSV_HEADER};
use harvest_engine::{run_harvest, HarvestOutcome, HarvestSettings, SessionRegistry};
use pretty_assertions::assert_eq;
use tokio::time::Instant;

#[tokio::test]
async fn two_connections_complete_with_csv_artifact() {
    init_logging();
    let directory = Arc::new(StaticDirectory::new(ids(&["alice123", "bob456"])));
    let lookup = Arc::new(ScriptedLookup::default());
    let services = services(2, directory.clone(), lookup.clone());
    let registry = SessionRegistry::new();
    let control = registry.begin();
    let sink = RecordingSink::new();

    let outcome = run_harvest(
        &control,
        ExportFormat::Csv,
        &services,
        &fast_settings(),
        &sink,
        "2026-10-16",
    )
    .await;

    assert_eq!(sink.progress(), vec![Progress::new(1, 2), Progress::new(2, 2)]);
    assert_eq!(lookup.calls(), vec!["alice123", "bob456"]);
    assert_eq!(directory.requests(), vec![(2, 0)]);

    let HarvestOutcome::Completed { report, artifact } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(report.succeeded(), 2);
    let artifact = artifact.expect("artifact rendered");
    assert_eq!(artifact.filename, "connections-2026-10-16.csv");
    let lines: Vec<_> = artifact.body.lines().collect();
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(
        lines[1],
        "alice123,Tester,alice123@example.com,https://www.linkedin.com/in/alice123,\"null\",Engineer"
    );
    assert_eq!(lines.len(), 3);

    let events = sink.events();
    assert!(matches!(events.first(), Some(HarvestEvent::Started { .. })));
    assert!(matches!(events.last(), Some(HarvestEvent::Completed { .. })));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
}

#[tokio::test]
async fn json_export_holds_every_record() {
    init_logging();
    let directory = Arc::new(StaticDirectory::new(ids(&["alice123", "bob456"])));
    let services = services(2, directory, Arc::new(ScriptedLookup::default()));
    let registry = SessionRegistry::new();
    let sink = RecordingSink::new();

    let outcome = run_harvest(
        &registry.begin(),
        ExportFormat::Json,
        &services,
        &fast_settings(),
        &sink,
        "t",
    )
    .await;

    let HarvestOutcome::Completed {
        artifact: Some(artifact),
        ..
    } = outcome
    else {
        panic!("expected completion with artifact");
    };
    assert!(artifact.filename.ends_with(".json"));
    let value: serde_json::Value = serde_json::from_str(&artifact.body).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(value[1]["profileUrl"], "https://www.linkedin.com/in/bob456");
}

#[tokio::test]
async fn cancel_between_steps_stops_after_second_record() {
    init_logging();
    let directory = Arc::new(StaticDirectory::new(ids(&["a", "b", "c", "d", "e"])));
    let lookup = Arc::new(ScriptedLookup::default());
    let services = services(5, directory, lookup.clone());
    let registry = SessionRegistry::new();
    let control = registry.begin();
    let sink = RecordingSink::cancelling_after(2, registry.clone());
    let settings = HarvestSettings {
        step_delay: Duration::from_millis(20),
        ..HarvestSettings::default()
    };

    let outcome = run_harvest(&control, ExportFormat::Csv, &services, &settings, &sink, "t").await;

    let HarvestOutcome::Cancelled(report) = outcome else {
        panic!("expected cancellation, got {outcome:?}");
    };
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.processed, 2);
    assert_eq!(sink.progress().len(), 2);
    assert_eq!(lookup.calls(), vec!["a", "b"]);
    assert!(matches!(
        sink.events().last(),
        Some(HarvestEvent::Cancelled { .. })
    ));
    assert!(!sink
        .events()
        .iter()
        .any(|e| matches!(e, HarvestEvent::Completed { .. })));
}

#[tokio::test(start_paused = true)]
async fn fixed_delay_separates_lookups() {
    init_logging();
    let directory = Arc::new(StaticDirectory::new(ids(&["a", "b", "c"])));
    let lookup = Arc::new(ScriptedLookup::default());
    let services = services(3, directory, lookup.clone());
    let registry = SessionRegistry::new();
    let sink = RecordingSink::new();
    let settings = HarvestSettings {
        step_delay: Duration::from_millis(200),
        ..HarvestSettings::default()
    };

    let started = Instant::now();
    let outcome = run_harvest(
        &registry.begin(),
        ExportFormat::Csv,
        &services,
        &settings,
        &sink,
        "t",
    )
    .await;
    let elapsed = started.elapsed();

    assert!(matches!(outcome, HarvestOutcome::Completed { .. }));
    assert_eq!(lookup.calls(), vec!["a", "b", "c"]);
    // Two pauses between three lookups, none after the last.
    assert!(elapsed >= Duration::from_millis(400), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(600), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn cancel_cuts_the_pause_short() {
    init_logging();
    let directory = Arc::new(StaticDirectory::new(ids(&["a", "b", "c"])));
    let lookup = Arc::new(ScriptedLookup::default());
    let services = services(3, directory, lookup.clone());
    let registry = SessionRegistry::new();
    let control = registry.begin();
    let sink = RecordingSink::new();
    let settings = HarvestSettings {
        step_delay: Duration::from_secs(30),
        ..HarvestSettings::default()
    };

    let canceller = {
        let registry = registry.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            registry.cancel_active()
        })
    };

    let started = Instant::now();
    let outcome = run_harvest(&control, ExportFormat::Csv, &services, &settings, &sink, "t").await;
    let elapsed = started.elapsed();

    assert_eq!(canceller.await.unwrap(), Some(control.id()));
    let HarvestOutcome::Cancelled(report) = outcome else {
        panic!("expected cancellation, got {outcome:?}");
    };
    assert_eq!(report.processed, 1);
    assert_eq!(lookup.calls(), vec!["a"]);
    assert!(elapsed < Duration::from_secs(1), "elapsed {elapsed:?}");
}

#[tokio::test]
async fn cancel_during_lookup_finishes_that_step_only() {
    init_logging();
    let directory = Arc::new(StaticDirectory::new(ids(&["a", "b", "c", "d"])));
    let lookup = Arc::new(GatedLookup::new(1));
    let services = services(4, directory, lookup.clone());
    let registry = SessionRegistry::new();
    let control = registry.begin();
    let sink = Arc::new(RecordingSink::new());

    let task = {
        let control = control.clone();
        let sink = sink.clone();
        tokio::spawn(async move {
            run_harvest(
                &control,
                ExportFormat::Csv,
                &services,
                &fast_settings(),
                sink.as_ref(),
                "t",
            )
            .await
        })
    };

    lookup.started.notified().await;
    assert_eq!(registry.cancel_active(), Some(control.id()));
    lookup.release.notify_one();

    let outcome = task.await.unwrap();
    let HarvestOutcome::Cancelled(report) = outcome else {
        panic!("expected cancellation, got {outcome:?}");
    };
    // Step 2 was in flight when cancel arrived: it is recorded, step 3 never starts.
    assert_eq!(report.records.len(), 2);
    assert_eq!(sink.progress(), vec![Progress::new(1, 4), Progress::new(2, 4)]);
    assert_eq!(lookup.calls(), 2);
}

#[tokio::test]
async fn zero_displayed_count_completes_empty_without_listing() {
    init_logging();
    let directory = Arc::new(StaticDirectory::new(ids(&["never", "listed"])));
    let lookup = Arc::new(ScriptedLookup::default());
    let services = services(0, directory.clone(), lookup.clone());
    let registry = SessionRegistry::new();
    let sink = RecordingSink::new();

    let outcome = run_harvest(
        &registry.begin(),
        ExportFormat::Csv,
        &services,
        &fast_settings(),
        &sink,
        "t",
    )
    .await;

    assert!(directory.requests().is_empty());
    assert!(lookup.calls().is_empty());
    assert!(sink.progress().is_empty());
    let HarvestOutcome::Completed { report, artifact } = outcome else {
        panic!("expected completion");
    };
    assert_eq!(report.total, 0);
    assert_eq!(artifact.unwrap().body, CSV_HEADER);
}

#[tokio::test]
async fn failed_lookup_is_reported_and_skipped() {
    init_logging();
    let directory = Arc::new(StaticDirectory::new(ids(&["a", "b", "c", "d", "e"])));
    let lookup = Arc::new(ScriptedLookup::failing_on(&["c"]));
    let services = services(5, directory, lookup.clone());
    let registry = SessionRegistry::new();
    let sink = RecordingSink::new();

    let outcome = run_harvest(
        &registry.begin(),
        ExportFormat::Csv,
        &services,
        &fast_settings(),
        &sink,
        "t",
    )
    .await;

    assert_eq!(lookup.calls().len(), 5);
    let completed: Vec<_> = sink.progress().iter().map(|p| p.completed).collect();
    assert_eq!(completed, vec![1, 2, 3, 4, 5]);

    let failures: Vec<_> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            HarvestEvent::ItemFailed { failure, .. } => Some(failure),
            _ => None,
        })
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].identity.as_str(), "c");

    let HarvestOutcome::Completed { report, artifact } = outcome else {
        panic!("expected completion");
    };
    assert_eq!(report.records.len(), 4);
    assert_eq!(report.failures.len(), 1);
    // Header plus four rows.
    assert_eq!(artifact.unwrap().body.lines().count(), 5);
}

#[tokio::test]
async fn resolution_failure_is_fatal() {
    init_logging();
    let directory = Arc::new(StaticDirectory::failing(http_error(401)));
    let lookup = Arc::new(ScriptedLookup::default());
    let services = services(10, directory, lookup.clone());
    let registry = SessionRegistry::new();
    let sink = RecordingSink::new();

    let outcome = run_harvest(
        &registry.begin(),
        ExportFormat::Json,
        &services,
        &fast_settings(),
        &sink,
        "t",
    )
    .await;

    assert_eq!(outcome, HarvestOutcome::Failed(http_error(401)));
    assert!(lookup.calls().is_empty());
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], HarvestEvent::Failed { .. }));
}

#[tokio::test]
async fn superseded_session_stops_silently() {
    init_logging();
    let directory = Arc::new(StaticDirectory::new(ids(&["a", "b", "c"])));
    let lookup = Arc::new(GatedLookup::new(0));
    let services = services(3, directory, lookup.clone());
    let registry = SessionRegistry::new();
    let first = registry.begin();
    let sink = Arc::new(RecordingSink::new());

    let task = {
        let first = first.clone();
        let sink = sink.clone();
        tokio::spawn(async move {
            run_harvest(
                &first,
                ExportFormat::Csv,
                &services,
                &fast_settings(),
                sink.as_ref(),
                "t",
            )
            .await
        })
    };

    lookup.started.notified().await;
    let second = registry.begin();
    lookup.release.notify_one();

    let outcome = task.await.unwrap();
    assert!(matches!(outcome, HarvestOutcome::Superseded(_)));
    assert_eq!(lookup.calls(), 1);
    assert!(!sink.events().iter().any(|e| e.is_terminal()));
    assert_eq!(registry.active(), Some(second.id()));
}
