//! 并发上报与提交中的追加

mod common;

use std::sync::Arc;

use coach_resilience::models::{ErrorContext, Severity};
use coach_resilience::services::{
    BuildProfile, ConnectivitySignal, ErrorLogStore, ErrorReporter, FileStorage, FlushOutcome,
    MAX_LOG_ENTRIES,
};
use common::{GatedCollector, MockCollector};

fn file_reporter(dir: &std::path::Path) -> Arc<ErrorReporter> {
    let storage = Arc::new(FileStorage::open(dir).unwrap());
    Arc::new(ErrorReporter::new(
        ErrorLogStore::new(storage),
        Arc::new(MockCollector::new()),
        ConnectivitySignal::new(false),
        BuildProfile::Development,
    ))
}

#[test]
fn test_reports_from_many_threads_are_all_queued() {
    let dir = tempfile::tempdir().unwrap();
    let reporter = file_reporter(dir.path());

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let reporter = reporter.clone();
            std::thread::spawn(move || {
                for i in 0..10 {
                    let handle = reporter.report(
                        format!("thread {} error {}", t, i),
                        Severity::Error,
                        ErrorContext::new(),
                    );
                    assert!(handle.persisted);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(reporter.queued().unwrap().len(), 40);
}

#[test]
fn test_bound_holds_under_concurrent_producers() {
    let dir = tempfile::tempdir().unwrap();
    let reporter = file_reporter(dir.path());

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let reporter = reporter.clone();
            std::thread::spawn(move || {
                for i in 0..20 {
                    reporter.report(format!("{}-{}", t, i), Severity::Warning, ErrorContext::new());
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(reporter.queued().unwrap().len(), MAX_LOG_ENTRIES);
}

#[tokio::test]
async fn test_report_during_inflight_flush_stays_queued() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
    let collector = Arc::new(GatedCollector::default());
    let reporter = Arc::new(ErrorReporter::new(
        ErrorLogStore::new(storage),
        collector.clone(),
        ConnectivitySignal::new(false),
        BuildProfile::Development,
    ));

    reporter.report("before flush", Severity::Error, ErrorContext::new());

    let flushing = {
        let reporter = reporter.clone();
        tokio::spawn(async move { reporter.submit_queued().await })
    };
    collector.entered.notified().await;

    reporter.report("during flush", Severity::Critical, ErrorContext::new());
    collector.release.notify_one();

    assert_eq!(flushing.await.unwrap().unwrap(), FlushOutcome::Submitted(1));

    let queued = reporter.queued().unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].message, "during flush");
    assert_eq!(collector.batches.lock().unwrap()[0].len(), 1);
}
