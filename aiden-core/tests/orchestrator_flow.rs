mod support;

use std::sync::Arc;
use std::time::Duration;

use aiden_core::AidenError;
use aiden_core::database::ports::ScansRepository;
use aiden_core::orchestration::{
    ChannelQueue, ExecuteOutcome, INTERRUPTED_REASON, OrchestratorConfig,
    RetryConfig, ScanJob, TaskQueue, WorkerPool,
};
use aiden_model::ScanStatus;

use support::{FakeCollector, Harness, finding, report};

#[tokio::test]
async fn findings_are_ranked_by_corroboration() {
    let harness = Harness::new(FakeCollector::with(vec![Ok(report(vec![
        finding("one", 1),
        finding("three", 3),
        finding("two", 2),
    ]))]));
    let orchestrator = &harness.orchestrator;

    let scan_id = orchestrator.initiate("a@b.com", Some(true)).await.unwrap();
    let pending = orchestrator.get_results(scan_id, None).await.unwrap();
    assert_eq!(pending.scan.status, ScanStatus::Pending);
    assert!(pending.findings.is_empty());

    let outcomes = orchestrator.drain().await.unwrap();
    assert_eq!(outcomes, vec![(scan_id, ExecuteOutcome::Finished { findings: 3 })]);

    let results = orchestrator.get_results(scan_id, None).await.unwrap();
    assert_eq!(results.scan.status, ScanStatus::Finished);
    let corroboration: Vec<u32> =
        results.findings.iter().map(|f| f.corroboration).collect();
    assert_eq!(corroboration, vec![3, 2, 1]);
    assert_eq!(results.findings[0].data, "three");

    let again = orchestrator.get_results(scan_id, None).await.unwrap();
    assert_eq!(again.findings, results.findings);

    let top = orchestrator.get_results(scan_id, Some(1)).await.unwrap();
    assert_eq!(top.findings.len(), 1);
}

#[tokio::test]
async fn collector_failure_marks_scan_error() {
    let harness = Harness::new(FakeCollector::with(vec![Err(
        AidenError::collector("request timed out"),
    )]));
    let orchestrator = &harness.orchestrator;

    let scan_id = orchestrator.initiate("a@b.com", Some(true)).await.unwrap();
    let outcomes = orchestrator.drain().await.unwrap();
    assert!(matches!(outcomes[0].1, ExecuteOutcome::Failed { .. }));

    let results = orchestrator.get_results(scan_id, None).await.unwrap();
    assert_eq!(results.scan.status, ScanStatus::Error);
    assert!(results.findings.is_empty());
    assert!(
        results
            .scan
            .failure_reason
            .as_deref()
            .is_some_and(|r| r.contains("timed out"))
    );
}

#[tokio::test]
async fn retries_transient_collector_failures() {
    let config = OrchestratorConfig {
        retry: RetryConfig {
            max_attempts: 2,
            backoff_base_ms: 1,
            backoff_max_ms: 1,
        },
        ..OrchestratorConfig::default()
    };
    let harness = Harness::with_config(
        FakeCollector::with(vec![
            Err(AidenError::collector("connection failed")),
            Ok(report(vec![finding("x", 1)])),
        ]),
        Arc::new(aiden_core::orchestration::ManualQueue::new()),
        config,
    );

    let scan_id = harness
        .orchestrator
        .initiate("a@b.com", Some(true))
        .await
        .unwrap();
    harness.orchestrator.drain().await.unwrap();

    let results = harness.orchestrator.get_results(scan_id, None).await.unwrap();
    assert_eq!(results.scan.status, ScanStatus::Finished);
    assert_eq!(harness.collector.call_count(), 2);
}

#[tokio::test]
async fn persistence_failure_marks_scan_error() {
    let harness =
        Harness::new(FakeCollector::with(vec![Ok(report(vec![finding("x", 1)]))]));
    let scan_id = harness
        .orchestrator
        .initiate("a@b.com", Some(true))
        .await
        .unwrap();

    harness.memory.set_fail_writes(true);
    harness.orchestrator.drain().await.unwrap();
    harness.memory.set_fail_writes(false);

    let results = harness.orchestrator.get_results(scan_id, None).await.unwrap();
    assert_eq!(results.scan.status, ScanStatus::Error);
    assert!(harness.memory.stored_findings(scan_id).await.is_empty());
}

#[tokio::test]
async fn initiate_rejects_bad_input() {
    let harness = Harness::new(FakeCollector::default());
    let orchestrator = &harness.orchestrator;

    for consent in [None, Some(false)] {
        let err = orchestrator.initiate("a@b.com", consent).await.unwrap_err();
        assert!(matches!(err, AidenError::Validation(_)));
    }
    let err = orchestrator
        .initiate("not-an-email", Some(true))
        .await
        .unwrap_err();
    assert!(matches!(err, AidenError::Validation(_)));
    assert_eq!(harness.collector.call_count(), 0);
}

#[tokio::test]
async fn unknown_scans_are_not_found() {
    let harness = Harness::new(FakeCollector::default());
    let err = harness
        .orchestrator
        .get_results(aiden_model::ScanId(999), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AidenError::NotFound(_)));
}

#[tokio::test]
async fn full_queue_fails_the_scan() {
    let queue = Arc::new(ChannelQueue::new(1));
    let harness = Harness::with_queue(FakeCollector::default(), queue);
    let orchestrator = &harness.orchestrator;

    orchestrator.initiate("a@b.com", Some(true)).await.unwrap();
    let err = orchestrator
        .initiate("c@d.com", Some(true))
        .await
        .unwrap_err();
    assert!(matches!(err, AidenError::Internal(_)));

    let rejected = harness.memory.scans_for("c@d.com").await;
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].status, ScanStatus::Error);
    assert!(
        rejected[0]
            .failure_reason
            .as_deref()
            .is_some_and(|r| r.starts_with("dispatch failed"))
    );
    let accepted = harness.memory.scans_for("a@b.com").await;
    assert_eq!(accepted[0].status, ScanStatus::Pending);
}

#[tokio::test]
async fn redelivered_jobs_are_skipped() {
    let harness =
        Harness::new(FakeCollector::with(vec![Ok(report(vec![finding("x", 1)]))]));
    let orchestrator = &harness.orchestrator;
    let scan_id = orchestrator.initiate("a@b.com", Some(true)).await.unwrap();

    // Same scan queued twice: only the first delivery runs.
    orchestrator
        .queue()
        .enqueue(ScanJob::new(scan_id))
        .await
        .unwrap();
    let outcomes = orchestrator.drain().await.unwrap();
    assert_eq!(
        outcomes,
        vec![
            (scan_id, ExecuteOutcome::Finished { findings: 1 }),
            (scan_id, ExecuteOutcome::Skipped),
        ]
    );

    let again = orchestrator.execute(scan_id).await.unwrap();
    assert_eq!(again, ExecuteOutcome::Skipped);
    assert_eq!(harness.collector.call_count(), 1);
    assert_eq!(harness.memory.stored_findings(scan_id).await.len(), 1);

    let results = orchestrator.get_results(scan_id, None).await.unwrap();
    assert_eq!(results.scan.status, ScanStatus::Finished);
}

#[tokio::test]
async fn failed_scans_are_not_retried_on_redelivery() {
    let harness = Harness::new(FakeCollector::with(vec![Err(
        AidenError::collector("connection failed"),
    )]));
    let orchestrator = &harness.orchestrator;
    let scan_id = orchestrator.initiate("a@b.com", Some(true)).await.unwrap();
    orchestrator.drain().await.unwrap();

    let again = orchestrator.execute(scan_id).await.unwrap();
    assert_eq!(again, ExecuteOutcome::Skipped);
    assert_eq!(harness.collector.call_count(), 1);
    let results = orchestrator.get_results(scan_id, None).await.unwrap();
    assert_eq!(results.scan.status, ScanStatus::Error);
}

#[tokio::test]
async fn email_generation_requires_a_finished_scan() {
    let harness = Harness::new(FakeCollector::with(vec![Ok(report(vec![
        finding("low", 1),
        finding("high", 4),
    ]))]));
    let orchestrator = &harness.orchestrator;
    let scan_id = orchestrator.initiate("a@b.com", Some(true)).await.unwrap();

    let err = orchestrator.generate_email(scan_id).await.unwrap_err();
    assert!(matches!(err, AidenError::Validation(_)));

    orchestrator.drain().await.unwrap();
    let stored = orchestrator.generate_email(scan_id).await.unwrap();
    assert_eq!(stored.email, support::sample_email());

    let requests = harness.generator.requests.lock().unwrap().clone();
    assert_eq!(requests[0].full_name, "a");
    assert_eq!(requests[0].osint_data[0]["data"], "high");
}

#[tokio::test]
async fn worker_pool_processes_queued_scans() {
    let config = OrchestratorConfig {
        workers: 2,
        ..OrchestratorConfig::default()
    };
    let queue = Arc::new(ChannelQueue::new(config.queue_capacity));
    let harness = Harness::with_config(
        FakeCollector::with(vec![
            Ok(report(vec![finding("x", 1)])),
            Ok(report(vec![finding("y", 2)])),
        ])
        .delayed(Duration::from_millis(10)),
        queue,
        config,
    );
    let orchestrator = Arc::new(harness.orchestrator);
    let pool = WorkerPool::spawn(Arc::clone(&orchestrator));
    assert_eq!(pool.len(), 2);

    let first = orchestrator.initiate("a@b.com", Some(true)).await.unwrap();
    let second = orchestrator.initiate("c@d.com", Some(true)).await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let a = orchestrator.get_results(first, None).await.unwrap();
        let b = orchestrator.get_results(second, None).await.unwrap();
        if a.scan.status.is_terminal() && b.scan.status.is_terminal() {
            assert_eq!(a.scan.status, ScanStatus::Finished);
            assert_eq!(b.scan.status, ScanStatus::Finished);
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "scans did not finish");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    pool.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn shutdown_drains_accepted_jobs() {
    let config = OrchestratorConfig {
        workers: 1,
        ..OrchestratorConfig::default()
    };
    let queue = Arc::new(ChannelQueue::new(config.queue_capacity));
    let harness = Harness::with_config(
        FakeCollector::with(vec![
            Ok(report(vec![finding("x", 1)])),
            Ok(report(vec![finding("y", 1)])),
            Ok(report(vec![finding("z", 1)])),
        ])
        .delayed(Duration::from_millis(200)),
        queue,
        config,
    );
    let memory = Arc::clone(&harness.memory);
    let orchestrator = Arc::new(harness.orchestrator);
    let pool = WorkerPool::spawn(Arc::clone(&orchestrator));

    let mut scans = Vec::new();
    for email in ["a@b.com", "c@d.com", "e@f.com"] {
        scans.push(orchestrator.initiate(email, Some(true)).await.unwrap());
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    orchestrator.queue().close();
    pool.shutdown(Duration::from_secs(5)).await;

    for scan_id in scans {
        let results = orchestrator.get_results(scan_id, None).await.unwrap();
        assert_eq!(results.scan.status, ScanStatus::Finished, "{scan_id}");
        assert_eq!(memory.stored_findings(scan_id).await.len(), 1);
    }
    assert!(orchestrator.queue().is_empty());
}

#[tokio::test]
async fn recover_requeues_pending_and_fails_running_scans() {
    let harness = Harness::new(FakeCollector::with(vec![Ok(report(vec![
        finding("x", 1),
    ]))]));
    let memory = &harness.memory;

    let pending = memory.create_scan("a@b.com", true).await.unwrap();
    let running = memory.create_scan("c@d.com", true).await.unwrap();
    let finished = memory.create_scan("e@f.com", true).await.unwrap();
    memory.set_scan_status(running.id, ScanStatus::Running).await;
    memory.set_scan_status(finished.id, ScanStatus::Finished).await;

    let recovered = harness.orchestrator.recover().await.unwrap();
    assert_eq!(recovered.requeued, vec![pending.id]);
    assert_eq!(recovered.interrupted, vec![running.id]);

    let interrupted = harness
        .orchestrator
        .get_results(running.id, None)
        .await
        .unwrap();
    assert_eq!(interrupted.scan.status, ScanStatus::Error);
    assert_eq!(
        interrupted.scan.failure_reason.as_deref(),
        Some(INTERRUPTED_REASON)
    );

    let outcomes = harness.orchestrator.drain().await.unwrap();
    assert_eq!(
        outcomes,
        vec![(pending.id, ExecuteOutcome::Finished { findings: 1 })]
    );
    assert!(memory.list_unfinished().await.unwrap().is_empty());

    let second = harness.orchestrator.recover().await.unwrap();
    assert_eq!(second, aiden_core::orchestration::RecoveryReport::default());
}

#[tokio::test]
async fn recover_waits_for_queue_room() {
    let config = OrchestratorConfig {
        workers: 1,
        queue_capacity: 1,
        ..OrchestratorConfig::default()
    };
    let queue = Arc::new(ChannelQueue::new(config.queue_capacity));
    let harness = Harness::with_config(
        FakeCollector::with(vec![
            Ok(report(vec![finding("x", 1)])),
            Ok(report(vec![finding("y", 1)])),
            Ok(report(vec![finding("z", 1)])),
        ]),
        queue,
        config,
    );
    let mut backlog = Vec::new();
    for email in ["a@b.com", "c@d.com", "e@f.com"] {
        backlog.push(harness.memory.create_scan(email, true).await.unwrap().id);
    }

    let orchestrator = Arc::new(harness.orchestrator);
    let pool = WorkerPool::spawn(Arc::clone(&orchestrator));
    let recovered =
        tokio::time::timeout(Duration::from_secs(5), orchestrator.recover())
            .await
            .expect("recovery stalled")
            .unwrap();
    assert_eq!(recovered.requeued, backlog);

    orchestrator.queue().close();
    pool.shutdown(Duration::from_secs(5)).await;
    for scan_id in backlog {
        let results = orchestrator.get_results(scan_id, None).await.unwrap();
        assert_eq!(results.scan.status, ScanStatus::Finished);
    }
}
