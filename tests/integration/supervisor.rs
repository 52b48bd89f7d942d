//! Supervisor tests: start, stop and check semantics.

use crate::common::{
    CallLog, FakeInstaller, FakeLauncher, FakeProcessTable, PROCESS_NAME, process_table_with,
};
use iris_installer::core::IrisError;
use iris_installer::process::{LaunchMode, ProcessRecord, Supervisor, SupervisorEvent};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

type FakeSupervisor = Supervisor<FakeInstaller, FakeProcessTable, FakeLauncher>;

fn supervisor(installer: FakeInstaller, table: FakeProcessTable, log: &CallLog) -> FakeSupervisor {
    Supervisor::new(installer, table, FakeLauncher::new(log), PROCESS_NAME)
}

#[tokio::test]
async fn test_check_without_instances_is_empty() {
    let log = CallLog::default();
    let supervisor = supervisor(
        FakeInstaller::new(true, &log),
        FakeProcessTable::with_records(process_table_with(&[]), &log),
        &log,
    );

    assert!(supervisor.check().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_check_returns_exactly_the_matching_record() {
    let log = CallLog::default();
    let supervisor = supervisor(
        FakeInstaller::new(true, &log),
        FakeProcessTable::with_records(process_table_with(&[1234]), &log),
        &log,
    );

    assert_eq!(supervisor.check().await.unwrap(), vec![ProcessRecord::new(PROCESS_NAME, 1234)]);
    // Read-only
    assert_eq!(log.entries(), vec!["list"]);
}

#[tokio::test]
async fn test_check_enumeration_failure() {
    let log = CallLog::default();
    let supervisor = supervisor(
        FakeInstaller::new(true, &log),
        FakeProcessTable::failing(
            IrisError::ProcessEnumeration {
                reason: "ps not found".to_string(),
            },
            &log,
        ),
        &log,
    );

    let err = supervisor.check().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<IrisError>(),
        Some(IrisError::ProcessEnumeration { .. })
    ));
}

#[tokio::test]
async fn test_stop_without_instances_terminates_nothing() {
    let log = CallLog::default();
    let supervisor = supervisor(
        FakeInstaller::new(true, &log),
        FakeProcessTable::with_records(process_table_with(&[]), &log),
        &log,
    );

    let report = supervisor.stop().await.unwrap();

    assert!(report.terminated.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(log.entries(), vec!["list"]);
}

#[tokio::test]
async fn test_stop_terminates_every_instance_and_nothing_else() {
    let log = CallLog::default();
    let table = FakeProcessTable::with_records(process_table_with(&[4321, 4400]), &log);
    let supervisor = supervisor(FakeInstaller::new(true, &log), table, &log);

    let report = supervisor.stop().await.unwrap();

    assert_eq!(report.terminated, vec![4321, 4400]);
    assert_eq!(log.entries(), vec!["list", "terminate:4321", "terminate:4400"]);
}

#[tokio::test]
async fn test_stop_skips_instances_that_fail_to_die() {
    let log = CallLog::default();
    let table =
        FakeProcessTable::with_records(process_table_with(&[10, 20, 30]), &log).refuse_to_kill(20);
    let supervisor = supervisor(FakeInstaller::new(true, &log), table, &log);

    let report = supervisor.stop().await.unwrap();

    assert_eq!(report.terminated, vec![10, 30]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, 20);
}

#[tokio::test]
async fn test_stop_enumeration_failure_is_kill_failure() {
    let log = CallLog::default();
    let supervisor = supervisor(
        FakeInstaller::new(true, &log),
        FakeProcessTable::failing(
            IrisError::ProcessEnumeration {
                reason: "ps exited with 1".to_string(),
            },
            &log,
        ),
        &log,
    );

    let err = supervisor.stop().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to stop running Iris instances");
}

#[tokio::test]
async fn test_start_installs_once_before_kill_and_launch() {
    let log = CallLog::default();
    let supervisor = supervisor(
        FakeInstaller::new(false, &log),
        FakeProcessTable::with_records(process_table_with(&[777]), &log),
        &log,
    );

    supervisor.start(LaunchMode::Background).await.unwrap();

    assert_eq!(supervisor.installer().calls.load(Ordering::SeqCst), 1);
    assert_eq!(log.entries(), vec!["install", "list", "terminate:777", "launch:Background"]);
}

#[tokio::test]
async fn test_start_with_artifact_present_skips_install() {
    let log = CallLog::default();
    let supervisor = supervisor(
        FakeInstaller::new(true, &log),
        FakeProcessTable::with_records(process_table_with(&[]), &log),
        &log,
    );

    supervisor.start(LaunchMode::Foreground).await.unwrap();

    assert_eq!(supervisor.installer().calls.load(Ordering::SeqCst), 0);
    assert_eq!(log.entries(), vec!["list", "launch:Foreground"]);
}

#[tokio::test]
async fn test_start_install_failure_aborts_before_kill_and_launch() {
    let log = CallLog::default();
    let supervisor = supervisor(
        FakeInstaller::failing(
            IrisError::DigestMismatch {
                expected: "sha256:aa".to_string(),
                actual: "sha256:bb".to_string(),
            },
            &log,
        ),
        FakeProcessTable::with_records(process_table_with(&[777]), &log),
        &log,
    );

    let err = supervisor.start(LaunchMode::Background).await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to install Iris");
    assert!(matches!(err.downcast_ref::<IrisError>(), Some(IrisError::DigestMismatch { .. })));
    assert_eq!(log.entries(), vec!["install"]);
}

#[tokio::test]
async fn test_start_enumeration_failure_prevents_launch() {
    let log = CallLog::default();
    let supervisor = supervisor(
        FakeInstaller::new(true, &log),
        FakeProcessTable::failing(
            IrisError::ProcessEnumeration {
                reason: "timed out".to_string(),
            },
            &log,
        ),
        &log,
    );

    let err = supervisor.start(LaunchMode::Background).await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to stop running Iris instances");
    assert_eq!(log.entries(), vec!["list"]);
}

#[tokio::test]
async fn test_start_tolerates_stale_pids() {
    let log = CallLog::default();
    let table = FakeProcessTable::with_records(process_table_with(&[55]), &log).refuse_to_kill(55);
    let supervisor = supervisor(FakeInstaller::new(true, &log), table, &log);

    supervisor.start(LaunchMode::Background).await.unwrap();

    assert_eq!(log.entries(), vec!["list", "launch:Background"]);
}

#[tokio::test]
async fn test_start_launch_failure() {
    let log = CallLog::default();
    let supervisor = Supervisor::new(
        FakeInstaller::new(true, &log),
        FakeProcessTable::with_records(process_table_with(&[]), &log),
        FakeLauncher::failing(
            IrisError::Launch {
                command: "app_process".to_string(),
                reason: "failed to spawn: No such file or directory".to_string(),
            },
            &log,
        ),
        PROCESS_NAME,
    );

    let err = supervisor.start(LaunchMode::Background).await.unwrap_err();

    assert_eq!(err.to_string(), "Failed to start Iris");
    assert!(matches!(err.downcast_ref::<IrisError>(), Some(IrisError::Launch { .. })));
}

#[tokio::test]
async fn test_reporter_sees_events_in_order() {
    let log = CallLog::default();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);

    let table = FakeProcessTable::with_records(process_table_with(&[1, 2]), &log).refuse_to_kill(2);
    let supervisor = supervisor(FakeInstaller::new(false, &log), table, &log)
        .with_reporter(move |event| sink.lock().unwrap().push(event.clone()));

    supervisor.start(LaunchMode::Background).await.unwrap();

    let events = events.lock().unwrap();
    assert!(matches!(events[0], SupervisorEvent::InstallStarted));
    assert!(matches!(events[1], SupervisorEvent::Installed(_)));
    assert_eq!(events[2], SupervisorEvent::Terminated { pid: 1 });
    assert!(matches!(events[3], SupervisorEvent::TerminationSkipped { pid: 2, .. }));
    assert_eq!(events[4], SupervisorEvent::Launching(LaunchMode::Background));
    assert_eq!(events[5], SupervisorEvent::Launched(LaunchMode::Background));
    assert_eq!(events.len(), 6);
}
