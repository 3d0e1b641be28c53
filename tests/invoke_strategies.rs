#![cfg(unix)]

use std::time::Duration;

use procvisor::invoke::WORKER_ENV;
use procvisor::{ExecutionStrategy, LifecycleEvent, Orchestrator, Registry, StdioMode};
use procvisor_test_utils::builders::{sh_descriptor, DescriptorBuilder, SubCommandBuilder};
use procvisor_test_utils::recorder::recorder;
use procvisor_test_utils::{init_tracing, with_timeout};

fn orchestrator_with(descriptor: procvisor::ProcessDescriptor) -> Orchestrator {
    let orch = Orchestrator::new(Registry::new());
    assert!(orch.register(descriptor));
    orch
}

#[tokio::test]
async fn stream_delivers_each_chunk_as_it_arrives() {
    init_tracing();
    let orch = orchestrator_with(sh_descriptor(
        "ticker",
        ExecutionStrategy::Spawn,
        "printf a; sleep 0.3; printf b",
    ));

    let (data, cleanup, mut rec) = recorder();
    orch.execute_action("ticker", "start", data, cleanup).unwrap();

    let first = rec.next_data().await.expect("first chunk");
    assert_eq!(first.error, None);
    assert_eq!(first.stdout_str().as_deref(), Some("a"));
    assert_eq!(first.stderr, None);

    let second = rec.next_data().await.expect("second chunk");
    assert_eq!(second.stdout_str().as_deref(), Some("b"));

    let (event, _) = rec.next_cleanup().await.expect("exit event");
    assert_eq!(event, LifecycleEvent::Exit);
    assert!(rec.drain_data().is_empty());
}

#[tokio::test]
async fn stream_routes_stderr_to_its_own_slot() {
    let orch = orchestrator_with(sh_descriptor(
        "complainer",
        ExecutionStrategy::Spawn,
        "printf oops >&2",
    ));

    let (data, cleanup, mut rec) = recorder();
    orch.execute_action("complainer", "start", data, cleanup).unwrap();

    let call = rec.next_data().await.expect("stderr chunk");
    assert_eq!(call.stdout, None);
    assert_eq!(call.stderr_str().as_deref(), Some("oops"));
}

#[tokio::test]
async fn stream_with_null_stdio_delivers_nothing() {
    let mut descriptor = sh_descriptor("quiet", ExecutionStrategy::Spawn, "echo hidden");
    descriptor.options.stdio = StdioMode::Null;
    let orch = orchestrator_with(descriptor);

    let (data, cleanup, mut rec) = recorder();
    orch.execute_action("quiet", "start", data, cleanup).unwrap();

    rec.next_cleanup().await.expect("exit event");
    assert!(rec.drain_data().is_empty());
}

#[tokio::test]
async fn exec_reports_non_zero_exit_as_runtime_error() {
    let orch = orchestrator_with(
        DescriptorBuilder::new("failing")
            .exe("exit")
            .action("start", SubCommandBuilder::new().arg("3").build())
            .build(),
    );

    let (data, cleanup, mut rec) = recorder();
    orch.execute_action("failing", "start", data, cleanup).unwrap();

    let call = rec.next_data().await.expect("data call");
    let error = call.error.expect("runtime error");
    assert!(error.contains("Some(3)"), "got {error}");

    let (event, _) = rec.next_cleanup().await.expect("exit event");
    assert_eq!(event, LifecycleEvent::Exit);
}

#[tokio::test]
async fn file_strategy_launch_failure_is_reported_twice_over() {
    let orch = orchestrator_with(
        DescriptorBuilder::new("missing")
            .exe("/nonexistent/bin/procvisor-test")
            .strategy(ExecutionStrategy::ExecFile)
            .action("start", SubCommandBuilder::new().build())
            .build(),
    );

    let (data, cleanup, mut rec) = recorder();
    let err = orch
        .execute_action("missing", "start", data, cleanup)
        .unwrap_err();
    assert!(matches!(err, procvisor::ProcessError::Launch { .. }), "got {err:?}");

    let call = rec.next_data().await.expect("error through data handler");
    assert!(call.error.unwrap().contains("Failed to launch"));

    let stored = orch.get("missing").unwrap();
    assert!(stored.handle().is_none());
    assert!(!rec.cleanup_within(Duration::from_millis(200)).await);
}

#[tokio::test]
async fn file_strategy_runs_image_without_shell() {
    // Without a shell `$HOME` reaches echo untouched.
    let orch = orchestrator_with(
        DescriptorBuilder::new("literal")
            .exe("echo")
            .strategy(ExecutionStrategy::ExecFile)
            .action("start", SubCommandBuilder::new().arg("$HOME").build())
            .build(),
    );

    let (data, cleanup, mut rec) = recorder();
    orch.execute_action("literal", "start", data, cleanup).unwrap();
    let call = rec.next_data().await.expect("data call");
    assert_eq!(call.stdout_str().as_deref(), Some("$HOME\n"));
}

#[tokio::test]
async fn worker_receives_messages_and_never_calls_data() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("received.txt");

    let orch = orchestrator_with(
        DescriptorBuilder::new("worker")
            .exe("sh")
            .strategy(ExecutionStrategy::Fork)
            .stdio(StdioMode::Null)
            .action(
                "start",
                SubCommandBuilder::new()
                    .arg("-c")
                    .arg(r#"read line; printf "%s:%s" "$line" "$PROCVISOR_WORKER" > "$1""#)
                    .arg("sh")
                    .arg(out.to_str().unwrap())
                    .build(),
            )
            .build(),
    );

    let (data, cleanup, mut rec) = recorder();
    let running = orch.execute_action("worker", "start", data, cleanup).unwrap();
    running.handle().unwrap().send("ping").unwrap();

    let (event, _) = rec.next_cleanup().await.expect("worker exit");
    assert_eq!(event, LifecycleEvent::Exit);

    let written = with_timeout(tokio::fs::read_to_string(&out)).await.unwrap();
    assert_eq!(written, "ping:1");
    assert_eq!(WORKER_ENV, "PROCVISOR_WORKER");
    assert!(rec.drain_data().is_empty());
}

#[tokio::test]
async fn send_is_refused_for_non_worker_launches() {
    let orch = orchestrator_with(
        DescriptorBuilder::new("plain")
            .exe("sleep")
            .strategy(ExecutionStrategy::ExecFile)
            .action("start", SubCommandBuilder::new().arg("1").build())
            .build(),
    );

    let (data, cleanup, _rec) = recorder();
    let running = orch.execute_action("plain", "start", data, cleanup).unwrap();
    assert!(running.handle().unwrap().send("hello").is_err());
    assert!(orch.kill("plain", procvisor::Signal::Kill));
}
