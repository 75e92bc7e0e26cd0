// tests/dev_supervisor.rs

//! Development-mode behaviour: watch-triggered rebuilds, self-restart
//! paths, debounced live-reload, and subordinate server supervision.
//!
//! These tests run with paused time: sleeps only resolve once the
//! supervisor has gone idle, which makes the watch/fire sequencing
//! deterministic.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use devrig::config::Configuration;
use devrig::engine::{Capabilities, Engine};
use devrig::fs::mock::MockFileSystem;
use devrig::pipeline::ToolKit;
use devrig::registry::{RestartKind, TaskExit};
use devrig::sched::Scheduler;
use devrig_test_utils::builders::ConfigBuilder;
use devrig_test_utils::fakes::{FakeProcessManager, FakeReload, FakeScheduler};
use devrig_test_utils::init_tracing;

struct Harness {
    _engine: Engine,
    scheduler: Arc<FakeScheduler>,
    processes: Arc<FakeProcessManager>,
    reload: Arc<FakeReload>,
    fs: MockFileSystem,
}

fn harness(config: Configuration, config_path: Option<PathBuf>, processes: FakeProcessManager) -> Harness {
    let scheduler = Arc::new(FakeScheduler::new());
    let processes = Arc::new(processes);
    let reload = Arc::new(FakeReload::new());
    let fs = MockFileSystem::new();

    let caps = Capabilities {
        scheduler: Arc::clone(&scheduler) as Arc<dyn devrig::sched::Scheduler>,
        tools: Arc::new(ToolKit::default()),
        fs: Arc::new(fs.clone()),
        processes: Arc::clone(&processes) as Arc<dyn devrig::proc::ProcessManager>,
        reload: Arc::clone(&reload) as Arc<dyn devrig::dev::LiveReload>,
    };
    let engine = Engine::new(config, config_path, caps);
    engine.register().unwrap();

    Harness {
        _engine: engine,
        scheduler,
        processes,
        reload,
        fs,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn style_change_triggers_exactly_the_styles_task() {
    init_tracing();

    let h = harness(ConfigBuilder::new().build(), None, FakeProcessManager::new());
    h.fs.add_file("client/src/styles/app.css", "body {}\n");

    let dev = tokio::spawn(h.scheduler.run_task("dev"));
    settle().await;

    assert_eq!(h.scheduler.fire("client/src/styles/app.css"), 1);
    settle().await;

    let runs = h.scheduler.runs();
    assert_eq!(runs.iter().filter(|r| r.as_str() == "styles").count(), 1);
    assert_eq!(runs.iter().filter(|r| r.as_str() == "scripts").count(), 0);
    assert_eq!(runs.iter().filter(|r| r.as_str() == "images").count(), 0);

    dev.abort();
}

#[tokio::test(start_paused = true)]
async fn dev_builds_once_before_watching() {
    init_tracing();

    let h = harness(ConfigBuilder::new().build(), None, FakeProcessManager::new());
    let dev = tokio::spawn(h.scheduler.run_task("dev"));
    settle().await;

    assert_eq!(h.scheduler.runs(), vec!["dev".to_string(), "build".to_string()]);
    assert_eq!(h.reload.listened_ports(), vec![35729]);

    dev.abort();
}

#[tokio::test(start_paused = true)]
async fn package_manifest_change_reinstalls_prunes_and_requests_restart() {
    init_tracing();

    let h = harness(ConfigBuilder::new().build(), None, FakeProcessManager::new());
    let dev = tokio::spawn(h.scheduler.run_task("dev"));
    settle().await;

    assert_eq!(h.scheduler.fire("package.json"), 1);
    let exit = dev.await.unwrap().unwrap();

    match exit {
        TaskExit::Restart(request) => {
            assert_eq!(request.kind, RestartKind::PackageManifest);
            assert_eq!(request.code, 0);
        }
        other => panic!("expected restart request, got {other:?}"),
    }

    // Reinstall ran in order, with no rebuild between trigger and exit.
    let pm_ops: Vec<String> = h
        .processes
        .operations()
        .into_iter()
        .filter(|op| !op.starts_with("spawn:"))
        .collect();
    assert_eq!(pm_ops, vec!["install".to_string(), "prune".to_string()]);
    assert_eq!(h.scheduler.runs(), vec!["dev".to_string(), "build".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn failed_install_halts_the_restart_chain_with_its_code() {
    init_tracing();

    let h = harness(
        ConfigBuilder::new().build(),
        None,
        FakeProcessManager::new().with_install_code(2),
    );
    let dev = tokio::spawn(h.scheduler.run_task("dev"));
    settle().await;

    h.scheduler.fire("package.json");
    let exit = dev.await.unwrap().unwrap();

    assert_eq!(
        exit,
        TaskExit::Restart(devrig::registry::RestartRequest {
            kind: RestartKind::PackageManifest,
            code: 2,
        })
    );

    let ops = h.processes.operations();
    assert!(!ops.contains(&"prune".to_string()));
}

#[tokio::test(start_paused = true)]
async fn library_manifest_change_reinstalls_libraries_and_rebuilds_detached() {
    init_tracing();

    let h = harness(ConfigBuilder::new().build(), None, FakeProcessManager::new());
    let dev = tokio::spawn(h.scheduler.run_task("dev"));
    settle().await;

    h.scheduler.fire("bower.json");
    let exit = dev.await.unwrap().unwrap();

    match exit {
        TaskExit::Restart(request) => assert_eq!(request.kind, RestartKind::LibraryManifest),
        other => panic!("expected restart request, got {other:?}"),
    }

    let ops = h.processes.operations();
    assert!(ops.contains(&"install_libraries".to_string()));
    let detached = ops
        .iter()
        .find(|op| op.starts_with("detached:"))
        .expect("fresh build spawned");
    assert!(detached.ends_with("build"));
}

#[tokio::test(start_paused = true)]
async fn engine_config_change_requests_a_plain_restart() {
    init_tracing();

    let h = harness(
        ConfigBuilder::new().build(),
        Some(PathBuf::from("Devrig.toml")),
        FakeProcessManager::new(),
    );
    let dev = tokio::spawn(h.scheduler.run_task("dev"));
    settle().await;

    assert_eq!(h.scheduler.fire("Devrig.toml"), 1);
    let exit = dev.await.unwrap().unwrap();

    assert_eq!(
        exit,
        TaskExit::Restart(devrig::registry::RestartRequest {
            kind: RestartKind::EngineConfig,
            code: 0,
        })
    );

    // No reinstall for a configuration change.
    let ops = h.processes.operations();
    assert!(!ops.contains(&"install".to_string()));
}

#[tokio::test(start_paused = true)]
async fn artifact_changes_are_debounced_into_one_notification() {
    init_tracing();

    let h = harness(ConfigBuilder::new().build(), None, FakeProcessManager::new());
    let dev = tokio::spawn(h.scheduler.run_task("dev"));
    settle().await;

    h.scheduler.fire("dist/scripts/bundle.js");
    h.scheduler.fire("dist/styles/bundle.css");
    settle().await;
    assert!(h.reload.notifications().is_empty(), "debounce still open");

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let notifications = h.reload.notifications();
    assert_eq!(notifications.len(), 1);
    // Paths are relative to the destination tree, in sorted order.
    assert_eq!(
        notifications[0],
        vec![PathBuf::from("scripts/bundle.js"), PathBuf::from("styles/bundle.css")]
    );

    dev.abort();
}

#[tokio::test(start_paused = true)]
async fn subordinate_exit_terminates_dev_with_its_code() {
    init_tracing();

    let h = harness(ConfigBuilder::new().build(), None, FakeProcessManager::new());
    let dev = tokio::spawn(h.scheduler.run_task("dev"));
    settle().await;

    h.processes.exit_subordinate(0);
    let exit = dev.await.unwrap().unwrap();

    assert_eq!(exit, TaskExit::Terminated { code: 0 });
}

#[tokio::test(start_paused = true)]
async fn demon_restarts_the_server_on_crash() {
    init_tracing();

    let h = harness(ConfigBuilder::new().build(), None, FakeProcessManager::new());
    let demon = tokio::spawn(h.scheduler.run_task("demon"));
    settle().await;

    // Crash: supervision respawns the server.
    h.processes.exit_subordinate(3);
    settle().await;

    let spawns = h
        .processes
        .operations()
        .iter()
        .filter(|op| op.starts_with("spawn:"))
        .count();
    assert_eq!(spawns, 2);

    // Clean exit ends supervision and propagates the code.
    h.processes.exit_subordinate(0);
    let exit = demon.await.unwrap().unwrap();
    assert_eq!(exit, TaskExit::Terminated { code: 0 });
}

#[tokio::test(start_paused = true)]
async fn server_source_change_restarts_the_subordinate() {
    init_tracing();

    let h = harness(ConfigBuilder::new().build(), None, FakeProcessManager::new());
    let dev = tokio::spawn(h.scheduler.run_task("dev"));
    settle().await;

    h.scheduler.fire("server/app.js");
    settle().await;

    let ops = h.processes.operations();
    assert!(ops.contains(&"kill".to_string()));
    let spawns = ops.iter().filter(|op| op.starts_with("spawn:")).count();
    assert_eq!(spawns, 2);

    dev.abort();
}
