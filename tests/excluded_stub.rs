// tests/excluded_stub.rs

//! Excluded tasks register as warn-only stubs: invoking them never runs
//! the real body and never touches the filesystem or any process.

use std::sync::Arc;

use devrig::engine::{Capabilities, Engine};
use devrig::fs::mock::MockFileSystem;
use devrig::pipeline::ToolKit;
use devrig::registry::TaskExit;
use devrig_test_utils::builders::ConfigBuilder;
use devrig_test_utils::fakes::{FakeProcessManager, FakeReload, FakeScheduler};
use devrig_test_utils::init_tracing;

#[tokio::test]
async fn invoking_an_excluded_server_task_performs_no_side_effects() {
    init_tracing();

    let fs = MockFileSystem::new();
    let processes = Arc::new(FakeProcessManager::new());
    let caps = Capabilities {
        scheduler: Arc::new(FakeScheduler::new()),
        tools: Arc::new(ToolKit::default()),
        fs: Arc::new(fs.clone()),
        processes: Arc::clone(&processes) as Arc<dyn devrig::proc::ProcessManager>,
        reload: Arc::new(FakeReload::new()),
    };
    let config = ConfigBuilder::new()
        .exclude(&["server"])
        .warn_exclusions(true)
        .build();
    let engine = Engine::new(config, None, caps);
    engine.register().unwrap();

    // Invoking the stub twice is idempotent: it completes, warns, and
    // performs no writes or process operations either time.
    assert_eq!(engine.run("server").await.unwrap(), TaskExit::Completed);
    assert_eq!(engine.run("server").await.unwrap(), TaskExit::Completed);

    assert!(processes.operations().is_empty());
    assert!(fs.written_paths().is_empty());
}

#[tokio::test]
async fn non_excluded_siblings_still_run_for_real() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("client/src/index.html", "<p>hi</p>");

    let caps = Capabilities {
        scheduler: Arc::new(FakeScheduler::new()),
        tools: Arc::new(ToolKit::default()),
        fs: Arc::new(fs.clone()),
        processes: Arc::new(FakeProcessManager::new()),
        reload: Arc::new(FakeReload::new()),
    };
    let config = ConfigBuilder::new()
        .exclude(&["server"])
        .warn_exclusions(true)
        .build();
    let engine = Engine::new(config, None, caps);
    engine.register().unwrap();

    engine.run("html").await.unwrap();
    assert!(!fs.written_paths().is_empty());
}
