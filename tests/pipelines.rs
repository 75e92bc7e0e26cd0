// tests/pipelines.rs

//! Per-category pipeline behaviour against the in-memory filesystem.

use std::path::Path;
use std::sync::Arc;

use devrig::config::Configuration;
use devrig::engine::{Capabilities, Engine};
use devrig::fs::mock::MockFileSystem;
use devrig::fs::FileSystem;
use devrig::pipeline::ToolKit;
use devrig::registry::TaskExit;
use devrig::sched::Scheduler;
use devrig_test_utils::builders::ConfigBuilder;
use devrig_test_utils::fakes::{FakeProcessManager, FakeReload, FakeScheduler};
use devrig_test_utils::init_tracing;

fn engine_on(fs: MockFileSystem, config: Configuration, processes: Arc<FakeProcessManager>) -> Engine {
    let caps = Capabilities {
        scheduler: Arc::new(FakeScheduler::new()),
        tools: Arc::new(ToolKit::default()),
        fs: Arc::new(fs),
        processes: processes as Arc<dyn devrig::proc::ProcessManager>,
        reload: Arc::new(FakeReload::new()),
    };
    Engine::new(config, None, caps)
}

#[tokio::test]
async fn markup_minifies_and_clears_stale_output() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("client/src/index.html", "<div>\n  <p>hi   there</p>\n</div>");
    fs.add_file("dist/removed.html", "<p>stale</p>");

    let engine = engine_on(fs.clone(), ConfigBuilder::new().build(), Arc::new(FakeProcessManager::new()));
    engine.register().unwrap();

    engine.run("html").await.unwrap();

    assert_eq!(
        fs.read_to_string(Path::new("dist/index.html")).unwrap(),
        "<div><p>hi there</p></div>"
    );
    assert!(!fs.exists(Path::new("dist/removed.html")));
}

#[tokio::test]
async fn styles_write_bundle_and_source_map() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("client/src/styles/app.css", "body {\n\n  color: red;\n}\n");

    let engine = engine_on(fs.clone(), ConfigBuilder::new().build(), Arc::new(FakeProcessManager::new()));
    engine.register().unwrap();

    engine.run("styles").await.unwrap();

    let bundle = fs.read_to_string(Path::new("dist/styles/bundle.css")).unwrap();
    assert_eq!(bundle, "body {\n  color: red;\n}");

    let map = fs.read_to_string(Path::new("dist/styles/bundle.css.map")).unwrap();
    assert!(map.contains("client/src/styles/app.css"));
    assert!(map.contains("\"file\":\"bundle.css\""));
}

#[tokio::test]
async fn images_copy_bytes_and_clear_stale_output() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("client/src/images/logo.png", vec![1u8, 2, 3]);
    fs.add_file("dist/images/gone.png", vec![9u8]);

    let engine = engine_on(fs.clone(), ConfigBuilder::new().build(), Arc::new(FakeProcessManager::new()));
    engine.register().unwrap();

    engine.run("images").await.unwrap();

    assert_eq!(fs.read(Path::new("dist/images/logo.png")).unwrap(), vec![1u8, 2, 3]);
    assert!(!fs.exists(Path::new("dist/images/gone.png")));
}

#[tokio::test]
async fn docs_concatenate_documented_sources() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(
        "client/src/scripts/math.js",
        "/** Adds two numbers. */\nfunction add(a, b) { return a + b; }\n",
    );
    fs.add_file("server/app.js", "/** Boots the server. */\nstart();\n");

    let engine = engine_on(fs.clone(), ConfigBuilder::new().build(), Arc::new(FakeProcessManager::new()));
    engine.register().unwrap();

    engine.run("docs").await.unwrap();

    let doc = fs.read_to_string(Path::new("dist/docs/api.md")).unwrap();
    assert!(doc.contains("/** Adds two numbers. */"));
    assert!(doc.contains("/** Boots the server. */"));
    assert!(!doc.contains("function add"));
}

#[tokio::test]
async fn changelog_is_written_at_the_project_root() {
    init_tracing();

    let fs = MockFileSystem::new();
    let engine = engine_on(fs.clone(), ConfigBuilder::new().build(), Arc::new(FakeProcessManager::new()));
    engine.register().unwrap();

    engine.run("changelog").await.unwrap();

    let changelog = fs.read_to_string(Path::new("CHANGELOG.md")).unwrap();
    assert!(changelog.starts_with("# Changelog"));
}

#[tokio::test]
async fn test_task_instruments_sources_and_runs_the_entry_point() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("server/app.js", "module.exports = 1;\n");

    let processes = Arc::new(FakeProcessManager::new().with_instant_exit(0));
    let engine = engine_on(fs.clone(), ConfigBuilder::new().build(), Arc::clone(&processes));
    engine.register().unwrap();

    assert_eq!(engine.run("test").await.unwrap(), TaskExit::Completed);

    assert!(processes
        .operations()
        .contains(&"spawn:node test/main.js".to_string()));
    assert!(fs.is_file(Path::new(".devrig/coverage/instrumented/server/app.js")));

    let report = fs
        .read_to_string(Path::new(".devrig/coverage/report.json"))
        .unwrap();
    assert!(report.contains("server/app.js"));
}

#[tokio::test]
async fn failing_test_entry_fails_the_task() {
    init_tracing();

    let fs = MockFileSystem::new();
    let processes = Arc::new(FakeProcessManager::new().with_instant_exit(3));
    let engine = engine_on(fs, ConfigBuilder::new().build(), Arc::clone(&processes));
    engine.register().unwrap();

    assert!(engine.run("test").await.is_err());
}

#[tokio::test]
async fn lint_never_fails_even_without_sources() {
    init_tracing();

    let fs = MockFileSystem::new();
    let engine = engine_on(fs, ConfigBuilder::new().build(), Arc::new(FakeProcessManager::new()));
    engine.register().unwrap();

    assert_eq!(engine.run("lint").await.unwrap(), TaskExit::Completed);
}

#[tokio::test(start_paused = true)]
async fn autotest_reruns_tests_when_sources_change() {
    init_tracing();

    let fs = MockFileSystem::new();
    let scheduler = Arc::new(FakeScheduler::new());
    let processes = Arc::new(FakeProcessManager::new().with_instant_exit(0));
    let caps = Capabilities {
        scheduler: Arc::clone(&scheduler) as Arc<dyn devrig::sched::Scheduler>,
        tools: Arc::new(ToolKit::default()),
        fs: Arc::new(fs),
        processes: processes as Arc<dyn devrig::proc::ProcessManager>,
        reload: Arc::new(FakeReload::new()),
    };
    let engine = Engine::new(ConfigBuilder::new().build(), None, caps);
    engine.register().unwrap();

    let autotest = tokio::spawn(scheduler.run_task("autotest"));
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    assert_eq!(scheduler.fire("test/unit.js"), 1);
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let runs = scheduler.runs();
    assert_eq!(runs.iter().filter(|r| r.as_str() == "test").count(), 1);

    // Another change re-runs the suite; the watcher never terminates.
    scheduler.fire("server/app.js");
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert_eq!(
        scheduler.runs().iter().filter(|r| r.as_str() == "test").count(),
        2
    );
    assert!(!autotest.is_finished());

    autotest.abort();
}
