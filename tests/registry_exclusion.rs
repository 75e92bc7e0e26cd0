// tests/registry_exclusion.rs

use std::collections::HashSet;
use std::sync::Arc;

use devrig::engine::{Capabilities, Engine};
use devrig::fs::mock::MockFileSystem;
use devrig::pipeline::ToolKit;
use devrig::registry::TASK_BASES;
use devrig_test_utils::builders::ConfigBuilder;
use devrig_test_utils::fakes::{FakeProcessManager, FakeReload, FakeScheduler};
use devrig_test_utils::init_tracing;

fn engine_with(config: devrig::config::Configuration) -> (Engine, Arc<FakeScheduler>) {
    let scheduler = Arc::new(FakeScheduler::new());
    let caps = Capabilities {
        scheduler: Arc::clone(&scheduler) as Arc<dyn devrig::sched::Scheduler>,
        tools: Arc::new(ToolKit::default()),
        fs: Arc::new(MockFileSystem::new()),
        processes: Arc::new(FakeProcessManager::new()),
        reload: Arc::new(FakeReload::new()),
    };
    (Engine::new(config, None, caps), scheduler)
}

#[test]
fn every_exposed_task_is_registered() {
    init_tracing();
    let (engine, scheduler) = engine_with(ConfigBuilder::new().build());
    engine.register().unwrap();

    let defined: HashSet<String> = scheduler.defined().into_iter().map(|(n, _)| n).collect();
    for base in TASK_BASES {
        assert!(defined.contains(base), "missing task {base}");
    }
    assert_eq!(defined.len(), TASK_BASES.len());
}

#[test]
fn prefix_qualifies_names_and_dependency_references() {
    init_tracing();
    let (engine, scheduler) = engine_with(ConfigBuilder::new().prefix("site").build());
    engine.register().unwrap();

    let defined = scheduler.defined();
    let build = defined
        .iter()
        .find(|(name, _)| name == "site_build")
        .expect("site_build registered");
    assert_eq!(
        build.1,
        vec!["site_html", "site_styles", "site_scripts", "site_images"]
    );

    // No unqualified names leak through.
    assert!(!defined.iter().any(|(name, _)| name == "build"));
}

#[test]
fn exclude_wins_over_only() {
    init_tracing();
    let (engine, _scheduler) = engine_with(
        ConfigBuilder::new()
            .exclude(&["html"])
            .only(&["scripts"])
            .build(),
    );
    let registry = engine.register().unwrap();

    let excluded: HashSet<String> = registry
        .plan()
        .into_iter()
        .filter(|entry| entry.excluded)
        .map(|entry| entry.name)
        .collect();

    // `only` was ignored entirely: just the explicit exclusion applies.
    assert_eq!(excluded, HashSet::from(["html".to_string()]));
}

#[test]
fn explicitly_empty_exclude_disables_only() {
    init_tracing();
    let (engine, _scheduler) =
        engine_with(ConfigBuilder::new().exclude(&[]).only(&["scripts"]).build());
    let registry = engine.register().unwrap();

    assert!(registry.plan().iter().all(|entry| !entry.excluded));
}

#[test]
fn only_suppresses_everything_else() {
    init_tracing();
    let (engine, _scheduler) = engine_with(ConfigBuilder::new().only(&["build"]).build());
    let registry = engine.register().unwrap();

    let plan = registry.plan();
    let kept: Vec<&str> = plan
        .iter()
        .filter(|entry| !entry.excluded)
        .map(|entry| entry.name.as_str())
        .collect();
    assert_eq!(kept, vec!["build"]);
}

#[tokio::test]
async fn excluded_tasks_resolve_as_dependencies() {
    init_tracing();
    // `scripts` depends on `lint`; excluding lint must not break the edge.
    let (engine, scheduler) = engine_with(
        ConfigBuilder::new()
            .exclude(&["lint"])
            .warn_exclusions(true)
            .build(),
    );
    engine.register().unwrap();

    let defined = scheduler.defined();
    let scripts = defined
        .iter()
        .find(|(name, _)| name == "scripts")
        .expect("scripts registered");
    assert_eq!(scripts.1, vec!["lint"]);

    // Running the stub is harmless.
    assert_eq!(
        engine.run("lint").await.unwrap(),
        devrig::registry::TaskExit::Completed
    );
}
