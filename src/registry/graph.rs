// src/registry/graph.rs

//! Declaration of the fixed task graph and its registration against the
//! scheduler capability.
//!
//! The registry is purely declarative: it builds one descriptor per base
//! name, applies prefixing and the exclusion filter uniformly, validates
//! references and acyclicity, and hands everything to the scheduler. It
//! never executes a body itself.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dev::supervisor::DevSupervisor;
use crate::engine::EngineContext;
use crate::errors::{DevrigError, Result};
use crate::registry::descriptor::{qualify, TaskBody, TaskDescriptor, TaskExit, TaskFuture, TaskName};
use crate::registry::exclusion::{stub_body, ExclusionSet};
use crate::sched::Scheduler;

/// Base names of every task this engine exposes, before prefixing.
pub const TASK_BASES: [&str; 13] = [
    "html",
    "lint",
    "scripts",
    "styles",
    "images",
    "build",
    "server",
    "demon",
    "dev",
    "test",
    "autotest",
    "docs",
    "changelog",
];

/// One row of the effective registration plan, for dry-run output and
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub name: TaskName,
    pub depends_on: Vec<TaskName>,
    pub excluded: bool,
}

/// The declared task set for one engine instance.
pub struct Registry {
    descriptors: Vec<TaskDescriptor>,
    excluded: ExclusionSet,
}

impl Registry {
    /// Build the full descriptor set for one engine instance.
    ///
    /// Names and dependency references are qualified through the instance
    /// prefix; excluded tasks get a stub body but keep their name so that
    /// dependents still resolve.
    pub fn build(ctx: &Arc<EngineContext>) -> Self {
        let prefix = ctx.config.effective_prefix();
        let mut descriptors = Vec::with_capacity(TASK_BASES.len());

        for base in TASK_BASES {
            let name = qualify(prefix, base);
            let depends_on: Vec<TaskName> = base_dependencies(base)
                .iter()
                .map(|dep| qualify(prefix, dep))
                .collect();

            let body = if ctx.exclusions.contains(&name) {
                debug!(task = %name, "registering exclusion stub");
                stub_body(name.clone(), ctx.config.warn_exclusions)
            } else {
                base_body(ctx, base)
            };

            descriptors.push(TaskDescriptor {
                name,
                depends_on,
                body,
            });
        }

        Self {
            descriptors,
            excluded: (*ctx.exclusions).clone(),
        }
    }

    /// Validate the graph and hand every descriptor to the scheduler.
    pub fn mount(&self, scheduler: &dyn Scheduler) -> Result<()> {
        self.validate()?;
        for descriptor in &self.descriptors {
            scheduler.define_task(descriptor.clone())?;
        }
        Ok(())
    }

    /// Effective registration plan, in declaration order.
    pub fn plan(&self) -> Vec<PlanEntry> {
        self.descriptors
            .iter()
            .map(|d| PlanEntry {
                name: d.name.clone(),
                depends_on: d.depends_on.clone(),
                excluded: self.excluded.contains(&d.name),
            })
            .collect()
    }

    /// Every referenced dependency must itself be a declared name (real or
    /// stub), and the dependency edges must form a DAG.
    fn validate(&self) -> Result<()> {
        let names: HashSet<&str> = self.descriptors.iter().map(|d| d.name.as_str()).collect();

        for descriptor in &self.descriptors {
            for dep in &descriptor.depends_on {
                if !names.contains(dep.as_str()) {
                    return Err(DevrigError::DanglingDependency {
                        task: descriptor.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        // Edge direction: dep -> task. A topological sort fails on a cycle.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for descriptor in &self.descriptors {
            graph.add_node(descriptor.name.as_str());
        }
        for descriptor in &self.descriptors {
            for dep in &descriptor.depends_on {
                graph.add_edge(dep.as_str(), descriptor.name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(DevrigError::TaskCycle(format!(
                "cycle involving task '{}'",
                cycle.node_id()
            ))),
        }
    }
}

/// Upstream dependencies for a base task name.
fn base_dependencies(base: &str) -> &'static [&'static str] {
    match base {
        "scripts" | "test" => &["lint"],
        "build" => &["html", "styles", "scripts", "images"],
        _ => &[],
    }
}

/// Body for a base task name, capturing the engine context.
fn base_body(ctx: &Arc<EngineContext>, base: &str) -> TaskBody {
    match base {
        "html" => body_from(ctx, crate::pipeline::markup::run),
        "lint" => body_from(ctx, crate::pipeline::lint::run),
        "scripts" => body_from(ctx, crate::pipeline::scripts::run),
        "styles" => body_from(ctx, crate::pipeline::styles::run),
        "images" => body_from(ctx, crate::pipeline::images::run),
        "server" => body_from(ctx, crate::dev::server::run_server),
        "demon" => body_from(ctx, crate::dev::server::run_demon),
        "dev" => body_from(ctx, |ctx| DevSupervisor::new(ctx).run()),
        "test" => body_from(ctx, crate::pipeline::testing::run_test),
        "autotest" => body_from(ctx, crate::pipeline::testing::run_autotest),
        "docs" => body_from(ctx, crate::pipeline::docs::run_docs),
        "changelog" => body_from(ctx, crate::pipeline::docs::run_changelog),
        // `build` (and anything unknown) is a pure aggregation: only its
        // dependency edges matter.
        _ => aggregation_body(),
    }
}

fn body_from<F, Fut>(ctx: &Arc<EngineContext>, run: F) -> TaskBody
where
    F: Fn(Arc<EngineContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<TaskExit>> + Send + 'static,
{
    let ctx = Arc::clone(ctx);
    Arc::new(move || -> TaskFuture { Box::pin(run(Arc::clone(&ctx))) })
}

/// `build` fan-in: depends on the four category pipelines and has no body
/// of its own.
fn aggregation_body() -> TaskBody {
    Arc::new(|| -> TaskFuture { Box::pin(async { Ok(TaskExit::Completed) }) })
}
