// src/registry/exclusion.rs

//! Exclusion set computation and excluded-task stubs.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::config::model::Configuration;
use crate::registry::descriptor::{qualify, TaskBody, TaskExit, TaskFuture, TaskName};

/// The set of task names suppressed from real execution.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    names: HashSet<TaskName>,
}

impl ExclusionSet {
    /// Compute the exclusion set from the resolved configuration.
    ///
    /// `exclude` always wins over `only`: when `exclude` is present, even
    /// as an explicitly empty list, `only` is ignored. `exclude` entries
    /// are taken as given (the caller qualifies them when a prefix is in
    /// play), while `only` entries are base names mapped through the prefix
    /// before the complement of `all_bases` is taken.
    pub fn from_config(cfg: &Configuration, all_bases: &[&str]) -> Self {
        let prefix = cfg.effective_prefix();

        let names = match (&cfg.exclude, &cfg.only) {
            (Some(exclude), _) => exclude.iter().cloned().collect(),
            (None, Some(only)) => {
                let keep: HashSet<TaskName> =
                    only.iter().map(|base| qualify(prefix, base)).collect();
                all_bases
                    .iter()
                    .map(|base| qualify(prefix, base))
                    .filter(|name| !keep.contains(name))
                    .collect()
            }
            (None, None) => HashSet::new(),
        };

        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }
}

/// Body registered in place of an excluded task.
///
/// Never invokes the real body and never fails. Dependents keep referencing
/// the name, they just depend on this no-op. When `warn_exclusions` is set,
/// each invocation emits exactly one human-readable warning.
pub fn stub_body(name: TaskName, warn_exclusions: bool) -> TaskBody {
    Arc::new(move || -> TaskFuture {
        let name = name.clone();
        Box::pin(async move {
            if warn_exclusions {
                warn!(task = %name, "task is excluded from this instance; skipping");
            }
            Ok(TaskExit::Completed)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASES: [&str; 3] = ["html", "scripts", "build"];

    fn config(exclude: Option<Vec<&str>>, only: Option<Vec<&str>>) -> Configuration {
        Configuration {
            exclude: exclude.map(|v| v.into_iter().map(String::from).collect()),
            only: only.map(|v| v.into_iter().map(String::from).collect()),
            ..Configuration::default()
        }
    }

    #[test]
    fn no_overrides_means_nothing_excluded() {
        let set = ExclusionSet::from_config(&config(None, None), &BASES);
        assert!(set.is_empty());
    }

    #[test]
    fn exclude_wins_over_only() {
        let set = ExclusionSet::from_config(&config(Some(vec!["html"]), Some(vec!["scripts"])), &BASES);
        assert!(set.contains("html"));
        // `only` was ignored entirely: nothing else is suppressed.
        assert!(!set.contains("build"));
        assert!(!set.contains("scripts"));
    }

    #[test]
    fn explicit_empty_exclude_still_disables_only() {
        let set = ExclusionSet::from_config(&config(Some(vec![]), Some(vec!["scripts"])), &BASES);
        assert!(set.is_empty());
    }

    #[test]
    fn only_suppresses_the_complement() {
        let set = ExclusionSet::from_config(&config(None, Some(vec!["scripts"])), &BASES);
        assert!(set.contains("html"));
        assert!(set.contains("build"));
        assert!(!set.contains("scripts"));
    }

    #[test]
    fn only_entries_are_qualified_through_the_prefix() {
        let mut cfg = config(None, Some(vec!["scripts"]));
        cfg.prefix = Some("site".to_string());
        let set = ExclusionSet::from_config(&cfg, &BASES);
        assert!(set.contains("site_html"));
        assert!(!set.contains("site_scripts"));
    }

    #[tokio::test]
    async fn stub_completes_without_invoking_anything() {
        let stub = stub_body("html".to_string(), true);
        assert_eq!(stub().await.unwrap(), TaskExit::Completed);
        // Invoking twice is just as harmless.
        assert_eq!(stub().await.unwrap(), TaskExit::Completed);
    }
}
