use crate::config::TriggerRules;
use std::collections::BTreeSet;
use std::fmt;

/// How the hosting platform started this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Push,
    Manual,
}

#[derive(Debug)]
pub struct UnknownTriggerKind(String);

impl std::error::Error for UnknownTriggerKind {}
impl fmt::Display for UnknownTriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown trigger kind: {}", self.0)
    }
}

impl TriggerKind {
    /// Accepts the platform's literal event names next to the generic ones.
    pub fn parse(s: &str) -> Result<Self, UnknownTriggerKind> {
        match s.trim() {
            "push" => Ok(TriggerKind::Push),
            "manual" | "workflow_dispatch" => Ok(TriggerKind::Manual),
            other => Err(UnknownTriggerKind(other.to_string())),
        }
    }
}

/// Repository occurrence that may start the pipeline. Created once per run
/// from the environment the hosting platform provides, then only read.
#[derive(Debug, Clone)]
pub struct Event {
    pub trigger_kind: TriggerKind,
    pub branch: String,
    pub changed_paths: BTreeSet<String>,
}

impl Event {
    pub fn new(trigger_kind: TriggerKind, branch: &str, changed_paths: BTreeSet<String>) -> Self {
        Self {
            trigger_kind,
            branch: branch.to_string(),
            changed_paths,
        }
    }

    /// Changed paths arrive as one whitespace separated list, the shape a CI
    /// diff step naturally produces.
    pub fn parse_changed_paths(raw: &str) -> BTreeSet<String> {
        raw.split_whitespace().map(str::to_string).collect()
    }

    /// The gate in front of everything else. Manual triggers always pass;
    /// pushes pass only on the configured branch with at least one changed
    /// path under the configured prefix. Pure evaluation, cannot fail.
    pub fn should_deploy(&self, rules: &TriggerRules) -> bool {
        match self.trigger_kind {
            TriggerKind::Manual => true,
            TriggerKind::Push => {
                self.branch == rules.branch
                    && self
                        .changed_paths
                        .iter()
                        .any(|path| path.starts_with(&rules.path_prefix))
            }
        }
    }
}
