//! Declarative agent/task configuration for the analysis step.
//!
//! An *agent* is a persona (role, goal, backstory); a *task* is a piece of
//! work (description, expected output) assigned to one agent. Both live in
//! YAML files, `agents.yaml` and `tasks.yaml`, so prompts can be tuned
//! without recompiling. Copies of both are embedded in the binary and used
//! unless a directory override is supplied.
//!
//! Templates may contain `{name}` placeholders. They are filled in a single
//! pass by [`interpolate`], so text substituted into a template (such as a
//! document that itself contains `{braces}`) is never expanded again.

use crate::error::BriefError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Embedded default agents.
pub const DEFAULT_AGENTS_YAML: &str = include_str!("../config/agents.yaml");

/// Embedded default tasks.
pub const DEFAULT_TASKS_YAML: &str = include_str!("../config/tasks.yaml");

/// Task run when none is selected explicitly.
pub const DEFAULT_TASK: &str = "research_task";

const DEFAULT_AGENT: &str = "researcher";

/// A persona handed to the model as its system prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

/// A unit of work assigned to one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub description: String,
    pub expected_output: String,
    #[serde(default = "default_agent")]
    pub agent: String,
}

fn default_agent() -> String {
    DEFAULT_AGENT.to_string()
}

/// The full crew: every known agent and task plus the task to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrewConfig {
    pub agents: BTreeMap<String, AgentSpec>,
    pub tasks: BTreeMap<String, TaskSpec>,
    /// Name of the task executed for each document.
    pub task: String,
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self::from_yaml(DEFAULT_AGENTS_YAML, DEFAULT_TASKS_YAML)
            .expect("embedded crew config must parse")
    }
}

impl CrewConfig {
    /// Parse agents and tasks from YAML source text.
    pub fn from_yaml(agents_yaml: &str, tasks_yaml: &str) -> Result<Self, BriefError> {
        let agents = serde_yaml::from_str(agents_yaml).map_err(|e| BriefError::ConfigLoad {
            path: "agents.yaml".into(),
            detail: e.to_string(),
        })?;
        let tasks = serde_yaml::from_str(tasks_yaml).map_err(|e| BriefError::ConfigLoad {
            path: "tasks.yaml".into(),
            detail: e.to_string(),
        })?;
        Ok(Self {
            agents,
            tasks,
            task: DEFAULT_TASK.to_string(),
        })
    }

    /// Load `agents.yaml` and `tasks.yaml` from `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, BriefError> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|e| BriefError::ConfigLoad {
                path: path.clone(),
                detail: e.to_string(),
            })
        };
        let agents_yaml = read("agents.yaml")?;
        let tasks_yaml = read("tasks.yaml")?;

        Self::from_yaml(&agents_yaml, &tasks_yaml).map_err(|e| match e {
            BriefError::ConfigLoad { path, detail } => BriefError::ConfigLoad {
                path: dir.join(path),
                detail,
            },
            other => other,
        })
    }

    /// Select a different task by name.
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    /// The selected task and the agent assigned to it.
    pub fn selected(&self) -> Result<(&AgentSpec, &TaskSpec), BriefError> {
        let task = self.tasks.get(&self.task).ok_or_else(|| {
            BriefError::InvalidConfig(format!(
                "task '{}' not found (known tasks: {})",
                self.task,
                join_keys(&self.tasks)
            ))
        })?;
        let agent = self.agents.get(&task.agent).ok_or_else(|| {
            BriefError::InvalidConfig(format!(
                "task '{}' is assigned to unknown agent '{}' (known agents: {})",
                self.task,
                task.agent,
                join_keys(&self.agents)
            ))
        })?;
        Ok((agent, task))
    }

    /// Check the selection resolves and every template only uses `{document}`.
    pub fn validate(&self) -> Result<(), BriefError> {
        let (agent, task) = self.selected()?;
        let probe = [("document", "")];
        for template in [
            &agent.role,
            &agent.goal,
            &agent.backstory,
            &task.description,
            &task.expected_output,
        ] {
            interpolate(template, &probe)?;
        }
        Ok(())
    }

    /// Serialise back to `(agents.yaml, tasks.yaml)`.
    pub fn to_yaml(&self) -> Result<(String, String), BriefError> {
        let to_internal = |e: serde_yaml::Error| BriefError::Internal(e.to_string());
        Ok((
            serde_yaml::to_string(&self.agents).map_err(to_internal)?,
            serde_yaml::to_string(&self.tasks).map_err(to_internal)?,
        ))
    }
}

fn join_keys<V>(map: &BTreeMap<String, V>) -> String {
    map.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

static RE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Replace `{name}` placeholders in `template` with values from `inputs`.
///
/// Single pass: substituted values are copied verbatim. A placeholder with no
/// matching input is an error rather than being left in the prompt.
pub fn interpolate(template: &str, inputs: &[(&str, &str)]) -> Result<String, BriefError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in RE_PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let name = &caps[1];
        let value = inputs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| BriefError::UnknownTemplateVariable {
                name: name.to_string(),
            })?;

        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}
