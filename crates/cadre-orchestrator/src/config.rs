use cadre_core::{CadreError, CadreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Where a rejected task re-enters the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequeuePolicy {
    /// Append to the end of the queue regardless of the bumped priority.
    #[default]
    Tail,
    /// Re-insert by the bumped priority, behind existing equal priorities.
    Priority,
}

/// How a completed task finds a QA agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaDispatch {
    /// Pick one QA agent uniformly at random; if it is busy, wait for a retry.
    #[default]
    RandomOnly,
    /// Pick at random, then fall back to the first available QA agent.
    RandomThenFallback,
}

/// Organization settings, usually read from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_department")]
    pub department: String,
    /// Proficiency every required skill must reach.
    #[serde(default = "default_min_proficiency")]
    pub min_proficiency: f64,
    #[serde(default = "default_task_history_limit")]
    pub task_history_limit: usize,
    #[serde(default = "default_max_review_history")]
    pub max_review_history: usize,
    #[serde(default = "default_approval_threshold")]
    pub approval_threshold: f64,
    #[serde(default = "default_action_item_probability")]
    pub action_item_probability: f64,
    #[serde(default)]
    pub requeue_policy: RequeuePolicy,
    #[serde(default)]
    pub qa_dispatch: QaDispatch,
    /// Deadline for one delegated collaborator call.
    #[serde(default = "default_task_deadline_secs")]
    pub task_deadline_secs: u64,
    #[serde(default = "default_cleanup_days")]
    pub cleanup_days: i64,
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_name() -> String {
    "Manager".to_string()
}

fn default_department() -> String {
    "General".to_string()
}

fn default_min_proficiency() -> f64 {
    0.7
}

fn default_task_history_limit() -> usize {
    cadre_agent::agent::DEFAULT_TASK_HISTORY_LIMIT
}

fn default_max_review_history() -> usize {
    cadre_qa::DEFAULT_MAX_REVIEW_HISTORY
}

fn default_approval_threshold() -> f64 {
    cadre_qa::DEFAULT_APPROVAL_THRESHOLD
}

fn default_action_item_probability() -> f64 {
    0.7
}

fn default_task_deadline_secs() -> u64 {
    300
}

fn default_cleanup_days() -> i64 {
    30
}

impl Default for OrgConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            department: default_department(),
            min_proficiency: default_min_proficiency(),
            task_history_limit: default_task_history_limit(),
            max_review_history: default_max_review_history(),
            approval_threshold: default_approval_threshold(),
            action_item_probability: default_action_item_probability(),
            requeue_policy: RequeuePolicy::default(),
            qa_dispatch: QaDispatch::default(),
            task_deadline_secs: default_task_deadline_secs(),
            cleanup_days: default_cleanup_days(),
            rng_seed: None,
        }
    }
}

impl OrgConfig {
    /// Defaults with a manager name and department.
    pub fn named(name: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            department: department.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> CadreResult<Self> {
        let config: OrgConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub async fn load(path: impl AsRef<Path>) -> CadreResult<Self> {
        let path = path.as_ref();
        let source = tokio::fs::read_to_string(path).await.map_err(|e| {
            CadreError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> CadreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CadreError::validation("Manager name is required"));
        }
        if self.department.trim().is_empty() {
            return Err(CadreError::validation("Department is required"));
        }
        if !(0.0..=1.0).contains(&self.min_proficiency) {
            return Err(CadreError::validation(
                "min_proficiency must be between 0 and 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.approval_threshold) {
            return Err(CadreError::validation(
                "approval_threshold must be between 0 and 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.action_item_probability) {
            return Err(CadreError::validation(
                "action_item_probability must be between 0 and 1",
            ));
        }
        if self.max_review_history == 0 {
            return Err(CadreError::validation(
                "max_review_history must be at least 1",
            ));
        }
        if self.task_deadline_secs == 0 {
            return Err(CadreError::validation(
                "task_deadline_secs must be at least 1",
            ));
        }
        if self.cleanup_days < 0 {
            return Err(CadreError::validation("cleanup_days cannot be negative"));
        }
        Ok(())
    }

    pub fn task_deadline(&self) -> Duration {
        Duration::from_secs(self.task_deadline_secs)
    }
}
