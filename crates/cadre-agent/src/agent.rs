use crate::behavior::AgentBehavior;
use cadre_core::{
    require_non_empty, running_mean, CadreError, CadreResult, Payload, Telemetry,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Default number of task-history entries an agent keeps.
pub const DEFAULT_TASK_HISTORY_LIMIT: usize = 100;

/// Number of history entries included in a performance report.
const RECENT_TASKS_IN_REPORT: usize = 5;

/// Running performance statistics for one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub tasks_completed: u64,
    pub success_rate: f64,
    /// Mean processing time in seconds.
    pub average_processing_time: f64,
    pub last_task_time: Option<DateTime<Utc>>,
}

/// The task an agent is currently working on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentTask {
    pub task_id: Uuid,
    pub data: Payload,
    pub started_at: DateTime<Utc>,
}

/// One completed (or abandoned) task in an agent's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHistoryEntry {
    pub task_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub input: Payload,
    pub output: Payload,
    pub success: bool,
    /// Seconds between assignment and completion.
    pub processing_time: f64,
}

/// Snapshot returned by [`Agent::performance_report`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReport {
    pub name: String,
    pub department: String,
    pub role: String,
    pub is_busy: bool,
    pub metrics: AgentMetrics,
    pub recent_tasks: Vec<TaskHistoryEntry>,
}

/// A stateful worker.
///
/// Busy-ness is derived from the presence of a current task, so an agent can
/// never hold more than one task at a time.
pub struct Agent {
    name: String,
    department: String,
    role: String,
    skills: HashMap<String, f64>,
    knowledge_base: HashMap<String, serde_json::Value>,
    current_task: Option<CurrentTask>,
    metrics: AgentMetrics,
    task_history: VecDeque<TaskHistoryEntry>,
    history_limit: usize,
    behavior: Option<Arc<dyn AgentBehavior>>,
    telemetry: Telemetry,
}

impl Agent {
    /// Create an agent. Name, department and role must be non-empty.
    pub fn new(
        name: impl Into<String>,
        department: impl Into<String>,
        role: impl Into<String>,
    ) -> CadreResult<Self> {
        let name = name.into();
        let department = department.into();
        let role = role.into();
        require_non_empty(&name, "Agent name")?;
        require_non_empty(&department, "Department")?;
        require_non_empty(&role, "Role")?;

        let telemetry = Telemetry::new("agent", &name, &department);
        {
            let _span = telemetry.enter();
            info!(role = %role, "Initializing agent");
        }

        Ok(Self {
            name,
            department,
            role,
            skills: HashMap::new(),
            knowledge_base: HashMap::new(),
            current_task: None,
            metrics: AgentMetrics::default(),
            task_history: VecDeque::new(),
            history_limit: DEFAULT_TASK_HISTORY_LIMIT,
            behavior: None,
            telemetry,
        })
    }

    pub fn with_behavior(mut self, behavior: Arc<dyn AgentBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    pub fn with_skills(mut self, skills: HashMap<String, f64>) -> Self {
        self.skills = skills
            .into_iter()
            .map(|(skill, level)| (skill, level.clamp(0.0, 1.0)))
            .collect();
        self
    }

    pub fn with_knowledge(mut self, knowledge: HashMap<String, serde_json::Value>) -> Self {
        self.knowledge_base = knowledge;
        self
    }

    /// Bound the task history; a limit of zero keeps no history.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self.trim_history();
        self
    }

    /// Replace the telemetry handle, e.g. with a child of the owning manager's.
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn metrics(&self) -> &AgentMetrics {
        &self.metrics
    }

    pub fn current_task(&self) -> Option<&CurrentTask> {
        self.current_task.as_ref()
    }

    pub fn task_history(&self) -> impl Iterator<Item = &TaskHistoryEntry> {
        self.task_history.iter()
    }

    pub fn is_busy(&self) -> bool {
        self.current_task.is_some()
    }

    pub fn is_available(&self) -> bool {
        !self.is_busy()
    }

    /// Shared handle to the collaborator, for running work outside a lock.
    pub fn behavior(&self) -> Option<Arc<dyn AgentBehavior>> {
        self.behavior.clone()
    }

    /// Delegate domain work to the injected behaviour.
    pub async fn process(&self, input: &Payload) -> CadreResult<Payload> {
        let behavior = self.behavior.clone().ok_or_else(|| {
            CadreError::Agent(format!("Agent {} has no behavior configured", self.name))
        })?;
        behavior.process(input).await
    }

    // --- Lifecycle ---

    /// Bind a task to this agent. Returns `false` when the agent is busy.
    pub fn assign_task(&mut self, task_id: Uuid, data: Payload) -> bool {
        let _span = self.telemetry.enter();
        if let Some(current) = &self.current_task {
            warn!(
                task_id = %task_id,
                current_task = %current.task_id,
                "Cannot assign task to busy agent"
            );
            return false;
        }

        self.current_task = Some(CurrentTask {
            task_id,
            data,
            started_at: Utc::now(),
        });
        info!(task_id = %task_id, "Assigned task");
        true
    }

    /// Finish the current task, record history and metrics, and free the agent.
    ///
    /// Returns the processing time in seconds, or `None` (logged) when the
    /// agent does not hold `task_id`.
    pub fn complete_task(&mut self, task_id: Uuid, result: Payload, success: bool) -> Option<f64> {
        let holds_task = self
            .current_task
            .as_ref()
            .is_some_and(|current| current.task_id == task_id);
        if !holds_task {
            let _span = self.telemetry.enter();
            error!(task_id = %task_id, "Cannot complete task not assigned to this agent");
            return None;
        }

        let current = self.current_task.take()?;
        let processing_time = (Utc::now() - current.started_at)
            .to_std()
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or(0.0);

        self.log_task(task_id, current.data, result, success, processing_time);
        self.record_metrics(success, processing_time);

        let _span = self.telemetry.enter();
        info!(task_id = %task_id, success, processing_time, "Completed task");
        Some(processing_time)
    }

    /// Fold one task outcome into the running metrics.
    pub fn update_metrics(&mut self, success: bool, processing_time: f64) -> CadreResult<()> {
        if processing_time < 0.0 || processing_time.is_nan() {
            return Err(CadreError::validation(
                "Processing time cannot be negative",
            ));
        }
        self.record_metrics(success, processing_time);
        Ok(())
    }

    fn record_metrics(&mut self, success: bool, processing_time: f64) {
        let n = self.metrics.tasks_completed;
        let sample = if success { 1.0 } else { 0.0 };
        self.metrics.success_rate = running_mean(self.metrics.success_rate, n, sample);
        self.metrics.average_processing_time =
            running_mean(self.metrics.average_processing_time, n, processing_time);
        self.metrics.tasks_completed = n + 1;
        self.metrics.last_task_time = Some(Utc::now());
    }

    fn log_task(
        &mut self,
        task_id: Uuid,
        input: Payload,
        output: Payload,
        success: bool,
        processing_time: f64,
    ) {
        self.task_history.push_back(TaskHistoryEntry {
            task_id,
            timestamp: Utc::now(),
            input,
            output,
            success,
            processing_time,
        });
        self.trim_history();
    }

    fn trim_history(&mut self) {
        while self.task_history.len() > self.history_limit {
            self.task_history.pop_front();
        }
    }

    pub fn performance_report(&self) -> AgentReport {
        let skip = self.task_history.len().saturating_sub(RECENT_TASKS_IN_REPORT);
        AgentReport {
            name: self.name.clone(),
            department: self.department.clone(),
            role: self.role.clone(),
            is_busy: self.is_busy(),
            metrics: self.metrics.clone(),
            recent_tasks: self.task_history.iter().skip(skip).cloned().collect(),
        }
    }

    // --- Skills ---

    pub fn skills(&self) -> &HashMap<String, f64> {
        &self.skills
    }

    /// Proficiency in `skill`, 0.0 when the agent lacks it.
    pub fn get_skill_proficiency(&self, skill: &str) -> CadreResult<f64> {
        require_non_empty(skill, "Skill name")?;
        Ok(self.skills.get(skill).copied().unwrap_or(0.0))
    }

    /// Raise proficiency by `improvement`, capped at 1.0.
    pub fn improve_skill(&mut self, skill: &str, improvement: f64) -> CadreResult<()> {
        require_non_empty(skill, "Skill name")?;
        if !(0.0..=1.0).contains(&improvement) {
            return Err(CadreError::validation(
                "Improvement must be between 0 and 1",
            ));
        }

        let _span = self.telemetry.enter();
        match self.skills.get_mut(skill) {
            Some(level) => {
                let before = *level;
                *level = (before + improvement).min(1.0);
                info!(skill, before, after = *level, "Improved skill");
            }
            None => {
                let level = improvement.min(1.0);
                self.skills.insert(skill.to_string(), level);
                info!(skill, level, "Added new skill");
            }
        }
        Ok(())
    }

    // --- Knowledge base ---

    pub fn add_to_knowledge_base(&mut self, key: &str, value: serde_json::Value) -> CadreResult<()> {
        require_non_empty(key, "Knowledge key")?;
        self.knowledge_base.insert(key.to_string(), value);
        let _span = self.telemetry.enter();
        info!(key, "Added knowledge");
        Ok(())
    }

    pub fn get_from_knowledge_base(&self, key: &str) -> CadreResult<Option<&serde_json::Value>> {
        require_non_empty(key, "Knowledge key")?;
        Ok(self.knowledge_base.get(key))
    }

    pub fn knowledge_base(&self) -> &HashMap<String, serde_json::Value> {
        &self.knowledge_base
    }

    /// Pick one option with probability proportional to its weight.
    ///
    /// Falls back to the first option when the weights do not sum to a
    /// positive number.
    pub fn make_decision<R: Rng + ?Sized>(
        &self,
        options: &[(&str, f64)],
        rng: &mut R,
    ) -> CadreResult<String> {
        let (first, _) = options
            .first()
            .ok_or_else(|| CadreError::validation("Options list cannot be empty"))?;

        let total: f64 = options.iter().map(|(_, weight)| weight).sum();
        if total <= 0.0 || !total.is_finite() {
            return Ok((*first).to_string());
        }

        let roll: f64 = rng.gen();
        let mut cumulative = 0.0;
        for (option, weight) in options {
            cumulative += weight / total;
            if roll < cumulative {
                return Ok((*option).to_string());
            }
        }
        Ok(options[options.len() - 1].0.to_string())
    }
}

impl std::fmt::Display for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) - {} Department", self.name, self.role, self.department)
    }
}
