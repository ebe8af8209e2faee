use crate::config::{OrgConfig, QaDispatch, RequeuePolicy};
use crate::matcher::CapabilityMatcher;
use crate::meeting::{ActionItem, DecisionGenerator, MeetingDecision, MeetingMinutes, PlainDecisions};
use crate::task_queue::TaskStore;
use crate::types::{AssignmentOutcome, DispatchOutcome, ManagerMetrics, QaStatus, Task, TaskStatus};
use cadre_agent::{result_status, Agent, AgentBehavior, AgentReport};
use cadre_core::{
    payload, require_non_empty, running_mean, CadreError, CadreResult, Payload, Telemetry,
};
use cadre_qa::{QaAgent, QaReport, ReviewDecision, ReviewRecord};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Snapshot returned by [`Manager::get_team_performance_report`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamReport {
    pub manager: String,
    pub department: String,
    pub metrics: ManagerMetrics,
    pub agents: HashMap<Uuid, AgentReport>,
    pub qa_agents: HashMap<Uuid, QaReport>,
    pub pending_tasks: usize,
    pub assigned_tasks: usize,
    pub completed_tasks: usize,
    pub approved_tasks: usize,
    pub rejected_tasks: usize,
}

/// Everything needed to run an assigned task without holding the manager.
pub(crate) struct PreparedExecution {
    pub agent_id: Uuid,
    pub behavior: Arc<dyn AgentBehavior>,
    pub input: Payload,
}

/// Owns a team of agents and QA agents and drives tasks through
/// assignment, completion and review.
///
/// Every method is synchronous bookkeeping; share a manager between tasks
/// through [`crate::Engine`], which serialises access behind one lock.
pub struct Manager {
    name: String,
    department: String,
    config: OrgConfig,
    agents: HashMap<Uuid, Agent>,
    agent_order: Vec<Uuid>,
    qa_agents: HashMap<Uuid, QaAgent>,
    qa_order: Vec<Uuid>,
    store: TaskStore,
    matcher: Arc<dyn CapabilityMatcher>,
    decisions: Arc<dyn DecisionGenerator>,
    team_knowledge: HashMap<String, Value>,
    team_skills: HashMap<String, f64>,
    metrics: ManagerMetrics,
    rng: StdRng,
    telemetry: Telemetry,
}

impl Manager {
    pub fn new(config: OrgConfig, matcher: Arc<dyn CapabilityMatcher>) -> CadreResult<Self> {
        config.validate()?;
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let telemetry = Telemetry::new("manager", &config.name, &config.department);
        {
            let _span = telemetry.enter();
            info!("Initializing manager");
        }

        Ok(Self {
            name: config.name.clone(),
            department: config.department.clone(),
            config,
            agents: HashMap::new(),
            agent_order: Vec::new(),
            qa_agents: HashMap::new(),
            qa_order: Vec::new(),
            store: TaskStore::new(),
            matcher,
            decisions: Arc::new(PlainDecisions),
            team_knowledge: HashMap::new(),
            team_skills: HashMap::new(),
            metrics: ManagerMetrics::default(),
            rng,
            telemetry,
        })
    }

    pub fn with_decision_generator(mut self, decisions: Arc<dyn DecisionGenerator>) -> Self {
        self.decisions = decisions;
        self
    }

    /// Replace the random source used for QA selection and meetings.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn department(&self) -> &str {
        &self.department
    }

    pub fn config(&self) -> &OrgConfig {
        &self.config
    }

    pub fn metrics(&self) -> &ManagerMetrics {
        &self.metrics
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    // --- Team ---

    /// Adopt an agent. Returns its generated id.
    pub fn add_agent(&mut self, agent: Agent) -> Uuid {
        let id = Uuid::new_v4();
        let telemetry = self
            .telemetry
            .child("agent", agent.name(), agent.department());
        let agent = agent
            .with_telemetry(telemetry)
            .with_history_limit(self.config.task_history_limit);

        let _span = self.telemetry.enter();
        info!(agent = %agent.name(), agent_id = %id, "Added agent to team");
        self.agents.insert(id, agent);
        self.agent_order.push(id);
        id
    }

    /// Adopt a QA agent; the manager's review-history cap and approval
    /// threshold apply to it from now on.
    pub fn add_qa_agent(&mut self, qa_agent: QaAgent) -> Uuid {
        let id = Uuid::new_v4();
        let telemetry = self
            .telemetry
            .child("qa_agent", qa_agent.name(), qa_agent.agent().department());
        let qa_agent = qa_agent
            .with_telemetry(telemetry)
            .with_max_review_history(self.config.max_review_history)
            .with_approval_threshold(self.config.approval_threshold);

        let _span = self.telemetry.enter();
        info!(qa_agent = %qa_agent.name(), qa_agent_id = %id, "Added QA agent to team");
        self.qa_agents.insert(id, qa_agent);
        self.qa_order.push(id);
        id
    }

    /// Remove an agent. A task it was holding goes back to pending.
    pub fn remove_agent(&mut self, agent_id: Uuid) -> bool {
        let Some(agent) = self.agents.remove(&agent_id) else {
            return false;
        };
        self.agent_order.retain(|id| *id != agent_id);
        if let Some(current) = agent.current_task() {
            if let Some(task) = self.store.get_mut(current.task_id) {
                task.release();
            }
        }

        let _span = self.telemetry.enter();
        info!(agent = %agent.name(), "Removed agent from team");
        true
    }

    /// Remove a QA agent. A review it was holding goes back to QA pending.
    pub fn remove_qa_agent(&mut self, qa_agent_id: Uuid) -> bool {
        let Some(qa_agent) = self.qa_agents.remove(&qa_agent_id) else {
            return false;
        };
        self.qa_order.retain(|id| *id != qa_agent_id);
        if let Some(current) = qa_agent.agent().current_task() {
            if let Some(task) = self.store.get_mut(current.task_id) {
                task.qa_status = QaStatus::Pending;
                task.qa_reviewer = None;
            }
        }

        let _span = self.telemetry.enter();
        info!(qa_agent = %qa_agent.name(), "Removed QA agent from team");
        true
    }

    pub fn get_agent(&self, agent_id: Uuid) -> Option<&Agent> {
        self.agents.get(&agent_id)
    }

    pub fn get_agent_mut(&mut self, agent_id: Uuid) -> Option<&mut Agent> {
        self.agents.get_mut(&agent_id)
    }

    pub fn get_qa_agent(&self, qa_agent_id: Uuid) -> Option<&QaAgent> {
        self.qa_agents.get(&qa_agent_id)
    }

    pub fn get_qa_agent_mut(&mut self, qa_agent_id: Uuid) -> Option<&mut QaAgent> {
        self.qa_agents.get_mut(&qa_agent_id)
    }

    pub fn get_task(&self, task_id: Uuid) -> Option<&Task> {
        self.store.get(task_id)
    }

    /// Agent ids in the order they were added.
    pub fn agent_ids(&self) -> &[Uuid] {
        &self.agent_order
    }

    pub fn qa_agent_ids(&self) -> &[Uuid] {
        &self.qa_order
    }

    // --- Tasks ---

    /// Create a task and queue it by priority.
    ///
    /// `data` must be a JSON object and `priority` at least 1.
    pub fn create_task(&mut self, task_type: &str, data: Value, priority: i64) -> CadreResult<Uuid> {
        require_non_empty(task_type, "Task type")?;
        let Value::Object(data) = data else {
            return Err(CadreError::validation("Task data must be a JSON object"));
        };
        let priority = u32::try_from(priority)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| CadreError::validation("Priority must be a positive integer"))?;

        let id = self.store.insert(Task::new(task_type, data, priority));
        let _span = self.telemetry.enter();
        info!(task_id = %id, task_type, priority, "Created task");
        Ok(id)
    }

    /// Bind waiting tasks to capable, available agents in queue order.
    ///
    /// Rejected tasks count as waiting so they get reworked.
    pub fn assign_tasks(&mut self) -> Vec<AssignmentOutcome> {
        let telemetry = self.telemetry.clone();
        let _span = telemetry.enter();

        let waiting: Vec<Uuid> = self
            .store
            .queued_tasks()
            .filter(|t| t.status.awaits_assignment())
            .map(|t| t.id)
            .collect();
        if waiting.is_empty() {
            info!("No tasks to assign");
            return Vec::new();
        }

        let mut outcomes = Vec::with_capacity(waiting.len());
        for task_id in waiting {
            let Some(task) = self.store.get(task_id) else {
                continue;
            };
            let candidate = self.agent_order.iter().copied().find(|agent_id| {
                self.agents
                    .get(agent_id)
                    .is_some_and(|agent| agent.is_available() && self.matcher.can_handle(agent, task))
            });
            let Some(agent_id) = candidate else {
                warn!(task_id = %task_id, task_type = %task.task_type, "Could not find an available agent for task");
                outcomes.push(AssignmentOutcome::NoCapableAgent { task_id });
                continue;
            };

            let data = task.data.clone();
            let accepted = self
                .agents
                .get_mut(&agent_id)
                .is_some_and(|agent| agent.assign_task(task_id, data));
            if !accepted {
                warn!(task_id = %task_id, agent_id = %agent_id, "Agent refused task");
                outcomes.push(AssignmentOutcome::AgentRefused { task_id, agent_id });
                continue;
            }

            if let Some(task) = self.store.get_mut(task_id) {
                task.status = TaskStatus::Assigned;
                task.assigned_to = Some(agent_id);
                task.assigned_at = Some(Utc::now());
                task.result = None;
                task.qa_status = QaStatus::Pending;
                task.qa_reviewer = None;
            }
            self.metrics.tasks_assigned += 1;
            self.metrics.refresh_efficiency();

            info!(task_id = %task_id, agent_id = %agent_id, "Assigned task");
            outcomes.push(AssignmentOutcome::Assigned { task_id, agent_id });
        }
        outcomes
    }

    /// Record an agent's result for its task and hand the task to QA.
    pub fn complete_task(
        &mut self,
        agent_id: Uuid,
        task_id: Uuid,
        result: Payload,
    ) -> CadreResult<DispatchOutcome> {
        let task = self
            .store
            .get(task_id)
            .ok_or_else(|| CadreError::validation(format!("Task {task_id} not found")))?;
        if task.status != TaskStatus::Assigned || task.assigned_to != Some(agent_id) {
            return Err(CadreError::validation(format!(
                "Task {task_id} is not assigned to agent {agent_id}"
            )));
        }

        let agent = self
            .agents
            .get_mut(&agent_id)
            .ok_or_else(|| CadreError::validation(format!("Agent {agent_id} not found")))?;
        let success = result_status(&result).is_success();
        let processing_time = agent
            .complete_task(task_id, result.clone(), success)
            .ok_or_else(|| {
                CadreError::Agent(format!("Agent {agent_id} does not hold task {task_id}"))
            })?;

        let n = self.metrics.tasks_completed;
        self.metrics.average_completion_time =
            running_mean(self.metrics.average_completion_time, n, processing_time);
        self.metrics.tasks_completed = n + 1;
        self.metrics.refresh_efficiency();

        self.update_task_status(task_id, TaskStatus::Completed, Some(result))
    }

    /// Move a task along its lifecycle. Completing with a result records it
    /// and dispatches the task to QA.
    ///
    /// Only the moves allowed by [`TaskStatus::can_advance_to`] are
    /// accepted, and completion requires a result.
    pub(crate) fn update_task_status(
        &mut self,
        task_id: Uuid,
        status: TaskStatus,
        result: Option<Payload>,
    ) -> CadreResult<DispatchOutcome> {
        let telemetry = self.telemetry.clone();
        let _span = telemetry.enter();

        let task = self
            .store
            .get_mut(task_id)
            .ok_or_else(|| CadreError::validation(format!("Task {task_id} not found")))?;
        if !task.status.can_advance_to(status) {
            return Err(CadreError::validation(format!(
                "Task {task_id} cannot move from {} to {status}",
                task.status
            )));
        }

        match (status, result) {
            (TaskStatus::Completed, Some(result)) => {
                task.status = status;
                task.result = Some(result);
                task.completed_at = Some(Utc::now());
                task.qa_status = QaStatus::Pending;
                info!(task_id = %task_id, status = %status, "Updated task status");
                Ok(self.dispatch_review(task_id))
            }
            (TaskStatus::Completed, None) => Err(CadreError::validation(format!(
                "Completing task {task_id} requires a result"
            ))),
            _ => {
                task.status = status;
                info!(task_id = %task_id, status = %status, "Updated task status");
                Ok(DispatchOutcome::NotRequested)
            }
        }
    }

    /// Offer a completed task to the QA pool.
    fn dispatch_review(&mut self, task_id: Uuid) -> DispatchOutcome {
        if self.qa_order.is_empty() {
            info!(task_id = %task_id, "No QA agents to review task");
            return DispatchOutcome::NoQaAgents;
        }

        let picked = self.qa_order[self.rng.gen_range(0..self.qa_order.len())];
        let is_free = |id: &Uuid| self.qa_agents.get(id).is_some_and(QaAgent::is_available);
        let chosen = if is_free(&picked) {
            Some(picked)
        } else if self.config.qa_dispatch == QaDispatch::RandomThenFallback {
            self.qa_order.iter().copied().find(is_free)
        } else {
            None
        };
        let Some(qa_agent_id) = chosen else {
            info!(task_id = %task_id, qa_agent_id = %picked, "Selected QA agent is busy");
            return DispatchOutcome::QaBusy {
                qa_agent_id: picked,
            };
        };

        let (Some(task), Some(qa_agent)) = (
            self.store.get_mut(task_id),
            self.qa_agents.get_mut(&qa_agent_id),
        ) else {
            return DispatchOutcome::NotRequested;
        };

        let mut request = Payload::new();
        request.insert("task_data".into(), Value::Object(task.input()));
        request.insert(
            "result".into(),
            Value::Object(task.result.clone().unwrap_or_default()),
        );
        if !qa_agent.agent_mut().assign_task(task_id, request) {
            return DispatchOutcome::QaBusy { qa_agent_id };
        }

        task.qa_status = QaStatus::Assigned;
        task.qa_reviewer = Some(qa_agent_id);
        info!(task_id = %task_id, qa_agent = %qa_agent.name(), "Assigned task to QA agent");
        DispatchOutcome::Dispatched { qa_agent_id }
    }

    /// Retry QA dispatch for completed tasks still waiting on a reviewer.
    pub fn dispatch_pending_reviews(&mut self) -> Vec<(Uuid, DispatchOutcome)> {
        let telemetry = self.telemetry.clone();
        let _span = telemetry.enter();

        let waiting: Vec<Uuid> = self
            .store
            .queued_tasks()
            .filter(|t| {
                t.status == TaskStatus::Completed
                    && t.qa_status == QaStatus::Pending
                    && t.result.is_some()
            })
            .map(|t| t.id)
            .collect();

        waiting
            .into_iter()
            .map(|task_id| (task_id, self.dispatch_review(task_id)))
            .collect()
    }

    /// Run the bound QA agent's review and apply its decision.
    ///
    /// A failed review frees the QA agent, returns the task to QA pending
    /// and propagates the error.
    pub fn run_review(&mut self, task_id: Uuid) -> CadreResult<ReviewRecord> {
        let task = self
            .store
            .get(task_id)
            .ok_or_else(|| CadreError::validation(format!("Task {task_id} not found")))?;
        let (Some(qa_agent_id), QaStatus::Assigned) = (task.qa_reviewer, task.qa_status) else {
            return Err(CadreError::validation(format!(
                "Task {task_id} is not assigned for review"
            )));
        };
        let task_data = task.input();
        let result = task.result.clone().unwrap_or_default();

        let qa_agent = self
            .qa_agents
            .get_mut(&qa_agent_id)
            .ok_or_else(|| CadreError::validation(format!("QA agent {qa_agent_id} not found")))?;

        match qa_agent.review_task(task_id, &task_data, &result) {
            Ok(record) => {
                let qa_result = payload(serde_json::to_value(&record)?);
                self.update_qa_status(task_id, record.decision, qa_result)?;
                Ok(record)
            }
            Err(e) => {
                qa_agent.agent_mut().complete_task(
                    task_id,
                    payload(json!({"success": false, "error": e.to_string()})),
                    false,
                );
                if let Some(task) = self.store.get_mut(task_id) {
                    task.qa_status = QaStatus::Pending;
                    task.qa_reviewer = None;
                }
                let _span = self.telemetry.enter();
                error!(task_id = %task_id, error = %e, "QA review failed");
                Err(e)
            }
        }
    }

    /// Apply a QA verdict to a completed task.
    ///
    /// Rejection bumps the priority by one and requeues per the configured
    /// [`RequeuePolicy`]. The reviewing QA agent, if any, is released.
    pub fn update_qa_status(
        &mut self,
        task_id: Uuid,
        decision: ReviewDecision,
        qa_result: Payload,
    ) -> CadreResult<()> {
        let telemetry = self.telemetry.clone();
        let _span = telemetry.enter();

        let task = self
            .store
            .get_mut(task_id)
            .ok_or_else(|| CadreError::validation(format!("Task {task_id} not found")))?;
        if task.status != TaskStatus::Completed {
            return Err(CadreError::validation(format!(
                "Task {task_id} is not awaiting review"
            )));
        }

        if let Some(reviewer) = task.qa_reviewer.take() {
            if let Some(qa_agent) = self.qa_agents.get_mut(&reviewer) {
                let holds = qa_agent
                    .agent()
                    .current_task()
                    .is_some_and(|current| current.task_id == task_id);
                if holds {
                    let success = decision == ReviewDecision::Approved;
                    qa_agent
                        .agent_mut()
                        .complete_task(task_id, qa_result.clone(), success);
                }
            }
        }
        task.qa_result = Some(qa_result);

        match decision {
            ReviewDecision::Approved => {
                task.qa_status = QaStatus::Approved;
                task.status = TaskStatus::Approved;
                info!(task_id = %task_id, "Task approved");
            }
            ReviewDecision::Rejected => {
                task.qa_status = QaStatus::Rejected;
                task.status = TaskStatus::Rejected;
                task.priority = task.priority.saturating_add(1);
                let priority = task.priority;

                self.store.dequeue(task_id);
                match self.config.requeue_policy {
                    RequeuePolicy::Tail => self.store.enqueue_tail(task_id),
                    RequeuePolicy::Priority => self.store.enqueue_by_priority(task_id, priority),
                }
                info!(task_id = %task_id, priority, "Task rejected and requeued");
            }
        }
        Ok(())
    }

    /// Claim what the engine needs to run an assigned task outside the lock.
    ///
    /// `None` when the task is not (or no longer) assigned.
    pub(crate) fn prepare_execution(&mut self, task_id: Uuid) -> CadreResult<Option<PreparedExecution>> {
        let Some(task) = self.store.get(task_id) else {
            return Ok(None);
        };
        let (TaskStatus::Assigned, Some(agent_id)) = (task.status, task.assigned_to) else {
            return Ok(None);
        };
        let input = task.input();

        let behavior = self.agents.get(&agent_id).and_then(Agent::behavior);
        match behavior {
            Some(behavior) => Ok(Some(PreparedExecution {
                agent_id,
                behavior,
                input,
            })),
            None => {
                self.abandon_task(task_id, agent_id, "Agent has no behavior configured")?;
                Err(CadreError::Agent(format!(
                    "Agent {agent_id} has no behavior configured"
                )))
            }
        }
    }

    /// Whether `agent_id` still holds `task_id` as an assigned task.
    pub fn holds_assignment(&self, task_id: Uuid, agent_id: Uuid) -> bool {
        self.store
            .get(task_id)
            .is_some_and(|t| t.status == TaskStatus::Assigned && t.assigned_to == Some(agent_id))
    }

    /// Record `agent_id`'s unsuccessful attempt and put the task back to
    /// pending.
    ///
    /// Returns `false` and changes nothing when the task is no longer
    /// assigned to that agent.
    pub fn abandon_task(&mut self, task_id: Uuid, agent_id: Uuid, reason: &str) -> CadreResult<bool> {
        let telemetry = self.telemetry.clone();
        let _span = telemetry.enter();

        let task = self
            .store
            .get_mut(task_id)
            .ok_or_else(|| CadreError::validation(format!("Task {task_id} not found")))?;
        if task.status != TaskStatus::Assigned || task.assigned_to != Some(agent_id) {
            warn!(task_id = %task_id, agent_id = %agent_id, reason, "Ignoring failure from agent no longer assigned");
            return Ok(false);
        }
        task.release();

        if let Some(agent) = self.agents.get_mut(&agent_id) {
            agent.complete_task(
                task_id,
                payload(json!({"success": false, "error": reason})),
                false,
            );
        }

        warn!(task_id = %task_id, reason, "Task returned to pending");
        Ok(true)
    }

    // --- Knowledge and skills ---

    /// Store a team fact and copy it into every agent's knowledge base.
    pub fn update_team_knowledge(&mut self, key: &str, value: Value) -> CadreResult<()> {
        require_non_empty(key, "Knowledge key")?;
        self.team_knowledge.insert(key.to_string(), value.clone());
        for agent in self.agents.values_mut() {
            agent.add_to_knowledge_base(key, value.clone())?;
        }

        let _span = self.telemetry.enter();
        info!(key, agents = self.agents.len(), "Updated team knowledge");
        Ok(())
    }

    pub fn team_knowledge(&self) -> &HashMap<String, Value> {
        &self.team_knowledge
    }

    /// Raise a team skill (capped at 1.0) and the same skill on every agent.
    pub fn update_team_skills(&mut self, skill: &str, improvement: f64) -> CadreResult<()> {
        require_non_empty(skill, "Skill name")?;
        if !(0.0..=1.0).contains(&improvement) {
            return Err(CadreError::validation(
                "Improvement must be between 0 and 1",
            ));
        }

        let level = self.team_skills.entry(skill.to_string()).or_insert(0.0);
        *level = (*level + improvement).min(1.0);
        let level = *level;
        for agent in self.agents.values_mut() {
            agent.improve_skill(skill, improvement)?;
        }

        let _span = self.telemetry.enter();
        info!(skill, level, "Updated team skill");
        Ok(())
    }

    pub fn team_skills(&self) -> &HashMap<String, f64> {
        &self.team_skills
    }

    /// Discuss each agenda topic, recording a decision and sometimes an
    /// action item for a random agent due in one to seven days.
    pub fn hold_team_meeting(&mut self, agenda: &[&str]) -> CadreResult<MeetingMinutes> {
        if agenda.is_empty() {
            return Err(CadreError::validation("Agenda cannot be empty"));
        }
        let telemetry = self.telemetry.clone();
        let _span = telemetry.enter();
        info!(?agenda, "Starting team meeting");

        let now = Utc::now();
        let attendees = self
            .agent_order
            .iter()
            .filter_map(|id| self.agents.get(id).map(|a| a.name().to_string()))
            .chain(
                self.qa_order
                    .iter()
                    .filter_map(|id| self.qa_agents.get(id).map(|q| q.name().to_string())),
            )
            .collect();

        let mut decisions = Vec::with_capacity(agenda.len());
        let mut action_items = Vec::new();
        for topic in agenda {
            let decision = self.decisions.decide(topic, &mut self.rng);
            decisions.push(MeetingDecision {
                topic: (*topic).to_string(),
                decision,
            });

            if self.agent_order.is_empty() {
                continue;
            }
            if self.rng.gen_bool(self.config.action_item_probability) {
                let assigned_to = self.agent_order[self.rng.gen_range(0..self.agent_order.len())];
                let due_date = now + chrono::Duration::days(self.rng.gen_range(1..=7));
                action_items.push(ActionItem {
                    topic: (*topic).to_string(),
                    action: format!("Follow up on {topic}"),
                    assigned_to,
                    due_date,
                });
            }
        }

        info!(
            decisions = decisions.len(),
            action_items = action_items.len(),
            "Team meeting completed"
        );
        Ok(MeetingMinutes {
            date: now,
            attendees,
            agenda: agenda.iter().map(|t| (*t).to_string()).collect(),
            decisions,
            action_items,
        })
    }

    // --- Housekeeping and reporting ---

    /// Remove terminal tasks older than the configured `cleanup_days`.
    pub fn cleanup_expired_tasks(&mut self) -> CadreResult<usize> {
        self.cleanup_old_tasks(self.config.cleanup_days)
    }

    /// Remove terminal tasks created more than `days` days ago.
    pub fn cleanup_old_tasks(&mut self, days: i64) -> CadreResult<usize> {
        self.cleanup_old_tasks_as_of(days, Utc::now())
    }

    /// [`Manager::cleanup_old_tasks`] measured from `now`.
    ///
    /// A task created exactly `days` before `now` is kept, as is a
    /// completed task whose review is still in flight.
    pub fn cleanup_old_tasks_as_of(&mut self, days: i64, now: DateTime<Utc>) -> CadreResult<usize> {
        if days < 0 {
            return Err(CadreError::validation("Days cannot be negative"));
        }
        let cutoff = chrono::Duration::try_days(days)
            .and_then(|age| now.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let removed = self.store.remove_terminal_before(cutoff);

        let _span = self.telemetry.enter();
        info!(removed, days, "Cleaned up old tasks");
        Ok(removed)
    }

    pub fn get_team_performance_report(&self) -> TeamReport {
        let mut metrics = self.metrics.clone();
        metrics.refresh_efficiency();
        TeamReport {
            manager: self.name.clone(),
            department: self.department.clone(),
            metrics,
            agents: self
                .agents
                .iter()
                .map(|(id, agent)| (*id, agent.performance_report()))
                .collect(),
            qa_agents: self
                .qa_agents
                .iter()
                .map(|(id, qa)| (*id, qa.qa_report()))
                .collect(),
            pending_tasks: self.store.count_with_status(TaskStatus::Pending),
            assigned_tasks: self.store.count_with_status(TaskStatus::Assigned),
            completed_tasks: self.store.count_with_status(TaskStatus::Completed),
            approved_tasks: self.store.count_with_status(TaskStatus::Approved),
            rejected_tasks: self.store.count_with_status(TaskStatus::Rejected),
        }
    }
}

impl std::fmt::Display for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {} Department Manager ({} agents, {} QA agents)",
            self.name,
            self.department,
            self.agents.len(),
            self.qa_agents.len()
        )
    }
}
