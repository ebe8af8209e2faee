use cadre_core::Payload;
use cadre_qa::ReviewRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Assigned,
    Completed,
    Approved,
    Rejected,
}

impl TaskStatus {
    /// Completed, approved and rejected tasks are eligible for cleanup.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Approved | TaskStatus::Rejected
        )
    }

    /// Pending work, including rejected work waiting to be redone.
    pub fn awaits_assignment(self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Rejected)
    }

    /// Lifecycle moves: pending (or rejected) to assigned, assigned back to
    /// pending or on to completed, completed to a QA verdict.
    pub fn can_advance_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending | Rejected, Assigned)
                | (Assigned, Pending | Completed)
                | (Completed, Approved | Rejected)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Assigned => write!(f, "assigned"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Approved => write!(f, "approved"),
            TaskStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// QA progress of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QaStatus {
    Pending,
    Assigned,
    Approved,
    Rejected,
}

/// A unit of work owned by a manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub task_type: String,
    pub data: Payload,
    pub priority: u32,
    pub status: TaskStatus,
    pub assigned_to: Option<Uuid>,
    pub result: Option<Payload>,
    pub qa_status: QaStatus,
    /// QA agent currently holding the review.
    pub qa_reviewer: Option<Uuid>,
    pub qa_result: Option<Payload>,
    pub created_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(task_type: impl Into<String>, data: Payload, priority: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_type: task_type.into(),
            data,
            priority,
            status: TaskStatus::Pending,
            assigned_to: None,
            result: None,
            qa_status: QaStatus::Pending,
            qa_reviewer: None,
            qa_result: None,
            created_at: Utc::now(),
            assigned_at: None,
            completed_at: None,
        }
    }

    /// Task data as handed to a collaborator or reviewer, with the task type under `"type"`.
    pub fn input(&self) -> Payload {
        let mut input = self.data.clone();
        input
            .entry("type")
            .or_insert_with(|| serde_json::Value::String(self.task_type.clone()));
        input
    }

    /// Return to pending with no agent bound.
    pub(crate) fn release(&mut self) {
        self.status = TaskStatus::Pending;
        self.assigned_to = None;
        self.assigned_at = None;
    }
}

/// What the assignment pass did with one waiting task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentOutcome {
    Assigned { task_id: Uuid, agent_id: Uuid },
    /// No owned agent is both available and capable; the task keeps waiting.
    NoCapableAgent { task_id: Uuid },
    /// The chosen agent refused the task because it was already busy.
    AgentRefused { task_id: Uuid, agent_id: Uuid },
}

impl AssignmentOutcome {
    pub fn task_id(&self) -> Uuid {
        match self {
            AssignmentOutcome::Assigned { task_id, .. }
            | AssignmentOutcome::NoCapableAgent { task_id }
            | AssignmentOutcome::AgentRefused { task_id, .. } => *task_id,
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, AssignmentOutcome::Assigned { .. })
    }
}

/// What happened when a completed task looked for a QA agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Dispatched { qa_agent_id: Uuid },
    /// The selected QA agent was busy; the task stays at QA pending.
    QaBusy { qa_agent_id: Uuid },
    NoQaAgents,
    /// The status change does not trigger a review.
    NotRequested,
}

impl DispatchOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, DispatchOutcome::Dispatched { .. })
    }
}

/// Result of running one assigned task through its collaborator.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    Completed {
        task_id: Uuid,
        dispatch: DispatchOutcome,
        review: Option<ReviewRecord>,
    },
    /// The collaborator reported failure or broke its result contract.
    Failed { task_id: Uuid, reason: String },
    /// The collaborator missed its deadline.
    TimedOut { task_id: Uuid },
    /// The task was no longer assigned when execution started.
    Skipped { task_id: Uuid },
}

impl ExecutionOutcome {
    pub fn task_id(&self) -> Uuid {
        match self {
            ExecutionOutcome::Completed { task_id, .. }
            | ExecutionOutcome::Failed { task_id, .. }
            | ExecutionOutcome::TimedOut { task_id }
            | ExecutionOutcome::Skipped { task_id } => *task_id,
        }
    }
}

/// Manager-level running statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerMetrics {
    pub tasks_assigned: u64,
    pub tasks_completed: u64,
    /// Mean seconds from assignment to completion.
    pub average_completion_time: f64,
    /// `tasks_completed / max(1, tasks_assigned)`.
    pub team_efficiency: f64,
}

impl ManagerMetrics {
    pub(crate) fn refresh_efficiency(&mut self) {
        self.team_efficiency = self.tasks_completed as f64 / self.tasks_assigned.max(1) as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadre_core::payload;
    use serde_json::json;

    #[test]
    fn test_terminal_statuses() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Assigned.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Approved.is_terminal());
        assert!(TaskStatus::Rejected.is_terminal());
        assert!(TaskStatus::Rejected.awaits_assignment());
    }

    #[test]
    fn test_status_only_advances() {
        use TaskStatus::*;
        assert!(Pending.can_advance_to(Assigned));
        assert!(Rejected.can_advance_to(Assigned));
        assert!(Assigned.can_advance_to(Completed));
        assert!(Assigned.can_advance_to(Pending));
        assert!(Completed.can_advance_to(Rejected));

        assert!(!Pending.can_advance_to(Completed));
        assert!(!Completed.can_advance_to(Assigned));
        assert!(!Approved.can_advance_to(Pending));
        assert!(!Approved.can_advance_to(Rejected));
        assert!(!Completed.can_advance_to(Completed));
    }

    #[test]
    fn test_input_carries_type() {
        let task = Task::new("content_creation", payload(json!({"topic": "launch"})), 1);
        let input = task.input();
        assert_eq!(input["type"], "content_creation");
        assert_eq!(input["topic"], "launch");

        let explicit = Task::new("x", payload(json!({"type": "override"})), 1);
        assert_eq!(explicit.input()["type"], "override");
    }

    #[test]
    fn test_task_serializes_type_field() {
        let task = Task::new("seo", Payload::new(), 2);
        let value = serde_json::to_value(&task).unwrap_or_default();
        assert_eq!(value["type"], "seo");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["qa_status"], "pending");
    }

    #[test]
    fn test_efficiency_guards_zero() {
        let mut metrics = ManagerMetrics::default();
        metrics.refresh_efficiency();
        assert_eq!(metrics.team_efficiency, 0.0);
        metrics.tasks_assigned = 4;
        metrics.tasks_completed = 3;
        metrics.refresh_efficiency();
        assert_eq!(metrics.team_efficiency, 0.75);
    }
}
