use crate::manager::Manager;
use crate::types::{AssignmentOutcome, ExecutionOutcome};
use cadre_agent::{result_status, ResultStatus};
use cadre_core::CadreResult;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Runs a [`Manager`]'s tasks concurrently.
///
/// Bookkeeping happens under one lock; collaborator calls run outside it,
/// each bounded by the configured deadline.
#[derive(Clone)]
pub struct Engine {
    manager: Arc<Mutex<Manager>>,
    deadline: Duration,
}

impl Engine {
    pub fn new(manager: Manager) -> Self {
        let deadline = manager.config().task_deadline();
        Self {
            manager: Arc::new(Mutex::new(manager)),
            deadline,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Shared handle to the manager, for bookkeeping calls.
    pub fn manager(&self) -> &Arc<Mutex<Manager>> {
        &self.manager
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run one assigned task through its agent's collaborator.
    ///
    /// On success the result is recorded, QA is dispatched and, when a QA
    /// agent took it, reviewed. Failure, a missing status discriminator or a
    /// missed deadline return the task to pending. An outcome that arrives
    /// after the task moved to another agent is discarded.
    pub async fn execute_task(&self, task_id: Uuid) -> CadreResult<ExecutionOutcome> {
        let prepared = {
            let mut manager = self.manager.lock().await;
            manager.prepare_execution(task_id)?
        };
        let Some(prepared) = prepared else {
            return Ok(ExecutionOutcome::Skipped { task_id });
        };

        info!(task_id = %task_id, agent_id = %prepared.agent_id, "Executing task");
        let attempt = tokio::time::timeout(
            self.deadline,
            prepared.behavior.process(&prepared.input),
        )
        .await;

        let mut manager = self.manager.lock().await;
        let agent_id = prepared.agent_id;
        if !manager.holds_assignment(task_id, agent_id) {
            warn!(task_id = %task_id, agent_id = %agent_id, "Discarding outcome from agent no longer assigned");
            return Ok(ExecutionOutcome::Skipped { task_id });
        }

        let output = match attempt {
            Err(_) => {
                warn!(task_id = %task_id, deadline_secs = self.deadline.as_secs_f64(), "Task deadline exceeded");
                manager.abandon_task(task_id, agent_id, "Deadline exceeded")?;
                return Ok(ExecutionOutcome::TimedOut { task_id });
            }
            Ok(Err(e)) => {
                let reason = e.to_string();
                manager.abandon_task(task_id, agent_id, &reason)?;
                return Ok(ExecutionOutcome::Failed { task_id, reason });
            }
            Ok(Ok(output)) => output,
        };

        let reason = match result_status(&output) {
            ResultStatus::Succeeded => None,
            ResultStatus::Failed { reason } => Some(reason),
            ResultStatus::Missing => Some("Result is missing a status discriminator".to_string()),
        };
        if let Some(reason) = reason {
            manager.abandon_task(task_id, agent_id, &reason)?;
            return Ok(ExecutionOutcome::Failed { task_id, reason });
        }

        let dispatch = manager.complete_task(agent_id, task_id, output)?;
        let review = if dispatch.is_dispatched() {
            Some(manager.run_review(task_id)?)
        } else {
            None
        };
        Ok(ExecutionOutcome::Completed {
            task_id,
            dispatch,
            review,
        })
    }

    /// One scheduling round: retry stuck reviews, run the assignment pass,
    /// then execute every newly assigned task concurrently.
    ///
    /// Every dispatched review runs even when an earlier one fails; the
    /// first review error is then returned before assignment. All
    /// executions finish before the first error, if any, is returned.
    pub async fn run_cycle(&self) -> CadreResult<Vec<ExecutionOutcome>> {
        let assigned: Vec<Uuid> = {
            let mut manager = self.manager.lock().await;
            let mut review_error = None;
            for (task_id, dispatch) in manager.dispatch_pending_reviews() {
                if dispatch.is_dispatched() {
                    if let Err(e) = manager.run_review(task_id) {
                        review_error.get_or_insert(e);
                    }
                }
            }
            if let Some(e) = review_error {
                return Err(e);
            }
            manager
                .assign_tasks()
                .into_iter()
                .filter(AssignmentOutcome::is_assigned)
                .map(|outcome| outcome.task_id())
                .collect()
        };

        info!(tasks = assigned.len(), "Running execution cycle");
        join_all(assigned.into_iter().map(|task_id| self.execute_task(task_id)))
            .await
            .into_iter()
            .collect()
    }
}
