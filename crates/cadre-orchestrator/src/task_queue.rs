use crate::types::{QaStatus, Task, TaskStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Task arena plus the priority-ordered queue of task ids.
///
/// The queue is non-increasing in priority with FIFO ties, except where a
/// rejected task was appended at the tail.
pub struct TaskStore {
    tasks: HashMap<Uuid, Task>,
    queue: Vec<Uuid>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            queue: Vec::new(),
        }
    }

    /// Store a task and queue it by priority.
    pub fn insert(&mut self, task: Task) -> Uuid {
        let id = task.id;
        let priority = task.priority;
        self.tasks.insert(id, task);
        self.enqueue_by_priority(id, priority);
        id
    }

    /// Place `id` before the first entry with strictly lower priority.
    pub(crate) fn enqueue_by_priority(&mut self, id: Uuid, priority: u32) {
        let position = self
            .queue
            .iter()
            .position(|queued| {
                self.tasks
                    .get(queued)
                    .is_some_and(|task| task.priority < priority)
            })
            .unwrap_or(self.queue.len());
        self.queue.insert(position, id);
    }

    pub(crate) fn enqueue_tail(&mut self, id: Uuid) {
        self.queue.push(id);
    }

    /// Remove `id` from the queue, keeping the task itself.
    pub(crate) fn dequeue(&mut self, id: Uuid) -> bool {
        match self.queue.iter().position(|queued| *queued == id) {
            Some(position) => {
                self.queue.remove(position);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    /// Queued task ids in scheduling order.
    pub fn queue(&self) -> &[Uuid] {
        &self.queue
    }

    /// Queued tasks in scheduling order.
    pub fn queued_tasks(&self) -> impl Iterator<Item = &Task> {
        self.queue.iter().filter_map(|id| self.tasks.get(id))
    }

    /// All tasks, oldest first.
    pub fn all_tasks(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.values().collect();
        tasks.sort_by_key(|t| t.created_at);
        tasks
    }

    pub fn count_with_status(&self, status: TaskStatus) -> usize {
        self.tasks.values().filter(|t| t.status == status).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drop terminal tasks created strictly before `cutoff`, except those
    /// bound to a QA reviewer. Returns the count.
    pub(crate) fn remove_terminal_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let expired: Vec<Uuid> = self
            .tasks
            .values()
            .filter(|t| {
                t.status.is_terminal() && t.qa_status != QaStatus::Assigned && t.created_at < cutoff
            })
            .map(|t| t.id)
            .collect();
        for id in &expired {
            self.tasks.remove(id);
        }
        self.queue.retain(|id| self.tasks.contains_key(id));
        expired.len()
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
