//! Task lifecycle, assignment and QA-feedback engine for the Cadre organization.
//!
//! A [`Manager`] owns a team of agents and QA agents plus a [`TaskStore`].
//! Tasks are queued by priority, bound to capable agents by the assignment
//! pass, completed, handed to a randomly selected QA agent, and either
//! approved or requeued with a bumped priority.
//!
//! # Main types
//!
//! - [`Manager`]: Team owner and single writer of the task store.
//! - [`Engine`]: Runs collaborator work concurrently outside the manager lock.
//! - [`TaskStore`]: Task arena plus the priority-ordered queue.
//! - [`CapabilityMatcher`]: Pluggable rule deciding whether an agent can take a task.
//! - [`OrgConfig`]: TOML-backed settings.

/// Organization settings.
pub mod config;
/// Concurrent execution on top of a locked manager.
pub mod engine;
/// The manager and its team report.
pub mod manager;
/// Capability matching between agents and tasks.
pub mod matcher;
/// Team meeting minutes and decision strategies.
pub mod meeting;
/// Task arena and priority queue.
pub mod task_queue;
/// Task model and structured outcomes.
pub mod types;

pub use config::{OrgConfig, QaDispatch, RequeuePolicy};
pub use engine::Engine;
pub use manager::{Manager, TeamReport};
pub use matcher::{CapabilityMatcher, SkillRequirementMatcher};
pub use meeting::{ActionItem, DecisionGenerator, MeetingDecision, MeetingMinutes, PlainDecisions};
pub use task_queue::TaskStore;
pub use types::{
    AssignmentOutcome, DispatchOutcome, ExecutionOutcome, ManagerMetrics, QaStatus, Task,
    TaskStatus,
};
