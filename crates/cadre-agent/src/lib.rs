//! Worker agents for the Cadre organization.
//!
//! An [`Agent`] holds a skill-proficiency table, a local knowledge base, at
//! most one in-flight task, a bounded task history and running performance
//! metrics. Domain work is delegated to an injected [`AgentBehavior`].

/// Agent state and lifecycle hooks.
pub mod agent;
/// The collaborator contract for domain work.
pub mod behavior;

pub use agent::{Agent, AgentMetrics, AgentReport, CurrentTask, TaskHistoryEntry};
pub use behavior::{result_status, AgentBehavior, ResultStatus};
