//! The marketing department of the Cadre organization.
//!
//! Marketing specialists create campaigns, content, market research and
//! social media work; marketing QA agents review it against a checklist
//! chosen by task type; the department runs strategy, budget, performance
//! review and team coordination tasks on top of the shared manager.
//!
//! # Main types
//!
//! - [`MarketingDepartment`]: Manager, engine and department plans.
//! - [`MarketingBehavior`]: Specialist collaborator and its work ledger.
//! - [`MarketingChecklistEvaluator`]: Marketing checklist rules.

/// Marketing specialists.
pub mod agent;
/// Department-level tasks and metrics.
pub mod department;
/// Marketing QA checklist and evaluator.
pub mod qa;

pub use agent::{
    marketing_agent, marketing_knowledge, marketing_skills, MarketingAgentMetrics,
    MarketingBehavior, MARKETING_ROLE,
};
pub use department::{marketing_matcher, MarketingDepartment, MarketingMetrics, COORDINATION_AGENDA};
pub use qa::{marketing_checklist, marketing_guidelines, marketing_qa_agent, MarketingChecklistEvaluator};
