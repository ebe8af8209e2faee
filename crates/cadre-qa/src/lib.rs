//! Quality-assurance review for completed tasks.
//!
//! A [`QaAgent`] sweeps its [`Checklist`] through a pluggable
//! [`ChecklistEvaluator`], buckets failed items into issues and suggestions,
//! scores the sweep with a [`QualityScorer`], and approves or rejects.
//!
//! # Main types
//!
//! - [`QaAgent`]: Agent specialization with checklist, guidelines and review history.
//! - [`Checklist`]: Ordered category → item table (also used for guidelines).
//! - [`ChecklistEvaluator`]: Department-specific pass/fail rule per item.
//! - [`WeightedSeverityScorer`]: Default score: high-severity checks weigh 60%.
//! - [`ReviewRecord`]: Outcome of one review.

/// Checklist tables, evaluator contract and sweep results.
pub mod checklist;
/// QA agent, review engine and QA metrics.
pub mod qa_agent;
/// Quality score strategies.
pub mod scoring;

pub use checklist::{
    CheckOutcome, CheckRecord, Checklist, ChecklistCategory, ChecklistEvaluator, ChecklistSweep,
    ReviewFinding, ReviewScope, Severity,
};
pub use qa_agent::{
    QaAgent, QaMetrics, QaReport, ReviewDecision, ReviewRecord, DEFAULT_APPROVAL_THRESHOLD,
    DEFAULT_MAX_REVIEW_HISTORY,
};
pub use scoring::{QualityScorer, ScoreBreakdown, WeightedSeverityScorer};
