use crate::checklist::{
    CheckOutcome, Checklist, ChecklistEvaluator, ChecklistSweep, ReviewFinding, ReviewScope,
    Severity,
};
use crate::scoring::{QualityScorer, WeightedSeverityScorer};
use cadre_agent::{Agent, AgentReport};
use cadre_core::{payload, running_mean, CadreError, CadreResult, Payload, Telemetry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

/// Reviews kept per QA agent unless configured otherwise.
pub const DEFAULT_MAX_REVIEW_HISTORY: usize = 1000;

/// Minimum score for approval.
pub const DEFAULT_APPROVAL_THRESHOLD: f64 = 0.8;

const RECENT_REVIEWS_IN_REPORT: usize = 10;

/// Final verdict of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl std::fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewDecision::Approved => write!(f, "approved"),
            ReviewDecision::Rejected => write!(f, "rejected"),
        }
    }
}

/// Outcome of one review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub task_id: Uuid,
    pub reviewer: String,
    pub timestamp: DateTime<Utc>,
    pub decision: ReviewDecision,
    pub score: f64,
    pub issues: Vec<ReviewFinding>,
    pub suggestions: Vec<ReviewFinding>,
    pub checks_evaluated: usize,
    pub checks_skipped: usize,
    pub comments: String,
}

impl ReviewRecord {
    pub fn approved(&self) -> bool {
        self.decision == ReviewDecision::Approved
    }
}

/// Running QA statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QaMetrics {
    pub tasks_reviewed: u64,
    pub tasks_approved: u64,
    pub tasks_rejected: u64,
    /// Mean review time in seconds.
    pub average_review_time: f64,
    /// Mean score over all reviews.
    pub quality_score: f64,
}

/// Snapshot returned by [`QaAgent::qa_report`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaReport {
    pub agent: AgentReport,
    pub qa_metrics: QaMetrics,
    pub guidelines_count: usize,
    pub checklist_items_count: usize,
    pub recent_reviews: Vec<ReviewRecord>,
}

/// An agent that reviews completed work against a checklist.
pub struct QaAgent {
    agent: Agent,
    checklist: Checklist,
    guidelines: Checklist,
    evaluator: Arc<dyn ChecklistEvaluator>,
    scorer: Arc<dyn QualityScorer>,
    approval_threshold: f64,
    qa_metrics: QaMetrics,
    review_history: VecDeque<ReviewRecord>,
    max_review_history: usize,
}

impl QaAgent {
    pub fn new(
        name: impl Into<String>,
        department: impl Into<String>,
        evaluator: Arc<dyn ChecklistEvaluator>,
    ) -> CadreResult<Self> {
        let name = name.into();
        let department = department.into();
        let telemetry = Telemetry::new("qa_agent", &name, &department);
        let agent = Agent::new(name, department, "QA")?.with_telemetry(telemetry);
        Ok(Self {
            agent,
            checklist: Checklist::new(),
            guidelines: Checklist::new(),
            evaluator,
            scorer: Arc::new(WeightedSeverityScorer::default()),
            approval_threshold: DEFAULT_APPROVAL_THRESHOLD,
            qa_metrics: QaMetrics::default(),
            review_history: VecDeque::new(),
            max_review_history: DEFAULT_MAX_REVIEW_HISTORY,
        })
    }

    pub fn with_checklist(mut self, checklist: Checklist) -> Self {
        self.checklist = checklist;
        self
    }

    pub fn with_guidelines(mut self, guidelines: Checklist) -> Self {
        self.guidelines = guidelines;
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn QualityScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_approval_threshold(mut self, threshold: f64) -> Self {
        self.approval_threshold = threshold;
        self
    }

    pub fn with_max_review_history(mut self, max: usize) -> Self {
        self.max_review_history = max;
        self.trim_history();
        self
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.agent = self.agent.with_telemetry(telemetry);
        self
    }

    /// The underlying agent (availability, lifecycle, skills).
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut Agent {
        &mut self.agent
    }

    pub fn name(&self) -> &str {
        self.agent.name()
    }

    pub fn is_available(&self) -> bool {
        self.agent.is_available()
    }

    pub fn qa_metrics(&self) -> &QaMetrics {
        &self.qa_metrics
    }

    pub fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    pub fn guidelines(&self) -> &Checklist {
        &self.guidelines
    }

    pub fn review_history(&self) -> impl Iterator<Item = &ReviewRecord> {
        self.review_history.iter()
    }

    pub fn review_history_len(&self) -> usize {
        self.review_history.len()
    }

    // --- Tables ---

    pub fn add_qa_guideline(&mut self, category: &str, guideline: &str) -> CadreResult<()> {
        self.guidelines.add_item(category, guideline)?;
        let _span = self.agent.telemetry().enter();
        info!(category, guideline, "Added QA guideline");
        Ok(())
    }

    pub fn add_qa_checklist_item(&mut self, category: &str, item: &str) -> CadreResult<()> {
        self.checklist.add_item(category, item)?;
        let _span = self.agent.telemetry().enter();
        info!(category, item, "Added QA checklist item");
        Ok(())
    }

    pub fn update_qa_guidelines(&mut self, category: &str, guidelines: Vec<String>) -> CadreResult<()> {
        self.guidelines.replace_category(category, guidelines)?;
        let _span = self.agent.telemetry().enter();
        info!(category, "Updated QA guidelines");
        Ok(())
    }

    pub fn update_qa_checklist(&mut self, category: &str, items: Vec<String>) -> CadreResult<()> {
        self.checklist.replace_category(category, items)?;
        let _span = self.agent.telemetry().enter();
        info!(category, "Updated QA checklist");
        Ok(())
    }

    pub fn clear_review_history(&mut self) {
        self.review_history.clear();
        let _span = self.agent.telemetry().enter();
        info!("Cleared review history");
    }

    // --- Review engine ---

    /// Review completed work against the checklist.
    ///
    /// Items the evaluator cannot answer are logged and skipped. A score
    /// outside `[0, 1]` is an [`CadreError::Evaluator`] and nothing is recorded.
    pub fn review_task(
        &mut self,
        task_id: Uuid,
        task_data: &Payload,
        result: &Payload,
    ) -> CadreResult<ReviewRecord> {
        let started = Instant::now();
        let telemetry = self.agent.telemetry().clone();
        let _span = telemetry.enter();
        info!(task_id = %task_id, "Starting QA review");

        let sweep = self.sweep_checklist(task_data, result);
        let score = self.scorer.score(&sweep, task_data, result);
        if !(0.0..=1.0).contains(&score) {
            error!(task_id = %task_id, score, "Quality score out of range");
            return Err(CadreError::Evaluator(format!(
                "Quality score must be between 0 and 1, got {score}"
            )));
        }

        let decision = if score >= self.approval_threshold {
            ReviewDecision::Approved
        } else {
            ReviewDecision::Rejected
        };

        let n = self.qa_metrics.tasks_reviewed;
        let review_time = started.elapsed().as_secs_f64();
        self.qa_metrics.average_review_time =
            running_mean(self.qa_metrics.average_review_time, n, review_time);
        self.qa_metrics.quality_score = running_mean(self.qa_metrics.quality_score, n, score);
        self.qa_metrics.tasks_reviewed = n + 1;
        match decision {
            ReviewDecision::Approved => self.qa_metrics.tasks_approved += 1,
            ReviewDecision::Rejected => self.qa_metrics.tasks_rejected += 1,
        }

        let comments = format!(
            "{} issue(s), {} suggestion(s) across {} check(s)",
            sweep.issues.len(),
            sweep.suggestions.len(),
            sweep.checks.len()
        );
        let record = ReviewRecord {
            task_id,
            reviewer: self.agent.name().to_string(),
            timestamp: Utc::now(),
            decision,
            score,
            checks_evaluated: sweep.checks.len(),
            checks_skipped: sweep.skipped,
            issues: sweep.issues,
            suggestions: sweep.suggestions,
            comments,
        };

        self.review_history.push_back(record.clone());
        self.trim_history();

        info!(task_id = %task_id, decision = %decision, score, "Completed QA review");
        Ok(record)
    }

    fn sweep_checklist(&self, task_data: &Payload, result: &Payload) -> ChecklistSweep {
        let mut sweep = ChecklistSweep::default();
        let categories = match self.evaluator.scope(task_data) {
            ReviewScope::All => None,
            ReviewScope::Categories(categories) => Some(categories),
            ReviewScope::Unsupported { reason } => {
                sweep.record("task", "Task type", CheckOutcome::fail(Severity::High, reason));
                return sweep;
            }
        };

        let in_scope = |category: &str| {
            categories
                .as_ref()
                .map_or(true, |wanted| wanted.iter().any(|c| c == category))
        };
        for (category, item) in self.checklist.items().filter(|&(c, _)| in_scope(c)) {
            match self.evaluator.evaluate(category, item, task_data, result) {
                Ok(outcome) => sweep.record(category, item, outcome),
                Err(e) => {
                    error!(category, item, error = %e, "Error checking checklist item");
                    sweep.skipped += 1;
                }
            }
        }
        sweep
    }

    fn trim_history(&mut self) {
        while self.review_history.len() > self.max_review_history {
            self.review_history.pop_front();
        }
    }

    /// Generic entry point: `{task_id?, task_data, result}` in, review out.
    ///
    /// Missing task data or result is a structured failure, not an error.
    pub fn process(&mut self, input: &Payload) -> CadreResult<Payload> {
        let task_data = input.get("task_data").and_then(|v| v.as_object());
        let result = input.get("result").and_then(|v| v.as_object());
        let (Some(task_data), Some(result)) = (task_data, result) else {
            return Ok(payload(json!({
                "success": false,
                "error": "Missing task data or result",
            })));
        };

        let task_id = input
            .get("task_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::nil);

        let record = self.review_task(task_id, task_data, result)?;
        Ok(payload(json!({
            "success": true,
            "quality_score": record.score,
            "review": serde_json::to_value(&record)?,
            "message": "QA review completed successfully",
        })))
    }

    pub fn qa_report(&self) -> QaReport {
        let skip = self
            .review_history
            .len()
            .saturating_sub(RECENT_REVIEWS_IN_REPORT);
        QaReport {
            agent: self.agent.performance_report(),
            qa_metrics: self.qa_metrics.clone(),
            guidelines_count: self.guidelines.item_count(),
            checklist_items_count: self.checklist.item_count(),
            recent_reviews: self.review_history.iter().skip(skip).cloned().collect(),
        }
    }
}

impl std::fmt::Display for QaAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (QA) - {} Department", self.agent.name(), self.agent.department())
    }
}
