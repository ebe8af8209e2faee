use crate::agent::{marketing_agent, MarketingBehavior};
use crate::qa::marketing_qa_agent;
use cadre_core::{CadreError, CadreResult, Payload};
use cadre_orchestrator::{Engine, Manager, OrgConfig, SkillRequirementMatcher, TaskStatus, TeamReport};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

/// Agenda of the meeting held after team coordination.
pub const COORDINATION_AGENDA: [&str; 4] = [
    "Task Assignments",
    "Resource Allocation",
    "Timeline Review",
    "Dependencies Check",
];

/// Skills each marketing task type needs.
pub fn marketing_matcher(min_proficiency: f64) -> SkillRequirementMatcher {
    SkillRequirementMatcher::new(min_proficiency)
        .with_requirement("campaign_creation", ["campaign_management", "market_research"])
        .with_requirement("content_creation", ["content_creation", "brand_management"])
        .with_requirement("market_research", ["market_research", "analytics"])
        .with_requirement("social_media", ["social_media", "content_creation"])
}

/// Department-level snapshot returned by [`MarketingDepartment::marketing_metrics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketingMetrics {
    pub active_strategies: usize,
    pub budget_allocations: usize,
    pub performance_reviews: usize,
    pub team_size: usize,
    pub qa_team_size: usize,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub team_performance: TeamReport,
}

#[derive(Default)]
struct Plans {
    strategies: Vec<Value>,
    budgets: Vec<Value>,
    reviews: Vec<Value>,
}

/// The marketing department: a manager with marketing hires, driven by an
/// [`Engine`], plus the plans produced by department-level tasks.
pub struct MarketingDepartment {
    engine: Engine,
    behaviors: Mutex<HashMap<Uuid, Arc<MarketingBehavior>>>,
    plans: Mutex<Plans>,
}

impl MarketingDepartment {
    pub fn new(config: OrgConfig) -> CadreResult<Self> {
        let matcher = Arc::new(marketing_matcher(config.min_proficiency));
        let manager = Manager::new(config, matcher)?;
        Ok(Self::with_manager(manager))
    }

    /// Wrap an existing manager, e.g. one with a custom decision generator.
    pub fn with_manager(manager: Manager) -> Self {
        Self {
            engine: Engine::new(manager),
            behaviors: Mutex::new(HashMap::new()),
            plans: Mutex::new(Plans::default()),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Hire a marketing specialist.
    pub async fn hire_agent(&self, name: &str) -> CadreResult<Uuid> {
        let behavior = Arc::new(MarketingBehavior::new());
        let agent = marketing_agent(name, behavior.clone())?;
        let id = self.engine.manager().lock().await.add_agent(agent);
        self.behaviors.lock().await.insert(id, behavior);
        Ok(id)
    }

    /// Hire a marketing QA reviewer.
    pub async fn hire_qa_agent(&self, name: &str) -> CadreResult<Uuid> {
        let qa_agent = marketing_qa_agent(name)?;
        Ok(self.engine.manager().lock().await.add_qa_agent(qa_agent))
    }

    /// The work ledger of a hired specialist.
    pub async fn behavior(&self, agent_id: Uuid) -> Option<Arc<MarketingBehavior>> {
        self.behaviors.lock().await.get(&agent_id).cloned()
    }

    pub async fn create_task(&self, task_type: &str, data: Value, priority: i64) -> CadreResult<Uuid> {
        self.engine
            .manager()
            .lock()
            .await
            .create_task(task_type, data, priority)
    }

    /// Run a department-level task.
    ///
    /// An unknown task type yields `{"error": ...}`, not an `Err`.
    pub async fn process_department_task(&self, task: &Payload) -> CadreResult<Payload> {
        let task_type = task.get("type").and_then(Value::as_str).unwrap_or("");
        info!(task_type, "Processing department task");

        match task_type {
            "strategy_development" => self.develop_strategy(task).await,
            "budget_allocation" => self.allocate_budget(task).await,
            "performance_review" => self.review_performance(task).await,
            "team_coordination" => self.coordinate_team(task).await,
            other => {
                error!(task_type = other, "Unknown department task type");
                Ok(cadre_core::payload(json!({
                    "error": format!("Unknown department task type: {other}"),
                })))
            }
        }
    }

    async fn develop_strategy(&self, data: &Payload) -> CadreResult<Payload> {
        let name = data
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unnamed Strategy")
            .to_string();
        let strategy = json!({
            "id": stamped_id("strat"),
            "name": name,
            "goals": field(data, "goals", json!([])),
            "timeline": {
                "start_date": field(data, "start_date", json!("")),
                "end_date": field(data, "end_date", json!("")),
                "phases": field(data, "phases", json!([])),
            },
            "target_audiences": field(data, "target_audiences", json!([])),
            "channels": field(data, "channels", json!([])),
            "budget": field(data, "budget", json!({})),
            "success_metrics": field(data, "success_metrics", json!([])),
            "created_at": Utc::now().to_rfc3339(),
        });

        self.plans.lock().await.strategies.push(strategy.clone());
        self.share("current_strategy", strategy.clone()).await?;

        Ok(cadre_core::payload(json!({
            "success": true,
            "strategy": strategy,
            "message": format!("Marketing strategy {name} developed successfully"),
        })))
    }

    async fn allocate_budget(&self, data: &Payload) -> CadreResult<Payload> {
        let allocation = json!({
            "id": stamped_id("budget"),
            "total_budget": field(data, "total_budget", json!(0)),
            "allocations": field(data, "allocations", json!({})),
            "period": {
                "start_date": field(data, "start_date", json!("")),
                "end_date": field(data, "end_date", json!("")),
            },
            "priorities": field(data, "priorities", json!([])),
            "created_at": Utc::now().to_rfc3339(),
        });

        self.plans.lock().await.budgets.push(allocation.clone());
        self.share("current_budget", allocation.clone()).await?;

        Ok(cadre_core::payload(json!({
            "success": true,
            "allocation": allocation,
            "message": "Budget allocated successfully",
        })))
    }

    async fn review_performance(&self, data: &Payload) -> CadreResult<Payload> {
        let review = json!({
            "id": stamped_id("review"),
            "period": {
                "start_date": field(data, "start_date", json!("")),
                "end_date": field(data, "end_date", json!("")),
            },
            "metrics": field(data, "metrics", json!({})),
            "campaign_performance": field(data, "campaign_performance", json!({})),
            "team_performance": field(data, "team_performance", json!({})),
            "recommendations": field(data, "recommendations", json!([])),
            "created_at": Utc::now().to_rfc3339(),
        });

        self.plans.lock().await.reviews.push(review.clone());
        self.share("latest_performance_review", review.clone()).await?;

        Ok(cadre_core::payload(json!({
            "success": true,
            "review": review,
            "message": "Performance review completed successfully",
        })))
    }

    /// Queue every listed task, then hold the coordination meeting.
    ///
    /// Each entry needs a `type`; `data` defaults to `{}` and `priority` to 1.
    /// Entries are checked before any task is created.
    async fn coordinate_team(&self, data: &Payload) -> CadreResult<Payload> {
        let tasks = field(data, "tasks", json!([]));
        let entries = tasks
            .as_array()
            .ok_or_else(|| CadreError::validation("Coordination tasks must be a list"))?
            .iter()
            .map(coordination_entry)
            .collect::<CadreResult<Vec<_>>>()?;

        let coordination = json!({
            "id": stamped_id("coord"),
            "tasks": tasks,
            "resources": field(data, "resources", json!({})),
            "dependencies": field(data, "dependencies", json!({})),
            "timeline": field(data, "timeline", json!({})),
            "created_at": Utc::now().to_rfc3339(),
        });

        let mut manager = self.engine.manager().lock().await;
        let mut created = Vec::with_capacity(entries.len());
        for (task_type, task_data, priority) in entries {
            created.push(manager.create_task(&task_type, task_data, priority)?);
        }
        let minutes = manager.hold_team_meeting(&COORDINATION_AGENDA)?;
        drop(manager);

        info!(tasks = created.len(), "Team coordination completed");
        Ok(cadre_core::payload(json!({
            "success": true,
            "coordination": coordination,
            "created_tasks": created,
            "meeting_outcomes": serde_json::to_value(minutes)?,
            "message": "Team coordination completed successfully",
        })))
    }

    async fn share(&self, key: &str, value: Value) -> CadreResult<()> {
        self.engine
            .manager()
            .lock()
            .await
            .update_team_knowledge(key, value)
    }

    pub async fn marketing_metrics(&self) -> MarketingMetrics {
        let (active_strategies, budget_allocations, performance_reviews) = {
            let plans = self.plans.lock().await;
            (plans.strategies.len(), plans.budgets.len(), plans.reviews.len())
        };
        let manager = self.engine.manager().lock().await;
        MarketingMetrics {
            active_strategies,
            budget_allocations,
            performance_reviews,
            team_size: manager.agent_ids().len(),
            qa_team_size: manager.qa_agent_ids().len(),
            pending_tasks: manager.store().count_with_status(TaskStatus::Pending),
            completed_tasks: manager.store().count_with_status(TaskStatus::Completed),
            team_performance: manager.get_team_performance_report(),
        }
    }
}

fn coordination_entry(entry: &Value) -> CadreResult<(String, Value, i64)> {
    let task_type = entry
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| CadreError::validation("Coordination task type is required"))?;
    let data = entry.get("data").cloned().unwrap_or_else(|| json!({}));
    let priority = match entry.get("priority") {
        None => 1,
        Some(p) => p
            .as_i64()
            .ok_or_else(|| CadreError::validation("Priority must be a positive integer"))?,
    };
    Ok((task_type.to_string(), data, priority))
}

fn stamped_id(prefix: &str) -> String {
    format!("{prefix}_{}", Utc::now().format("%Y%m%d_%H%M%S"))
}

fn field(data: &Payload, key: &str, default: Value) -> Value {
    data.get(key).cloned().unwrap_or(default)
}
