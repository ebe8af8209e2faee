use async_trait::async_trait;
use cadre_agent::{Agent, AgentBehavior};
use cadre_core::{payload, CadreResult, Payload};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;
use tracing::{error, info};

/// Role given to every marketing agent.
pub const MARKETING_ROLE: &str = "Marketing Specialist";

const RECENT_CAMPAIGNS: usize = 5;

/// Starting proficiencies of a marketing agent.
pub fn marketing_skills() -> HashMap<String, f64> {
    [
        ("content_creation", 0.8),
        ("social_media", 0.7),
        ("email_marketing", 0.75),
        ("seo", 0.65),
        ("analytics", 0.7),
        ("campaign_management", 0.75),
        ("market_research", 0.8),
        ("brand_management", 0.7),
    ]
    .into_iter()
    .map(|(skill, level)| (skill.to_string(), level))
    .collect()
}

/// Seed knowledge every marketing agent starts with.
pub fn marketing_knowledge() -> HashMap<String, Value> {
    HashMap::from([
        (
            "marketing_principles".to_string(),
            json!([
                "4Ps of Marketing",
                "Customer Journey Mapping",
                "Brand Positioning",
                "Market Segmentation"
            ]),
        ),
        (
            "best_practices".to_string(),
            json!({
                "social_media": [
                    "Engage with audience regularly",
                    "Post at optimal times",
                    "Use relevant hashtags",
                    "Create shareable content"
                ],
                "email_marketing": [
                    "Personalize content",
                    "Optimize subject lines",
                    "Mobile-friendly design",
                    "Clear call-to-action"
                ]
            }),
        ),
        (
            "industry_terms".to_string(),
            json!(["ROI", "CTR", "Conversion Rate", "Engagement Rate", "CPC", "CPM"]),
        ),
    ])
}

/// Build a marketing agent around `behavior`.
pub fn marketing_agent(name: &str, behavior: std::sync::Arc<MarketingBehavior>) -> CadreResult<Agent> {
    Ok(Agent::new(name, "Marketing", MARKETING_ROLE)?
        .with_skills(marketing_skills())
        .with_knowledge(marketing_knowledge())
        .with_behavior(behavior))
}

#[derive(Default)]
struct Ledger {
    campaigns: Vec<Value>,
    target_audiences: BTreeSet<String>,
    channels: BTreeSet<String>,
    content_types: BTreeSet<String>,
    research: HashMap<String, Value>,
}

impl Ledger {
    fn note_audiences(&mut self, audiences: &Value) {
        if let Some(list) = audiences.as_array() {
            self.target_audiences
                .extend(list.iter().filter_map(Value::as_str).map(str::to_string));
        }
    }

    fn note_channel(&mut self, channel: &Value) {
        if let Some(channel) = channel.as_str().filter(|c| !c.is_empty()) {
            self.channels.insert(channel.to_string());
        }
    }
}

/// What one marketing agent has produced so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketingAgentMetrics {
    pub campaigns_created: usize,
    pub target_audiences: Vec<String>,
    pub marketing_channels: Vec<String>,
    pub content_types: Vec<String>,
    pub research_topics: Vec<String>,
    pub recent_campaigns: Vec<Value>,
}

/// Marketing work: campaigns, content, market research and social media.
///
/// Results always carry `"success"`. Unknown task types fail with an error
/// message rather than an `Err`.
pub struct MarketingBehavior {
    ledger: Mutex<Ledger>,
}

impl MarketingBehavior {
    pub fn new() -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub async fn marketing_metrics(&self) -> MarketingAgentMetrics {
        let ledger = self.ledger.lock().await;
        let skip = ledger.campaigns.len().saturating_sub(RECENT_CAMPAIGNS);
        MarketingAgentMetrics {
            campaigns_created: ledger.campaigns.len(),
            target_audiences: ledger.target_audiences.iter().cloned().collect(),
            marketing_channels: ledger.channels.iter().cloned().collect(),
            content_types: ledger.content_types.iter().cloned().collect(),
            research_topics: ledger.research.keys().cloned().collect(),
            recent_campaigns: ledger.campaigns.iter().skip(skip).cloned().collect(),
        }
    }

    /// Research recorded under `market_research_<topic>`.
    pub async fn research(&self, topic: &str) -> Option<Value> {
        let ledger = self.ledger.lock().await;
        ledger.research.get(&format!("market_research_{topic}")).cloned()
    }

    async fn create_campaign(&self, data: &Payload) -> Payload {
        let name = text(data, "name", "Unnamed Campaign");
        let campaign = json!({
            "id": stamped_id("camp"),
            "name": name,
            "objective": text(data, "objective", ""),
            "target_audience": field(data, "target_audience", json!([])),
            "channels": field(data, "channels", json!([])),
            "budget": field(data, "budget", json!(0)),
            "timeline": {
                "start_date": text(data, "start_date", ""),
                "end_date": text(data, "end_date", ""),
                "milestones": field(data, "milestones", json!([])),
            },
            "metrics": {
                "kpi": field(data, "kpi", json!([])),
                "targets": field(data, "targets", json!({})),
            },
            "status": "created",
            "created_at": Utc::now().to_rfc3339(),
        });

        let mut ledger = self.ledger.lock().await;
        ledger.note_audiences(&campaign["target_audience"]);
        if let Some(channels) = campaign["channels"].as_array() {
            for channel in channels {
                ledger.note_channel(channel);
            }
        }
        ledger.campaigns.push(campaign.clone());

        payload(json!({
            "success": true,
            "campaign": campaign,
            "message": format!("Campaign {name} created successfully"),
        }))
    }

    async fn create_content(&self, data: &Payload) -> Payload {
        let content_type = text(data, "content_type", "text");
        let content = json!({
            "id": stamped_id("content"),
            "type": content_type,
            "topic": text(data, "topic", ""),
            "text": text(data, "text", ""),
            "target_audience": field(data, "target_audience", json!([])),
            "channel": text(data, "channel", ""),
            "format": text(data, "format", ""),
            "tone": text(data, "tone", "professional"),
            "keywords": field(data, "keywords", json!([])),
            "call_to_action": text(data, "call_to_action", ""),
            "created_at": Utc::now().to_rfc3339(),
        });

        let mut ledger = self.ledger.lock().await;
        ledger.content_types.insert(content_type.clone());
        ledger.note_audiences(&content["target_audience"]);
        ledger.note_channel(&content["channel"]);

        payload(json!({
            "success": true,
            "content": content,
            "message": format!("Content of type {content_type} created successfully"),
        }))
    }

    async fn conduct_market_research(&self, data: &Payload) -> Payload {
        let topic = text(data, "topic", "");
        let research = json!({
            "id": stamped_id("research"),
            "topic": topic,
            "scope": text(data, "scope", ""),
            "methodology": field(data, "methodology", json!([])),
            "findings": {
                "market_size": field(data, "market_size", json!(0)),
                "competitors": field(data, "competitors", json!([])),
                "trends": field(data, "trends", json!([])),
                "opportunities": field(data, "opportunities", json!([])),
                "threats": field(data, "threats", json!([])),
            },
            "recommendations": field(data, "recommendations", json!([])),
            "created_at": Utc::now().to_rfc3339(),
        });

        self.ledger
            .lock()
            .await
            .research
            .insert(format!("market_research_{topic}"), research.clone());

        payload(json!({
            "success": true,
            "research": research,
            "message": format!("Market research on {topic} completed successfully"),
        }))
    }

    async fn handle_social_media(&self, data: &Payload) -> Payload {
        let platform = text(data, "platform", "");
        let task = json!({
            "id": stamped_id("social"),
            "platform": platform,
            "action": text(data, "action", ""),
            "content": field(data, "content", json!({})),
            "schedule": field(data, "schedule", json!({})),
            "metrics": field(data, "metrics", json!({})),
            "created_at": Utc::now().to_rfc3339(),
        });

        self.ledger
            .lock()
            .await
            .note_channel(&task["platform"]);

        payload(json!({
            "success": true,
            "task": task,
            "message": format!("Social media task on {platform} handled successfully"),
        }))
    }
}

impl Default for MarketingBehavior {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentBehavior for MarketingBehavior {
    async fn process(&self, input: &Payload) -> CadreResult<Payload> {
        let task_type = input.get("type").and_then(Value::as_str).unwrap_or("");
        info!(task_type, "Processing marketing task");

        let result = match task_type {
            "campaign_creation" => self.create_campaign(input).await,
            "content_creation" => self.create_content(input).await,
            "market_research" => self.conduct_market_research(input).await,
            "social_media" => self.handle_social_media(input).await,
            other => {
                error!(task_type = other, "Unknown task type");
                payload(json!({
                    "success": false,
                    "error": format!("Unknown task type: {other}"),
                }))
            }
        };
        Ok(result)
    }
}

fn stamped_id(prefix: &str) -> String {
    format!("{prefix}_{}", Utc::now().format("%Y%m%d_%H%M%S"))
}

fn field(data: &Payload, key: &str, default: Value) -> Value {
    data.get(key).cloned().unwrap_or(default)
}

fn text(data: &Payload, key: &str, default: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}
