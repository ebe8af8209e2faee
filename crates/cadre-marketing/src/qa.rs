use cadre_core::{CadreResult, Payload};
use cadre_qa::{CheckOutcome, Checklist, ChecklistEvaluator, QaAgent, ReviewScope, Severity};
use serde_json::Value;
use std::sync::Arc;

const CONTENT: &str = "content";
const CAMPAIGN: &str = "campaign";
const SOCIAL_MEDIA: &str = "social_media";
const EMAIL: &str = "email";

/// Default marketing review checklist.
pub fn marketing_checklist() -> Checklist {
    Checklist::from_categories([
        (
            CONTENT,
            vec![
                "Brand voice consistency",
                "Grammar and spelling",
                "Call-to-action presence",
                "Target audience alignment",
                "SEO optimization",
            ],
        ),
        (
            CAMPAIGN,
            vec![
                "Objective clarity",
                "Audience definition",
                "Budget reasonableness",
                "Timeline feasibility",
                "Metrics measurability",
            ],
        ),
        (
            SOCIAL_MEDIA,
            vec![
                "Platform compliance",
                "Hashtag usage",
                "Visual requirements",
                "Engagement elements",
                "Timing optimization",
            ],
        ),
        (
            EMAIL,
            vec![
                "Subject line effectiveness",
                "Preview text optimization",
                "Mobile responsiveness",
                "Compliance elements",
                "Personalization",
            ],
        ),
    ])
}

/// Default marketing review guidelines.
pub fn marketing_guidelines() -> Checklist {
    Checklist::from_categories([
        (
            CONTENT,
            vec![
                "Content aligns with brand voice and guidelines",
                "Grammar and spelling are correct",
                "Call-to-action is clear and compelling",
                "Content is optimized for target audience",
                "SEO best practices are followed",
            ],
        ),
        (
            CAMPAIGN,
            vec![
                "Campaign objectives are clearly defined",
                "Target audience is well-defined",
                "Budget allocation is appropriate",
                "Timeline is realistic",
                "Success metrics are measurable",
            ],
        ),
        (
            SOCIAL_MEDIA,
            vec![
                "Platform-specific best practices are followed",
                "Hashtags are relevant and researched",
                "Visual content meets platform requirements",
                "Engagement prompts are included",
                "Posting time is optimized",
            ],
        ),
        (
            EMAIL,
            vec![
                "Subject line is compelling",
                "Preview text is optimized",
                "Content is mobile-responsive",
                "Unsubscribe link is present",
                "Personalization is implemented",
            ],
        ),
    ])
}

/// A QA agent with the marketing checklist, guidelines and evaluator.
pub fn marketing_qa_agent(name: &str) -> CadreResult<QaAgent> {
    Ok(QaAgent::new(name, "Marketing", Arc::new(MarketingChecklistEvaluator::new()))?
        .with_checklist(marketing_checklist())
        .with_guidelines(marketing_guidelines()))
}

/// Pass/fail rules for the marketing checklist.
///
/// Only the category matching the task type is reviewed; tasks of any other
/// type are rejected outright.
#[derive(Debug, Clone)]
pub struct MarketingChecklistEvaluator {
    known: Checklist,
}

impl MarketingChecklistEvaluator {
    pub fn new() -> Self {
        Self {
            known: marketing_checklist(),
        }
    }

    /// Checklist category reviewed for a task type.
    pub fn category_for(task_type: &str) -> Option<&'static str> {
        match task_type {
            "content_creation" => Some(CONTENT),
            "campaign_creation" => Some(CAMPAIGN),
            "social_media" => Some(SOCIAL_MEDIA),
            "email_marketing" => Some(EMAIL),
            _ => None,
        }
    }
}

impl Default for MarketingChecklistEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ChecklistEvaluator for MarketingChecklistEvaluator {
    fn scope(&self, task_data: &Payload) -> ReviewScope {
        let task_type = task_data.get("type").and_then(Value::as_str).unwrap_or("");
        match Self::category_for(task_type) {
            Some(category) => ReviewScope::Categories(vec![category.to_string()]),
            None => ReviewScope::Unsupported {
                reason: format!("Unknown task type: {task_type}"),
            },
        }
    }

    fn evaluate(
        &self,
        category: &str,
        item: &str,
        task_data: &Payload,
        result: &Payload,
    ) -> CadreResult<CheckOutcome> {
        if self.known.category(category).is_none() {
            return Ok(CheckOutcome::fail(
                Severity::High,
                format!("Unknown category: {category}"),
            ));
        }
        if !self.known.contains(category, item) {
            return Ok(CheckOutcome::fail(
                Severity::High,
                format!("Unknown checklist item: {item}"),
            ));
        }

        let outcome = match category {
            CONTENT => check_content(item, task_data, section(result, "content")),
            CAMPAIGN => check_campaign(item, section(result, "campaign")),
            SOCIAL_MEDIA => check_social_media(item, section(result, "task")),
            EMAIL => check_email(item, section(result, "content")),
            _ => None,
        };
        Ok(outcome.unwrap_or_else(|| CheckOutcome::pass(Severity::Low, "Default check passed")))
    }
}

fn check_content(item: &str, task_data: &Payload, content: &Value) -> Option<CheckOutcome> {
    let outcome = match item {
        "Brand voice consistency" => {
            let tone = content.get("tone").and_then(Value::as_str).unwrap_or("");
            let allowed = task_data
                .get("brand_voice")
                .and_then(|voice| voice.get("allowed_tones"))
                .and_then(Value::as_array)
                .is_some_and(|tones| tones.iter().any(|t| t.as_str() == Some(tone)));
            CheckOutcome::check(
                allowed,
                Severity::High,
                format!("Content tone '{tone}' should match brand voice guidelines"),
            )
        }
        // No grammar service is wired in; the item always passes.
        "Grammar and spelling" => {
            CheckOutcome::pass(Severity::High, "Grammar and spelling check passed")
        }
        "Call-to-action presence" => CheckOutcome::check(
            truthy(content.get("call_to_action")),
            Severity::High,
            "Call-to-action is required",
        ),
        "Target audience alignment" => {
            let wanted = task_data
                .get("target_audience")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let aligned = content
                .get("target_audience")
                .and_then(Value::as_array)
                .map_or(true, |audience| audience.iter().all(|a| wanted.contains(a)));
            CheckOutcome::check(
                aligned,
                Severity::High,
                "Content should target the specified audience",
            )
        }
        "SEO optimization" => CheckOutcome::check(
            truthy(content.get("keywords")),
            Severity::Medium,
            "Keywords should be specified for SEO",
        ),
        _ => return None,
    };
    Some(outcome)
}

fn check_campaign(item: &str, campaign: &Value) -> Option<CheckOutcome> {
    let outcome = match item {
        "Objective clarity" => {
            let objective = campaign.get("objective").and_then(Value::as_str).unwrap_or("");
            CheckOutcome::check(
                objective.chars().count() > 10,
                Severity::High,
                "Campaign objective should be clearly defined",
            )
        }
        "Audience definition" => CheckOutcome::check(
            truthy(campaign.get("target_audience")),
            Severity::High,
            "Target audience should be specified",
        ),
        "Budget reasonableness" => CheckOutcome::check(
            campaign.get("budget").and_then(Value::as_f64).unwrap_or(0.0) > 0.0,
            Severity::High,
            "Campaign budget should be specified",
        ),
        "Timeline feasibility" => {
            let timeline = campaign.get("timeline");
            let has_dates = truthy(timeline.and_then(|t| t.get("start_date")))
                && truthy(timeline.and_then(|t| t.get("end_date")));
            CheckOutcome::check(has_dates, Severity::High, "Campaign timeline should be specified")
        }
        "Metrics measurability" => CheckOutcome::check(
            truthy(campaign.get("metrics").and_then(|m| m.get("kpi"))),
            Severity::High,
            "Success metrics should be specified",
        ),
        _ => return None,
    };
    Some(outcome)
}

fn check_social_media(item: &str, social: &Value) -> Option<CheckOutcome> {
    let content = social.get("content");
    let content_field = |key: &str| truthy(content.and_then(|c| c.get(key)));
    let outcome = match item {
        "Platform compliance" => CheckOutcome::check(
            truthy(social.get("platform")) && truthy(content),
            Severity::High,
            "Content should meet platform requirements",
        ),
        "Hashtag usage" => CheckOutcome::check(
            content_field("hashtags"),
            Severity::Medium,
            "Hashtags should be used appropriately",
        ),
        "Visual requirements" => CheckOutcome::check(
            content_field("image") || content_field("video"),
            Severity::Medium,
            "Visual content should meet platform requirements",
        ),
        "Engagement elements" => CheckOutcome::check(
            content_field("engagement_prompt"),
            Severity::Medium,
            "Content should include engagement elements",
        ),
        "Timing optimization" => CheckOutcome::check(
            truthy(social.get("schedule").and_then(|s| s.get("posting_time"))),
            Severity::Low,
            "Posting time should be optimized",
        ),
        _ => return None,
    };
    Some(outcome)
}

fn check_email(item: &str, email: &Value) -> Option<CheckOutcome> {
    let flag = |key: &str| email.get(key).and_then(Value::as_bool).unwrap_or(false);
    let outcome = match item {
        "Subject line effectiveness" => CheckOutcome::check(
            truthy(email.get("subject")),
            Severity::High,
            "Subject line should be compelling",
        ),
        "Preview text optimization" => CheckOutcome::check(
            truthy(email.get("preview_text")),
            Severity::Medium,
            "Preview text should be optimized",
        ),
        "Mobile responsiveness" => CheckOutcome::check(
            flag("mobile_responsive"),
            Severity::High,
            "Email should be mobile-responsive",
        ),
        "Compliance elements" => CheckOutcome::check(
            truthy(email.get("unsubscribe_link")),
            Severity::High,
            "Email should include compliance elements",
        ),
        "Personalization" => CheckOutcome::check(
            flag("personalized"),
            Severity::Medium,
            "Email should be personalized",
        ),
        _ => return None,
    };
    Some(outcome)
}

fn section<'a>(result: &'a Payload, key: &str) -> &'a Value {
    result.get(key).unwrap_or(&Value::Null)
}

/// Present and non-empty.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}
