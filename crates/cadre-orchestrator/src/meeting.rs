use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Produces the decision recorded for one meeting topic.
pub trait DecisionGenerator: Send + Sync {
    fn decide(&self, topic: &str, rng: &mut dyn RngCore) -> String;
}

/// `"Decision regarding <topic>"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainDecisions;

impl DecisionGenerator for PlainDecisions {
    fn decide(&self, topic: &str, _rng: &mut dyn RngCore) -> String {
        format!("Decision regarding {topic}")
    }
}

/// Decision taken on one agenda topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDecision {
    pub topic: String,
    pub decision: String,
}

/// Follow-up assigned to an agent during a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub topic: String,
    pub action: String,
    pub assigned_to: Uuid,
    pub due_date: DateTime<Utc>,
}

/// Minutes returned by `Manager::hold_team_meeting`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingMinutes {
    pub date: DateTime<Utc>,
    pub attendees: Vec<String>,
    pub agenda: Vec<String>,
    pub decisions: Vec<MeetingDecision>,
    pub action_items: Vec<ActionItem>,
}

impl MeetingMinutes {
    pub fn decision_for(&self, topic: &str) -> Option<&str> {
        self.decisions
            .iter()
            .find(|d| d.topic == topic)
            .map(|d| d.decision.as_str())
    }
}
