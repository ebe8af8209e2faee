use crate::types::Task;
use cadre_agent::Agent;
use std::collections::HashMap;

/// Decides whether an agent is able to take a task.
pub trait CapabilityMatcher: Send + Sync {
    fn can_handle(&self, agent: &Agent, task: &Task) -> bool;
}

/// Maps each task type to required skills, all of which must reach a minimum
/// proficiency. Unknown task types never match.
#[derive(Debug, Clone)]
pub struct SkillRequirementMatcher {
    requirements: HashMap<String, Vec<String>>,
    min_proficiency: f64,
}

impl SkillRequirementMatcher {
    pub fn new(min_proficiency: f64) -> Self {
        Self {
            requirements: HashMap::new(),
            min_proficiency,
        }
    }

    pub fn with_requirement<I, S>(mut self, task_type: &str, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements.insert(
            task_type.to_string(),
            skills.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn required_skills(&self, task_type: &str) -> Option<&[String]> {
        self.requirements.get(task_type).map(Vec::as_slice)
    }

    pub fn min_proficiency(&self) -> f64 {
        self.min_proficiency
    }
}

impl CapabilityMatcher for SkillRequirementMatcher {
    fn can_handle(&self, agent: &Agent, task: &Task) -> bool {
        let Some(required) = self.requirements.get(&task.task_type) else {
            return false;
        };
        required.iter().all(|skill| {
            agent
                .skills()
                .get(skill)
                .is_some_and(|level| *level >= self.min_proficiency)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use cadre_core::Payload;

    fn agent(skills: &[(&str, f64)]) -> Agent {
        Agent::new("Avery", "Marketing", "Specialist")
            .unwrap()
            .with_skills(skills.iter().map(|(s, l)| (s.to_string(), *l)).collect())
    }

    fn matcher() -> SkillRequirementMatcher {
        SkillRequirementMatcher::new(0.7)
            .with_requirement("content_creation", ["content_creation", "brand_management"])
    }

    #[test]
    fn test_all_required_skills_at_threshold() {
        let task = Task::new("content_creation", Payload::new(), 1);
        let capable = agent(&[("content_creation", 0.8), ("brand_management", 0.7)]);
        assert!(matcher().can_handle(&capable, &task));
    }

    #[test]
    fn test_one_skill_below_threshold() {
        let task = Task::new("content_creation", Payload::new(), 1);
        let weak = agent(&[("content_creation", 0.8), ("brand_management", 0.69)]);
        assert!(!matcher().can_handle(&weak, &task));

        let missing = agent(&[("content_creation", 0.9)]);
        assert!(!matcher().can_handle(&missing, &task));
    }

    #[test]
    fn test_unknown_type_never_matches() {
        let task = Task::new("video_editing", Payload::new(), 1);
        let expert = agent(&[("content_creation", 1.0), ("brand_management", 1.0)]);
        assert!(!matcher().can_handle(&expert, &task));
        assert!(matcher().required_skills("video_editing").is_none());
    }
}
