use cadre_core::{require_non_empty, CadreResult, Payload};
use serde::{Deserialize, Serialize};

/// Severity of a checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Result of evaluating one checklist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub passed: bool,
    pub severity: Severity,
    pub description: String,
}

impl CheckOutcome {
    pub fn pass(severity: Severity, description: impl Into<String>) -> Self {
        Self {
            passed: true,
            severity,
            description: description.into(),
        }
    }

    pub fn fail(severity: Severity, description: impl Into<String>) -> Self {
        Self {
            passed: false,
            severity,
            description: description.into(),
        }
    }

    /// A check whose outcome is `passed`, keeping the same description either way.
    pub fn check(passed: bool, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            passed,
            severity,
            description: description.into(),
        }
    }
}

/// Which part of a checklist applies to a piece of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewScope {
    /// Every category.
    All,
    /// Only the named categories.
    Categories(Vec<String>),
    /// The work cannot be reviewed; recorded as one failed high-severity check.
    Unsupported { reason: String },
}

/// Department-specific pass/fail rule for one checklist item.
///
/// An `Err` means the item could not be evaluated; the review logs it and
/// moves on to the next item.
pub trait ChecklistEvaluator: Send + Sync {
    fn evaluate(
        &self,
        category: &str,
        item: &str,
        task_data: &Payload,
        result: &Payload,
    ) -> CadreResult<CheckOutcome>;

    /// Narrow the sweep for this task. Defaults to the whole checklist.
    fn scope(&self, _task_data: &Payload) -> ReviewScope {
        ReviewScope::All
    }
}

impl<F> ChecklistEvaluator for F
where
    F: Fn(&str, &str, &Payload, &Payload) -> CadreResult<CheckOutcome> + Send + Sync,
{
    fn evaluate(
        &self,
        category: &str,
        item: &str,
        task_data: &Payload,
        result: &Payload,
    ) -> CadreResult<CheckOutcome> {
        self(category, item, task_data, result)
    }
}

/// One named category and its ordered items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistCategory {
    pub name: String,
    pub items: Vec<String>,
}

/// Ordered category → item table.
///
/// Categories keep insertion order so reviews sweep them deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    categories: Vec<ChecklistCategory>,
}

impl Checklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(category, items)` pairs.
    pub fn from_categories<C, I, S>(categories: C) -> Self
    where
        C: IntoIterator<Item = (S, I)>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories
                .into_iter()
                .map(|(name, items)| ChecklistCategory {
                    name: name.into(),
                    items: items.into_iter().map(Into::into).collect(),
                })
                .collect(),
        }
    }

    /// Append an item to a category, creating the category if needed.
    pub fn add_item(&mut self, category: &str, item: &str) -> CadreResult<()> {
        require_non_empty(category, "Category")?;
        require_non_empty(item, "Checklist item text")?;
        match self.categories.iter_mut().find(|c| c.name == category) {
            Some(existing) => existing.items.push(item.to_string()),
            None => self.categories.push(ChecklistCategory {
                name: category.to_string(),
                items: vec![item.to_string()],
            }),
        }
        Ok(())
    }

    /// Replace every item of a category.
    pub fn replace_category(&mut self, category: &str, items: Vec<String>) -> CadreResult<()> {
        require_non_empty(category, "Category")?;
        match self.categories.iter_mut().find(|c| c.name == category) {
            Some(existing) => existing.items = items,
            None => self.categories.push(ChecklistCategory {
                name: category.to_string(),
                items,
            }),
        }
        Ok(())
    }

    pub fn category(&self, name: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.items.as_slice())
    }

    pub fn contains(&self, category: &str, item: &str) -> bool {
        self.category(category)
            .is_some_and(|items| items.iter().any(|i| i == item))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Every `(category, item)` pair in sweep order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories.iter().flat_map(|c| {
            c.items
                .iter()
                .map(move |item| (c.name.as_str(), item.as_str()))
        })
    }

    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}

/// A failed item reported back to the task owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFinding {
    pub category: String,
    pub item: String,
    pub severity: Severity,
    pub description: String,
}

/// A single evaluated item, kept for scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub category: String,
    pub item: String,
    pub outcome: CheckOutcome,
}

/// Everything one checklist sweep produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistSweep {
    /// Every item the evaluator answered, in sweep order.
    pub checks: Vec<CheckRecord>,
    /// Failed high-severity items.
    pub issues: Vec<ReviewFinding>,
    /// Failed low/medium-severity items.
    pub suggestions: Vec<ReviewFinding>,
    /// Items the evaluator could not answer.
    pub skipped: usize,
}

impl ChecklistSweep {
    /// Record one answered item and bucket it when it failed.
    pub fn record(&mut self, category: &str, item: &str, outcome: CheckOutcome) {
        if !outcome.passed {
            let finding = ReviewFinding {
                category: category.to_string(),
                item: item.to_string(),
                severity: outcome.severity,
                description: outcome.description.clone(),
            };
            if outcome.severity == Severity::High {
                self.issues.push(finding);
            } else {
                self.suggestions.push(finding);
            }
        }
        self.checks.push(CheckRecord {
            category: category.to_string(),
            item: item.to_string(),
            outcome,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checklist_keeps_insertion_order() {
        let mut checklist = Checklist::new();
        checklist.add_item("content", "Grammar").unwrap();
        checklist.add_item("campaign", "Budget").unwrap();
        checklist.add_item("content", "Tone").unwrap();

        let pairs: Vec<_> = checklist.items().collect();
        assert_eq!(
            pairs,
            vec![
                ("content", "Grammar"),
                ("content", "Tone"),
                ("campaign", "Budget")
            ]
        );
        assert_eq!(checklist.item_count(), 3);
        assert!(checklist.contains("campaign", "Budget"));
        assert!(!checklist.contains("campaign", "Grammar"));
    }

    #[test]
    fn test_add_item_validates() {
        let mut checklist = Checklist::new();
        assert!(checklist.add_item("", "Grammar").is_err());
        assert!(checklist.add_item("content", "").is_err());
        assert!(checklist.is_empty());
    }

    #[test]
    fn test_replace_category() {
        let mut checklist = Checklist::from_categories([("email", vec!["Subject", "Preview"])]);
        checklist
            .replace_category("email", vec!["Unsubscribe".to_string()])
            .unwrap();
        assert_eq!(checklist.category("email").unwrap(), ["Unsubscribe"]);
        checklist.replace_category("social", Vec::new()).unwrap();
        assert_eq!(checklist.categories().count(), 2);
    }

    #[test]
    fn test_sweep_buckets_by_severity() {
        let mut sweep = ChecklistSweep::default();
        sweep.record("content", "CTA", CheckOutcome::fail(Severity::High, "missing CTA"));
        sweep.record("content", "SEO", CheckOutcome::fail(Severity::Medium, "no keywords"));
        sweep.record("content", "Tone", CheckOutcome::pass(Severity::High, "ok"));

        assert_eq!(sweep.checks.len(), 3);
        assert_eq!(sweep.issues.len(), 1);
        assert_eq!(sweep.issues[0].item, "CTA");
        assert_eq!(sweep.suggestions.len(), 1);
        assert_eq!(sweep.suggestions[0].severity, Severity::Medium);
    }

    #[test]
    fn test_closure_is_an_evaluator() {
        let evaluator =
            |_: &str, item: &str, _: &Payload, _: &Payload| -> CadreResult<CheckOutcome> {
                Ok(CheckOutcome::check(item == "good", Severity::Low, item))
            };
        let outcome = evaluator
            .evaluate("c", "good", &Payload::new(), &Payload::new())
            .unwrap();
        assert!(outcome.passed);
    }

    #[test]
    fn test_severity_serialization() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
        assert_eq!(Severity::Medium.to_string(), "medium");
    }
}
