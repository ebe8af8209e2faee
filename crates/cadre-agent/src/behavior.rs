use async_trait::async_trait;
use cadre_core::{CadreResult, Payload};
use serde_json::Value;

/// Domain work performed on behalf of an agent.
///
/// Implementations may suspend on network or process I/O for arbitrarily
/// long. The returned payload must carry a status discriminator, either a
/// boolean `"success"` or a string `"status"`.
#[async_trait]
pub trait AgentBehavior: Send + Sync {
    async fn process(&self, input: &Payload) -> CadreResult<Payload>;
}

/// Outcome read from a collaborator result's discriminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultStatus {
    Succeeded,
    Failed { reason: String },
    /// The collaborator omitted both `"success"` and `"status"`.
    Missing,
}

impl ResultStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ResultStatus::Succeeded)
    }
}

/// Read the status discriminator of a collaborator result.
///
/// `"success"` wins when both keys are present. A string `"status"` counts as
/// success for `success`, `completed` and `approved`.
pub fn result_status(result: &Payload) -> ResultStatus {
    let reason = || {
        result
            .get("error")
            .or_else(|| result.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("collaborator reported failure")
            .to_string()
    };

    if let Some(success) = result.get("success") {
        return match success.as_bool() {
            Some(true) => ResultStatus::Succeeded,
            _ => ResultStatus::Failed { reason: reason() },
        };
    }

    match result.get("status").and_then(Value::as_str) {
        Some("success" | "completed" | "approved") => ResultStatus::Succeeded,
        Some(_) => ResultStatus::Failed { reason: reason() },
        None => ResultStatus::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadre_core::payload;
    use serde_json::json;

    #[test]
    fn test_success_flag() {
        let ok = payload(json!({"success": true, "content": {}}));
        assert_eq!(result_status(&ok), ResultStatus::Succeeded);

        let failed = payload(json!({"success": false, "error": "Unknown task type: x"}));
        assert_eq!(
            result_status(&failed),
            ResultStatus::Failed {
                reason: "Unknown task type: x".into()
            }
        );
    }

    #[test]
    fn test_status_string() {
        assert!(result_status(&payload(json!({"status": "success"}))).is_success());
        assert!(!result_status(&payload(json!({"status": "error"}))).is_success());
    }

    #[test]
    fn test_missing_discriminator() {
        let result = payload(json!({"content": "no status here"}));
        assert_eq!(result_status(&result), ResultStatus::Missing);
    }
}
