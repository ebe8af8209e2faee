//! Core types and error definitions for the Cadre agent organization.
//!
//! This crate provides the foundational pieces shared across all Cadre crates:
//! the unified error type, the opaque payload map exchanged with collaborators,
//! the incremental running-mean helper, and per-component telemetry handles.
//!
//! # Main types
//!
//! - [`CadreError`]: Unified error enum for all Cadre subsystems.
//! - [`CadreResult`]: Convenience alias for `Result<T, CadreError>`.
//! - [`Payload`]: Opaque JSON object carried by tasks and results.
//! - [`running_mean`]: Incremental mean used by every metrics table.
//! - [`Telemetry`]: Explicitly passed tracing handle for one component.

/// Incremental metrics aggregation.
pub mod metrics;
/// Per-component tracing handles and subscriber setup.
pub mod telemetry;

pub use metrics::running_mean;
pub use telemetry::Telemetry;

/// Opaque structured payload: task data, collaborator results, knowledge values.
pub type Payload = serde_json::Map<String, serde_json::Value>;

// --- Error types ---

/// Top-level error type for the Cadre organization.
///
/// Recoverable domain outcomes (no capable agent, a failed checklist item,
/// a collaborator reporting failure) are *not* errors; they travel as
/// structured values. This enum carries the fatal channel only.
#[derive(Debug, thiserror::Error)]
pub enum CadreError {
    /// A missing or malformed argument supplied by the direct caller.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An error originating from an agent's lifecycle bookkeeping.
    #[error("Agent error: {0}")]
    Agent(String),

    /// A checklist evaluator or quality scorer broke its contract.
    #[error("Evaluator error: {0}")]
    Evaluator(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`CadreError`].
pub type CadreResult<T> = Result<T, CadreError>;

impl CadreError {
    /// Shorthand for a [`CadreError::Validation`] error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Fail with a validation error when `value` is empty.
pub fn require_non_empty(value: &str, what: &str) -> CadreResult<()> {
    if value.trim().is_empty() {
        return Err(CadreError::validation(format!("{what} is required")));
    }
    Ok(())
}

/// Build a [`Payload`] from a `serde_json::json!` object literal.
///
/// Non-object values produce an empty payload.
pub fn payload(value: serde_json::Value) -> Payload {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Payload::new(),
    }
}
