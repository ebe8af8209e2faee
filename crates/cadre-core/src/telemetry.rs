use tracing::Span;
use tracing_subscriber::EnvFilter;

/// Tracing handle owned by one component (agent, QA agent, manager).
///
/// Components are constructed with their handle and enter it around their
/// own bookkeeping, so every event they emit carries the component, name and
/// department fields without any process-wide logger object.
#[derive(Debug, Clone)]
pub struct Telemetry {
    span: Span,
}

impl Telemetry {
    /// Create a root handle for a component.
    pub fn new(component: &'static str, name: &str, department: &str) -> Self {
        Self {
            span: tracing::info_span!(
                "cadre",
                component = component,
                name = %name,
                department = %department
            ),
        }
    }

    /// A handle whose span records nothing.
    pub fn disabled() -> Self {
        Self { span: Span::none() }
    }

    /// Derive a nested handle, e.g. for an agent owned by a manager.
    pub fn child(&self, component: &'static str, name: &str, department: &str) -> Self {
        Self {
            span: tracing::info_span!(
                parent: &self.span,
                "cadre",
                component = component,
                name = %name,
                department = %department
            ),
        }
    }

    /// Enter the handle's span for the lifetime of the returned guard.
    ///
    /// Only hold the guard across synchronous code.
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns `false` when a
/// subscriber was already installed.
///
/// # Examples
///
/// Call once at startup, before building a manager, so every component's
/// span reaches the output:
///
/// ```
/// use cadre_core::telemetry::init_tracing;
///
/// init_tracing("info,cadre_orchestrator=debug", false);
/// // A second call leaves the first subscriber in place.
/// assert!(!init_tracing("warn", true));
/// ```
pub fn init_tracing(default_filter: &str, json: bool) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}
