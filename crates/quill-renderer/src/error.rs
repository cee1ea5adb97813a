//! Error types.
//!
//! Syntax a pass does not recognise is never an error. Only failures of
//! external renderers are document-fatal; they surface as [`PassError`]
//! and the orchestrator wraps them in a [`PipelineError`] naming the pass
//! and document.

/// Boxed error from an external renderer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Document-fatal failure inside a pass.
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    /// Diagrams must be rendered inline but no renderer was configured.
    #[error("{language} diagram found but no diagram renderer is configured\n  --> {excerpt}")]
    MissingDiagramRenderer { language: String, excerpt: String },

    /// The diagram renderer failed.
    #[error("{language} diagram failed to render: {source}\n  --> {excerpt}")]
    Diagram {
        language: String,
        excerpt: String,
        #[source]
        source: BoxError,
    },

    /// The math renderer rejected an expression.
    #[error("math failed to render: {message}\n  --> {excerpt}")]
    Math { excerpt: String, message: String },
}

/// Failure of a pipeline run.
#[derive(Debug, thiserror::Error)]
#[error("{document}: pass '{pass}' failed: {source}")]
pub struct PipelineError {
    /// Name of the failing pass.
    pub pass: &'static str,
    /// Document id, usually its path.
    pub document: String,
    #[source]
    pub source: PassError,
}

/// Short single-line excerpt of offending input for error messages.
#[must_use]
pub fn excerpt(input: &str) -> String {
    const MAX_CHARS: usize = 60;

    let line = input.trim().lines().next().unwrap_or_default();
    if line.chars().count() > MAX_CHARS {
        let cut: String = line.chars().take(MAX_CHARS).collect();
        format!("{cut}...")
    } else if input.trim().lines().nth(1).is_some() {
        format!("{line} ...")
    } else {
        line.to_owned()
    }
}
