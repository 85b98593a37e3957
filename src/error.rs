//! # Translation Errors
//!
//! Fatal errors abort the whole translation pass. Tolerated conditions
//! (blind and assumed references) are not errors; they are reported through
//! the structured diagnostic channel on the evaluation state instead.

use thiserror::Error;

/// Errors raised during a translation pass.
#[derive(Debug, Error)]
pub enum Error {
    /// A label string in the workspace description does not parse.
    #[error("invalid label '{label}': {reason}")]
    LabelSyntax { label: String, reason: String },

    /// A target owned by the current repository has no registered record.
    #[error("target not found: {0}")]
    TargetNotFound(String),

    /// A node reached a code path that requires a provider facet it lacks.
    /// This is an internal invariant violation, not a user error.
    #[error("target {target} is missing required provider {provider}")]
    MissingProvider {
        target: String,
        provider: &'static str,
    },

    /// A compiler plugin reference resolved to zero or multiple CMake
    /// targets; plugin wiring needs exactly one binary.
    #[error("resolving plugin {plugin} returned {resolved:?}")]
    PluginResolution {
        plugin: String,
        resolved: Vec<String>,
    },

    /// A generated library would have no sources, no dependencies, and no
    /// existing reference: a compilation unit that produces nothing.
    #[error("proto generation failed: {target} no inputs for {library}")]
    NoInputs { target: String, library: String },

    /// The dependency graph loops back into a node still being resolved.
    #[error("proto dependency cycle: {0}")]
    DependencyCycle(String),

    /// The workspace description could not be deserialized.
    #[error("invalid workspace description: {0}")]
    Description(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn label_syntax(label: &str, reason: impl Into<String>) -> Self {
        Error::LabelSyntax {
            label: label.to_string(),
            reason: reason.into(),
        }
    }
}
