//! # Translation Driver
//!
//! Main entry points for translating a workspace description into a CMake
//! script fragment.

use crate::context::TranslationContext;
use crate::error::Error;
use crate::evaluation::{Diagnostic, EvaluationState};
use crate::workspace::WorkspaceDescription;

/// The result of one translation pass.
#[derive(Debug)]
pub struct Translation {
    /// The accumulated CMake script fragment, in traversal order.
    pub script: String,
    /// Tolerated degradations recorded during the pass, in order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Translate a workspace description to a CMake script fragment.
///
/// This is the main entry point. It takes the dependency graph of one
/// repository and emits the `add_library` / `btc_protobuf` fragments for
/// every `cc_proto_library` the workspace declares, in declaration order.
///
/// # Arguments
///
/// * `workspace` - The workspace description to translate
///
/// # Returns
///
/// * `Ok(Translation)` - The generated script and any diagnostics
/// * `Err(Error)` - A descriptive error if translation fails
///
/// # Examples
///
/// ```rust,no_run
/// use proto2cmake::{translate, WorkspaceDescription};
///
/// let workspace = WorkspaceDescription::new("main", "CMakeProject");
/// // ... describe packages, proto_libraries, and cc_proto_libraries
///
/// match translate(&workspace) {
///     Ok(translation) => println!("{}", translation.script),
///     Err(e) => eprintln!("Translation failed: {}", e),
/// }
/// ```
pub fn translate(workspace: &WorkspaceDescription) -> Result<Translation, Error> {
    tracing::info!("[proto2cmake] Starting translation");
    tracing::info!(
        "[proto2cmake] Workspace: @{} ({} packages, {} mappings)",
        workspace.repository,
        workspace.packages.len(),
        workspace.mappings.len()
    );

    let state = EvaluationState::new(workspace.repository_id(), &workspace.project);
    let mut ctx = TranslationContext::new(state);

    // Phase 1: register declared targets and persisted mappings.
    tracing::info!("[proto2cmake] Phase 1: Registering workspace targets...");
    workspace.register_targets(&mut ctx)?;

    // Phase 2: queue aggregate rules for deferred evaluation.
    tracing::info!("[proto2cmake] Phase 2: Queueing rules...");
    workspace.queue_rules(&mut ctx)?;

    // Phase 3: evaluate in registration order.
    let pending = ctx.take_pending();
    tracing::info!("[proto2cmake] Phase 3: Evaluating {} rules...", pending.len());
    for rule in pending {
        rule.evaluate(&mut ctx)?;
    }

    let script = std::mem::take(&mut ctx.builder).build();
    let diagnostics = ctx.state.take_diagnostics();
    tracing::info!(
        "[proto2cmake] Translation complete ({} bytes, {} diagnostics)",
        script.len(),
        diagnostics.len()
    );

    Ok(Translation {
        script,
        diagnostics,
    })
}

/// Translate a JSON-encoded workspace description.
///
/// Convenience wrapper around [`translate`] for callers holding the
/// serialized form.
pub fn translate_json(json: &str) -> Result<Translation, Error> {
    let workspace = WorkspaceDescription::from_json(json)?;
    translate(&workspace)
}
