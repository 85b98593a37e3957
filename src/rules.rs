//! # Deferred Rules
//!
//! Build declarations register rules without evaluating them; the driver
//! drains the queue in registration order once every target in the
//! workspace is known. Each rule snapshots the package that declared it so
//! relative labels keep resolving against the right package at evaluation
//! time.

use crate::codegen::proto::{cc_proto_library_impl, PluginProfile};
use crate::context::TranslationContext;
use crate::error::Error;
use crate::label::{PackageId, TargetId};

/// One queued build rule awaiting evaluation.
pub trait Rule {
    /// The target this rule declares.
    fn target(&self) -> &TargetId;

    /// Evaluate the rule, emitting its output through the context.
    fn evaluate(&self, ctx: &mut TranslationContext) -> Result<(), Error>;
}

/// Register a `cc_proto_library` aggregate rule for deferred evaluation.
/// Visibility is recorded but does not affect emission.
pub fn cc_proto_library(
    ctx: &mut TranslationContext,
    name: &str,
    deps: Vec<String>,
    extra_deps: Vec<String>,
    visibility: Vec<String>,
) -> Result<(), Error> {
    let target = ctx.parse_rule_target(name)?;
    let package = ctx.caller_package().clone();
    ctx.add_rule(Box::new(CcProtoLibraryRule {
        target,
        package,
        deps,
        extra_deps,
        visibility,
    }));
    Ok(())
}

struct CcProtoLibraryRule {
    target: TargetId,
    package: PackageId,
    deps: Vec<String>,
    extra_deps: Vec<String>,
    #[allow(dead_code)]
    visibility: Vec<String>,
}

impl Rule for CcProtoLibraryRule {
    fn target(&self) -> &TargetId {
        &self.target
    }

    fn evaluate(&self, ctx: &mut TranslationContext) -> Result<(), Error> {
        tracing::debug!(
            "[proto2cmake] evaluating cc_proto_library({})",
            self.target.as_label()
        );
        ctx.set_caller_package(self.package.clone());
        cc_proto_library_impl(
            ctx,
            &self.target,
            &[PluginProfile::cc()],
            &self.deps,
            &self.extra_deps,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::EvaluationState;
    use crate::label::RepositoryId;

    #[test]
    fn registration_queues_without_emitting() {
        let state = EvaluationState::new(RepositoryId::new("main"), "CMakeProject");
        let mut ctx = TranslationContext::new(state);
        ctx.set_caller_package(RepositoryId::new("main").package("pkg"));

        cc_proto_library(
            &mut ctx,
            "a_cc_proto",
            vec![":a_proto".to_string()],
            vec![],
            vec!["//visibility:public".to_string()],
        )
        .unwrap();

        assert!(ctx.builder.as_str().is_empty());
        let pending = ctx.take_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].target().as_label(), "@main//pkg:a_cc_proto");
    }

    #[test]
    fn evaluation_resolves_against_the_declaring_package() {
        let state = EvaluationState::new(RepositoryId::new("main"), "CMakeProject");
        let mut ctx = TranslationContext::new(state);
        ctx.set_caller_package(RepositoryId::new("main").package("nested/pkg"));
        cc_proto_library(&mut ctx, "x_cc_proto", vec![], vec![], vec![]).unwrap();

        // The caller package moves on before the queue drains.
        ctx.set_caller_package(RepositoryId::new("main").package("elsewhere"));
        for rule in ctx.take_pending() {
            rule.evaluate(&mut ctx).unwrap();
        }
        assert!(ctx
            .builder
            .as_str()
            .contains("# cc_proto_library(@main//nested/pkg:x_cc_proto)"));
    }

    #[test]
    fn invalid_rule_name_is_rejected() {
        let state = EvaluationState::new(RepositoryId::new("main"), "CMakeProject");
        let mut ctx = TranslationContext::new(state);
        let err = cc_proto_library(&mut ctx, "bad name", vec![], vec![], vec![]).unwrap_err();
        assert!(matches!(err, Error::LabelSyntax { .. }));
    }
}
