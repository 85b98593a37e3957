//! # Translation Context
//!
//! Owns one translation pass: the evaluation state, the shared script
//! builder, the package whose declarations are currently being processed,
//! and the queue of deferred rules. Everything emitted during the pass goes
//! through the builder held here, so fragment order is traversal order.

use crate::builder::ScriptBuilder;
use crate::error::Error;
use crate::evaluation::EvaluationState;
use crate::label::{PackageId, TargetId};
use crate::rules::Rule;

pub struct TranslationContext {
    pub state: EvaluationState,
    pub builder: ScriptBuilder,
    caller_package: PackageId,
    pending: Vec<Box<dyn Rule>>,
}

impl TranslationContext {
    pub fn new(state: EvaluationState) -> Self {
        let caller_package = state.repository().root_package();
        TranslationContext {
            state,
            builder: ScriptBuilder::new(),
            caller_package,
            pending: Vec::new(),
        }
    }

    /// The package issuing the declarations currently being processed.
    /// Label strings resolve relative to it, and first-party/foreign
    /// decisions compare against its repository.
    pub fn caller_package(&self) -> &PackageId {
        &self.caller_package
    }

    pub fn set_caller_package(&mut self, package: PackageId) {
        self.caller_package = package;
    }

    /// Queue a rule for deferred evaluation.
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        tracing::debug!("[proto2cmake] queued rule {}", rule.target().as_label());
        self.pending.push(rule);
    }

    /// Drain the deferred-rule queue, preserving registration order.
    pub fn take_pending(&mut self) -> Vec<Box<dyn Rule>> {
        std::mem::take(&mut self.pending)
    }

    /// Resolve one label string against the caller package.
    pub fn resolve_label(&self, label: &str) -> Result<TargetId, Error> {
        self.caller_package.parse_label(label)
    }

    /// Resolve a list of label strings against the caller package.
    pub fn resolve_target_or_label_list(&self, labels: &[String]) -> Result<Vec<TargetId>, Error> {
        labels
            .iter()
            .map(|label| self.caller_package.parse_label(label))
            .collect()
    }

    /// Resolve a rule's `name` attribute to a target in the caller package.
    pub fn parse_rule_target(&self, name: &str) -> Result<TargetId, Error> {
        self.caller_package.parse_target(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::RepositoryId;

    struct NullRule {
        target: TargetId,
    }

    impl Rule for NullRule {
        fn target(&self) -> &TargetId {
            &self.target
        }

        fn evaluate(&self, _ctx: &mut TranslationContext) -> Result<(), Error> {
            Ok(())
        }
    }

    fn context() -> TranslationContext {
        TranslationContext::new(EvaluationState::new(
            RepositoryId::new("main"),
            "CMakeProject",
        ))
    }

    #[test]
    fn labels_resolve_against_the_caller_package() {
        let mut ctx = context();
        ctx.set_caller_package(RepositoryId::new("main").package("tensor/proto"));
        assert_eq!(
            ctx.resolve_label(":schema_proto").unwrap().as_label(),
            "@main//tensor/proto:schema_proto"
        );
        assert_eq!(
            ctx.parse_rule_target("schema_cc_proto").unwrap().as_label(),
            "@main//tensor/proto:schema_cc_proto"
        );
        let list = ctx
            .resolve_target_or_label_list(&["//other:lib".to_string(), "sibling".to_string()])
            .unwrap();
        assert_eq!(list[0].as_label(), "@main//other:lib");
        assert_eq!(list[1].as_label(), "@main//tensor/proto:sibling");
    }

    #[test]
    fn pending_rules_drain_in_registration_order() {
        let mut ctx = context();
        let pkg = RepositoryId::new("main").package("pkg");
        ctx.add_rule(Box::new(NullRule {
            target: pkg.target("first"),
        }));
        ctx.add_rule(Box::new(NullRule {
            target: pkg.target("second"),
        }));
        let drained = ctx.take_pending();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].target().target_name(), "first");
        assert_eq!(drained[1].target().target_name(), "second");
        assert!(ctx.take_pending().is_empty());
    }
}
