use super::Pass;
use crate::diagnostics::{Diagnostic, Label};
use crate::ir::{Function, FunctionKind, IrModule, Struct, StructKind};

const DIAGNOSTIC_CONTEXT: &str = "semantics";

/// Behaviors may only be declared directly inside an actor.
#[derive(Debug, Default)]
pub struct BehaviorPlacement {
    diagnostics: Vec<Diagnostic>,
}

impl Pass for BehaviorPlacement {
    fn name(&self) -> &'static str {
        "behavior-placement"
    }

    fn accept_function(&mut self, module: &IrModule, function: &Function, parent: Option<&Struct>) {
        if function.kind != FunctionKind::Behavior {
            return;
        }
        if parent.is_some_and(|parent| parent.kind == StructKind::Actor) {
            return;
        }
        self.diagnostics.push(
            Diagnostic::error("Behavior functions must be within actors")
                .with_label(Label::new(
                    module.full_path().to_key(),
                    function.location,
                    "Behavior function must be within actor",
                ))
                .with_source_context(DIAGNOSTIC_CONTEXT),
        );
    }

    fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
