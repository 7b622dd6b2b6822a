//! Declaration-tree visitors that report diagnostics.

mod semantics;

use crate::diagnostics::Diagnostic;
use crate::ir::{Declaration, Function, IrModule, Struct};

pub use semantics::BehaviorPlacement;

/// A visitor over one module's declaration tree.
///
/// The default walk descends into nested declarations, threading the
/// enclosing struct, and calls [`Pass::accept_function`] for every function.
pub trait Pass: Send {
    fn name(&self) -> &'static str;

    fn accept(&mut self, module: &IrModule) {
        for declaration in &module.declarations {
            self.accept_declaration(module, declaration, None);
        }
    }

    fn accept_declaration(
        &mut self,
        module: &IrModule,
        declaration: &Declaration,
        parent: Option<&Struct>,
    ) {
        match declaration {
            Declaration::Struct(structure) => {
                for nested in &structure.declarations {
                    self.accept_declaration(module, nested, Some(structure));
                }
            }
            Declaration::Function(function) => self.accept_function(module, function, parent),
        }
    }

    fn accept_function(
        &mut self,
        _module: &IrModule,
        _function: &Function,
        _parent: Option<&Struct>,
    ) {
    }

    fn take_diagnostics(&mut self) -> Vec<Diagnostic>;
}

type PassFactory = fn() -> Box<dyn Pass>;

/// Runs a fixed set of passes. Every run gets fresh pass instances, so the
/// manager can be shared between threads compiling different modules.
#[derive(Clone, Default)]
pub struct PassManager {
    passes: Vec<PassFactory>,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The passes that gate lowering.
    pub fn semantic() -> Self {
        Self::new().with_pass(|| Box::new(BehaviorPlacement::default()))
    }

    pub fn with_pass(mut self, factory: PassFactory) -> Self {
        self.passes.push(factory);
        self
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn run(&self, module: &IrModule) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for factory in &self.passes {
            let mut pass = factory();
            pass.accept(module);
            let found = pass.take_diagnostics();
            tracing::debug!(
                "[passes] {} reported {} diagnostic(s) for {}",
                pass.name(),
                found.len(),
                module.full_path()
            );
            diagnostics.extend(found);
        }
        diagnostics
    }
}
