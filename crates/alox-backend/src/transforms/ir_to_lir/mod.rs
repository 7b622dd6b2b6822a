//! IR → LIR lowering.
//!
//! Lowering runs in two phases per module. The header phase lowers every
//! declaration's type and declares every function symbol; the body phase
//! then defines the functions, so bodies may call anything declared in the
//! module regardless of order.

use crate::config::BackendConfig;
use alox_core::diagnostics::{Diagnostic, DiagnosticReport, Label};
use alox_core::ir::{
    Declaration, DeclarationRef, Function, FunctionType, InstId, IrModule, Struct, StructType,
    Type,
};
use alox_core::lir::{LirFunction, LirFunctionSignature, LirProgram, LirType, RuntimeSymbol};
use alox_core::span::SourceLocation;
use alox_core::DeclarationResolver;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

mod function;
mod types;

use function::FunctionLowering;

const LOG_AREA: &str = "[ir→lir]";
const DIAGNOSTIC_CONTEXT: &str = "ir_to_lir";

#[derive(Debug, Error)]
pub enum LowerError {
    #[error(transparent)]
    Resolution(#[from] alox_core::Error),
    #[error("unsupported float width: {0} bits")]
    UnsupportedFloatWidth(u32),
    #[error("field `{field}` of {structure} has unresolved type {reference}")]
    UnresolvedField {
        structure: String,
        field: String,
        reference: DeclarationRef,
    },
    #[error("{structure} has no field named `{field}`")]
    FieldNotFound { structure: String, field: String },
    #[error("{0} is not a struct")]
    NotAStruct(String),
    #[error("{structure} has no method named `{method}`")]
    MethodNotFound { structure: String, method: String },
    #[error("`this` used outside of a method")]
    ThisOutsideMethod,
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("cannot infer the type of {0}")]
    UnknownType(InstId),
    #[error("{0} is not a value")]
    NotAValue(String),
    #[error("{0} does not produce a value")]
    MissingValue(InstId),
    #[error("integer literal {value} does not fit in {ty}")]
    LiteralDoesNotFit { value: i64, ty: String },
    #[error("cannot assign to {0}")]
    NotAssignable(String),
}

impl From<LowerError> for alox_core::Error {
    fn from(err: LowerError) -> Self {
        match err {
            LowerError::Resolution(inner) => inner,
            other => alox_core::Error::Lowering(other.to_string()),
        }
    }
}

/// The struct a function is a method of. Methods take a pointer to the
/// receiver as parameter 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodContext {
    pub receiver: StructType,
}

impl MethodContext {
    pub fn new(receiver: StructType) -> Self {
        Self { receiver }
    }

    pub fn receiver_type(&self) -> Type {
        Type::reference(Type::Struct(self.receiver.clone()))
    }

    /// `StructName` followed by the method name.
    pub fn symbol(&self, function: &str) -> String {
        format!("{}{}", self.receiver, function)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Header,
    Body,
}

pub struct Backend<'a> {
    resolver: &'a DeclarationResolver,
    module: Arc<IrModule>,
    config: BackendConfig,
    program: LirProgram,
    type_cache: HashMap<Type, LirType>,
    in_progress: HashSet<String>,
    declared: HashSet<String>,
    runtime: HashSet<RuntimeSymbol>,
    pending: Vec<(Arc<Function>, MethodContext)>,
    phase: Phase,
    diagnostics: Vec<Diagnostic>,
    failed: bool,
}

impl<'a> Backend<'a> {
    pub fn new(
        resolver: &'a DeclarationResolver,
        module: Arc<IrModule>,
        config: BackendConfig,
    ) -> Self {
        Self {
            resolver,
            module,
            config,
            program: LirProgram::new(),
            type_cache: HashMap::new(),
            in_progress: HashSet::new(),
            declared: HashSet::new(),
            runtime: HashSet::new(),
            pending: Vec::new(),
            phase: Phase::Header,
            diagnostics: Vec::new(),
            failed: false,
        }
    }

    /// Lower the whole module. Fails if any declaration could not be lowered,
    /// unless error tolerance is on.
    pub fn lower(mut self) -> DiagnosticReport<LirProgram> {
        debug!("{} lowering module {}", LOG_AREA, self.config.module_name);
        let module = self.module.clone();

        for declaration in &module.declarations {
            self.declare_declaration(declaration, None);
        }

        self.phase = Phase::Body;
        for declaration in &module.declarations {
            self.define_declaration(declaration, None);
        }
        while let Some((function, method)) = self.pending.pop() {
            self.define_function(&function, Some(&method));
        }

        debug!(
            "{} {}: {} functions, {} types",
            LOG_AREA,
            self.config.module_name,
            self.program.functions.len(),
            self.program.type_definitions.len()
        );
        if self.failed && !self.config.tolerate_errors {
            DiagnosticReport::failure(self.diagnostics)
        } else {
            DiagnosticReport::success_with_diagnostics(self.program, self.diagnostics)
        }
    }

    fn declare_declaration(&mut self, declaration: &Declaration, method: Option<&MethodContext>) {
        match declaration {
            Declaration::Struct(structure) => {
                let Some(context) = self.struct_context(structure) else {
                    return;
                };
                if let Err(err) = self.lower_type(&Type::Struct(context.receiver.clone())) {
                    self.report("struct", &structure.name, structure.location, err);
                }
                for nested in &structure.declarations {
                    self.declare_declaration(nested, Some(&context));
                }
            }
            Declaration::Function(function) => {
                if function.is_generic() {
                    trace!("{} skipping generic function {}", LOG_AREA, function.name);
                    return;
                }
                let instance = self.function_instance(function, method);
                if let Err(err) = self.function_symbol(&instance, method) {
                    self.report("function", &function.name, function.location, err);
                }
            }
        }
    }

    fn define_declaration(&mut self, declaration: &Declaration, method: Option<&MethodContext>) {
        match declaration {
            Declaration::Struct(structure) => {
                let Some(context) = self.struct_context(structure) else {
                    return;
                };
                for nested in &structure.declarations {
                    self.define_declaration(nested, Some(&context));
                }
            }
            Declaration::Function(function) if !function.is_generic() => {
                self.define_function(function, method);
            }
            Declaration::Function(_) => {}
        }
    }

    /// The receiver context of a non-generic struct declared in this module.
    fn struct_context(&self, structure: &Arc<Struct>) -> Option<MethodContext> {
        if structure.is_generic() {
            trace!("{} skipping generic struct {}", LOG_AREA, structure.name);
            return None;
        }
        Some(MethodContext::new(StructType::new(
            self.module.clone(),
            structure.clone(),
            Default::default(),
        )))
    }

    fn function_instance(
        &self,
        function: &Arc<Function>,
        method: Option<&MethodContext>,
    ) -> FunctionType {
        match method {
            Some(method) => FunctionType::new(
                method.receiver.module.clone(),
                function.clone(),
                method.receiver.bindings.clone(),
            ),
            None => FunctionType::new(self.module.clone(), function.clone(), Default::default()),
        }
    }

    fn define_function(&mut self, function: &Arc<Function>, method: Option<&MethodContext>) {
        let symbol = self.symbol_name(&function.name, method);
        if !self.declared.contains(&symbol) {
            // the header pass already reported why
            return;
        }

        match FunctionLowering::new(self, function.clone(), method.cloned()).run() {
            Ok(blocks) => {
                trace!("{} defined {} ({} blocks)", LOG_AREA, symbol, blocks.len());
                if let Some(lowered) = self.program.function_mut(&symbol) {
                    lowered.basic_blocks = blocks;
                }
            }
            Err(err) => self.report("function", &function.name, function.location, err),
        }
    }

    fn symbol_name(&self, function: &str, method: Option<&MethodContext>) -> String {
        match method {
            Some(method) => method.symbol(function),
            None => function.to_string(),
        }
    }

    /// Declare `function` on first use and return its symbol.
    ///
    /// Functions of other modules stay declarations. Local functions first
    /// seen during the body phase (methods of generic struct instances) are
    /// queued for definition.
    pub(crate) fn function_symbol(
        &mut self,
        function: &FunctionType,
        method: Option<&MethodContext>,
    ) -> Result<String, LowerError> {
        let symbol = self.symbol_name(function.name(), method);
        if self.declared.contains(&symbol) {
            return Ok(symbol);
        }

        let signature = self.lower_signature(function, method)?;
        self.program
            .add_function(LirFunction::declaration(symbol.clone(), signature));
        self.declared.insert(symbol.clone());

        let local = function.module.full_path() == self.module.full_path();
        if !local {
            debug!(
                "{} declared external {} from {}",
                LOG_AREA,
                symbol,
                function.module.full_path()
            );
        } else if self.phase == Phase::Body {
            if let Some(method) = method {
                self.pending
                    .push((function.declaration.clone(), method.clone()));
            }
        }
        Ok(symbol)
    }

    pub(crate) fn runtime_symbol(&mut self, symbol: RuntimeSymbol) -> String {
        let name = symbol.as_str().to_string();
        if self.runtime.insert(symbol) {
            let signature = match symbol {
                RuntimeSymbol::Malloc => LirFunctionSignature::new(
                    vec![LirType::Int(64)],
                    LirType::ptr(LirType::Int(8)),
                ),
            };
            self.program
                .add_function(LirFunction::declaration(name.clone(), signature));
        }
        name
    }

    fn report(&mut self, kind: &str, name: &str, location: SourceLocation, err: LowerError) {
        self.failed = true;
        let mut diagnostic = Diagnostic::error(format!("cannot lower {} `{}`", kind, name))
            .with_label(Label::new(
                self.module.full_path().to_key(),
                location,
                err.to_string(),
            ))
            .with_source_context(DIAGNOSTIC_CONTEXT);
        if self.config.tolerate_errors {
            diagnostic = diagnostic.into_warning();
        }
        debug!("{} {}", LOG_AREA, diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

/// Lower one module with a fresh [`Backend`].
pub fn lower_module(
    resolver: &DeclarationResolver,
    module: Arc<IrModule>,
    config: BackendConfig,
) -> DiagnosticReport<LirProgram> {
    Backend::new(resolver, module, config).lower()
}
