#![allow(dead_code)]
use alox_backend::{generate, lower_module, BackendConfig};
use alox_core::ast::{
    AstArgument, AstDeclaration, AstField, AstFunction, AstModule, AstStruct, FunctionKind,
    Statement, StructKind, TypeName,
};
use alox_core::diagnostics::DiagnosticReport;
use alox_core::ir::IrModule;
use alox_core::lir::{LirFunction, LirInstructionKind, LirProgram};
use alox_core::span::SourceLocation;
use alox_core::{DeclarationResolver, Path};
use std::sync::Arc;

pub fn ty(name: &str) -> TypeName {
    TypeName::simple(name)
}

pub fn reference(name: &str) -> TypeName {
    TypeName::generic("Ref", vec![TypeName::simple(name)])
}

pub fn function(
    name: &str,
    arguments: &[(&str, TypeName)],
    return_type: TypeName,
    statements: Vec<Statement>,
) -> AstFunction {
    AstFunction {
        name: name.to_string(),
        kind: FunctionKind::Function,
        type_parameters: Vec::new(),
        arguments: arguments
            .iter()
            .map(|(name, type_name)| AstArgument {
                name: name.to_string(),
                type_name: type_name.clone(),
            })
            .collect(),
        statements,
        return_type,
        location: SourceLocation::new(1, 0, name.len() as u32),
    }
}

pub fn behavior(
    name: &str,
    arguments: &[(&str, TypeName)],
    statements: Vec<Statement>,
) -> AstFunction {
    AstFunction {
        kind: FunctionKind::Behavior,
        ..function(name, arguments, TypeName::void(), statements)
    }
}

pub fn structure(
    name: &str,
    kind: StructKind,
    fields: &[(&str, TypeName)],
    methods: Vec<AstFunction>,
) -> AstDeclaration {
    AstDeclaration::Struct(AstStruct {
        name: name.to_string(),
        kind,
        type_parameters: Vec::new(),
        fields: fields
            .iter()
            .map(|(name, type_name)| AstField {
                name: name.to_string(),
                type_name: type_name.clone(),
            })
            .collect(),
        declarations: methods.into_iter().map(AstDeclaration::Function).collect(),
        location: SourceLocation::default(),
    })
}

pub fn generic_structure(
    name: &str,
    type_parameters: &[&str],
    fields: &[(&str, TypeName)],
) -> AstDeclaration {
    match structure(name, StructKind::Struct, fields, Vec::new()) {
        AstDeclaration::Struct(structure) => AstDeclaration::Struct(AstStruct {
            type_parameters: type_parameters.iter().map(|p| p.to_string()).collect(),
            ..structure
        }),
        other => other,
    }
}

pub fn point() -> AstDeclaration {
    structure(
        "Point",
        StructKind::Struct,
        &[("a", ty("Int32")), ("x", ty("Int32"))],
        Vec::new(),
    )
}

pub fn ast_module(path: &str, name: &str, declarations: Vec<AstDeclaration>) -> AstModule {
    AstModule::new(Path::parse(path), name, declarations)
}

/// Translates and publishes every module, then lowers `main`.
pub fn lower_with(
    modules: Vec<AstModule>,
    main: &str,
    config: BackendConfig,
) -> DiagnosticReport<LirProgram> {
    let resolver = DeclarationResolver::new();
    let mut target = None;
    for module in &modules {
        let ir = Arc::new(generate(module));
        if ir.full_path() == Path::parse(main) {
            target = Some(ir.clone());
        }
        resolver.register_module(ir);
    }
    let target: Arc<IrModule> = target.expect("main module present");
    lower_module(&resolver, target, config.with_module_name(main))
}

pub fn lower(declarations: Vec<AstDeclaration>) -> LirProgram {
    let report = lower_with(
        vec![ast_module("test", "main", declarations)],
        "test::main",
        BackendConfig::default(),
    );
    let (program, diagnostics) = report
        .into_result()
        .unwrap_or_else(|diagnostics| panic!("lowering failed: {:?}", diagnostics));
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
    program
}

pub fn defined<'a>(program: &'a LirProgram, name: &str) -> &'a LirFunction {
    let function = program
        .function(name)
        .unwrap_or_else(|| panic!("function {} missing", name));
    assert!(!function.is_declaration(), "{} has no body", name);
    function
}

pub fn kinds(function: &LirFunction) -> Vec<LirInstructionKind> {
    function
        .instructions()
        .map(|instruction| instruction.kind.clone())
        .collect()
}
