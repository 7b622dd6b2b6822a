#![allow(dead_code)]
use alox_core::ast::{
    AstArgument, AstDeclaration, AstField, AstFunction, AstModule, AstStruct, FunctionKind,
    Statement, StructKind, TypeName,
};
use alox_core::span::SourceLocation;
use alox_core::Path;

pub fn ty(name: &str) -> TypeName {
    TypeName::simple(name)
}

pub fn function(
    name: &str,
    kind: FunctionKind,
    arguments: &[(&str, TypeName)],
    return_type: TypeName,
    statements: Vec<Statement>,
) -> AstDeclaration {
    AstDeclaration::Function(AstFunction {
        name: name.to_string(),
        kind,
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
        location: SourceLocation::new(2, 4, name.len() as u32),
    })
}

pub fn structure(
    name: &str,
    kind: StructKind,
    fields: &[(&str, TypeName)],
    declarations: Vec<AstDeclaration>,
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
        declarations,
        location: SourceLocation::new(1, 0, name.len() as u32),
    })
}

pub fn module(path: &str, name: &str, declarations: Vec<AstDeclaration>) -> AstModule {
    AstModule::new(Path::parse(path), name, declarations)
}

/// A struct (not an actor) holding a behavior.
pub fn misplaced_behavior(path: &str, name: &str) -> AstModule {
    module(
        path,
        name,
        vec![structure(
            "Worker",
            StructKind::Struct,
            &[],
            vec![function("work", FunctionKind::Behavior, &[], TypeName::void(), Vec::new())],
        )],
    )
}

pub fn empty_function(path: &str, name: &str, function_name: &str) -> AstModule {
    module(
        path,
        name,
        vec![function(
            function_name,
            FunctionKind::Function,
            &[],
            TypeName::void(),
            Vec::new(),
        )],
    )
}
