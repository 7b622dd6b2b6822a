#![allow(dead_code)]
use alox_core::ir::{
    Argument, Body, Declaration, DeclarationRef, Field, Function, FunctionKind, IrModule, Struct,
    StructKind,
};
use alox_core::span::SourceLocation;
use alox_core::Path;
use std::sync::Arc;

pub fn simple(name: &str) -> DeclarationRef {
    DeclarationRef::simple(name)
}

pub fn generic(name: &str, arguments: Vec<DeclarationRef>) -> DeclarationRef {
    DeclarationRef::generic(name, arguments)
}

pub fn at(line: u32, offset: u32, length: u32) -> SourceLocation {
    SourceLocation::new(line, offset, length)
}

pub fn structure(
    name: &str,
    kind: StructKind,
    type_parameters: &[&str],
    fields: &[(&str, DeclarationRef)],
    declarations: Vec<Declaration>,
) -> Declaration {
    Declaration::Struct(Arc::new(Struct {
        name: name.to_string(),
        kind,
        type_parameters: type_parameters.iter().map(|p| p.to_string()).collect(),
        fields: fields
            .iter()
            .map(|(name, ty)| Field {
                name: name.to_string(),
                ty: ty.clone(),
            })
            .collect(),
        declarations,
        location: SourceLocation::default(),
    }))
}

pub fn function(
    name: &str,
    kind: FunctionKind,
    arguments: &[(&str, DeclarationRef)],
    return_type: DeclarationRef,
    body: Body,
    location: SourceLocation,
) -> Declaration {
    Declaration::Function(Arc::new(Function {
        name: name.to_string(),
        kind,
        type_parameters: Vec::new(),
        arguments: arguments
            .iter()
            .map(|(name, ty)| Argument {
                name: name.to_string(),
                ty: ty.clone(),
            })
            .collect(),
        body,
        return_type,
        location,
    }))
}

pub fn module(path: &str, name: &str, declarations: Vec<Declaration>) -> Arc<IrModule> {
    let mut module = IrModule::new(Path::parse(path), name, "");
    module.declarations = declarations;
    Arc::new(module)
}

/// `struct Point { let a: Int32; let x: Int32 }` in `test::main`.
pub fn point_module() -> Arc<IrModule> {
    module(
        "test",
        "main",
        vec![structure(
            "Point",
            StructKind::Struct,
            &[],
            &[("a", simple("Int32")), ("x", simple("Int32"))],
            Vec::new(),
        )],
    )
}
