use super::DeclarationResolver;
use crate::ir::{DeclarationRef, IrModule, Primitive, Type};
use std::sync::Arc;

/// Synthesize a builtin type for a path-less reference.
pub(super) fn resolve_builtin(
    resolver: &DeclarationResolver,
    current: &Arc<IrModule>,
    reference: &DeclarationRef,
) -> Option<Type> {
    match reference.name.as_str() {
        "Ref" => wrap(resolver, current, reference).map(Type::Ref),
        "Array" => wrap(resolver, current, reference).map(Type::Array),
        name if reference.arguments.is_empty() => primitive(name).map(Type::Primitive),
        _ => None,
    }
}

fn wrap(
    resolver: &DeclarationResolver,
    current: &Arc<IrModule>,
    reference: &DeclarationRef,
) -> Option<Box<Type>> {
    let [inner] = reference.arguments.as_slice() else {
        tracing::debug!(
            "{} expects exactly one type argument, found {}",
            reference.name,
            reference.arguments.len()
        );
        return None;
    };
    resolver.resolve(current, inner).map(Box::new)
}

fn primitive(name: &str) -> Option<Primitive> {
    let known = match name {
        "Bool" => Primitive::Bool,
        "Void" => Primitive::Void,
        "NoReturn" => Primitive::NoReturn,
        "Int8" => Primitive::Int(8),
        "Int16" => Primitive::Int(16),
        "Int32" => Primitive::Int(32),
        "Int64" => Primitive::Int(64),
        "Int128" => Primitive::Int(128),
        "Float8" => Primitive::Float(8),
        "Float16" => Primitive::Float(16),
        "Float32" => Primitive::Float(32),
        "Float64" => Primitive::Float(64),
        "Float128" => Primitive::Float(128),
        _ => {
            if let Some(bits) = numeral_suffix(name, "Int") {
                return Some(Primitive::Int(bits));
            }
            return numeral_suffix(name, "Float").map(Primitive::Float);
        }
    };
    Some(known)
}

fn numeral_suffix(name: &str, prefix: &str) -> Option<u32> {
    let digits = name.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|bits| *bits > 0)
}
