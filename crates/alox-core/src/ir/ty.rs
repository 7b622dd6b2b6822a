use super::{Bindings, DeclarationRef, Function, IrModule, Struct};
use itertools::Itertools;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int(u32),
    Float(u32),
    Bool,
    Void,
    NoReturn,
}

/// A resolved declaration, produced by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Struct(StructType),
    Function(FunctionType),
    Primitive(Primitive),
    Ref(Box<Type>),
    Array(Box<Type>),
}

impl Type {
    pub fn int(bits: u32) -> Self {
        Type::Primitive(Primitive::Int(bits))
    }

    pub fn float(bits: u32) -> Self {
        Type::Primitive(Primitive::Float(bits))
    }

    pub fn bool() -> Self {
        Type::Primitive(Primitive::Bool)
    }

    pub fn void() -> Self {
        Type::Primitive(Primitive::Void)
    }

    pub fn reference(inner: Type) -> Self {
        Type::Ref(Box::new(inner))
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, Type::Ref(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(
            self,
            Type::Primitive(Primitive::Void) | Type::Primitive(Primitive::NoReturn)
        )
    }

    /// The pointee of a `Ref`.
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Ref(inner) => Some(inner),
            _ => None,
        }
    }

    /// Strip every `Ref` layer.
    pub fn unwrap_refs(&self) -> &Type {
        let mut current = self;
        while let Type::Ref(inner) = current {
            current = inner;
        }
        current
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            Type::Struct(structure) => Some(structure),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Struct(structure) => write!(f, "{}", structure),
            Type::Function(function) => write!(f, "{}", function),
            Type::Primitive(Primitive::Int(bits)) => write!(f, "Int{}", bits),
            Type::Primitive(Primitive::Float(bits)) => write!(f, "Float{}", bits),
            Type::Primitive(Primitive::Bool) => f.write_str("Bool"),
            Type::Primitive(Primitive::Void) => f.write_str("Void"),
            Type::Primitive(Primitive::NoReturn) => f.write_str("NoReturn"),
            Type::Ref(inner) => write!(f, "Ref[{}]", inner),
            Type::Array(inner) => write!(f, "Array[{}]", inner),
        }
    }
}

fn write_instance(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    parameters: &[String],
    bindings: &Bindings,
) -> fmt::Result {
    f.write_str(name)?;
    if bindings.is_empty() {
        return Ok(());
    }
    let arguments = parameters
        .iter()
        .filter_map(|parameter| bindings.get(parameter))
        .join(", ");
    write!(f, "[{}]", arguments)
}

/// A struct declaration instantiated with concrete type arguments.
///
/// Compares nominally: owning module, declaration name and bindings.
#[derive(Clone)]
pub struct StructType {
    pub module: Arc<IrModule>,
    pub declaration: Arc<Struct>,
    pub bindings: Bindings,
}

impl StructType {
    pub fn new(module: Arc<IrModule>, declaration: Arc<Struct>, bindings: Bindings) -> Self {
        Self {
            module,
            declaration,
            bindings,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    /// Field index and declared type with this instance's bindings applied.
    pub fn field(&self, name: &str) -> Option<(usize, DeclarationRef)> {
        let index = self.declaration.field_index(name)?;
        let field = &self.declaration.fields[index];
        Some((index, field.ty.substitute(&self.bindings)))
    }

    fn key(&self) -> (crate::path::Path, &str, &Bindings) {
        (self.module.full_path(), &self.declaration.name, &self.bindings)
    }
}

impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for StructType {}

impl Hash for StructType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructType")
            .field("module", &self.module.full_path().to_key())
            .field("name", &self.declaration.name)
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl fmt::Display for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_instance(
            f,
            &self.declaration.name,
            &self.declaration.type_parameters,
            &self.bindings,
        )
    }
}

/// A function declaration instantiated with concrete type arguments.
#[derive(Clone)]
pub struct FunctionType {
    pub module: Arc<IrModule>,
    pub declaration: Arc<Function>,
    pub bindings: Bindings,
}

impl FunctionType {
    pub fn new(module: Arc<IrModule>, declaration: Arc<Function>, bindings: Bindings) -> Self {
        Self {
            module,
            declaration,
            bindings,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    pub fn return_type(&self) -> DeclarationRef {
        self.declaration.return_type.substitute(&self.bindings)
    }

    pub fn argument_types(&self) -> Vec<DeclarationRef> {
        self.declaration
            .arguments
            .iter()
            .map(|argument| argument.ty.substitute(&self.bindings))
            .collect()
    }

    fn key(&self) -> (crate::path::Path, &str, &Bindings) {
        (self.module.full_path(), &self.declaration.name, &self.bindings)
    }
}

impl PartialEq for FunctionType {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for FunctionType {}

impl Hash for FunctionType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionType")
            .field("module", &self.module.full_path().to_key())
            .field("name", &self.declaration.name)
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_instance(
            f,
            &self.declaration.name,
            &self.declaration.type_parameters,
            &self.bindings,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_compare_by_width() {
        assert_eq!(Type::int(17), Type::int(17));
        assert_ne!(Type::int(32), Type::float(32));
        assert_ne!(Type::int(32), Type::int(64));
    }

    #[test]
    fn unwrap_refs_strips_every_layer() {
        let nested = Type::reference(Type::reference(Type::bool()));
        assert_eq!(nested.unwrap_refs(), &Type::bool());
        assert_eq!(nested.to_string(), "Ref[Ref[Bool]]");
    }
}
