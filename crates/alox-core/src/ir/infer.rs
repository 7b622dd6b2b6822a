//! Static types of instructions.

use super::{
    Bindings, DeclarationRef, Function, InstId, Instruction, IrModule, Primitive, StructType, Type,
};
use crate::resolve::DeclarationResolver;
use std::sync::Arc;

/// Everything needed to type an instruction of one function body.
///
/// `receiver` is the enclosing struct when the function is a method; it
/// also supplies the bindings for the function's written types.
pub struct TypeContext<'a> {
    pub resolver: &'a DeclarationResolver,
    pub module: &'a Arc<IrModule>,
    pub function: &'a Function,
    pub receiver: Option<&'a StructType>,
}

impl<'a> TypeContext<'a> {
    pub fn new(
        resolver: &'a DeclarationResolver,
        module: &'a Arc<IrModule>,
        function: &'a Function,
        receiver: Option<&'a StructType>,
    ) -> Self {
        Self {
            resolver,
            module,
            function,
            receiver,
        }
    }

    fn bindings(&self) -> Bindings {
        self.receiver
            .map(|receiver| receiver.bindings.clone())
            .unwrap_or_default()
    }

    fn resolve_local(&self, reference: &DeclarationRef) -> Option<Type> {
        self.resolver
            .resolve(self.module, &reference.substitute(&self.bindings()))
    }

    /// A type written inside `declaring`, such as a field or a callee's
    /// return type.
    fn resolve_declared(&self, declaring: &IrModule, reference: &DeclarationRef) -> Option<Type> {
        self.resolver.resolve_in(&declaring.full_path(), self.module, reference)
    }

    /// `None` for instructions that produce no value and for operands that
    /// cannot be resolved yet.
    pub fn type_of(&self, id: InstId) -> Option<Type> {
        match self.function.body.instruction(id) {
            Instruction::Alloca { ty, .. } => self.resolve_local(ty).map(Type::reference),
            Instruction::Load(pointer) | Instruction::Dereference(pointer) => {
                match self.type_of(*pointer)? {
                    Type::Ref(inner) => Some(*inner),
                    _ => None,
                }
            }
            Instruction::Store { .. }
            | Instruction::Return(_)
            | Instruction::Jump(_)
            | Instruction::Branch { .. } => None,
            Instruction::BooleanLiteral(_) => Some(Type::bool()),
            Instruction::IntegerLiteral(value) => Some(integer_literal_type(*value)),
            Instruction::FloatLiteral(_) => Some(Type::float(64)),
            Instruction::GetParameter(name) => {
                let argument = self.function.argument(name)?;
                self.resolve_local(&argument.ty)
            }
            Instruction::DeclarationReference(reference) => {
                self.resolver.resolve(self.module, reference)
            }
            Instruction::FunctionCall { callee, .. } => match self.type_of(*callee)? {
                Type::Function(function) => {
                    self.resolve_declared(&function.module, &function.return_type())
                }
                _ => None,
            },
            Instruction::MethodCall {
                receiver, method, ..
            } => {
                let receiver = self.type_of(*receiver)?;
                let structure = receiver.unwrap_refs().as_struct()?;
                let method = structure.declaration.find_function(method)?;
                let return_type = method.return_type.substitute(&structure.bindings);
                self.resolve_declared(&structure.module, &return_type)
            }
            Instruction::GetField { aggregate, field } => {
                let aggregate = self.type_of(*aggregate)?;
                let structure = aggregate.unwrap_refs().as_struct()?;
                let (_, field_type) = structure.field(field)?;
                self.resolve_declared(&structure.module, &field_type)
            }
            Instruction::AddressOf(value) => self.type_of(*value).map(Type::reference),
            Instruction::This => self
                .receiver
                .map(|receiver| Type::reference(Type::Struct(receiver.clone()))),
            // An integer literal takes the width of the other operand.
            Instruction::Binary { lhs, rhs, .. } => {
                match self.function.body.instruction(*lhs) {
                    Instruction::IntegerLiteral(_) => self.type_of(*rhs),
                    _ => self.type_of(*lhs),
                }
            }
            Instruction::New(reference) => self.resolve_local(reference).map(Type::reference),
        }
    }
}

/// `Int32` when the value fits in 32 bits, `Int64` otherwise.
pub fn integer_literal_type(value: i64) -> Type {
    if i32::try_from(value).is_ok() {
        Type::Primitive(Primitive::Int(32))
    } else {
        Type::Primitive(Primitive::Int(64))
    }
}
