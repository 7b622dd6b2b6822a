use super::{Backend, LowerError, MethodContext, LOG_AREA};
use alox_core::ir::{
    BinaryOp, BlockId, Bindings, DeclarationRef, Function, FunctionType, InstId, Instruction,
    IrModule, Primitive, Type, TypeContext,
};
use alox_core::lir::layout::{align_of, size_of};
use alox_core::lir::{
    LirBasicBlock, LirConstant, LirInstruction, LirInstructionKind, LirTerminator, LirType,
    LirValue, RegisterId, RuntimeSymbol,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Lowers the body of one function. Every IR block becomes the LIR block
/// with the same index.
pub(super) struct FunctionLowering<'b, 'a> {
    backend: &'b mut Backend<'a>,
    module: Arc<IrModule>,
    function: Arc<Function>,
    method: Option<MethodContext>,
    return_type: Option<Type>,
    values: HashMap<InstId, LirValue>,
    blocks: Vec<LirBasicBlock>,
    next_register: RegisterId,
}

impl<'b, 'a> FunctionLowering<'b, 'a> {
    pub fn new(
        backend: &'b mut Backend<'a>,
        function: Arc<Function>,
        method: Option<MethodContext>,
    ) -> Self {
        let module = match &method {
            Some(method) => method.receiver.module.clone(),
            None => backend.module.clone(),
        };
        Self {
            backend,
            module,
            function,
            method,
            return_type: None,
            values: HashMap::new(),
            blocks: Vec::new(),
            next_register: 0,
        }
    }

    pub fn run(mut self) -> Result<Vec<LirBasicBlock>, LowerError> {
        let function = self.function.clone();
        self.blocks = function
            .body
            .blocks()
            .iter()
            .map(|block| LirBasicBlock::new(block.id.index() as u32))
            .collect();

        let return_type = self.resolve_local(&function.return_type)?;
        self.return_type = Some(return_type.clone());
        for block in function.body.blocks() {
            let mut terminated = false;
            for &id in &block.instructions {
                if terminated {
                    trace!("{} {}: skipping {} after terminator", LOG_AREA, function.name, id);
                    continue;
                }
                terminated = self.instruction(block.id, id)?;
            }
            if !terminated {
                self.blocks[block.id.index()].terminator = if return_type.is_void() {
                    LirTerminator::Return(None)
                } else {
                    LirTerminator::Unreachable
                };
            }
        }
        Ok(self.blocks)
    }

    fn bindings(&self) -> Bindings {
        self.method
            .as_ref()
            .map(|method| method.receiver.bindings.clone())
            .unwrap_or_default()
    }

    fn resolve_local(&self, reference: &DeclarationRef) -> Result<Type, LowerError> {
        Ok(self
            .backend
            .resolver
            .require(&self.module, &reference.substitute(&self.bindings()))?)
    }

    fn type_of(&self, id: InstId) -> Result<Type, LowerError> {
        let resolver = self.backend.resolver;
        TypeContext::new(
            resolver,
            &self.module,
            &self.function,
            self.method.as_ref().map(|method| &method.receiver),
        )
        .type_of(id)
        .ok_or(LowerError::UnknownType(id))
    }

    fn lowered_type_of(&mut self, id: InstId) -> Result<LirType, LowerError> {
        let ty = self.type_of(id)?;
        self.backend.lower_type(&ty)
    }

    fn value(&self, id: InstId) -> Result<LirValue, LowerError> {
        self.values
            .get(&id)
            .cloned()
            .ok_or(LowerError::MissingValue(id))
    }

    /// The value of `id` where a value of type `expected` is required.
    /// Integer literals take the width of their destination.
    fn operand(&mut self, id: InstId, expected: Option<&Type>) -> Result<LirValue, LowerError> {
        let literal = match self.function.body.instruction(id) {
            Instruction::IntegerLiteral(literal) => *literal,
            _ => return self.value(id),
        };
        let Some(expected) = expected else {
            return self.value(id);
        };
        match expected {
            Type::Primitive(Primitive::Int(bits)) if literal_fits(literal, *bits) => Ok(
                LirValue::Constant(LirConstant::Int(literal, LirType::Int(*bits))),
            ),
            Type::Primitive(Primitive::Float(_)) => {
                let ty = self.backend.lower_type(expected)?;
                Ok(LirValue::Constant(LirConstant::Float(literal as f64, ty)))
            }
            _ => Err(LowerError::LiteralDoesNotFit {
                value: literal,
                ty: expected.to_string(),
            }),
        }
    }

    fn operands(
        &mut self,
        ids: &[InstId],
        expected: &[Option<Type>],
    ) -> Result<Vec<LirValue>, LowerError> {
        ids.iter()
            .enumerate()
            .map(|(index, id)| self.operand(*id, expected.get(index).and_then(Option::as_ref)))
            .collect()
    }

    /// Parameter types of `function` as written in its declaring module.
    fn parameter_types(&self, function: &FunctionType) -> Vec<Option<Type>> {
        let declaring = function.module.full_path();
        function
            .argument_types()
            .iter()
            .map(|argument| {
                self.backend
                    .resolver
                    .resolve_in(&declaring, &self.module, argument)
            })
            .collect()
    }

    fn emit(&mut self, block: BlockId, kind: LirInstructionKind, ty: Option<LirType>) -> LirValue {
        let id = self.next_register;
        self.next_register += 1;
        let mut instruction = LirInstruction::new(id, kind);
        if let Some(ty) = ty {
            instruction = instruction.with_type(ty);
        }
        self.blocks[block.index()].instructions.push(instruction);
        LirValue::Register(id)
    }

    fn terminate(&mut self, block: BlockId, terminator: LirTerminator) {
        self.blocks[block.index()].terminator = terminator;
    }

    /// Returns whether the instruction ended the block.
    fn instruction(&mut self, block: BlockId, id: InstId) -> Result<bool, LowerError> {
        let function = self.function.clone();
        let value = match function.body.instruction(id) {
            Instruction::Alloca { ty, .. } => {
                let ty = self.resolve_local(ty)?;
                let ty = self.backend.lower_type(&ty)?;
                let alignment = align_of(&ty);
                self.emit(
                    block,
                    LirInstructionKind::Alloca {
                        ty: ty.clone(),
                        alignment,
                    },
                    Some(LirType::ptr(ty)),
                )
            }
            Instruction::Load(pointer) | Instruction::Dereference(pointer) => {
                let address = self.value(*pointer)?;
                let ty = self.lowered_type_of(id)?;
                self.emit(block, LirInstructionKind::Load { address }, Some(ty))
            }
            Instruction::Store { place, value } => {
                let address = self.value(*place)?;
                let slot = self.type_of(*place).ok();
                let value = self.operand(*value, slot.as_ref().and_then(Type::pointee))?;
                self.emit(block, LirInstructionKind::Store { value, address }, None);
                return Ok(false);
            }
            Instruction::BooleanLiteral(value) => LirValue::Constant(LirConstant::Bool(*value)),
            Instruction::IntegerLiteral(value) => {
                let ty = self.lowered_type_of(id)?;
                LirValue::Constant(LirConstant::Int(*value, ty))
            }
            Instruction::FloatLiteral(value) => {
                LirValue::Constant(LirConstant::Float(*value, LirType::F64))
            }
            Instruction::GetParameter(name) => {
                let index = function
                    .argument_index(name)
                    .ok_or_else(|| LowerError::UnknownParameter(name.clone()))?;
                let offset = u32::from(self.method.is_some());
                LirValue::Local(index as u32 + offset)
            }
            Instruction::DeclarationReference(reference) => self.declaration_reference(reference)?,
            Instruction::FunctionCall { callee, arguments } => {
                let function = self.value(*callee)?;
                let expected = match self.type_of(*callee)? {
                    Type::Function(callee) => self.parameter_types(&callee),
                    _ => Vec::new(),
                };
                let args = self.operands(arguments, &expected)?;
                let ty = self.lowered_type_of(id)?;
                self.emit(block, LirInstructionKind::Call { function, args }, Some(ty))
            }
            Instruction::MethodCall {
                receiver,
                method,
                arguments,
            } => self.method_call(block, id, *receiver, method, arguments)?,
            Instruction::GetField { aggregate, field } => {
                self.get_field(block, id, *aggregate, field)?
            }
            Instruction::Return(value) => {
                let expected = self.return_type.clone();
                let value = self.operand(*value, expected.as_ref())?;
                self.terminate(block, LirTerminator::Return(Some(value)));
                return Ok(true);
            }
            Instruction::Jump(target) => {
                self.terminate(block, LirTerminator::Br(target.index() as u32));
                return Ok(true);
            }
            Instruction::Branch {
                condition,
                on_true,
                on_false,
            } => {
                let condition = self.value(*condition)?;
                self.terminate(
                    block,
                    LirTerminator::CondBr {
                        condition,
                        if_true: on_true.index() as u32,
                        if_false: on_false.index() as u32,
                    },
                );
                return Ok(true);
            }
            Instruction::AddressOf(value) => self.address_of(block, id, *value)?,
            Instruction::This => {
                if self.method.is_none() {
                    return Err(LowerError::ThisOutsideMethod);
                }
                LirValue::Local(0)
            }
            Instruction::Binary { op, lhs, rhs } => {
                let result = self.type_of(id)?;
                let lhs = self.operand(*lhs, Some(&result))?;
                let rhs = self.operand(*rhs, Some(&result))?;
                let ty = self.backend.lower_type(&result)?;
                let kind = match op {
                    BinaryOp::Add => LirInstructionKind::Add(lhs, rhs),
                    BinaryOp::Sub => LirInstructionKind::Sub(lhs, rhs),
                    BinaryOp::Mul => LirInstructionKind::Mul(lhs, rhs),
                    BinaryOp::Div => LirInstructionKind::Div(lhs, rhs),
                };
                self.emit(block, kind, Some(ty))
            }
            Instruction::New(reference) => {
                let ty = self.resolve_local(reference)?;
                let ty = self.backend.lower_type(&ty)?;
                let malloc = self.backend.runtime_symbol(RuntimeSymbol::Malloc);
                let size = size_of(&ty) as i64;
                let size = LirValue::Constant(LirConstant::Int(size, LirType::Int(64)));
                self.emit(
                    block,
                    LirInstructionKind::Call {
                        function: LirValue::Function(malloc),
                        args: vec![size],
                    },
                    Some(LirType::ptr(ty)),
                )
            }
        };
        self.values.insert(id, value);
        Ok(false)
    }

    fn declaration_reference(
        &mut self,
        reference: &DeclarationRef,
    ) -> Result<LirValue, LowerError> {
        match self.backend.resolver.require(&self.module, reference)? {
            Type::Function(function) => {
                let symbol = self.backend.function_symbol(&function, None)?;
                Ok(LirValue::Function(symbol))
            }
            other => Err(LowerError::NotAValue(format!("{} ({})", reference, other))),
        }
    }

    /// The receiver is passed by pointer as argument 0. A receiver held by
    /// value is passed by the address it was loaded from, or spilled to the
    /// stack when it has none.
    fn method_call(
        &mut self,
        block: BlockId,
        id: InstId,
        receiver: InstId,
        method: &str,
        arguments: &[InstId],
    ) -> Result<LirValue, LowerError> {
        let receiver_type = self.type_of(receiver)?;
        let structure = receiver_type
            .unwrap_refs()
            .as_struct()
            .ok_or_else(|| LowerError::NotAStruct(receiver_type.to_string()))?
            .clone();
        let declaration = structure
            .declaration
            .find_function(method)
            .ok_or_else(|| LowerError::MethodNotFound {
                structure: structure.to_string(),
                method: method.to_string(),
            })?
            .clone();

        let context = MethodContext::new(structure);
        let instance = FunctionType::new(
            context.receiver.module.clone(),
            declaration,
            context.receiver.bindings.clone(),
        );
        let symbol = self.backend.function_symbol(&instance, Some(&context))?;

        let value = self.value(receiver)?;
        let receiver = if receiver_type.is_ref() {
            self.struct_pointer(block, value, &receiver_type)?
        } else if let Some(address) = self.place(block, receiver)? {
            address
        } else {
            self.spill(block, value, &receiver_type)?
        };

        let expected = self.parameter_types(&instance);
        let mut args = vec![receiver];
        args.extend(self.operands(arguments, &expected)?);
        let ty = self.lowered_type_of(id)?;
        Ok(self.emit(
            block,
            LirInstructionKind::Call {
                function: LirValue::Function(symbol),
                args,
            },
            Some(ty),
        ))
    }

    /// Fields behind a reference are read through a field pointer; fields of
    /// a struct value are extracted.
    fn get_field(
        &mut self,
        block: BlockId,
        id: InstId,
        aggregate: InstId,
        field: &str,
    ) -> Result<LirValue, LowerError> {
        let aggregate_type = self.type_of(aggregate)?;
        if aggregate_type.is_ref() {
            let (pointer, field_type) = self.field_address(block, aggregate, field)?;
            return Ok(self.emit(
                block,
                LirInstructionKind::Load { address: pointer },
                Some(field_type),
            ));
        }

        let (index, _) = self.field_index(&aggregate_type, field)?;
        let value = self.value(aggregate)?;
        let ty = self.lowered_type_of(id)?;
        Ok(self.emit(
            block,
            LirInstructionKind::ExtractValue {
                aggregate: value,
                indices: vec![index as u32],
            },
            Some(ty),
        ))
    }

    fn field_index(
        &self,
        aggregate: &Type,
        field: &str,
    ) -> Result<(usize, DeclarationRef), LowerError> {
        let structure = aggregate
            .unwrap_refs()
            .as_struct()
            .ok_or_else(|| LowerError::NotAStruct(aggregate.to_string()))?;
        structure
            .field(field)
            .ok_or_else(|| LowerError::FieldNotFound {
                structure: structure.to_string(),
                field: field.to_string(),
            })
    }

    /// Pointer to `field` of the struct behind `aggregate`, and the field's
    /// lowered type.
    fn field_address(
        &mut self,
        block: BlockId,
        aggregate: InstId,
        field: &str,
    ) -> Result<(LirValue, LirType), LowerError> {
        let aggregate_type = self.type_of(aggregate)?;
        let value = self.value(aggregate)?;
        let pointer = self.struct_pointer(block, value, &aggregate_type)?;
        self.field_pointer(block, pointer, &aggregate_type, field)
    }

    /// GEP to `field` of the struct `pointer` points at.
    fn field_pointer(
        &mut self,
        block: BlockId,
        pointer: LirValue,
        aggregate_type: &Type,
        field: &str,
    ) -> Result<(LirValue, LirType), LowerError> {
        let (index, field_ref) = self.field_index(aggregate_type, field)?;
        let structure = aggregate_type
            .unwrap_refs()
            .as_struct()
            .ok_or_else(|| LowerError::NotAStruct(aggregate_type.to_string()))?;
        let field_type = self
            .backend
            .resolver
            .resolve_in(&structure.module.full_path(), &self.module, &field_ref)
            .ok_or_else(|| LowerError::UnresolvedField {
                structure: structure.to_string(),
                field: field.to_string(),
                reference: field_ref.clone(),
            })?;
        let field_type = self.backend.lower_type(&field_type)?;

        let indices = vec![
            LirValue::Constant(LirConstant::Int(0, LirType::Int(32))),
            LirValue::Constant(LirConstant::Int(index as i64, LirType::Int(32))),
        ];
        let address = self.emit(
            block,
            LirInstructionKind::GetElementPtr {
                ptr: pointer,
                indices,
                inbounds: true,
            },
            Some(LirType::ptr(field_type.clone())),
        );
        Ok((address, field_type))
    }

    /// Loads through reference layers until one pointer to the struct is left.
    fn struct_pointer(
        &mut self,
        block: BlockId,
        mut value: LirValue,
        ty: &Type,
    ) -> Result<LirValue, LowerError> {
        let mut current = ty;
        while let Type::Ref(inner) = current {
            if !inner.is_ref() {
                break;
            }
            let loaded = self.backend.lower_type(inner)?;
            value = self.emit(block, LirInstructionKind::Load { address: value }, Some(loaded));
            current = &**inner;
        }
        Ok(value)
    }

    /// Address of the storage `target` was read from, if it has one. Fields
    /// of a struct held by value are addressed through the struct's own
    /// storage.
    fn place(&mut self, block: BlockId, target: InstId) -> Result<Option<LirValue>, LowerError> {
        let function = self.function.clone();
        match function.body.instruction(target) {
            Instruction::Load(pointer) | Instruction::Dereference(pointer) => {
                self.value(*pointer).map(Some)
            }
            Instruction::GetField { aggregate, field } => {
                let aggregate_type = self.type_of(*aggregate)?;
                let pointer = if aggregate_type.is_ref() {
                    let value = self.value(*aggregate)?;
                    self.struct_pointer(block, value, &aggregate_type)?
                } else {
                    match self.place(block, *aggregate)? {
                        Some(pointer) => pointer,
                        None => return Ok(None),
                    }
                };
                let (address, _) = self.field_pointer(block, pointer, &aggregate_type, field)?;
                Ok(Some(address))
            }
            _ => Ok(None),
        }
    }

    /// A value without storage is spilled, unless something is stored
    /// through the address.
    fn address_of(
        &mut self,
        block: BlockId,
        id: InstId,
        target: InstId,
    ) -> Result<LirValue, LowerError> {
        if let Some(address) = self.place(block, target)? {
            return Ok(address);
        }
        if self.is_store_target(id) {
            let target = match self.function.body.instruction(target) {
                Instruction::GetParameter(name) => format!("parameter `{}`", name),
                Instruction::GetField { field, .. } => format!("field `{}`", field),
                _ => target.to_string(),
            };
            return Err(LowerError::NotAssignable(target));
        }
        let value = self.value(target)?;
        let ty = self.type_of(target)?;
        self.spill(block, value, &ty)
    }

    fn is_store_target(&self, id: InstId) -> bool {
        let body = &self.function.body;
        body.blocks()
            .iter()
            .flat_map(|block| &block.instructions)
            .any(|other| {
                matches!(body.instruction(*other), Instruction::Store { place, .. } if *place == id)
            })
    }

    /// Copies `value` into a fresh stack slot and returns the slot.
    fn spill(
        &mut self,
        block: BlockId,
        value: LirValue,
        ty: &Type,
    ) -> Result<LirValue, LowerError> {
        let ty = self.backend.lower_type(ty)?;
        let alignment = align_of(&ty);
        let slot = self.emit(
            block,
            LirInstructionKind::Alloca {
                ty: ty.clone(),
                alignment,
            },
            Some(LirType::ptr(ty)),
        );
        self.emit(
            block,
            LirInstructionKind::Store {
                value,
                address: slot.clone(),
            },
            None,
        );
        Ok(slot)
    }
}

/// Integer literals may use the full unsigned range of their width.
fn literal_fits(value: i64, bits: u32) -> bool {
    match bits {
        0 => false,
        bits if bits >= 64 => true,
        bits => {
            let value = i128::from(value);
            value >= -(1i128 << (bits - 1)) && value < (1i128 << bits)
        }
    }
}
