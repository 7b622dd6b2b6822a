use alox_core::ast::{
    AstDeclaration, AstFunction, AstModule, AstStruct, ElseBranch, Expression, IfStatement,
    Statement,
};
use alox_core::ir::{
    Argument, BlockId, Declaration, DeclarationRef, Field, Function, InstId, Instruction,
    IrModule, Struct,
};
use std::sync::Arc;
use tracing::debug;

mod block;
mod scope;


use block::BlockBuilder;
use scope::LocalVariableTable;

const LOG_AREA: &str = "[ast→ir]";

/// Translates one syntax-tree module into an IR module.
///
/// Names are not resolved here: written types become [`DeclarationRef`]s
/// and unknown identifiers become deferred declaration references.
#[derive(Debug, Default)]
pub struct IrGenerator {
    translated_functions: usize,
}

impl IrGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&mut self, module: &AstModule) -> IrModule {
        let mut ir = IrModule::new(
            module.path.clone(),
            module.name.clone(),
            module.source.as_str(),
        );
        ir.declarations = module
            .declarations
            .iter()
            .map(|declaration| self.transform_declaration(declaration))
            .collect();
        debug!(
            "{} translated module {} ({} functions)",
            LOG_AREA,
            ir.full_path(),
            self.translated_functions
        );
        ir
    }

    fn transform_declaration(&mut self, declaration: &AstDeclaration) -> Declaration {
        match declaration {
            AstDeclaration::Struct(structure) => {
                Declaration::Struct(Arc::new(self.transform_struct(structure)))
            }
            AstDeclaration::Function(function) => {
                Declaration::Function(Arc::new(self.transform_function(function)))
            }
        }
    }

    fn transform_struct(&mut self, structure: &AstStruct) -> Struct {
        Struct {
            name: structure.name.clone(),
            kind: structure.kind,
            type_parameters: structure.type_parameters.clone(),
            fields: structure
                .fields
                .iter()
                .map(|field| Field {
                    name: field.name.clone(),
                    ty: DeclarationRef::from(&field.type_name),
                })
                .collect(),
            declarations: structure
                .declarations
                .iter()
                .map(|declaration| self.transform_declaration(declaration))
                .collect(),
            location: structure.location,
        }
    }

    fn transform_function(&mut self, function: &AstFunction) -> Function {
        let mut translator = FunctionTranslator::new(function);
        translator.statements(&function.statements);
        let body = translator.blocks.finish();
        self.translated_functions += 1;
        debug!(
            "{} {}: {} blocks, {} instructions",
            LOG_AREA,
            function.name,
            body.blocks().len(),
            body.instruction_count()
        );

        Function {
            name: function.name.clone(),
            kind: function.kind,
            type_parameters: function.type_parameters.clone(),
            arguments: function
                .arguments
                .iter()
                .map(|argument| Argument {
                    name: argument.name.clone(),
                    ty: DeclarationRef::from(&argument.type_name),
                })
                .collect(),
            body,
            return_type: DeclarationRef::from(&function.return_type),
            location: function.location,
        }
    }
}

/// Convenience wrapper around [`IrGenerator`].
pub fn generate(module: &AstModule) -> IrModule {
    IrGenerator::new().generate(module)
}

struct FunctionTranslator<'a> {
    function: &'a AstFunction,
    blocks: BlockBuilder,
    locals: LocalVariableTable,
}

impl<'a> FunctionTranslator<'a> {
    fn new(function: &'a AstFunction) -> Self {
        Self {
            function,
            blocks: BlockBuilder::new(),
            locals: LocalVariableTable::new(),
        }
    }

    fn statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.statement(statement);
        }
    }

    fn scoped_statements(&mut self, statements: &[Statement]) {
        self.locals.push();
        self.statements(statements);
        self.locals.pop();
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::VariableDeclaration { name, type_name } => {
                let slot = self.blocks.emit(Instruction::Alloca {
                    name: name.clone(),
                    ty: DeclarationRef::from(type_name),
                });
                self.locals.define(name.clone(), slot);
            }
            Statement::Assignment { target, value } => {
                let place = self.place(target);
                let value = self.expression(value);
                self.blocks.emit(Instruction::Store { place, value });
            }
            Statement::VariableDefinition {
                name,
                type_name,
                value,
            } => {
                let value = self.expression(value);
                let slot = self.blocks.emit(Instruction::Alloca {
                    name: name.clone(),
                    ty: DeclarationRef::from(type_name),
                });
                self.locals.define(name.clone(), slot);
                self.blocks.emit(Instruction::Store { place: slot, value });
            }
            Statement::FunctionCall {
                function,
                arguments,
            } => {
                self.call(function, arguments);
            }
            Statement::MethodCall {
                receiver,
                method,
                arguments,
            } => {
                self.method_call(receiver, method, arguments);
            }
            Statement::If(statement) => self.if_statement(statement),
            Statement::Return(value) => {
                let value = self.expression(value);
                self.blocks.emit(Instruction::Return(value));
            }
        }
    }

    /// The branch is appended to the block that evaluated the condition once
    /// both arms exist.
    fn if_statement(&mut self, statement: &IfStatement) {
        let condition = self.expression(&statement.condition);
        let head = self.blocks.current();

        let on_true = self.blocks.create_block();
        self.scoped_statements(&statement.block);
        let true_end = self.blocks.current();

        match &statement.else_branch {
            None => {
                let on_false = self.blocks.create_block();
                if true_end != on_false && !self.blocks.is_terminated(true_end) {
                    self.blocks.append_to(true_end, Instruction::Jump(on_false));
                }
                self.branch(head, condition, on_true, on_false);
            }
            Some(tail) => {
                // An empty true arm must not double as the else arm.
                let on_false = self.blocks.create_fresh_block();
                self.locals.push();
                match tail {
                    ElseBranch::Block(statements) => self.statements(statements),
                    ElseBranch::If(nested) => self.if_statement(nested),
                }
                self.locals.pop();
                let false_end = self.blocks.current();

                let true_falls = !self.blocks.is_terminated(true_end);
                let false_falls = !self.blocks.is_terminated(false_end);
                if true_falls || false_falls {
                    let join = self.blocks.create_block();
                    if true_falls {
                        self.blocks.append_to(true_end, Instruction::Jump(join));
                    }
                    if false_falls && false_end != join {
                        self.blocks.append_to(false_end, Instruction::Jump(join));
                    }
                }
                self.branch(head, condition, on_true, on_false);
            }
        }
    }

    fn branch(&mut self, head: BlockId, condition: InstId, on_true: BlockId, on_false: BlockId) {
        self.blocks.append_to(
            head,
            Instruction::Branch {
                condition,
                on_true,
                on_false,
            },
        );
    }

    /// The address an assignment writes to.
    fn place(&mut self, target: &Expression) -> InstId {
        match target {
            Expression::VariableReference { path, name } if !has_path(path) => {
                if let Some(slot) = self.locals.lookup(name) {
                    return slot;
                }
                let value = self.expression(target);
                self.blocks.emit(Instruction::AddressOf(value))
            }
            Expression::Dereference(pointer) => self.expression(pointer),
            other => {
                let value = self.expression(other);
                self.blocks.emit(Instruction::AddressOf(value))
            }
        }
    }

    fn call(&mut self, function: &Expression, arguments: &[Expression]) -> InstId {
        let callee = self.expression(function);
        let arguments = arguments
            .iter()
            .map(|argument| self.expression(argument))
            .collect();
        self.blocks
            .emit(Instruction::FunctionCall { callee, arguments })
    }

    fn method_call(
        &mut self,
        receiver: &Expression,
        method: &str,
        arguments: &[Expression],
    ) -> InstId {
        let receiver = self.expression(receiver);
        let arguments = arguments
            .iter()
            .map(|argument| self.expression(argument))
            .collect();
        self.blocks.emit(Instruction::MethodCall {
            receiver,
            method: method.to_string(),
            arguments,
        })
    }

    /// Operands are emitted before the instruction that uses them.
    fn expression(&mut self, expression: &Expression) -> InstId {
        match expression {
            Expression::BooleanLiteral(value) => {
                self.blocks.emit(Instruction::BooleanLiteral(*value))
            }
            Expression::IntegerLiteral(value) => {
                self.blocks.emit(Instruction::IntegerLiteral(*value))
            }
            Expression::FloatLiteral(value) => self.blocks.emit(Instruction::FloatLiteral(*value)),
            Expression::Binary { op, lhs, rhs } => {
                let lhs = self.expression(lhs);
                let rhs = self.expression(rhs);
                self.blocks.emit(Instruction::Binary { op: *op, lhs, rhs })
            }
            Expression::VariableReference {
                path: Some(path),
                name,
            } if !path.is_empty() => self.blocks.emit(Instruction::DeclarationReference(
                DeclarationRef::new(path.clone(), name.clone(), Vec::new()),
            )),
            Expression::VariableReference { name, .. } => self.identifier(name),
            Expression::FunctionCall {
                function,
                arguments,
            } => self.call(function, arguments),
            Expression::GetField { aggregate, field } => {
                let aggregate = self.expression(aggregate);
                self.blocks.emit(Instruction::GetField {
                    aggregate,
                    field: field.clone(),
                })
            }
            Expression::MethodCall {
                receiver,
                method,
                arguments,
            } => self.method_call(receiver, method, arguments),
            Expression::New(type_name) => self
                .blocks
                .emit(Instruction::New(DeclarationRef::from(type_name))),
            Expression::AddressOf(value) => {
                let value = self.expression(value);
                self.blocks.emit(Instruction::AddressOf(value))
            }
            Expression::Dereference(pointer) => {
                let pointer = self.expression(pointer);
                self.blocks.emit(Instruction::Dereference(pointer))
            }
            Expression::This => self.blocks.emit(Instruction::This),
        }
    }

    /// Locals shadow parameters, which shadow module-level declarations.
    fn identifier(&mut self, name: &str) -> InstId {
        if let Some(slot) = self.locals.lookup(name) {
            return self.blocks.emit(Instruction::Load(slot));
        }
        if self
            .function
            .arguments
            .iter()
            .any(|argument| argument.name == name)
        {
            return self
                .blocks
                .emit(Instruction::GetParameter(name.to_string()));
        }
        self.blocks
            .emit(Instruction::DeclarationReference(DeclarationRef::simple(name)))
    }
}

fn has_path(path: &Option<alox_core::Path>) -> bool {
    path.as_ref().is_some_and(|path| !path.is_empty())
}
