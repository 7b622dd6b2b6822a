//! Typed intermediate representation.
//!
//! A module owns its declaration tree. Function bodies are arenas: blocks and
//! instructions refer to each other through [`BlockId`] and [`InstId`]
//! handles, and an instruction's handle doubles as its SSA name.

pub mod infer;
pub mod pretty;
pub mod ty;

use crate::path::Path;
use crate::span::SourceLocation;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub use crate::ast::{BinaryOp, FunctionKind, StructKind};
pub use infer::TypeContext;
pub use ty::{FunctionType, Primitive, StructType, Type};

/// Type-parameter name to bound type argument.
pub type Bindings = BTreeMap<String, DeclarationRef>;

#[derive(Debug, Clone, PartialEq)]
pub struct IrModule {
    pub path: Path,
    pub name: String,
    pub source: Arc<str>,
    pub declarations: Vec<Declaration>,
}

impl IrModule {
    pub fn new(path: Path, name: impl Into<String>, source: impl Into<Arc<str>>) -> Self {
        Self {
            path,
            name: name.into(),
            source: source.into(),
            declarations: Vec::new(),
        }
    }

    /// The module path with the module's own name appended.
    pub fn full_path(&self) -> Path {
        self.path.with_segment(self.name.clone())
    }

    pub fn find_declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|decl| decl.name() == name)
    }
}

/// An unresolved reference to a declaration or type: `path::Name[Args]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclarationRef {
    pub path: Path,
    pub name: String,
    pub arguments: Vec<DeclarationRef>,
}

impl DeclarationRef {
    pub fn new(path: Path, name: impl Into<String>, arguments: Vec<DeclarationRef>) -> Self {
        Self {
            path,
            name: name.into(),
            arguments,
        }
    }

    pub fn simple(name: impl Into<String>) -> Self {
        Self::new(Path::empty(), name, Vec::new())
    }

    pub fn generic(name: impl Into<String>, arguments: Vec<DeclarationRef>) -> Self {
        Self::new(Path::empty(), name, arguments)
    }

    /// Replace bound type parameters by their arguments, recursively.
    pub fn substitute(&self, bindings: &Bindings) -> DeclarationRef {
        if self.path.is_empty() && self.arguments.is_empty() {
            if let Some(bound) = bindings.get(&self.name) {
                return bound.clone();
            }
        }
        DeclarationRef {
            path: self.path.clone(),
            name: self.name.clone(),
            arguments: self
                .arguments
                .iter()
                .map(|argument| argument.substitute(bindings))
                .collect(),
        }
    }
}

impl From<&crate::ast::TypeName> for DeclarationRef {
    fn from(type_name: &crate::ast::TypeName) -> Self {
        DeclarationRef {
            path: type_name.path.clone(),
            name: type_name.name.clone(),
            arguments: type_name.arguments.iter().map(DeclarationRef::from).collect(),
        }
    }
}

impl fmt::Display for DeclarationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.path.is_empty() {
            write!(f, "{}::", self.path)?;
        }
        f.write_str(&self.name)?;
        if !self.arguments.is_empty() {
            let arguments = self
                .arguments
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "[{}]", arguments)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Struct(Arc<Struct>),
    Function(Arc<Function>),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Struct(structure) => &structure.name,
            Declaration::Function(function) => &function.name,
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            Declaration::Struct(structure) => structure.location,
            Declaration::Function(function) => function.location,
        }
    }

    /// Bind the reference's type arguments positionally to this declaration's
    /// type parameters.
    ///
    /// Missing arguments leave their parameters unbound. Surplus arguments
    /// make the reference invalid and yield `None`.
    pub fn instantiate(&self, module: &Arc<IrModule>, reference: &DeclarationRef) -> Option<Type> {
        match self {
            Declaration::Struct(structure) => {
                let bindings = bind(&structure.type_parameters, reference)?;
                Some(Type::Struct(StructType::new(
                    module.clone(),
                    structure.clone(),
                    bindings,
                )))
            }
            Declaration::Function(function) => {
                let bindings = bind(&function.type_parameters, reference)?;
                Some(Type::Function(FunctionType::new(
                    module.clone(),
                    function.clone(),
                    bindings,
                )))
            }
        }
    }
}

fn bind(type_parameters: &[String], reference: &DeclarationRef) -> Option<Bindings> {
    if reference.arguments.len() > type_parameters.len() {
        tracing::warn!(
            "{} supplies {} type arguments, but only {} are declared",
            reference,
            reference.arguments.len(),
            type_parameters.len()
        );
        return None;
    }
    Some(
        type_parameters
            .iter()
            .cloned()
            .zip(reference.arguments.iter().cloned())
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    pub name: String,
    pub kind: StructKind,
    pub type_parameters: Vec<String>,
    pub fields: Vec<Field>,
    pub declarations: Vec<Declaration>,
    pub location: SourceLocation,
}

impl Struct {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// A method declared directly on this struct.
    pub fn find_function(&self, name: &str) -> Option<&Arc<Function>> {
        self.declarations.iter().find_map(|decl| match decl {
            Declaration::Function(function) if function.name == name => Some(function),
            _ => None,
        })
    }

    pub fn is_generic(&self) -> bool {
        !self.type_parameters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: DeclarationRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub kind: FunctionKind,
    pub type_parameters: Vec<String>,
    pub arguments: Vec<Argument>,
    pub body: Body,
    pub return_type: DeclarationRef,
    pub location: SourceLocation,
}

impl Function {
    pub fn argument_index(&self, name: &str) -> Option<usize> {
        self.arguments.iter().position(|argument| argument.name == name)
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|argument| argument.name == name)
    }

    pub fn is_generic(&self) -> bool {
        !self.type_parameters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub ty: DeclarationRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstId(u32);

impl InstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub instructions: Vec<InstId>,
}

/// Arena of one function's blocks and instructions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    blocks: Vec<Block>,
    instructions: Vec<Instruction>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block {
            id,
            instructions: Vec::new(),
        });
        id
    }

    /// Append `instruction` to the end of `block`.
    pub fn push(&mut self, block: BlockId, instruction: Instruction) -> InstId {
        let id = InstId(self.instructions.len() as u32);
        self.instructions.push(instruction);
        self.blocks[block.index()].instructions.push(id);
        id
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub fn instruction(&self, id: InstId) -> &Instruction {
        &self.instructions[id.index()]
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    pub fn last_instruction(&self, block: BlockId) -> Option<&Instruction> {
        self.block(block)
            .instructions
            .last()
            .map(|id| self.instruction(*id))
    }

    pub fn is_terminated(&self, block: BlockId) -> bool {
        self.last_instruction(block)
            .is_some_and(Instruction::is_terminator)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// A stack slot for the local `name` of type `ty`.
    Alloca { name: String, ty: DeclarationRef },
    Load(InstId),
    Store { place: InstId, value: InstId },
    BooleanLiteral(bool),
    IntegerLiteral(i64),
    FloatLiteral(f64),
    GetParameter(String),
    DeclarationReference(DeclarationRef),
    FunctionCall {
        callee: InstId,
        arguments: Vec<InstId>,
    },
    MethodCall {
        receiver: InstId,
        method: String,
        arguments: Vec<InstId>,
    },
    GetField { aggregate: InstId, field: String },
    Return(InstId),
    Jump(BlockId),
    Branch {
        condition: InstId,
        on_true: BlockId,
        on_false: BlockId,
    },
    AddressOf(InstId),
    Dereference(InstId),
    This,
    Binary {
        op: BinaryOp,
        lhs: InstId,
        rhs: InstId,
    },
    New(DeclarationRef),
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Return(_) | Instruction::Jump(_) | Instruction::Branch { .. }
        )
    }

    pub fn operands(&self) -> Vec<InstId> {
        match self {
            Instruction::Load(value)
            | Instruction::Return(value)
            | Instruction::AddressOf(value)
            | Instruction::Dereference(value) => vec![*value],
            Instruction::Store { place, value } => vec![*place, *value],
            Instruction::FunctionCall { callee, arguments } => {
                std::iter::once(*callee).chain(arguments.iter().copied()).collect()
            }
            Instruction::MethodCall {
                receiver, arguments, ..
            } => std::iter::once(*receiver)
                .chain(arguments.iter().copied())
                .collect(),
            Instruction::GetField { aggregate, .. } => vec![*aggregate],
            Instruction::Branch { condition, .. } => vec![*condition],
            Instruction::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Instruction::Alloca { .. }
            | Instruction::BooleanLiteral(_)
            | Instruction::IntegerLiteral(_)
            | Instruction::FloatLiteral(_)
            | Instruction::GetParameter(_)
            | Instruction::DeclarationReference(_)
            | Instruction::Jump(_)
            | Instruction::This
            | Instruction::New(_) => Vec::new(),
        }
    }
}
