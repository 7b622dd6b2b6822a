//! Syntax tree handed over by the parser.
//!
//! The tree is plain data: the translator in `alox-backend` walks it once and
//! never mutates it. Everything derives `serde` so trees can be stored as JSON
//! fixtures.

use crate::path::Path;
use crate::span::SourceLocation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstModule {
    pub path: Path,
    pub name: String,
    #[serde(default)]
    pub source: String,
    pub declarations: Vec<AstDeclaration>,
}

impl AstModule {
    pub fn new(path: Path, name: impl Into<String>, declarations: Vec<AstDeclaration>) -> Self {
        Self {
            path,
            name: name.into(),
            source: String::new(),
            declarations,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn full_path(&self) -> Path {
        self.path.with_segment(self.name.clone())
    }
}

/// A written type: `path::Name[Arg, ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeName {
    #[serde(default)]
    pub path: Path,
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<TypeName>,
}

impl TypeName {
    pub fn new(path: Path, name: impl Into<String>, arguments: Vec<TypeName>) -> Self {
        Self {
            path,
            name: name.into(),
            arguments,
        }
    }

    pub fn simple(name: impl Into<String>) -> Self {
        Self::new(Path::empty(), name, Vec::new())
    }

    pub fn generic(name: impl Into<String>, arguments: Vec<TypeName>) -> Self {
        Self::new(Path::empty(), name, arguments)
    }

    pub fn void() -> Self {
        Self::simple("Void")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructKind {
    Struct,
    Actor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    Function,
    Behavior,
    Kernel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AstDeclaration {
    Struct(AstStruct),
    Function(AstFunction),
}

impl AstDeclaration {
    pub fn name(&self) -> &str {
        match self {
            AstDeclaration::Struct(structure) => &structure.name,
            AstDeclaration::Function(function) => &function.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstStruct {
    pub name: String,
    pub kind: StructKind,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub fields: Vec<AstField>,
    #[serde(default)]
    pub declarations: Vec<AstDeclaration>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstField {
    pub name: String,
    pub type_name: TypeName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstFunction {
    pub name: String,
    pub kind: FunctionKind,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub arguments: Vec<AstArgument>,
    #[serde(default)]
    pub statements: Vec<Statement>,
    #[serde(default = "TypeName::void")]
    pub return_type: TypeName,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstArgument {
    pub name: String,
    pub type_name: TypeName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `let name: T`
    VariableDeclaration { name: String, type_name: TypeName },
    /// `target = value`
    Assignment { target: Expression, value: Expression },
    /// `let name: T = value`
    VariableDefinition {
        name: String,
        type_name: TypeName,
        value: Expression,
    },
    FunctionCall {
        function: Expression,
        arguments: Vec<Expression>,
    },
    MethodCall {
        receiver: Expression,
        method: String,
        arguments: Vec<Expression>,
    },
    If(IfStatement),
    Return(Expression),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    pub condition: Expression,
    pub block: Vec<Statement>,
    #[serde(default)]
    pub else_branch: Option<ElseBranch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElseBranch {
    If(Box<IfStatement>),
    Block(Vec<Statement>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    BooleanLiteral(bool),
    IntegerLiteral(i64),
    FloatLiteral(f64),
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    /// An identifier; `path` is `Some` only when the source spelled one out.
    VariableReference { path: Option<Path>, name: String },
    FunctionCall {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    GetField {
        aggregate: Box<Expression>,
        field: String,
    },
    MethodCall {
        receiver: Box<Expression>,
        method: String,
        arguments: Vec<Expression>,
    },
    New(TypeName),
    AddressOf(Box<Expression>),
    Dereference(Box<Expression>),
    This,
}

impl Expression {
    pub fn var(name: impl Into<String>) -> Self {
        Expression::VariableReference {
            path: None,
            name: name.into(),
        }
    }

    pub fn qualified(path: Path, name: impl Into<String>) -> Self {
        Expression::VariableReference {
            path: Some(path),
            name: name.into(),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn call(function: Expression, arguments: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            function: Box::new(function),
            arguments,
        }
    }

    pub fn field(aggregate: Expression, field: impl Into<String>) -> Self {
        Expression::GetField {
            aggregate: Box::new(aggregate),
            field: field.into(),
        }
    }

    pub fn method(
        receiver: Expression,
        method: impl Into<String>,
        arguments: Vec<Expression>,
    ) -> Self {
        Expression::MethodCall {
            receiver: Box::new(receiver),
            method: method.into(),
            arguments,
        }
    }
}
