//! Low-level target IR: LLVM-shaped functions, basic blocks and values.

pub mod layout;
pub mod pretty;
pub mod ty;

pub use ty::Ty;
pub type LirType = Ty;
pub type LirId = u32;
pub type RegisterId = u32;
pub type BasicBlockId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeSymbol {
    Malloc,
}

impl RuntimeSymbol {
    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeSymbol::Malloc => "malloc",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LirProgram {
    pub functions: Vec<LirFunction>,
    pub type_definitions: Vec<LirTypeDefinition>,
}

impl LirProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, function: LirFunction) {
        self.functions.push(function);
    }

    pub fn function(&self, name: &str) -> Option<&LirFunction> {
        self.functions.iter().find(|function| function.name == name)
    }

    pub fn function_mut(&mut self, name: &str) -> Option<&mut LirFunction> {
        self.functions.iter_mut().find(|function| function.name == name)
    }

    pub fn type_definition(&self, name: &str) -> Option<&LirTypeDefinition> {
        self.type_definitions.iter().find(|def| def.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LirFunction {
    pub name: String,
    pub signature: LirFunctionSignature,
    pub basic_blocks: Vec<LirBasicBlock>,
}

impl LirFunction {
    /// A function without blocks; it only declares `name`.
    pub fn declaration(name: impl Into<String>, signature: LirFunctionSignature) -> Self {
        Self {
            name: name.into(),
            signature,
            basic_blocks: Vec::new(),
        }
    }

    pub fn is_declaration(&self) -> bool {
        self.basic_blocks.is_empty()
    }

    pub fn get_basic_block(&self, id: BasicBlockId) -> Option<&LirBasicBlock> {
        self.basic_blocks.iter().find(|bb| bb.id == id)
    }

    /// Every instruction of the function in block order.
    pub fn instructions(&self) -> impl Iterator<Item = &LirInstruction> {
        self.basic_blocks
            .iter()
            .flat_map(|block| block.instructions.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LirFunctionSignature {
    pub params: Vec<LirType>,
    pub return_type: LirType,
    pub is_variadic: bool,
}

impl LirFunctionSignature {
    pub fn new(params: Vec<LirType>, return_type: LirType) -> Self {
        Self {
            params,
            return_type,
            is_variadic: false,
        }
    }

    pub fn function_type(&self) -> LirType {
        LirType::Function {
            return_type: Box::new(self.return_type.clone()),
            param_types: self.params.clone(),
            is_variadic: self.is_variadic,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LirBasicBlock {
    pub id: BasicBlockId,
    pub instructions: Vec<LirInstruction>,
    pub terminator: LirTerminator,
}

impl LirBasicBlock {
    pub fn new(id: BasicBlockId) -> Self {
        Self {
            id,
            instructions: Vec::new(),
            terminator: LirTerminator::Unreachable,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LirInstruction {
    pub id: LirId,
    pub kind: LirInstructionKind,
    pub type_hint: Option<LirType>,
}

impl LirInstruction {
    pub fn new(id: LirId, kind: LirInstructionKind) -> Self {
        Self {
            id,
            kind,
            type_hint: None,
        }
    }

    pub fn with_type(mut self, ty: LirType) -> Self {
        self.type_hint = Some(ty);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LirInstructionKind {
    Add(LirValue, LirValue),
    Sub(LirValue, LirValue),
    Mul(LirValue, LirValue),
    Div(LirValue, LirValue),

    Load {
        address: LirValue,
    },
    Store {
        value: LirValue,
        address: LirValue,
    },
    Alloca {
        ty: LirType,
        alignment: u32,
    },

    GetElementPtr {
        ptr: LirValue,
        indices: Vec<LirValue>,
        inbounds: bool,
    },
    ExtractValue {
        aggregate: LirValue,
        indices: Vec<u32>,
    },

    Call {
        function: LirValue,
        args: Vec<LirValue>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LirTerminator {
    Return(Option<LirValue>),
    Br(BasicBlockId),
    CondBr {
        condition: LirValue,
        if_true: BasicBlockId,
        if_false: BasicBlockId,
    },
    Unreachable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LirValue {
    Register(RegisterId),
    Constant(LirConstant),
    Function(String),
    /// Function parameter by position.
    Local(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LirConstant {
    Int(i64, LirType),
    Float(f64, LirType),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LirTypeDefinition {
    pub name: String,
    pub ty: LirType,
}
