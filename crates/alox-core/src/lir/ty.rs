#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// Integer of the given bit width; `Int(1)` is the boolean type.
    Int(u32),
    Half,
    F32,
    F64,
    F128,
    Ptr(Box<Ty>),
    Array(Box<Ty>, u64),
    Struct {
        name: Option<String>,
        fields: Vec<Ty>,
        packed: bool,
    },
    /// Reference to a named struct whose definition is still being built.
    Named(String),
    Function {
        return_type: Box<Ty>,
        param_types: Vec<Ty>,
        is_variadic: bool,
    },
    Void,
}

impl Ty {
    pub fn ptr(inner: Ty) -> Self {
        Ty::Ptr(Box::new(inner))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Ty::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Ty::Half | Ty::F32 | Ty::F64 | Ty::F128)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Ty::Ptr(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Ty::Void)
    }

    pub fn pointee(&self) -> Option<&Ty> {
        match self {
            Ty::Ptr(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn struct_fields(&self) -> Option<&[Ty]> {
        match self {
            Ty::Struct { fields, .. } => Some(fields),
            _ => None,
        }
    }
}
