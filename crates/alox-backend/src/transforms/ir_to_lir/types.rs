use super::{Backend, LowerError, MethodContext, LOG_AREA};
use alox_core::ir::{FunctionType, Primitive, StructType, Type};
use alox_core::lir::{LirFunctionSignature, LirType, LirTypeDefinition};
use tracing::trace;

impl<'a> Backend<'a> {
    pub(crate) fn lower_type(&mut self, ty: &Type) -> Result<LirType, LowerError> {
        if let Some(cached) = self.type_cache.get(ty) {
            return Ok(cached.clone());
        }

        let lowered = match ty {
            Type::Primitive(primitive) => lower_primitive(*primitive)?,
            Type::Ref(inner) | Type::Array(inner) => LirType::ptr(self.lower_type(inner)?),
            Type::Struct(structure) => return self.lower_struct(structure),
            Type::Function(function) => self.lower_signature(function, None)?.function_type(),
        };
        self.type_cache.insert(ty.clone(), lowered.clone());
        Ok(lowered)
    }

    /// Structs become named LIR structs with one entry per field. A struct
    /// reached again while its own fields are being lowered is referred to
    /// by name.
    fn lower_struct(&mut self, structure: &StructType) -> Result<LirType, LowerError> {
        let name = structure.to_string();
        if self.in_progress.contains(&name) {
            return Ok(LirType::Named(name));
        }

        self.in_progress.insert(name.clone());
        let fields = self.lower_fields(structure);
        self.in_progress.remove(&name);

        let lowered = LirType::Struct {
            name: Some(name.clone()),
            fields: fields?,
            packed: false,
        };
        trace!("{} struct {} = {:?}", LOG_AREA, name, lowered);
        self.program.type_definitions.push(LirTypeDefinition {
            name,
            ty: lowered.clone(),
        });
        self.type_cache
            .insert(Type::Struct(structure.clone()), lowered.clone());
        Ok(lowered)
    }

    fn lower_fields(&mut self, structure: &StructType) -> Result<Vec<LirType>, LowerError> {
        structure
            .declaration
            .fields
            .iter()
            .map(|field| {
                let reference = field.ty.substitute(&structure.bindings);
                let ty = self
                    .resolver
                    .resolve_in(&structure.module.full_path(), &self.module, &reference)
                    .ok_or_else(|| LowerError::UnresolvedField {
                        structure: structure.to_string(),
                        field: field.name.clone(),
                        reference,
                    })?;
                self.lower_type(&ty)
            })
            .collect()
    }

    /// Methods take a pointer to their receiver before the written arguments.
    pub(crate) fn lower_signature(
        &mut self,
        function: &FunctionType,
        method: Option<&MethodContext>,
    ) -> Result<LirFunctionSignature, LowerError> {
        let mut params = Vec::with_capacity(function.declaration.arguments.len() + 1);
        if let Some(method) = method {
            params.push(self.lower_type(&method.receiver_type())?);
        }
        for argument in function.argument_types() {
            let ty = self.resolver.require(&function.module, &argument)?;
            params.push(self.lower_type(&ty)?);
        }
        let return_type = self
            .resolver
            .require(&function.module, &function.return_type())?;
        let return_type = self.lower_type(&return_type)?;
        Ok(LirFunctionSignature::new(params, return_type))
    }
}

fn lower_primitive(primitive: Primitive) -> Result<LirType, LowerError> {
    Ok(match primitive {
        Primitive::Int(bits) => LirType::Int(bits),
        Primitive::Bool => LirType::Int(1),
        Primitive::Float(16) => LirType::Half,
        Primitive::Float(32) => LirType::F32,
        Primitive::Float(64) => LirType::F64,
        Primitive::Float(128) => LirType::F128,
        Primitive::Float(bits) => return Err(LowerError::UnsupportedFloatWidth(bits)),
        Primitive::Void | Primitive::NoReturn => LirType::Void,
    })
}
