use std::fmt::{self, Formatter};

use crate::pretty::{PrettyCtx, PrettyPrintable};

use super::ty::Ty;
use super::{
    LirBasicBlock, LirConstant, LirFunction, LirInstruction, LirInstructionKind, LirProgram,
    LirTerminator, LirValue,
};

impl PrettyPrintable for LirProgram {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        ctx.writeln(f, "lir::Program {")?;
        ctx.with_indent(|ctx| {
            if !self.type_definitions.is_empty() {
                ctx.writeln(f, "types:")?;
                ctx.with_indent(|ctx| {
                    for typedef in &self.type_definitions {
                        ctx.writeln(
                            f,
                            format!("%{} = {}", typedef.name, format_definition(&typedef.ty)),
                        )?;
                    }
                    Ok(())
                })?;
            }

            if !self.functions.is_empty() {
                ctx.writeln(f, "functions:")?;
                ctx.with_indent(|ctx| {
                    for func in &self.functions {
                        write_function(func, f, ctx)?;
                    }
                    Ok(())
                })?;
            }
            Ok(())
        })?;
        ctx.writeln(f, "}")
    }
}

fn write_function(
    func: &LirFunction,
    f: &mut Formatter<'_>,
    ctx: &mut PrettyCtx<'_>,
) -> fmt::Result {
    let params = func
        .signature
        .params
        .iter()
        .enumerate()
        .map(|(idx, ty)| format!("arg{}: {}", idx, format_type(ty)))
        .collect::<Vec<_>>()
        .join(", ");
    let header = format!(
        "{} {}({}) -> {}",
        if func.is_declaration() { "declare" } else { "fn" },
        func.name,
        params,
        format_type(&func.signature.return_type),
    );
    if func.is_declaration() {
        return ctx.writeln(f, header);
    }

    ctx.writeln(f, header + " {")?;
    ctx.with_indent(|ctx| {
        for block in &func.basic_blocks {
            write_block(block, f, ctx)?;
        }
        Ok(())
    })?;
    ctx.writeln(f, "}")
}

fn write_block(
    block: &LirBasicBlock,
    f: &mut Formatter<'_>,
    ctx: &mut PrettyCtx<'_>,
) -> fmt::Result {
    ctx.writeln(f, format!("bb{}:", block.id))?;
    ctx.with_indent(|ctx| {
        for inst in &block.instructions {
            let mut line = summarize_instruction(inst);
            if ctx.options.show_types {
                if let Some(ty) = &inst.type_hint {
                    line.push_str(&format!(" : {}", format_type(ty)));
                }
            }
            ctx.writeln(f, line)?;
        }
        ctx.writeln(f, summarize_terminator(&block.terminator))
    })
}

fn summarize_instruction(inst: &LirInstruction) -> String {
    use LirInstructionKind::*;

    let register = format!("%r{}", inst.id);
    match &inst.kind {
        Add(lhs, rhs) => format!("{} = add {}, {}", register, format_value(lhs), format_value(rhs)),
        Sub(lhs, rhs) => format!("{} = sub {}, {}", register, format_value(lhs), format_value(rhs)),
        Mul(lhs, rhs) => format!("{} = mul {}, {}", register, format_value(lhs), format_value(rhs)),
        Div(lhs, rhs) => format!("{} = div {}, {}", register, format_value(lhs), format_value(rhs)),
        Load { address } => format!("{} = load {}", register, format_value(address)),
        Store { value, address } => {
            format!("store {}, {}", format_value(value), format_value(address))
        }
        Alloca { ty, alignment } => format!(
            "{} = alloca {}, align {}",
            register,
            format_type(ty),
            alignment
        ),
        GetElementPtr {
            ptr,
            indices,
            inbounds,
        } => format!(
            "{} = getelementptr{} {}, [{}]",
            register,
            if *inbounds { " inbounds" } else { "" },
            format_value(ptr),
            format_values(indices)
        ),
        ExtractValue { aggregate, indices } => format!(
            "{} = extractvalue {}, [{}]",
            register,
            format_value(aggregate),
            indices
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Call { function, args } => format!(
            "{} = call {}({})",
            register,
            format_value(function),
            format_values(args)
        ),
    }
}

fn summarize_terminator(terminator: &LirTerminator) -> String {
    match terminator {
        LirTerminator::Return(Some(value)) => format!("ret {}", format_value(value)),
        LirTerminator::Return(None) => "ret void".to_string(),
        LirTerminator::Br(target) => format!("br bb{}", target),
        LirTerminator::CondBr {
            condition,
            if_true,
            if_false,
        } => format!(
            "condbr {}, bb{}, bb{}",
            format_value(condition),
            if_true,
            if_false
        ),
        LirTerminator::Unreachable => "unreachable".to_string(),
    }
}

fn format_values(values: &[LirValue]) -> String {
    values.iter().map(format_value).collect::<Vec<_>>().join(", ")
}

pub fn format_value(value: &LirValue) -> String {
    match value {
        LirValue::Register(id) => format!("%r{}", id),
        LirValue::Constant(constant) => format_constant(constant),
        LirValue::Function(name) => format!("@{}", name),
        LirValue::Local(index) => format!("%arg{}", index),
    }
}

fn format_constant(constant: &LirConstant) -> String {
    match constant {
        LirConstant::Int(value, ty) => format!("{} {}", format_type(ty), value),
        LirConstant::Float(value, ty) => format!("{} {:?}", format_type(ty), value),
        LirConstant::Bool(value) => format!("i1 {}", value),
    }
}

/// Named structs print by name; [`format_definition`] spells them out.
pub fn format_type(ty: &Ty) -> String {
    match ty {
        Ty::Struct {
            name: Some(name), ..
        }
        | Ty::Named(name) => format!("%{}", name),
        other => format_definition(other),
    }
}

fn format_definition(ty: &Ty) -> String {
    match ty {
        Ty::Int(bits) => format!("i{}", bits),
        Ty::Half => "half".to_string(),
        Ty::F32 => "float".to_string(),
        Ty::F64 => "double".to_string(),
        Ty::F128 => "fp128".to_string(),
        Ty::Ptr(inner) => format!("{}*", format_type(inner)),
        Ty::Array(inner, len) => format!("[{} x {}]", len, format_type(inner)),
        Ty::Struct { fields, packed, .. } => {
            let body = fields.iter().map(format_type).collect::<Vec<_>>().join(", ");
            if *packed {
                format!("<{{ {} }}>", body)
            } else {
                format!("{{ {} }}", body)
            }
        }
        Ty::Named(name) => format!("%{}", name),
        Ty::Function {
            return_type,
            param_types,
            is_variadic,
        } => {
            let mut params = param_types.iter().map(format_type).collect::<Vec<_>>();
            if *is_variadic {
                params.push("...".to_string());
            }
            format!("{} ({})", format_type(return_type), params.join(", "))
        }
        Ty::Void => "void".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_structs_print_by_name() {
        let node = Ty::Struct {
            name: Some("Node".to_string()),
            fields: vec![Ty::Int(32), Ty::ptr(Ty::Named("Node".to_string()))],
            packed: false,
        };
        assert_eq!(format_type(&node), "%Node");
        assert_eq!(format_definition(&node), "{ i32, %Node* }");
        assert_eq!(format_type(&Ty::ptr(Ty::Int(1))), "i1*");
    }
}
