use std::fmt::{self, Formatter};

use super::{
    BinaryOp, Body, Declaration, Function, FunctionKind, Instruction, IrModule, Struct, StructKind,
};
use crate::pretty::{escape_string, PrettyCtx, PrettyPrintable};

impl PrettyPrintable for IrModule {
    fn fmt_pretty(&self, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
        ctx.writeln(f, format!("; Module: {}", self.full_path()))?;
        for declaration in &self.declarations {
            write_declaration(declaration, f, ctx)?;
        }
        Ok(())
    }
}

fn write_declaration(
    declaration: &Declaration,
    f: &mut Formatter<'_>,
    ctx: &mut PrettyCtx<'_>,
) -> fmt::Result {
    match declaration {
        Declaration::Struct(structure) => write_struct(structure, f, ctx),
        Declaration::Function(function) => write_function(function, f, ctx),
    }
}

fn write_struct(structure: &Struct, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
    let keyword = match structure.kind {
        StructKind::Struct => "struct",
        StructKind::Actor => "actor",
    };
    let mut header = format!(
        "{} {}[{}]:",
        keyword,
        structure.name,
        structure.type_parameters.join(", ")
    );
    if ctx.options.show_locations {
        header.push_str(&format!(" ; at {}", structure.location));
    }
    ctx.writeln(f, header)?;
    ctx.with_indent(|ctx| {
        for field in &structure.fields {
            ctx.writeln(f, format!("let {}: {}", field.name, field.ty))?;
        }
        for nested in &structure.declarations {
            write_declaration(nested, f, ctx)?;
        }
        Ok(())
    })
}

fn write_function(
    function: &Function,
    f: &mut Formatter<'_>,
    ctx: &mut PrettyCtx<'_>,
) -> fmt::Result {
    let keyword = match function.kind {
        FunctionKind::Function => "fun",
        FunctionKind::Behavior => "behave",
        FunctionKind::Kernel => "kernel",
    };
    let type_parameters = if function.type_parameters.is_empty() {
        String::new()
    } else {
        format!("[{}]", function.type_parameters.join(", "))
    };
    let arguments = function
        .arguments
        .iter()
        .map(|argument| format!("%{}: {}", argument.name, argument.ty))
        .collect::<Vec<_>>()
        .join(", ");
    let mut header = format!(
        "{} @{}{}({}) -> {}:",
        keyword, function.name, type_parameters, arguments, function.return_type
    );
    if ctx.options.show_locations {
        header.push_str(&format!(" ; at {}", function.location));
    }
    ctx.writeln(f, header)?;
    ctx.with_indent(|ctx| write_body(&function.body, f, ctx))
}

fn write_body(body: &Body, f: &mut Formatter<'_>, ctx: &mut PrettyCtx<'_>) -> fmt::Result {
    for block in body.blocks() {
        ctx.writeln(f, format!("{}:", block.id))?;
        ctx.with_indent(|ctx| {
            for id in &block.instructions {
                let text = summarize_instruction(body.instruction(*id));
                if produces_value(body.instruction(*id)) {
                    ctx.writeln(f, format!("{} = {}", id, text))?;
                } else {
                    ctx.writeln(f, text)?;
                }
            }
            Ok(())
        })?;
    }
    Ok(())
}

fn produces_value(instruction: &Instruction) -> bool {
    !matches!(
        instruction,
        Instruction::Store { .. }
            | Instruction::Return(_)
            | Instruction::Jump(_)
            | Instruction::Branch { .. }
    )
}

fn join_values(values: &[super::InstId]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn summarize_instruction(instruction: &Instruction) -> String {
    match instruction {
        Instruction::Alloca { name, ty } => format!("alloca {}: {}", name, ty),
        Instruction::Load(pointer) => format!("load {}", pointer),
        Instruction::Store { place, value } => format!("store {}, {}", place, value),
        Instruction::BooleanLiteral(value) => format!("bool {}", value),
        Instruction::IntegerLiteral(value) => format!("int {}", value),
        Instruction::FloatLiteral(value) => format!("float {:?}", value),
        Instruction::GetParameter(name) => format!("param %{}", name),
        Instruction::DeclarationReference(reference) => format!("ref {}", reference),
        Instruction::FunctionCall { callee, arguments } => {
            format!("call {}({})", callee, join_values(arguments))
        }
        Instruction::MethodCall {
            receiver,
            method,
            arguments,
        } => format!("method {}.{}({})", receiver, method, join_values(arguments)),
        Instruction::GetField { aggregate, field } => {
            format!("getfield {} \"{}\"", aggregate, escape_string(field))
        }
        Instruction::Return(value) => format!("ret {}", value),
        Instruction::Jump(block) => format!("jump {}", block),
        Instruction::Branch {
            condition,
            on_true,
            on_false,
        } => format!("branch {}, {}, {}", condition, on_true, on_false),
        Instruction::AddressOf(value) => format!("addressof {}", value),
        Instruction::Dereference(pointer) => format!("deref {}", pointer),
        Instruction::This => "this".to_string(),
        Instruction::Binary { op, lhs, rhs } => {
            let name = match op {
                BinaryOp::Add => "add",
                BinaryOp::Sub => "sub",
                BinaryOp::Mul => "mul",
                BinaryOp::Div => "div",
            };
            format!("{} {}, {}", name, lhs, rhs)
        }
        Instruction::New(reference) => format!("new {}", reference),
    }
}
