// alox-backend: lowering from syntax trees down to the low-level IR
//
// Architecture:
// - transforms::ast_to_ir: per-module translation of syntax trees into IR bodies
// - transforms::ir_to_lir: type lowering and code generation into LIR
// - config: knobs for the backend

pub mod config;
pub mod transforms;

pub use config::BackendConfig;
pub use transforms::ast_to_ir::{generate, IrGenerator};
pub use transforms::ir_to_lir::{lower_module, Backend, LowerError, MethodContext};
