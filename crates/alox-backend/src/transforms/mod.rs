pub mod ast_to_ir;
pub mod ir_to_lir;
