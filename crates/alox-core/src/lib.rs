pub mod ast;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod lir;
pub mod passes;
pub mod path;
pub mod pretty;
pub mod resolve;
pub mod span;

// Re-export commonly used items for convenience
pub use tracing;

pub use path::Path;
pub use resolve::DeclarationResolver;

// Alias for error types
pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
