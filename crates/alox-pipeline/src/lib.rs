pub mod compiler;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod stages;

pub use compiler::{CompileOutput, CompiledModule, Compiler};
pub use config::{DebugOptions, ErrorToleranceOptions, PipelineOptions};
pub use error::{PipelineDiagnostics, PipelineError};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineStage};
