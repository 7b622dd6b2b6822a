use crate::config::PipelineOptions;
use crate::error::{PipelineDiagnostics, PipelineError};
use crate::pipeline::PipelineStage;
use alox_backend::{BackendConfig, IrGenerator};
use alox_core::ast::AstModule;
use alox_core::diagnostics::has_errors;
use alox_core::ir::IrModule;
use alox_core::lir::LirProgram;
use alox_core::passes::PassManager;
use alox_core::pretty::{pretty, PrettyOptions};
use alox_core::DeclarationResolver;
use std::sync::Arc;
use tracing::info;

pub const STAGE_TRANSLATE: &str = "translate";
pub const STAGE_PUBLISH: &str = "publish";
pub const STAGE_SEMANTICS: &str = "semantics";
pub const STAGE_LOWER: &str = "lower";

/// Syntax tree to IR.
pub struct TranslateStage;

impl PipelineStage for TranslateStage {
    type SrcCtx = AstModule;
    type DstCtx = Arc<IrModule>;

    fn name(&self) -> &'static str {
        STAGE_TRANSLATE
    }

    fn run(
        &self,
        module: AstModule,
        _diagnostics: &mut PipelineDiagnostics,
        options: &PipelineOptions,
    ) -> Result<Arc<IrModule>, PipelineError> {
        let ir = IrGenerator::new().generate(&module);
        if options.debug.print_ir {
            info!("\n{}", pretty(&ir, PrettyOptions::default()));
        }
        Ok(Arc::new(ir))
    }
}

/// Makes the module visible to every other module's resolution.
pub struct PublishStage {
    pub resolver: Arc<DeclarationResolver>,
}

impl PipelineStage for PublishStage {
    type SrcCtx = Arc<IrModule>;
    type DstCtx = Arc<IrModule>;

    fn name(&self) -> &'static str {
        STAGE_PUBLISH
    }

    fn run(
        &self,
        module: Arc<IrModule>,
        _diagnostics: &mut PipelineDiagnostics,
        _options: &PipelineOptions,
    ) -> Result<Arc<IrModule>, PipelineError> {
        if !self.resolver.register_module(module.clone()) {
            return Err(PipelineError::new(
                STAGE_PUBLISH,
                format!("module {} is already published", module.full_path()),
            ));
        }
        Ok(module)
    }
}

/// Runs the semantic passes. A module with errors goes no further.
pub struct SemanticStage {
    pub passes: PassManager,
}

impl Default for SemanticStage {
    fn default() -> Self {
        Self {
            passes: PassManager::semantic(),
        }
    }
}

impl PipelineStage for SemanticStage {
    type SrcCtx = Arc<IrModule>;
    type DstCtx = Arc<IrModule>;

    fn name(&self) -> &'static str {
        STAGE_SEMANTICS
    }

    fn run(
        &self,
        module: Arc<IrModule>,
        diagnostics: &mut PipelineDiagnostics,
        _options: &PipelineOptions,
    ) -> Result<Arc<IrModule>, PipelineError> {
        let found = self.passes.run(&module);
        let failed = has_errors(&found);
        let errors = found.iter().filter(|d| d.is_error()).count();
        diagnostics.extend(found);
        if failed {
            return Err(PipelineError::new(
                STAGE_SEMANTICS,
                format!("{} semantic error(s) in {}", errors, module.full_path()),
            ));
        }
        Ok(module)
    }
}

/// IR to LIR for one module.
pub struct LowerStage {
    pub resolver: Arc<DeclarationResolver>,
}

impl PipelineStage for LowerStage {
    type SrcCtx = Arc<IrModule>;
    type DstCtx = LirProgram;

    fn name(&self) -> &'static str {
        STAGE_LOWER
    }

    fn run(
        &self,
        module: Arc<IrModule>,
        diagnostics: &mut PipelineDiagnostics,
        options: &PipelineOptions,
    ) -> Result<LirProgram, PipelineError> {
        let name = module.full_path().to_key();
        let config = BackendConfig::new()
            .with_module_name(name.clone())
            .with_tolerate_errors(options.error_tolerance.enabled);

        let report = alox_backend::lower_module(&self.resolver, module, config);
        match report.into_result() {
            Ok((program, found)) => {
                diagnostics.extend(found);
                if options.debug.print_lir {
                    info!("\n{}", pretty(&program, PrettyOptions::default()));
                }
                Ok(program)
            }
            Err(found) => {
                let errors = found.iter().filter(|d| d.is_error()).count();
                diagnostics.extend(found);
                Err(PipelineError::new(
                    STAGE_LOWER,
                    format!("{} declaration(s) of {} failed to lower", errors, name),
                ))
            }
        }
    }
}
