//! Multi-module driver.
//!
//! Modules are translated and published concurrently; once every module is
//! visible to the resolver they are checked and lowered one at a time.

use crate::config::PipelineOptions;
use crate::error::{PipelineDiagnostics, PipelineError};
use crate::logging::init_logging;
use crate::pipeline::{Pipeline, PipelineBuilder};
use crate::stages::{
    LowerStage, PublishStage, SemanticStage, TranslateStage, STAGE_LOWER, STAGE_TRANSLATE,
};
use alox_core::ast::AstModule;
use alox_core::diagnostics::{has_errors, Diagnostic, DiagnosticManager};
use alox_core::ir::IrModule;
use alox_core::lir::LirProgram;
use alox_core::passes::PassManager;
use alox_core::{DeclarationResolver, Path};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

const LOG_AREA: &str = "[compiler]";

#[derive(Debug)]
pub struct CompiledModule {
    pub path: Path,
    pub result: Result<LirProgram, PipelineError>,
}

#[derive(Debug)]
pub struct CompileOutput {
    pub modules: Vec<CompiledModule>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics) || self.modules.iter().any(|m| m.result.is_err())
    }

    pub fn program(&self, path: &Path) -> Option<&LirProgram> {
        self.modules
            .iter()
            .find(|module| &module.path == path)
            .and_then(|module| module.result.as_ref().ok())
    }

    pub fn error(&self, path: &Path) -> Option<&PipelineError> {
        self.modules
            .iter()
            .find(|module| &module.path == path)
            .and_then(|module| module.result.as_ref().err())
    }
}

pub struct Compiler {
    options: PipelineOptions,
    resolver: Arc<DeclarationResolver>,
    passes: PassManager,
    diagnostics: DiagnosticManager,
}

impl Compiler {
    /// Installs the global log subscriber at the configured level unless one
    /// is already set.
    pub fn new(options: PipelineOptions) -> Self {
        init_logging(options.log_level());
        Self {
            options,
            resolver: Arc::new(DeclarationResolver::new()),
            passes: PassManager::semantic(),
            diagnostics: DiagnosticManager::new(),
        }
    }

    pub fn with_passes(mut self, passes: PassManager) -> Self {
        self.passes = passes;
        self
    }

    /// Shared by every build of this compiler; modules of earlier builds stay
    /// resolvable.
    pub fn resolver(&self) -> &Arc<DeclarationResolver> {
        &self.resolver
    }

    /// Diagnostics of every build so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.get_diagnostics()
    }

    pub fn build(&self, modules: Vec<AstModule>) -> CompileOutput {
        let mut output = CompileOutput {
            modules: Vec::with_capacity(modules.len()),
            diagnostics: Vec::new(),
        };

        let translated = self.translate_all(modules);
        let back = self.back_end();
        let tolerance = &self.options.error_tolerance;
        let mut stopped = false;

        for (path, result, diagnostics) in translated {
            output.diagnostics.extend(diagnostics);
            let result = match result {
                Err(err) => Err(err),
                Ok(_) if stopped => Err(PipelineError::new(
                    STAGE_LOWER,
                    "skipped after earlier failures",
                )),
                Ok(module) => {
                    let mut diagnostics = PipelineDiagnostics::default();
                    let result = back.run(module, &mut diagnostics, &self.options);
                    output.diagnostics.extend(diagnostics.into_vec());
                    result
                }
            };

            if let Err(err) = &result {
                warn!("{} {}: {}", LOG_AREA, path, err);
                if !tolerance.continue_on_error {
                    stopped = true;
                }
            }
            let errors = output.diagnostics.iter().filter(|d| d.is_error()).count();
            if tolerance.exhausted(errors) && !stopped {
                warn!("{} stopping after {} errors", LOG_AREA, errors);
                stopped = true;
            }
            output.modules.push(CompiledModule { path, result });
        }

        info!(
            "{} built {} modules, {} failed",
            LOG_AREA,
            output.modules.len(),
            output.modules.iter().filter(|m| m.result.is_err()).count()
        );
        self.diagnostics.add_diagnostics(output.diagnostics.clone());
        output
    }

    fn front_end(&self) -> Pipeline<AstModule, Arc<IrModule>> {
        PipelineBuilder::new()
            .add_stage(TranslateStage)
            .add_stage(PublishStage {
                resolver: self.resolver.clone(),
            })
            .build()
    }

    fn back_end(&self) -> Pipeline<Arc<IrModule>, LirProgram> {
        PipelineBuilder::new()
            .add_stage(SemanticStage {
                passes: self.passes.clone(),
            })
            .add_stage(LowerStage {
                resolver: self.resolver.clone(),
            })
            .build()
    }

    /// Translate and publish every module on its own thread. Results come
    /// back in input order.
    #[allow(clippy::type_complexity)]
    fn translate_all(
        &self,
        modules: Vec<AstModule>,
    ) -> Vec<(Path, Result<Arc<IrModule>, PipelineError>, Vec<Diagnostic>)> {
        let front = self.front_end();
        let options = &self.options;
        thread::scope(|scope| {
            let handles: Vec<_> = modules
                .into_iter()
                .map(|module| {
                    let path = module.full_path();
                    let front = &front;
                    let handle = scope.spawn(move || {
                        let mut diagnostics = PipelineDiagnostics::default();
                        let result = front.run(module, &mut diagnostics, options);
                        (result, diagnostics.into_vec())
                    });
                    (path, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(path, handle)| {
                    debug!("{} waiting for {}", LOG_AREA, path);
                    let (result, diagnostics) = handle.join().unwrap_or_else(|_| {
                        (
                            Err(PipelineError::new(
                                STAGE_TRANSLATE,
                                "translation thread panicked",
                            )),
                            Vec::new(),
                        )
                    });
                    (path, result, diagnostics)
                })
                .collect()
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}
