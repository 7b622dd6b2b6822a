use crate::config::PipelineOptions;
use crate::error::{PipelineDiagnostics, PipelineError};
use std::marker::PhantomData;
use tracing::{debug, info};

/// One step of a module's compilation, from `SrcCtx` to `DstCtx`.
pub trait PipelineStage: Send + Sync {
    type SrcCtx;
    type DstCtx;

    fn name(&self) -> &'static str;
    fn run(
        &self,
        context: Self::SrcCtx,
        diagnostics: &mut PipelineDiagnostics,
        options: &PipelineOptions,
    ) -> Result<Self::DstCtx, PipelineError>;
}

type StageFn<Src, Dst> =
    dyn Fn(Src, &mut PipelineDiagnostics, &PipelineOptions) -> Result<Dst, PipelineError>
        + Send
        + Sync;

pub struct Pipeline<Src, Dst> {
    stages: Vec<&'static str>,
    run: Box<StageFn<Src, Dst>>,
}

impl<Src, Dst> Pipeline<Src, Dst> {
    pub fn run(
        &self,
        context: Src,
        diagnostics: &mut PipelineDiagnostics,
        options: &PipelineOptions,
    ) -> Result<Dst, PipelineError> {
        (self.run)(context, diagnostics, options)
    }

    /// Stage names in execution order.
    pub fn stages(&self) -> &[&'static str] {
        &self.stages
    }
}

pub struct PipelineBuilder<Src, Dst> {
    pipeline: Pipeline<Src, Dst>,
    _marker: PhantomData<(Src, Dst)>,
}

impl<Src> PipelineBuilder<Src, Src> {
    pub fn new() -> Self {
        let run = |context: Src,
                   _diagnostics: &mut PipelineDiagnostics,
                   _options: &PipelineOptions| Ok(context);
        Self {
            pipeline: Pipeline {
                stages: Vec::new(),
                run: Box::new(run),
            },
            _marker: PhantomData,
        }
    }
}

impl<Src> Default for PipelineBuilder<Src, Src> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Src, Mid> PipelineBuilder<Src, Mid> {
    /// Append `stage`. Its diagnostics are emitted when it succeeds; errors
    /// are attributed to it unless they already name a stage of their own.
    pub fn add_stage<Next, S>(self, stage: S) -> PipelineBuilder<Src, Next>
    where
        S: PipelineStage<SrcCtx = Mid, DstCtx = Next> + 'static,
        Src: 'static,
        Mid: 'static,
        Next: 'static,
    {
        let name = stage.name();
        let previous = self.pipeline.run;
        let mut stages = self.pipeline.stages;
        stages.push(name);

        let run = move |context: Src,
                        diagnostics: &mut PipelineDiagnostics,
                        options: &PipelineOptions| {
            let mid = previous(context, diagnostics, options)?;
            if options.debug.verbose {
                info!("[pipeline] running {}", name);
            } else {
                debug!("[pipeline] running {}", name);
            }
            match stage.run(mid, diagnostics, options) {
                Ok(next) => {
                    diagnostics.emit_stage(name, options);
                    Ok(next)
                }
                Err(err) if err.stage == name => Err(err),
                Err(err) => Err(PipelineError::new(name, err.message)),
            }
        };

        PipelineBuilder {
            pipeline: Pipeline {
                stages,
                run: Box::new(run),
            },
            _marker: PhantomData,
        }
    }

    pub fn build(self) -> Pipeline<Src, Mid> {
        self.pipeline
    }
}
