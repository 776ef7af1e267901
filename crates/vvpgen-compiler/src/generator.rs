//! Whole-design generation.
//!
//! [`Generator`] runs the stages in order and assembles the program:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ header          #!, :ivl_version, :vpi_time_precision, ...   │
//! │ declarations    ScopeEmitter, plus records drawn on demand   │
//! │ module paths    flushed after every scope is drawn           │
//! │ threads         task/function bodies, then processes         │
//! │ trailer         :file_names                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A fatal error aborts the run and no program is returned. Recoverable
//! problems end up in [`GenerationOutput::diagnostics`]; the program is
//! still complete but the run counts as failed.

use tracing::{debug, error, info};
use vvpgen_core::{CodegenResult, Design, ScopeId, ScopeKind};

use crate::bytecode::{Line, Program, escape_string};
use crate::context::GenContext;
use crate::diagnostics::Diagnostics;
use crate::options::CodegenOptions;
use crate::scope::ScopeEmitter;
use crate::thread::ThreadCompiler;

/// The result of a generation run that did not abort.
#[derive(Debug)]
pub struct GenerationOutput {
    pub program: Program,
    pub diagnostics: Diagnostics,
}

impl GenerationOutput {
    /// Whether the run finished without errors.
    pub fn succeeded(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// Process exit status for the run.
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.succeeded())
    }
}

/// Generates the program for one design.
pub struct Generator<'d> {
    design: &'d Design,
    options: &'d CodegenOptions,
}

impl<'d> Generator<'d> {
    pub fn new(design: &'d Design, options: &'d CodegenOptions) -> Self {
        Self { design, options }
    }

    /// Run every stage.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&self) -> CodegenResult<GenerationOutput> {
        let mut ctx = GenContext::new(self.design, self.options);
        match self.run_stages(&mut ctx) {
            Ok(program) => {
                info!(
                    lines = program.len(),
                    errors = ctx.diags.error_count(),
                    "generation finished"
                );
                Ok(GenerationOutput {
                    program,
                    diagnostics: ctx.diags,
                })
            }
            Err(err) => {
                error!(%err, "generation aborted");
                Err(err)
            }
        }
    }

    fn run_stages(&self, ctx: &mut GenContext<'d>) -> CodegenResult<Program> {
        debug!("drawing scopes");
        ScopeEmitter::new(ctx).emit_all()?;

        debug!("compiling subroutines");
        for scope in self.subroutines() {
            let mut compiler = ThreadCompiler::for_subroutine(ctx, scope);
            compiler.compile_body()?;
            let lines = compiler.finish()?;
            ctx.push_thread(lines);
        }

        debug!("compiling processes");
        for pid in self.design.processes() {
            let mut compiler = ThreadCompiler::for_process(ctx, pid);
            compiler.compile_body()?;
            let lines = compiler.finish()?;
            ctx.push_thread(lines);
        }

        let modpaths = ctx.draw_modpaths()?;
        let (decls, threads) = ctx.take_sections();

        let mut program = Program::new();
        program.extend(self.header());
        program.extend(decls);
        program.extend(modpaths);
        program.extend(threads);
        program.extend(self.trailer());
        Ok(program)
    }

    /// Task and function scopes with a body, depth first.
    fn subroutines(&self) -> Vec<ScopeId> {
        let mut found = Vec::new();
        let mut stack: Vec<ScopeId> = self.design.roots().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let scope = self.design.scope(id);
            if matches!(scope.kind, ScopeKind::Task | ScopeKind::Function) && scope.body.is_some()
            {
                found.push(id);
            }
            stack.extend(scope.children.iter().rev().copied());
        }
        found
    }

    fn header(&self) -> Vec<Line> {
        let opts = self.options;
        let mut lines = Vec::new();
        if let Some(exe) = &opts.executable {
            let args = opts.executable_args.trim();
            lines.push(Line::Directive(if args.is_empty() {
                format!("#! {exe}")
            } else {
                format!("#! {exe} {args}")
            }));
        }
        let mut version = format!(":ivl_version \"{}\"", escape_string(&opts.version));
        if let Some(tag) = &opts.version_tag {
            version.push_str(&format!(" \"{}\"", escape_string(tag)));
        }
        version.push(';');
        lines.push(Line::Directive(version));
        lines.push(Line::Directive(format!(
            ":ivl_delay_selection \"{}\";",
            opts.delay_selection.keyword()
        )));

        let precision = opts
            .time_precision
            .unwrap_or_else(|| self.design.time_precision());
        let sign = if precision < 0 { '-' } else { '+' };
        lines.push(Line::Directive(format!(
            ":vpi_time_precision {sign} {};",
            precision.unsigned_abs()
        )));
        for module in &opts.vpi_modules {
            lines.push(Line::Directive(format!(
                ":vpi_module \"{}\";",
                escape_string(module)
            )));
        }
        lines
    }

    fn trailer(&self) -> Vec<Line> {
        let files = self.design.files();
        let mut lines = Vec::with_capacity(files.len() + 1);
        lines.push(Line::Directive(format!(":file_names {};", files.len())));
        for name in files {
            lines.push(Line::Directive(format!("    \"{}\";", escape_string(name))));
        }
        lines
    }
}
